pub mod bitpack;
pub mod palette;
pub mod quantize;
pub mod rle;

use log::{debug, info, warn};
use thiserror::Error;

use crate::image::options::ConvertOptions;
use crate::image::source::PixelGrid;
use bitpack::BitPackError;
use palette::Palette;
use quantize::{IndexGrid, QuantizeError};
use rle::RleError;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Quantization failed")]
    QuantizeFailed(#[from] QuantizeError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecompressionError {
    #[error("Bit-packed data is truncated")]
    PackedDataTruncated(#[from] BitPackError),
    #[error("Run-length decoding failed")]
    RunLengthFailed(#[from] RleError),
    #[error("Raw data is truncated: expected {expected} bytes, got {actual}")]
    RawDataTruncated { expected: usize, actual: usize },
}

/// Pixel payload layouts a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// One byte per index.
    Raw,
    /// Indices back to back at the palette bit width.
    Packed,
    /// Escape-tagged run-length tokens.
    RunLength,
}

impl Encoding {
    pub const ALL: [Encoding; 3] = [Encoding::Raw, Encoding::Packed, Encoding::RunLength];

    pub fn tag(self) -> [u8; 2] {
        match self {
            Encoding::Raw => *b"RW",
            Encoding::Packed => *b"PK",
            Encoding::RunLength => *b"RL",
        }
    }

    pub fn from_tag(tag: [u8; 2]) -> Option<Self> {
        Self::ALL.into_iter().find(|encoding| encoding.tag() == tag)
    }

    pub fn encode(self, indices: &[u8], bit_width: u32) -> Vec<u8> {
        match self {
            Encoding::Raw => indices.to_vec(),
            Encoding::Packed => bitpack::pack(indices.iter().map(|&i| i as u32), bit_width),
            Encoding::RunLength => rle::rle_encode(indices, bit_width),
        }
    }

    pub fn decode(
        self,
        data: &[u8],
        bit_width: u32,
        count: usize,
    ) -> Result<Vec<u8>, DecompressionError> {
        match self {
            Encoding::Raw => {
                if data.len() < count {
                    return Err(DecompressionError::RawDataTruncated {
                        expected: count,
                        actual: data.len(),
                    });
                }
                Ok(data[..count].to_vec())
            }
            Encoding::Packed => Ok(bitpack::unpack(data, bit_width, count)?
                .into_iter()
                .map(|index| index as u8)
                .collect()),
            Encoding::RunLength => Ok(rle::rle_decode(data, bit_width, count)?),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPixels {
    pub encoding: Encoding,
    pub data: Vec<u8>,
}

/// Picks the payload layout for a flattened index grid.
///
/// With packing disabled the indices are stored raw. Otherwise the smaller of
/// the packed and run-length encodings wins, ties going to packed.
pub fn select_encoding(indices: &[u8], bit_width: u32, packed: bool) -> EncodedPixels {
    if !packed {
        debug!("Packing disabled: storing {} raw indices", indices.len());
        return EncodedPixels {
            encoding: Encoding::Raw,
            data: Encoding::Raw.encode(indices, bit_width),
        };
    }

    let packed = Encoding::Packed.encode(indices, bit_width);
    let runlength = Encoding::RunLength.encode(indices, bit_width);
    debug!(
        "Candidate sizes at {} bits per index: packed {} bytes, run-length {} bytes",
        bit_width,
        packed.len(),
        runlength.len()
    );

    let selected = if runlength.len() < packed.len() {
        EncodedPixels {
            encoding: Encoding::RunLength,
            data: runlength,
        }
    } else {
        EncodedPixels {
            encoding: Encoding::Packed,
            data: packed,
        }
    };

    info!(
        "Selected {:?} encoding: {} indices in {} bytes",
        selected.encoding,
        indices.len(),
        selected.data.len()
    );
    selected
}

pub struct CompressionResult {
    pub palette: Palette,
    pub indices: IndexGrid,
    pub pixels: EncodedPixels,
}

/// Quantizes `pixels` against `palette` and encodes the resulting indices.
///
/// A requested transparent colour is first marked in the palette, then
/// substituted on every matching pixel.
pub fn compress(
    pixels: &PixelGrid,
    mut palette: Palette,
    options: &ConvertOptions,
) -> Result<CompressionResult, CompressionError> {
    info!("Starting compression");
    debug!(
        "Input: {}x{} pixels, {} palette entries",
        pixels.width(),
        pixels.height(),
        palette.len()
    );

    if let Some([r, g, b]) = options.transparent {
        match palette.mark_transparent(r, g, b) {
            Some(index) => info!(
                "Found transparent colour ({},{},{}) in palette at index {}",
                r, g, b, index
            ),
            None => warn!(
                "Could not find transparent colour ({},{},{}) in palette",
                r, g, b
            ),
        }
    }

    // Step 1: Map pixels to palette indices
    let quantized = quantize::quantize(pixels, palette, options.transparent, options.strict)?;

    // Step 2: Pick the smallest payload layout
    let bit_width = quantized.palette.bit_width();
    let encoded = select_encoding(&quantized.indices.indices, bit_width, options.packed);

    info!(
        "Compression completed: {} colours, {} payload bytes",
        quantized.palette.len(),
        encoded.data.len()
    );

    Ok(CompressionResult {
        palette: quantized.palette,
        indices: quantized.indices,
        pixels: encoded,
    })
}

pub fn decompress(
    encoding: Encoding,
    data: &[u8],
    palette: &Palette,
    count: usize,
) -> Result<Vec<u8>, DecompressionError> {
    let indices = encoding.decode(data, palette.bit_width(), count)?;
    debug!("Decompressed {} indices from {:?} payload", indices.len(), encoding);
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::palette::Color;

    fn options(packed: bool, strict: bool, transparent: Option<[u8; 3]>) -> ConvertOptions {
        ConvertOptions {
            packed,
            strict,
            transparent,
        }
    }

    #[test]
    fn test_compress_marks_supplied_palette_transparent() {
        let magenta = Color::opaque(255, 0, 255);
        let white = Color::opaque(255, 255, 255);
        let palette = Palette::from_colors([white, magenta]).unwrap();
        let rgba: Vec<u8> = [magenta, white, magenta, magenta]
            .iter()
            .flat_map(|c| c.to_bytes())
            .collect();
        let pixels = PixelGrid::from_rgba(4, 1, &rgba).unwrap();

        let result = compress(&pixels, palette, &options(true, true, Some([255, 0, 255]))).unwrap();
        assert_eq!(
            result.palette.entries(),
            &[white, Color::new(255, 0, 255, 0)]
        );
        assert_eq!(result.indices.indices, vec![1, 0, 1, 1]);
        assert_eq!(result.pixels.encoding, Encoding::Packed);
        assert_eq!(result.pixels.data, vec![0b1011_0000]);
    }

    #[test]
    fn test_compress_decompress() {
        let rgba: Vec<u8> = (0..256u32)
            .flat_map(|i| Color::opaque((i / 64) as u8, 0, 0).to_bytes())
            .collect();
        let pixels = PixelGrid::from_rgba(16, 16, &rgba).unwrap();

        let result = compress(&pixels, Palette::new(), &options(true, false, None)).unwrap();
        assert_eq!(result.pixels.encoding, Encoding::RunLength);

        let indices = decompress(
            result.pixels.encoding,
            &result.pixels.data,
            &result.palette,
            256,
        )
        .unwrap();
        assert_eq!(indices, result.indices.indices);
    }

    #[test]
    fn test_compress_strict_unknown_colour() {
        let palette = Palette::from_colors([Color::opaque(0, 0, 0)]).unwrap();
        let pixels = PixelGrid::from_rgba(1, 1, &[1, 1, 1, 255]).unwrap();
        let result = compress(&pixels, palette, &options(true, true, None));
        assert!(matches!(result, Err(CompressionError::QuantizeFailed(_))));
    }

    #[test]
    fn test_tags_roundtrip() {
        for encoding in Encoding::ALL {
            assert_eq!(Encoding::from_tag(encoding.tag()), Some(encoding));
        }
        assert_eq!(Encoding::from_tag(*b"XX"), None);
    }

    #[test]
    fn test_select_raw_when_unpacked() {
        let indices = vec![0, 0, 0, 0, 0, 0, 0, 0, 3];
        let selected = select_encoding(&indices, 2, false);
        assert_eq!(selected.encoding, Encoding::Raw);
        assert_eq!(selected.data, indices);
    }

    #[test]
    fn test_select_runlength_for_flat_image() {
        let indices = vec![1u8; 1000];
        let selected = select_encoding(&indices, 1, true);
        assert_eq!(selected.encoding, Encoding::RunLength);
        assert_eq!(selected.data.len(), 5);
    }

    #[test]
    fn test_select_packed_for_noise() {
        let indices: Vec<u8> = (0..64).map(|i| (i * 7 % 16) as u8).collect();
        let selected = select_encoding(&indices, 4, true);
        assert_eq!(selected.encoding, Encoding::Packed);
        assert_eq!(selected.data.len(), 32);
    }

    #[test]
    fn test_select_tie_favours_packed() {
        // Three indices at one bit: packed 3 bits, run-length 6 bits, both one byte
        let indices = vec![0, 1, 0];
        assert_eq!(Encoding::Packed.encode(&indices, 1).len(), 1);
        assert_eq!(Encoding::RunLength.encode(&indices, 1).len(), 1);

        let selected = select_encoding(&indices, 1, true);
        assert_eq!(selected.encoding, Encoding::Packed);
        assert_eq!(selected.data, vec![0b0100_0000]);
    }

    #[test]
    fn test_select_deterministic() {
        let indices: Vec<u8> = (0..500).map(|i| ((i / 13) % 5) as u8).collect();
        let first = select_encoding(&indices, 3, true);
        let second = select_encoding(&indices, 3, true);
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_each_encoding() {
        let indices: Vec<u8> = (0..300).map(|i| ((i / 40) % 4) as u8).collect();
        for encoding in Encoding::ALL {
            let data = encoding.encode(&indices, 2);
            let decoded = encoding.decode(&data, 2, indices.len()).unwrap();
            assert_eq!(decoded, indices, "{:?}", encoding);
        }
    }

    #[test]
    fn test_decode_raw_truncated() {
        let result = Encoding::Raw.decode(&[0, 1], 1, 3);
        assert_eq!(
            result,
            Err(DecompressionError::RawDataTruncated {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_decode_packed_truncated() {
        let result = Encoding::Packed.decode(&[0xFF], 4, 3);
        assert!(matches!(
            result,
            Err(DecompressionError::PackedDataTruncated(_))
        ));
    }
}
