use log::{debug, error, info};
use thiserror::Error;

use super::format::ImageRecord;
use super::options::ConvertOptions;
use super::source::{PixelGrid, SourceError};
use crate::compression::palette::Palette;
use crate::compression::{compress, CompressionError};

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Failed to read source pixels")]
    SourceFailed(#[from] SourceError),
    #[error("Failed to compress image data")]
    CompressionFailed(#[from] CompressionError),
    #[error("Image dimensions {0}x{1} exceed 65535")]
    DimensionsTooLarge(u32, u32),
}

#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub palette: Palette,
}

/// Converts encoded image bytes (PNG, GIF, ...) into a serialized record.
pub fn encode(
    image_data: &[u8],
    palette: Palette,
    options: &ConvertOptions,
) -> Result<Encoded, EncodingError> {
    let pixels = PixelGrid::from_image_bytes(image_data)?;
    encode_pixels(&pixels, palette, options)
}

/// Converts already decoded pixels into a serialized record.
///
/// Nothing is returned unless every step succeeds; the palette comes back
/// with any colours quantization appended.
pub fn encode_pixels(
    pixels: &PixelGrid,
    palette: Palette,
    options: &ConvertOptions,
) -> Result<Encoded, EncodingError> {
    info!("Starting encoding");
    debug!("Options: {:?}", options);

    let (width, height) = match (
        u16::try_from(pixels.width()),
        u16::try_from(pixels.height()),
    ) {
        (Ok(width), Ok(height)) => (width, height),
        _ => {
            error!(
                "Image dimensions {}x{} do not fit the record header",
                pixels.width(),
                pixels.height()
            );
            return Err(EncodingError::DimensionsTooLarge(
                pixels.width(),
                pixels.height(),
            ));
        }
    };

    // Step 1: Quantize and compress the pixels
    let compressed = compress(pixels, palette, options)?;

    // Step 2: Write header, palette and payload
    let record = ImageRecord::new(
        compressed.pixels.encoding,
        width,
        height,
        compressed.palette,
        compressed.pixels.data,
    );
    let bytes = record.to_bytes();
    debug!(
        "Record written: {:?} {}x{}, {} palette entries, {} bytes",
        record.encoding,
        width,
        height,
        record.palette.len(),
        bytes.len()
    );

    info!("Encoding process completed successfully");
    Ok(Encoded {
        bytes,
        palette: record.palette,
    })
}
