use super::format::ImageRecord;
use crate::compression::palette::{Palette, PaletteError};
use crate::compression::{DecompressionError, Encoding};
use log::{debug, error, info};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid format or header")]
    InvalidHeader,
    #[error("Unknown encoding tag {0:?}")]
    UnknownEncoding([u8; 2]),
    #[error("Unexpected end of data while reading palette: need {needed} bytes, {available} left")]
    UnexpectedEofPalette { needed: usize, available: usize },
    #[error("Invalid palette in record")]
    InvalidPalette(#[from] PaletteError),
    #[error("Invalid palette index: {0} exceeds palette size of {1}")]
    InvalidPaletteIndex(usize, usize),

    #[error("Decompression failed")]
    DecompressionFailed(#[from] DecompressionError),
}

fn read_u16(data: &[u8], cursor: usize) -> u16 {
    u16::from_le_bytes([data[cursor], data[cursor + 1]])
}

/// Parses a serialized record and checks its payload expands to every pixel.
pub fn decode(encoded_data: &[u8]) -> Result<ImageRecord, DecodeError> {
    if encoded_data.len() < ImageRecord::HEADER_SIZE {
        error!(
            "Record of {} bytes is shorter than the {} byte header",
            encoded_data.len(),
            ImageRecord::HEADER_SIZE
        );
        return Err(DecodeError::InvalidHeader);
    }

    let mut cursor = 0;

    // Read encoding tag
    let tag = [encoded_data[0], encoded_data[1]];
    let encoding = Encoding::from_tag(tag).ok_or_else(|| {
        error!("Unknown encoding tag {:?}", tag);
        DecodeError::UnknownEncoding(tag)
    })?;
    cursor += ImageRecord::TAG_SIZE;

    // Read width and height
    let width = read_u16(encoded_data, cursor);
    cursor += ImageRecord::WIDTH_HEIGHT_SIZE;
    let height = read_u16(encoded_data, cursor);
    cursor += ImageRecord::WIDTH_HEIGHT_SIZE;
    debug!("Image dimensions read: width={} height={}", width, height);

    // Read palette
    let palette_size = read_u16(encoded_data, cursor) as usize;
    cursor += ImageRecord::PALETTE_SIZE_SIZE;
    debug!("Palette size: {}", palette_size);

    let palette_bytes = palette_size * ImageRecord::COLOR_SIZE;
    if cursor + palette_bytes > encoded_data.len() {
        error!("Unexpected end of data while reading palette");
        return Err(DecodeError::UnexpectedEofPalette {
            needed: palette_bytes,
            available: encoded_data.len() - cursor,
        });
    }
    let palette = Palette::deserialize(&encoded_data[cursor..cursor + palette_bytes], palette_size)?;
    cursor += palette_bytes;

    // The remaining data is the pixel payload
    let record = ImageRecord::new(
        encoding,
        width,
        height,
        palette,
        encoded_data[cursor..].to_vec(),
    );
    debug!(
        "{:?} payload length: {}",
        record.encoding,
        record.data.len()
    );

    // Reject truncated payloads up front instead of on first use.
    record.indices()?;
    info!("Decoded {}x{} {:?} record", width, height, encoding);

    Ok(record)
}
