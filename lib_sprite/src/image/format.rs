use crate::compression::palette::{Color, Palette};
use crate::compression::{decompress, DecompressionError, Encoding};

use super::decoder::DecodeError;

/// A converted image: encoding tag, dimensions, palette and pixel payload.
///
/// Serialized as (little-endian):
///
/// ```text
/// 0      2  tag            "RW" | "PK" | "RL"
/// 2      2  width          u16
/// 4      2  height         u16
/// 6      2  palette count  u16
/// 8    4*N  palette        N entries of R, G, B, A
/// 8+4N      payload
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub encoding: Encoding,
    pub width: u16,
    pub height: u16,
    pub palette: Palette,
    pub data: Vec<u8>,
}

impl ImageRecord {
    pub const TAG_SIZE: usize = 2;
    pub const WIDTH_HEIGHT_SIZE: usize = std::mem::size_of::<u16>();
    pub const PALETTE_SIZE_SIZE: usize = std::mem::size_of::<u16>();
    pub const HEADER_SIZE: usize =
        Self::TAG_SIZE + 2 * Self::WIDTH_HEIGHT_SIZE + Self::PALETTE_SIZE_SIZE;
    pub const COLOR_SIZE: usize = 4;

    pub fn new(encoding: Encoding, width: u16, height: u16, palette: Palette, data: Vec<u8>) -> Self {
        Self {
            encoding,
            width,
            height,
            palette,
            data,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let palette = self.palette.serialize();
        let mut bytes = Vec::with_capacity(Self::HEADER_SIZE + palette.len() + self.data.len());

        bytes.extend_from_slice(&self.encoding.tag());
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.extend_from_slice(&(self.palette.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&palette);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    pub fn indices(&self) -> Result<Vec<u8>, DecompressionError> {
        decompress(self.encoding, &self.data, &self.palette, self.pixel_count())
    }

    pub fn to_rgba(&self) -> Result<Vec<u8>, DecodeError> {
        let mut rgba = Vec::with_capacity(self.pixel_count() * Self::COLOR_SIZE);
        for index in self.indices()? {
            let color = self.palette.get(index as usize).ok_or(
                DecodeError::InvalidPaletteIndex(index as usize, self.palette.len()),
            )?;
            rgba.extend_from_slice(&color.to_bytes());
        }
        Ok(rgba)
    }
}
