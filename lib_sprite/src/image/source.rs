use log::debug;
use thiserror::Error;

use crate::compression::palette::Color;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to decode source image")]
    ImageDecode(#[from] image::ImageError),
    #[error("Invalid pixel data length: expected {expected} bytes for {width}x{height}, got {actual}")]
    InvalidPixelDataLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Decoded RGBA pixels, row-major. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelGrid {
    /// Decodes any image container the `image` crate understands.
    pub fn from_image_bytes(data: &[u8]) -> Result<Self, SourceError> {
        let image = image::load_from_memory(data)?.to_rgba8();
        let (width, height) = image.dimensions();
        debug!("Decoded {}x{} source image", width, height);

        Ok(Self {
            width,
            height,
            pixels: image.pixels().map(|pixel| Color::from(pixel.0)).collect(),
        })
    }

    pub fn from_rgba(width: u32, height: u32, rgba_data: &[u8]) -> Result<Self, SourceError> {
        let expected = width as usize * height as usize * 4;
        if rgba_data.len() != expected {
            return Err(SourceError::InvalidPixelDataLength {
                width,
                height,
                expected,
                actual: rgba_data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels: rgba_data
                .chunks_exact(4)
                .map(|rgba| Color::new(rgba[0], rgba[1], rgba[2], rgba[3]))
                .collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }
}
