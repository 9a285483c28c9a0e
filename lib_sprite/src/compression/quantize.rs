use log::debug;
use thiserror::Error;

use super::palette::{Palette, PaletteError};
use crate::image::source::PixelGrid;

#[derive(Error, Debug)]
pub enum QuantizeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("Palette lookup failed")]
    Palette(#[from] PaletteError),
}

/// Palette indices for every pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGrid {
    pub width: u32,
    pub height: u32,
    pub indices: Vec<u8>,
}

/// Result of a quantization pass; the palette is handed back to the caller.
#[derive(Debug, Clone)]
pub struct Quantized {
    pub indices: IndexGrid,
    pub palette: Palette,
}

/// Maps every pixel to a palette index in row-major order.
///
/// Pixels whose RGB equals `transparent` are looked up with alpha 0. Unless
/// `strict` is set, colours missing from the palette are appended to it.
///
/// # Errors
/// - `QuantizeError::InvalidConfiguration` if `strict` is set with an empty palette
/// - `QuantizeError::Palette` for an unknown colour (strict) or a palette overflow
pub fn quantize(
    pixels: &PixelGrid,
    mut palette: Palette,
    transparent: Option<[u8; 3]>,
    strict: bool,
) -> Result<Quantized, QuantizeError> {
    if strict && palette.is_empty() {
        return Err(QuantizeError::InvalidConfiguration(
            "strict colours requested with an empty palette",
        ));
    }

    let starting_colors = palette.len();
    let indices = pixels
        .pixels()
        .iter()
        .map(|&pixel| palette.lookup_or_insert(pixel.with_transparency(transparent), strict))
        .collect::<Result<Vec<u8>, _>>()?;

    debug!(
        "Quantized {}x{} pixels: palette grew from {} to {} colours",
        pixels.width(),
        pixels.height(),
        starting_colors,
        palette.len()
    );

    Ok(Quantized {
        indices: IndexGrid {
            width: pixels.width(),
            height: pixels.height(),
            indices,
        },
        palette,
    })
}
