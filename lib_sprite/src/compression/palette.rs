use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

/// Maximum number of entries a palette can hold; indices fit in a byte.
pub const MAX_PALETTE_SIZE: usize = 256;

const ACT_TABLE_SIZE: usize = 768;
const ACT_FILE_SIZE: usize = 772;
const GPL_HEADER: &str = "GIMP Palette";

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Colour {0} does not exist in palette")]
    UnknownColor(Color),
    #[error("Palette overflow: maximum 256 colors supported, attempted to add color #{0}")]
    PaletteOverflow(usize),
    #[error("Invalid palette data: {0}")]
    InvalidPaletteData(String),
    #[error("Unsupported palette file type: {0:?}")]
    UnsupportedPaletteFormat(String),
    #[error("Failed to read palette file")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode reference image")]
    Image(#[from] image::ImageError),
}

/// An RGBA colour, compared channel by channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn with_transparency(self, transparent: Option<[u8; 3]>) -> Self {
        match transparent {
            Some(rgb) if self.rgb() == rgb => Self { a: 0x00, ..self },
            _ => self,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl From<[u8; 4]> for Color {
    fn from(rgba: [u8; 4]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2], rgba[3])
    }
}

/// Supported palette file layouts, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteFormat {
    /// Adobe Colour Table: 256 RGB triples, entry count and transparent index.
    Act,
    /// Pro Motion raw table: exactly 256 RGB triples.
    Pal,
    /// GIMP palette text file.
    Gpl,
    /// Any image the decoder understands; colours collected in pixel order.
    Image,
}

impl PaletteFormat {
    pub fn from_path(path: &Path) -> Result<Self, PaletteError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "act" => Ok(Self::Act),
            "pal" => Ok(Self::Pal),
            "gpl" => Ok(Self::Gpl),
            "png" | "gif" | "bmp" => Ok(Self::Image),
            _ => Err(PaletteError::UnsupportedPaletteFormat(extension)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TransparentEntry {
    index: u8,
    // Colour the entry held before its alpha was cleared
    original: Option<Color>,
}

/// Ordered set of unique colours; an entry's position is its index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Color>,
    lookup: HashMap<Color, u8>,
    transparent: Option<TransparentEntry>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_colors<I>(colors: I) -> Result<Self, PaletteError>
    where
        I: IntoIterator<Item = Color>,
    {
        let mut palette = Self::new();
        for color in colors {
            palette.lookup_or_insert(color, false)?;
        }
        Ok(palette)
    }

    /// Collects the unique colours of a reference image in row-major order.
    ///
    /// The transparent substitution is applied per pixel before deduplication.
    pub fn from_image(data: &[u8], transparent: Option<[u8; 3]>) -> Result<Self, PaletteError> {
        let image = image::load_from_memory(data)?.to_rgba8();
        let palette = Self::from_colors(
            image
                .pixels()
                .map(|pixel| Color::from(pixel.0).with_transparency(transparent)),
        )?;
        debug!(
            "Palette built from {}x{} reference image: {} colours",
            image.width(),
            image.height(),
            palette.len()
        );
        Ok(palette)
    }

    /// Parses palette file contents of the given layout.
    ///
    /// `transparent` only affects reference images, where it is substituted per
    /// pixel before deduplication. Colour tables are taken as written.
    pub fn from_file_bytes(
        format: PaletteFormat,
        data: &[u8],
        transparent: Option<[u8; 3]>,
    ) -> Result<Self, PaletteError> {
        match format {
            PaletteFormat::Act => Self::from_act(data),
            PaletteFormat::Pal => Self::from_pal(data),
            PaletteFormat::Gpl => Self::from_gpl(data),
            PaletteFormat::Image => Self::from_image(data, transparent),
        }
    }

    pub fn load<P: AsRef<Path>>(
        path: P,
        transparent: Option<[u8; 3]>,
    ) -> Result<Self, PaletteError> {
        let path = path.as_ref();
        let format = PaletteFormat::from_path(path)?;
        let data = fs::read(path)?;
        let palette = Self::from_file_bytes(format, &data, transparent)?;
        info!(
            "Loaded {} colour palette from {}",
            palette.len(),
            path.display()
        );
        Ok(palette)
    }

    fn from_act(data: &[u8]) -> Result<Self, PaletteError> {
        if data.len() < ACT_FILE_SIZE {
            return Err(PaletteError::InvalidPaletteData(format!(
                "Adobe .act must be at least {} bytes, got {}",
                ACT_FILE_SIZE,
                data.len()
            )));
        }

        let trailer = &data[data.len() - 4..];
        let count = u16::from_be_bytes([trailer[0], trailer[1]]) as usize;
        if count > MAX_PALETTE_SIZE {
            return Err(PaletteError::InvalidPaletteData(format!(
                "Adobe .act declares {} entries",
                count
            )));
        }

        Self::from_colors(
            data[..count * 3]
                .chunks_exact(3)
                .map(|rgb| Color::opaque(rgb[0], rgb[1], rgb[2])),
        )
    }

    fn from_pal(data: &[u8]) -> Result<Self, PaletteError> {
        if data.len() != ACT_TABLE_SIZE {
            return Err(PaletteError::InvalidPaletteData(format!(
                "Pro Motion .pal must be {} bytes, got {}",
                ACT_TABLE_SIZE,
                data.len()
            )));
        }

        Self::from_colors(
            data.chunks_exact(3)
                .map(|rgb| Color::opaque(rgb[0], rgb[1], rgb[2])),
        )
    }

    fn from_gpl(data: &[u8]) -> Result<Self, PaletteError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| PaletteError::InvalidPaletteData(e.to_string()))?;
        let mut lines = text.lines();

        if lines.next().map(str::trim) != Some(GPL_HEADER) {
            return Err(PaletteError::InvalidPaletteData(
                "missing \"GIMP Palette\" header".to_string(),
            ));
        }

        let mut colors = Vec::new();
        for line in lines.map(str::trim) {
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with("Name:")
                || line.starts_with("Columns:")
            {
                continue;
            }

            let mut channels = line.split_whitespace().take(3).map(str::parse::<u8>);
            match (channels.next(), channels.next(), channels.next()) {
                (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) => colors.push(Color::opaque(r, g, b)),
                _ => {
                    return Err(PaletteError::InvalidPaletteData(format!(
                        "bad GIMP palette line: {:?}",
                        line
                    )))
                }
            }
        }

        Self::from_colors(colors)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Color] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.entries.get(index).copied()
    }

    /// Index of the entry rewritten by [`Palette::mark_transparent`], if any.
    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent.as_ref().map(|entry| entry.index)
    }

    pub fn index_of(&self, color: Color) -> Option<u8> {
        self.lookup.get(&color).copied()
    }

    /// Returns the index of `color`, appending it unless `strict` is set.
    ///
    /// # Errors
    /// - `PaletteError::UnknownColor` if the colour is absent in strict mode
    /// - `PaletteError::PaletteOverflow` if a 257th colour would be added
    pub fn lookup_or_insert(&mut self, color: Color, strict: bool) -> Result<u8, PaletteError> {
        if let Some(index) = self.index_of(color) {
            return Ok(index);
        }
        if strict {
            return Err(PaletteError::UnknownColor(color));
        }
        if self.entries.len() >= MAX_PALETTE_SIZE {
            return Err(PaletteError::PaletteOverflow(self.entries.len() + 1));
        }

        let index = self.entries.len() as u8;
        self.entries.push(color);
        self.lookup.insert(color, index);
        Ok(index)
    }

    /// Sets alpha to 0 on the first entry whose RGB matches, returning its index.
    ///
    /// Only one entry is the transparent surrogate at a time: marking another
    /// colour puts back the entry rewritten by the previous call.
    pub fn mark_transparent(&mut self, r: u8, g: u8, b: u8) -> Option<u8> {
        let transparent = Color::new(r, g, b, 0x00);
        let (index, original) = match self.index_of(transparent) {
            Some(index) => (index, None),
            None => {
                let position = self
                    .entries
                    .iter()
                    .position(|color| color.rgb() == [r, g, b])?;
                (position as u8, Some(self.entries[position]))
            }
        };

        match self.transparent {
            Some(previous) if previous.index == index => return Some(index),
            Some(previous) => self.restore(previous),
            None => {}
        }

        if original.is_some() {
            self.replace_entry(index, transparent);
        }
        self.transparent = Some(TransparentEntry { index, original });
        Some(index)
    }

    fn restore(&mut self, previous: TransparentEntry) {
        // The original colour may have been appended again since it was rewritten
        if let Some(original) = previous.original {
            if !self.lookup.contains_key(&original) {
                self.replace_entry(previous.index, original);
            }
        }
    }

    fn replace_entry(&mut self, index: u8, color: Color) {
        let old = std::mem::replace(&mut self.entries[index as usize], color);
        self.lookup.remove(&old);
        self.lookup.insert(color, index);
    }

    /// Bits needed per index: `max(1, ceil(log2(len)))`.
    pub fn bit_width(&self) -> u32 {
        bit_width_for(self.entries.len())
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|color| color.to_bytes()).collect()
    }

    pub fn deserialize(data: &[u8], count: usize) -> Result<Self, PaletteError> {
        if data.len() < count * 4 {
            return Err(PaletteError::InvalidPaletteData(format!(
                "expected {} palette bytes, got {}",
                count * 4,
                data.len()
            )));
        }

        let palette = Self::from_colors(
            data[..count * 4]
                .chunks_exact(4)
                .map(|rgba| Color::new(rgba[0], rgba[1], rgba[2], rgba[3])),
        )?;
        if palette.len() != count {
            return Err(PaletteError::InvalidPaletteData(
                "duplicate palette entries".to_string(),
            ));
        }
        Ok(palette)
    }
}

/// `max(1, ceil(log2(entries)))`, so an empty or single colour palette still uses one bit.
pub fn bit_width_for(entries: usize) -> u32 {
    if entries <= 2 {
        1
    } else {
        usize::BITS - (entries - 1).leading_zeros()
    }
}
