//! Layout and metric parameters for the conversion.
//!
//! Every value has a default matching the character set of the 48K Spectrum ROM, so an empty
//! configuration reproduces the stock font. Configurations can also be loaded from TOML:
//!
//! ```toml
//! [layout]
//! charset_offset = 0x3D00
//! char_count = 96
//!
//! [metrics]
//! units_per_em = 800
//! ascent = 700
//! descent = -100
//! ```

use crate::error::{FontError, Result};
use derive_setters::Setters;
use log::debug;
use serde::Deserialize;
use std::{fs, ops::Range, path::Path};

/// The tallest character cell accepted, so heights fit the `lowestRecPPEM` field of `head`.
pub const MAX_CHAR_HEIGHT: usize = 255;

/// Where the character set lives in the ROM image and how each character is laid out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Setters, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RomLayout {
    /// Byte offset of the first character.
    pub charset_offset: u64,
    /// Number of characters stored back to back.
    pub char_count: usize,
    /// Width of a character cell in pixels. Each row is stored in a single byte.
    pub char_width: usize,
    /// Height of a character cell in pixels (and bytes).
    pub char_height: usize,
    /// Code point of the first character.
    pub first_char: u32,
}
impl RomLayout {
    /// The number of bytes the character set occupies in the ROM.
    pub fn charset_len(&self) -> Result<usize> {
        self.char_count.checked_mul(self.char_height).ok_or_else(|| {
            FontError::Config(format!(
                "character set of {} characters of {} bytes does not fit in memory",
                self.char_count, self.char_height
            ))
        })
    }

    /// The code points covered by the character set, in storage order.
    pub fn code_points(&self) -> Range<u32> {
        self.first_char..self.first_char + self.char_count as u32
    }
}
impl Default for RomLayout {
    fn default() -> Self {
        RomLayout {
            charset_offset: 0x3D00,
            char_count: 96,
            char_width: 8,
            char_height: 8,
            first_char: 32,
        }
    }
}

/// Font-wide metrics, in design units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Setters, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascent: i16,
    /// Subtracted from every pixel row's y coordinate, so the bottom row starts at `-descent`.
    /// With the default of -100 the bottom row sits one pixel above the baseline.
    pub descent: i16,
    pub x_height: i16,
    pub cap_height: i16,
}
impl Default for FontMetrics {
    fn default() -> Self {
        FontMetrics {
            units_per_em: 800,
            ascent: 700,
            descent: -100,
            x_height: 500,
            cap_height: 700,
        }
    }
}

/// The strings stored in the font's naming table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Setters, Deserialize)]
#[setters(into)]
#[serde(default, deny_unknown_fields)]
pub struct FontNames {
    pub family: String,
    pub style: String,
    pub postscript: String,
    pub version: String,
    pub manufacturer: String,
    pub description: String,
}
impl FontNames {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.family, self.style)
    }

    pub fn unique_id(&self) -> String {
        format!("{};{}", self.version, self.postscript)
    }
}
impl Default for FontNames {
    fn default() -> Self {
        FontNames {
            family: "ZXSpectrum".to_string(),
            style: "Regular".to_string(),
            postscript: "ZXSpectrum-Regular".to_string(),
            version: "Version 1.000".to_string(),
            manufacturer: "Generated from ZX Spectrum ROM".to_string(),
            description: "ZX Spectrum 8x8 pixel font extracted from 48K ROM".to_string(),
        }
    }
}

/// Everything the pipeline needs to know besides the input and output paths.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Setters, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontConfig {
    pub layout: RomLayout,
    pub metrics: FontMetrics,
    pub names: FontNames,
}
impl FontConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from '{}'", path.display());
        let text = fs::read_to_string(path).map_err(FontError::io(path))?;
        Self::from_toml(&text)
    }

    /// Parses and validates a configuration from TOML source.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: FontConfig =
            toml::from_str(text).map_err(|e| FontError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The size of one bitmap pixel in design units.
    pub fn pixel_size(&self) -> i32 {
        self.metrics.units_per_em as i32 / self.layout.char_width as i32
    }

    /// Checks that the layout and metrics describe a font that can actually be encoded.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        let metrics = &self.metrics;

        if layout.char_count == 0 {
            return Err(FontError::Config("character count must not be zero".to_string()));
        }
        if layout.char_width == 0 || layout.char_width > 8 {
            return Err(FontError::Config(format!(
                "character width must be between 1 and 8 pixels, got {}",
                layout.char_width
            )));
        }
        if layout.char_height == 0 || layout.char_height > MAX_CHAR_HEIGHT {
            return Err(FontError::Config(format!(
                "character height must be between 1 and {MAX_CHAR_HEIGHT} pixels, got {}",
                layout.char_height
            )));
        }
        layout.charset_len()?;
        // glyph 0 is reserved for .notdef
        if layout.char_count >= u16::MAX as usize {
            return Err(FontError::Config(format!(
                "too many characters for one font: {}",
                layout.char_count
            )));
        }
        let last_char = layout.first_char as u64 + layout.char_count as u64 - 1;
        if last_char >= 0xFFFF {
            return Err(FontError::Config(format!(
                "code points {:#X}..={last_char:#X} leave the Basic Multilingual Plane",
                layout.first_char
            )));
        }
        if metrics.units_per_em < 16 || metrics.units_per_em > 16384 {
            return Err(FontError::Config(format!(
                "units per em must be between 16 and 16384, got {}",
                metrics.units_per_em
            )));
        }
        if metrics.units_per_em as usize % layout.char_width != 0 {
            return Err(FontError::Config(format!(
                "units per em ({}) must be a multiple of the character width ({})",
                metrics.units_per_em, layout.char_width
            )));
        }
        if metrics.ascent <= metrics.descent {
            return Err(FontError::Config(format!(
                "ascent ({}) must be above descent ({})",
                metrics.ascent, metrics.descent
            )));
        }
        Ok(())
    }
}
