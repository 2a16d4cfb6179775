//! Converts the 8x8 character set of a ZX Spectrum 48K ROM image into a monospaced outline font.
//!
//! Every lit pixel becomes a square of font units, merged into one rectangle per horizontal run,
//! and the resulting glyphs are written out as a TrueType or WOFF2 file.
//!
//! ```no_run
//! use std::path::Path;
//! use zxfont::{FontConfig, OutputFormat};
//!
//! let report = zxfont::run(
//!     Path::new("roms/48.rom"),
//!     Path::new("public/fonts/zx-spectrum.woff2"),
//!     &FontConfig::default(),
//!     OutputFormat::Woff2,
//! )?;
//! println!("{} bytes", report.bytes);
//! # Ok::<(), zxfont::FontError>(())
//! ```

mod error;
mod pipeline;

pub mod config;
pub mod font;
pub mod glyph;
pub mod raster;
pub mod rom;
pub mod sfnt;
pub mod woff2;

pub use crate::{
    config::{FontConfig, FontMetrics, FontNames, RomLayout},
    error::{FontError, Result},
    pipeline::{run, write_output, OutputFormat, Report},
};
