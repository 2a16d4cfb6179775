use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Errors produced while turning a ROM image into a font file.
#[derive(Debug, Error)]
pub enum FontError {
    /// The input ROM image does not exist.
    #[error("ROM file not found at {}", path.display())]
    NotFound { path: PathBuf },

    /// The input ROM image ends before the end of the character set.
    #[error(
        "ROM file {} is truncated: expected {expected} bytes at offset {offset:#06X}, found {actual}",
        path.display()
    )]
    TruncatedInput {
        path: PathBuf,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// An internal invariant was violated while assembling or encoding the font.
    #[error("could not build font: {0}")]
    Build(String),

    /// The layout or metrics configuration cannot describe a valid font.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading the input or writing the output failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
impl FontError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> FontError + '_ {
        move |source| FontError::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn encoding(table: &str) -> impl FnOnce(io::Error) -> FontError + '_ {
        move |e| FontError::Build(format!("failed to encode '{table}' table: {e}"))
    }
}

pub type Result<T, E = FontError> = std::result::Result<T, E>;
