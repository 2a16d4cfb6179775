use crate::{
    config::FontConfig,
    error::{FontError, Result},
    font::{build_font, Font, FontStats},
    rom::read_charset,
    sfnt, woff2,
};
use log::{debug, info};
use std::{
    ffi::OsStr,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// The container format of the output file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Brotli compressed WOFF2, for the web.
    #[default]
    Woff2,
    /// A plain TrueType file.
    Ttf,
}
impl OutputFormat {
    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(OsStr::to_str)?.parse().ok()
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Woff2 => "woff2",
            OutputFormat::Ttf => "ttf",
        }
    }

    /// Serializes a font in this format.
    pub fn encode(self, font: &Font) -> Result<Vec<u8>> {
        let tables = sfnt::compile(font)?;
        match self {
            OutputFormat::Woff2 => {
                info!("Compressing font...");
                woff2::encode(&tables)
            }
            OutputFormat::Ttf => Ok(sfnt::write_sfnt(&tables)),
        }
    }
}
impl FromStr for OutputFormat {
    type Err = FontError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "woff2" => Ok(OutputFormat::Woff2),
            "ttf" | "truetype" => Ok(OutputFormat::Ttf),
            _ => Err(FontError::Config(format!("unknown output format '{s}'"))),
        }
    }
}
impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What a successful run produced.
#[derive(Clone, Debug)]
pub struct Report {
    pub characters: usize,
    pub stats: FontStats,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub bytes: u64,
}

/// Writes `data` to `path`, creating parent directories as needed.
///
/// The data goes to a temporary file next to `path` first and is renamed into place, so `path`
/// is either left untouched or fully written.
pub fn write_output(path: &Path, data: &[u8]) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|x| !x.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(FontError::io(parent))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_else(|| OsStr::new("font")).to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    debug!("Writing {} bytes to '{}'", data.len(), tmp_path.display());

    if let Err(e) = fs::write(&tmp_path, data) {
        let _ = fs::remove_file(&tmp_path);
        return Err(FontError::Io { path: tmp_path, source: e });
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(FontError::Io { path: path.to_path_buf(), source: e });
    }

    let size = fs::metadata(path).map_err(FontError::io(path))?.len();
    Ok(size)
}

/// Runs the full conversion: reads the character set from `rom`, builds the font and writes it
/// to `output`.
///
/// Nothing is written unless the font was built and encoded successfully.
pub fn run(rom: &Path, output: &Path, config: &FontConfig, format: OutputFormat) -> Result<Report> {
    config.validate()?;

    let charset = read_charset(rom, &config.layout)?;
    let font = build_font(config, &charset)?;
    let data = format.encode(&font)?;

    info!("Writing {format} font to '{}'...", output.display());
    let bytes = write_output(output, &data)?;
    Ok(Report {
        characters: charset.len(),
        stats: font.stats(),
        output: output.to_path_buf(),
        format,
        bytes,
    })
}
