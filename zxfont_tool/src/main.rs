use anyhow::*;
use clap::Parser;
use log::debug;
use std::{
    path::{Path, PathBuf},
    result::Result::Ok,
};
use zxfont::{FontConfig, OutputFormat};

/// Builds a web font from the character set of a ZX Spectrum 48K ROM image.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The ROM image to read the character set from.
    #[arg(long, default_value = "roms/48.rom")]
    rom: PathBuf,
    /// Where to write the font.
    #[arg(long, default_value = "public/fonts/zx-spectrum.woff2")]
    output: PathBuf,
    /// A TOML file overriding the ROM layout, metrics or font names.
    #[arg(long)]
    config: Option<PathBuf>,
    /// The output format [woff2, ttf]. Guessed from the output extension if not given.
    #[arg(long)]
    format: Option<OutputFormat>,
}

/// Formats a number with `,` between groups of three digits.
fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn load_config(path: Option<&Path>) -> Result<FontConfig> {
    match path {
        Some(path) => FontConfig::load(path)
            .with_context(|| format!("Could not load configuration from '{}'", path.display())),
        None => Ok(FontConfig::default()),
    }
}

fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let format = cli
        .format
        .or_else(|| OutputFormat::from_path(&cli.output))
        .unwrap_or_default();
    debug!("Output format: {format}");

    println!("Reading ROM charset from {}...", cli.rom.display());
    let report = zxfont::run(&cli.rom, &cli.output, &config, format)?;
    println!("Extracted {} characters", report.characters);
    debug!("Font contents: {}", report.stats);
    println!("Saved {} ({} bytes)", report.output.display(), thousands(report.bytes));
    Ok(())
}
fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match execute(cli) {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e:?}");
            std::process::exit(1);
        }
    }
}
