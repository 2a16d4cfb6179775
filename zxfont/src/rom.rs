//! Reads the character set out of a ROM image.

use crate::{
    config::RomLayout,
    error::{FontError, Result},
};
use log::{debug, info, warn};
use std::{
    fmt,
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
};

/// The pixels of a single character cell.
///
/// Each row is kept as the byte it was stored as in the ROM, with the most significant bit being
/// the leftmost pixel. Bits past the cell width are cleared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bitmap {
    width: usize,
    rows: Vec<u8>,
}
impl Bitmap {
    /// Creates a bitmap from one byte per row.
    pub fn from_rows(width: usize, rows: &[u8]) -> Self {
        let mask = (0xFF00u16 >> width.min(8)) as u8;
        Bitmap { width, rows: rows.iter().map(|x| x & mask).collect() }
    }

    /// Creates a bitmap from a grid of pixels, top row first.
    pub fn from_pixels(pixels: &[Vec<bool>]) -> Self {
        let width = pixels.iter().map(|x| x.len()).max().unwrap_or(0).min(8);
        let rows: Vec<u8> = pixels
            .iter()
            .map(|row| {
                row.iter()
                    .take(8)
                    .enumerate()
                    .fold(0u8, |acc, (col, &set)| acc | ((set as u8) << (7 - col)))
            })
            .collect();
        Bitmap::from_rows(width, &rows)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[u8] {
        &self.rows
    }

    /// Returns whether the pixel at the given column and row is set.
    pub fn get(&self, col: usize, row: usize) -> bool {
        col < self.width && (self.rows[row] & (0x80 >> col)) != 0
    }

    /// Expands the bitmap into a grid of pixels, top row first.
    pub fn pixels(&self) -> Vec<Vec<bool>> {
        (0..self.height())
            .map(|row| (0..self.width).map(|col| self.get(col, row)).collect())
            .collect()
    }

    /// The number of set pixels.
    pub fn ink(&self) -> u32 {
        self.rows.iter().map(|x| x.count_ones()).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|&x| x == 0)
    }
}
impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bitmap {}x{}:", self.width, self.height())?;
        for row in 0..self.height() {
            for col in 0..self.width {
                f.write_str(if self.get(col, row) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Slices an in-memory character set into bitmaps.
///
/// `data` should contain at least [`RomLayout::charset_len`] bytes; characters past the end of
/// the data are not returned.
pub fn decode_charset(data: &[u8], layout: &RomLayout) -> Vec<Bitmap> {
    data.chunks_exact(layout.char_height)
        .take(layout.char_count)
        .map(|rows| Bitmap::from_rows(layout.char_width, rows))
        .collect()
}

/// Reads the character set from the ROM image at `path`.
pub fn read_charset(path: &Path, layout: &RomLayout) -> Result<Vec<Bitmap>> {
    if !path.exists() {
        return Err(FontError::NotFound { path: path.to_path_buf() });
    }

    info!("Reading ROM charset from '{}'...", path.display());
    let expected = layout.charset_len()?;
    let mut data = Vec::with_capacity(expected);
    {
        let mut file = File::open(path).map_err(FontError::io(path))?;
        file.seek(SeekFrom::Start(layout.charset_offset))
            .map_err(FontError::io(path))?;
        file.take(expected as u64)
            .read_to_end(&mut data)
            .map_err(FontError::io(path))?;
    }
    if data.len() < expected {
        return Err(FontError::TruncatedInput {
            path: path.to_path_buf(),
            offset: layout.charset_offset,
            expected,
            actual: data.len(),
        });
    }

    let chars = decode_charset(&data, layout);
    debug!(
        "Decoded {} characters ({} set pixels)",
        chars.len(),
        chars.iter().map(Bitmap::ink).sum::<u32>()
    );
    if chars.iter().all(Bitmap::is_blank) {
        warn!("The character set at offset {:#06X} is completely blank.", layout.charset_offset);
    }
    Ok(chars)
}
