//! The fixed-layout metric and metadata tables.

use crate::{
    config::FontNames,
    error::{FontError, Result},
    font::{Font, NOTDEF},
};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

/// Seconds between the `LONGDATETIME` epoch (1904-01-01) and the Unix epoch.
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Number of glyph names predefined by `post` table formats 1 and 2.
const STANDARD_GLYPH_NAMES: u16 = 258;

/// Baseline at y = 0, left sidebearing point at x = 0.
const HEAD_FLAGS: u16 = 0x0003;
const FS_SELECTION_REGULAR: u16 = 0x0040;

fn write_fixed(out: &mut Vec<u8>, major: u16, minor: u16) -> io::Result<()> {
    out.write_u16::<BigEndian>(major)?;
    out.write_u16::<BigEndian>(minor)
}

/// Scales a value given for a 1000 unit em to the font's units per em.
fn scale(font: &Font, value: i32) -> i16 {
    (value * font.metrics.units_per_em as i32 / 1000) as i16
}

pub fn head(font: &Font, index_to_loc_format: i16) -> Result<Vec<u8>> {
    let encode = || -> io::Result<Vec<u8>> {
        let bbox = font.bounds();
        let timestamp = font.timestamp as i64 + MAC_EPOCH_OFFSET;

        let mut out = Vec::with_capacity(54);
        write_fixed(&mut out, 1, 0)?; // version
        write_fixed(&mut out, 1, 0)?; // fontRevision
        out.write_u32::<BigEndian>(0)?; // checkSumAdjustment, filled in later
        out.write_u32::<BigEndian>(0x5F0F3CF5)?;
        out.write_u16::<BigEndian>(HEAD_FLAGS)?;
        out.write_u16::<BigEndian>(font.metrics.units_per_em)?;
        out.write_i64::<BigEndian>(timestamp)?; // created
        out.write_i64::<BigEndian>(timestamp)?; // modified
        out.write_i16::<BigEndian>(bbox.map_or(0, |x| x.x_min as i16))?;
        out.write_i16::<BigEndian>(bbox.map_or(0, |x| x.y_min as i16))?;
        out.write_i16::<BigEndian>(bbox.map_or(0, |x| x.x_max as i16))?;
        out.write_i16::<BigEndian>(bbox.map_or(0, |x| x.y_max as i16))?;
        out.write_u16::<BigEndian>(0)?; // macStyle
        out.write_u16::<BigEndian>(font.lowest_rec_ppem)?;
        out.write_i16::<BigEndian>(2)?; // fontDirectionHint
        out.write_i16::<BigEndian>(index_to_loc_format)?;
        out.write_i16::<BigEndian>(0)?; // glyphDataFormat
        Ok(out)
    };
    encode().map_err(FontError::encoding("head"))
}

/// The number of full metric records after dropping trailing repeats of the last advance.
fn number_of_h_metrics(font: &Font) -> usize {
    let glyphs = font.glyphs();
    let mut count = glyphs.len();
    while count > 1 && glyphs[count - 1].advance == glyphs[count - 2].advance {
        count -= 1;
    }
    count
}

pub fn hhea(font: &Font) -> Result<Vec<u8>> {
    let encode = || -> io::Result<Vec<u8>> {
        let mut advance_max = 0u16;
        let mut min_lsb = i16::MAX;
        let mut min_rsb = i16::MAX;
        let mut max_extent = i16::MIN;
        for glyph in font.glyphs() {
            advance_max = advance_max.max(glyph.advance);
            if let Some(bbox) = glyph.glyph.bounds() {
                let width = (bbox.x_max - bbox.x_min) as i16;
                min_lsb = min_lsb.min(glyph.lsb);
                min_rsb = min_rsb.min(glyph.advance as i16 - glyph.lsb - width);
                max_extent = max_extent.max(glyph.lsb + width);
            }
        }
        if max_extent == i16::MIN {
            // no outlines at all
            min_lsb = 0;
            min_rsb = 0;
            max_extent = 0;
        }

        let mut out = Vec::with_capacity(36);
        write_fixed(&mut out, 1, 0)?;
        out.write_i16::<BigEndian>(font.metrics.ascent)?;
        out.write_i16::<BigEndian>(font.metrics.descent)?;
        out.write_i16::<BigEndian>(0)?; // lineGap
        out.write_u16::<BigEndian>(advance_max)?;
        out.write_i16::<BigEndian>(min_lsb)?;
        out.write_i16::<BigEndian>(min_rsb)?;
        out.write_i16::<BigEndian>(max_extent)?;
        out.write_i16::<BigEndian>(1)?; // caretSlopeRise
        out.write_i16::<BigEndian>(0)?; // caretSlopeRun
        out.write_i16::<BigEndian>(0)?; // caretOffset
        for _ in 0..4 {
            out.write_i16::<BigEndian>(0)?;
        }
        out.write_i16::<BigEndian>(0)?; // metricDataFormat
        out.write_u16::<BigEndian>(number_of_h_metrics(font) as u16)?;
        Ok(out)
    };
    encode().map_err(FontError::encoding("hhea"))
}

pub fn hmtx(font: &Font) -> Result<Vec<u8>> {
    let encode = || -> io::Result<Vec<u8>> {
        let full = number_of_h_metrics(font);
        let mut out = Vec::new();
        for (i, glyph) in font.glyphs().iter().enumerate() {
            if i < full {
                out.write_u16::<BigEndian>(glyph.advance)?;
            }
            out.write_i16::<BigEndian>(glyph.lsb)?;
        }
        Ok(out)
    };
    encode().map_err(FontError::encoding("hmtx"))
}

pub fn maxp(font: &Font) -> Result<Vec<u8>> {
    let encode = || -> io::Result<Vec<u8>> {
        let glyphs = font.glyphs();
        let max_points = glyphs.iter().map(|x| x.glyph.point_count()).max().unwrap_or(0);
        let max_contours = glyphs.iter().map(|x| x.glyph.contours().len()).max().unwrap_or(0);

        let mut out = Vec::with_capacity(32);
        write_fixed(&mut out, 1, 0)?;
        out.write_u16::<BigEndian>(glyphs.len() as u16)?;
        out.write_u16::<BigEndian>(max_points as u16)?;
        out.write_u16::<BigEndian>(max_contours as u16)?;
        out.write_u16::<BigEndian>(0)?; // maxCompositePoints
        out.write_u16::<BigEndian>(0)?; // maxCompositeContours
        out.write_u16::<BigEndian>(2)?; // maxZones
        // twilight points, storage, function defs, instruction defs, stack elements,
        // size of instructions, component elements, component depth
        for _ in 0..8 {
            out.write_u16::<BigEndian>(0)?;
        }
        Ok(out)
    };
    encode().map_err(FontError::encoding("maxp"))
}

/// Name ids, in the order they are written.
fn name_records(names: &FontNames) -> Vec<(u16, String)> {
    vec![
        (1, names.family.clone()),
        (2, names.style.clone()),
        (3, names.unique_id()),
        (4, names.full_name()),
        (5, names.version.clone()),
        (6, names.postscript.clone()),
        (8, names.manufacturer.clone()),
        (10, names.description.clone()),
    ]
}

/// Encodes a string for the Macintosh Roman encoding, replacing anything outside ASCII.
fn mac_roman(text: &str) -> Vec<u8> {
    text.chars().map(|x| if x.is_ascii() { x as u8 } else { b'?' }).collect()
}

fn utf16_be(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|x| x.to_be_bytes()).collect()
}

pub fn name(names: &FontNames) -> Result<Vec<u8>> {
    let encode = || -> io::Result<Vec<u8>> {
        let records = name_records(names);

        // (platform, encoding, language, name id, data), sorted as the table requires
        let mut entries = Vec::new();
        for (id, text) in &records {
            entries.push((1u16, 0u16, 0u16, *id, mac_roman(text)));
        }
        for (id, text) in &records {
            entries.push((3, 1, 0x409, *id, utf16_be(text)));
        }

        let count = entries.len() as u16;
        let mut out = Vec::new();
        out.write_u16::<BigEndian>(0)?; // format
        out.write_u16::<BigEndian>(count)?;
        out.write_u16::<BigEndian>(6 + 12 * count)?;
        let mut storage = Vec::new();
        for (platform, encoding, language, id, data) in &entries {
            out.write_u16::<BigEndian>(*platform)?;
            out.write_u16::<BigEndian>(*encoding)?;
            out.write_u16::<BigEndian>(*language)?;
            out.write_u16::<BigEndian>(*id)?;
            out.write_u16::<BigEndian>(data.len() as u16)?;
            out.write_u16::<BigEndian>(storage.len() as u16)?;
            storage.extend_from_slice(data);
        }
        out.write_all(&storage)?;
        Ok(out)
    };
    encode().map_err(FontError::encoding("name"))
}

pub fn os2(font: &Font) -> Result<Vec<u8>> {
    let encode = || -> io::Result<Vec<u8>> {
        let metrics = &font.metrics;
        let glyphs = font.glyphs();
        let advances: Vec<u32> = glyphs
            .iter()
            .map(|x| x.advance as u32)
            .filter(|&x| x != 0)
            .collect();
        let avg_width = if advances.is_empty() {
            0
        } else {
            advances.iter().sum::<u32>() / advances.len() as u32
        };
        let first_char = font.char_map().keys().next().copied().unwrap_or(0);
        let last_char = font.char_map().keys().next_back().copied().unwrap_or(0);
        let win_ascent = font.bounds().map_or(0, |x| x.y_max).max(metrics.ascent as i32);
        let win_descent = font.bounds().map_or(0, |x| -x.y_min).max(-metrics.descent as i32);

        let mut out = Vec::with_capacity(96);
        out.write_u16::<BigEndian>(4)?; // version
        out.write_i16::<BigEndian>(avg_width as i16)?;
        out.write_u16::<BigEndian>(400)?; // usWeightClass
        out.write_u16::<BigEndian>(5)?; // usWidthClass
        out.write_u16::<BigEndian>(0)?; // fsType: installable embedding
        out.write_i16::<BigEndian>(scale(font, 650))?; // ySubscriptXSize
        out.write_i16::<BigEndian>(scale(font, 600))?; // ySubscriptYSize
        out.write_i16::<BigEndian>(0)?; // ySubscriptXOffset
        out.write_i16::<BigEndian>(scale(font, 75))?; // ySubscriptYOffset
        out.write_i16::<BigEndian>(scale(font, 650))?; // ySuperscriptXSize
        out.write_i16::<BigEndian>(scale(font, 600))?; // ySuperscriptYSize
        out.write_i16::<BigEndian>(0)?; // ySuperscriptXOffset
        out.write_i16::<BigEndian>(scale(font, 350))?; // ySuperscriptYOffset
        out.write_i16::<BigEndian>(scale(font, 50))?; // yStrikeoutSize
        out.write_i16::<BigEndian>(scale(font, 300))?; // yStrikeoutPosition
        out.write_i16::<BigEndian>(0)?; // sFamilyClass
        out.write_all(&[0; 10])?; // panose
        out.write_u32::<BigEndian>(1)?; // ulUnicodeRange1: Basic Latin
        out.write_u32::<BigEndian>(0)?;
        out.write_u32::<BigEndian>(0)?;
        out.write_u32::<BigEndian>(0)?;
        out.write_all(b"NONE")?; // achVendID
        out.write_u16::<BigEndian>(FS_SELECTION_REGULAR)?;
        out.write_u16::<BigEndian>(first_char.min(0xFFFF) as u16)?;
        out.write_u16::<BigEndian>(last_char.min(0xFFFF) as u16)?;
        out.write_i16::<BigEndian>(metrics.ascent)?; // sTypoAscender
        out.write_i16::<BigEndian>(metrics.descent)?; // sTypoDescender
        out.write_i16::<BigEndian>(0)?; // sTypoLineGap
        out.write_u16::<BigEndian>(win_ascent as u16)?;
        out.write_u16::<BigEndian>(win_descent as u16)?;
        out.write_u32::<BigEndian>(1)?; // ulCodePageRange1: Latin 1
        out.write_u32::<BigEndian>(0)?;
        out.write_i16::<BigEndian>(metrics.x_height)?;
        out.write_i16::<BigEndian>(metrics.cap_height)?;
        out.write_u16::<BigEndian>(0)?; // usDefaultChar
        out.write_u16::<BigEndian>(0x20)?; // usBreakChar
        out.write_u16::<BigEndian>(0)?; // usMaxContext
        Ok(out)
    };
    encode().map_err(FontError::encoding("OS/2"))
}

/// Encodes a format 2.0 `post` table, which carries the glyph names.
pub fn post(font: &Font) -> Result<Vec<u8>> {
    let encode = || -> io::Result<Vec<u8>> {
        let upem = font.metrics.units_per_em as i32;

        let mut out = Vec::new();
        write_fixed(&mut out, 2, 0)?;
        write_fixed(&mut out, 0, 0)?; // italicAngle
        out.write_i16::<BigEndian>((-upem / 10) as i16)?; // underlinePosition
        out.write_i16::<BigEndian>((upem / 16) as i16)?; // underlineThickness
        out.write_u32::<BigEndian>(1)?; // isFixedPitch
        for _ in 0..4 {
            out.write_u32::<BigEndian>(0)?; // memory usage hints
        }

        let glyphs = font.glyphs();
        out.write_u16::<BigEndian>(glyphs.len() as u16)?;
        let mut custom = Vec::new();
        for glyph in glyphs {
            if glyph.name == NOTDEF {
                out.write_u16::<BigEndian>(0)?;
            } else {
                out.write_u16::<BigEndian>(STANDARD_GLYPH_NAMES + custom.len() as u16)?;
                custom.push(glyph.name.as_bytes());
            }
        }
        for name in custom {
            out.write_u8(name.len() as u8)?;
            out.write_all(name)?;
        }
        Ok(out)
    };
    encode().map_err(FontError::encoding("post"))
}
