use super::search_params;
use crate::error::{FontError, Result};
use byteorder::{BigEndian, WriteBytesExt};
use std::io;

/// A run of consecutive code points mapped to consecutive glyph ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Segment {
    start: u16,
    end: u16,
    id_delta: u16,
}

fn segments(mapping: &[(u32, u16)]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for &(ch, id) in mapping {
        let ch = ch as u16;
        let id_delta = id.wrapping_sub(ch);
        match segments.last_mut() {
            Some(last) if last.end.wrapping_add(1) == ch && last.id_delta == id_delta => {
                last.end = ch;
            }
            _ => segments.push(Segment { start: ch, end: ch, id_delta }),
        }
    }
    // required terminator
    segments.push(Segment { start: 0xFFFF, end: 0xFFFF, id_delta: 1 });
    segments
}

fn encode_format4(mapping: &[(u32, u16)]) -> io::Result<Vec<u8>> {
    let segments = segments(mapping);
    let seg_count = segments.len() as u16;
    let (search_range, entry_selector, range_shift) = search_params(seg_count, 2);

    let mut out = Vec::new();
    out.write_u16::<BigEndian>(4)?;
    out.write_u16::<BigEndian>(16 + 8 * seg_count)?;
    out.write_u16::<BigEndian>(0)?; // language
    out.write_u16::<BigEndian>(seg_count * 2)?;
    out.write_u16::<BigEndian>(search_range)?;
    out.write_u16::<BigEndian>(entry_selector)?;
    out.write_u16::<BigEndian>(range_shift)?;
    for segment in &segments {
        out.write_u16::<BigEndian>(segment.end)?;
    }
    out.write_u16::<BigEndian>(0)?; // reservedPad
    for segment in &segments {
        out.write_u16::<BigEndian>(segment.start)?;
    }
    for segment in &segments {
        out.write_u16::<BigEndian>(segment.id_delta)?;
    }
    for _ in &segments {
        out.write_u16::<BigEndian>(0)?; // idRangeOffset
    }
    Ok(out)
}

/// Encodes a `cmap` table with one format 4 subtable, shared by the Unicode BMP and Windows
/// Unicode BMP encoding records.
///
/// `mapping` must be sorted by code point and stay below U+FFFF.
pub fn encode(mapping: &[(u32, u16)]) -> Result<Vec<u8>> {
    if let Some(&(ch, _)) = mapping.iter().find(|x| x.0 >= 0xFFFF) {
        return Err(FontError::Build(format!("code point {ch:#X} cannot be stored in cmap format 4")));
    }
    if mapping.windows(2).any(|x| x[0].0 >= x[1].0) {
        return Err(FontError::Build("cmap entries are not sorted".to_string()));
    }

    encode_table(mapping).map_err(FontError::encoding("cmap"))
}

fn encode_table(mapping: &[(u32, u16)]) -> io::Result<Vec<u8>> {
    let subtable = encode_format4(mapping)?;
    let mut out = Vec::with_capacity(20 + subtable.len());
    out.write_u16::<BigEndian>(0)?; // version
    out.write_u16::<BigEndian>(2)?;
    for (platform, encoding) in [(0u16, 3u16), (3, 1)] {
        out.write_u16::<BigEndian>(platform)?;
        out.write_u16::<BigEndian>(encoding)?;
        out.write_u32::<BigEndian>(20)?;
    }
    out.extend_from_slice(&subtable);
    Ok(out)
}
