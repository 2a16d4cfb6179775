use crate::{
    error::{FontError, Result},
    font::Font,
    glyph::Glyph,
};
use byteorder::{BigEndian, WriteBytesExt};
use std::io;

const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

/// The largest `glyf` table that short `loca` offsets can address.
const SHORT_LOCA_LIMIT: usize = 0x1FFFE;

pub struct GlyfLoca {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    pub index_to_loc_format: i16,
}

/// Encodes one coordinate delta, returning its flag bits.
fn encode_delta(delta: i32, short: u8, same: u8, out: &mut Vec<u8>) -> io::Result<u8> {
    if delta == 0 {
        Ok(same)
    } else if delta.abs() <= 0xFF {
        out.push(delta.unsigned_abs() as u8);
        Ok(if delta > 0 { short | same } else { short })
    } else {
        out.write_i16::<BigEndian>(delta as i16)?;
        Ok(0)
    }
}

/// Encodes a simple glyph description. Empty glyphs are encoded as no data at all.
fn encode_glyph(glyph: &Glyph) -> io::Result<Vec<u8>> {
    let bbox = match glyph.bounds() {
        Some(bbox) => bbox,
        None => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    out.write_i16::<BigEndian>(glyph.contours().len() as i16)?;
    out.write_i16::<BigEndian>(bbox.x_min as i16)?;
    out.write_i16::<BigEndian>(bbox.y_min as i16)?;
    out.write_i16::<BigEndian>(bbox.x_max as i16)?;
    out.write_i16::<BigEndian>(bbox.y_max as i16)?;

    let mut end_point = 0;
    for contour in glyph.contours() {
        end_point += contour.points().len();
        out.write_u16::<BigEndian>((end_point - 1) as u16)?;
    }
    out.write_u16::<BigEndian>(0)?; // instructionLength

    let mut flags = Vec::new();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let (mut last_x, mut last_y) = (0, 0);
    for point in glyph.points() {
        let x_flags = encode_delta(point.x - last_x, X_SHORT, X_SAME_OR_POSITIVE, &mut xs)?;
        let y_flags = encode_delta(point.y - last_y, Y_SHORT, Y_SAME_OR_POSITIVE, &mut ys)?;
        flags.push(ON_CURVE | x_flags | y_flags);
        last_x = point.x;
        last_y = point.y;
    }
    out.extend_from_slice(&flags);
    out.extend_from_slice(&xs);
    out.extend_from_slice(&ys);
    Ok(out)
}

fn encode_tables(font: &Font) -> io::Result<GlyfLoca> {
    let mut glyf = Vec::new();
    let mut offsets = Vec::with_capacity(font.glyphs().len() + 1);
    for glyph in font.glyphs() {
        offsets.push(glyf.len());
        glyf.extend_from_slice(&encode_glyph(&glyph.glyph)?);
        glyf.resize(super::padded_len(glyf.len()), 0);
    }
    offsets.push(glyf.len());

    let mut loca = Vec::new();
    let index_to_loc_format = if glyf.len() <= SHORT_LOCA_LIMIT {
        for offset in offsets {
            loca.write_u16::<BigEndian>((offset / 2) as u16)?;
        }
        0
    } else {
        for offset in offsets {
            loca.write_u32::<BigEndian>(offset as u32)?;
        }
        1
    };
    Ok(GlyfLoca { glyf, loca, index_to_loc_format })
}

/// Encodes the `glyf` and `loca` tables.
pub fn encode(font: &Font) -> Result<GlyfLoca> {
    encode_tables(font).map_err(FontError::encoding("glyf"))
}
