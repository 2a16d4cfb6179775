//! TrueType (`sfnt`) serialization.
//!
//! [`compile`] turns an assembled [`Font`] into its table set, and [`write_sfnt`] lays a table set
//! out as a TrueType file. The WOFF2 encoder reuses the same tables.

use crate::{error::Result, font::Font};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::debug;
use std::fmt;

mod cmap;
mod glyf;
mod tables;

/// Offset of `checkSumAdjustment` in the `head` table.
const HEAD_CHECKSUM_OFFSET: usize = 8;
const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;
const SFNT_VERSION_TRUETYPE: u32 = 0x00010000;

/// A four byte table tag.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub [u8; 4]);
impl Tag {
    pub const CMAP: Tag = Tag(*b"cmap");
    pub const GLYF: Tag = Tag(*b"glyf");
    pub const HEAD: Tag = Tag(*b"head");
    pub const HHEA: Tag = Tag(*b"hhea");
    pub const HMTX: Tag = Tag(*b"hmtx");
    pub const LOCA: Tag = Tag(*b"loca");
    pub const MAXP: Tag = Tag(*b"maxp");
    pub const NAME: Tag = Tag(*b"name");
    pub const OS2: Tag = Tag(*b"OS/2");
    pub const POST: Tag = Tag(*b"post");

    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}
impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", String::from_utf8_lossy(&self.0))
    }
}
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// The encoded contents of one font table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    pub tag: Tag,
    pub data: Vec<u8>,
}
impl Table {
    pub fn new(tag: Tag, data: Vec<u8>) -> Self {
        Table { tag, data }
    }

    /// The checksum recorded in the table directory. For `head`, this is computed as if
    /// `checkSumAdjustment` were zero.
    pub fn checksum(&self) -> u32 {
        let sum = checksum(&self.data);
        match self.data.get(HEAD_CHECKSUM_OFFSET..HEAD_CHECKSUM_OFFSET + 4) {
            Some(adjustment) if self.tag == Tag::HEAD => {
                sum.wrapping_sub(BigEndian::read_u32(adjustment))
            }
            _ => sum,
        }
    }
}

/// Sums a byte string as big-endian `u32` words, zero padding the final word.
pub fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    let mut chunks = data.chunks_exact(4);
    for word in &mut chunks {
        sum = sum.wrapping_add(BigEndian::read_u32(word));
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut last = [0; 4];
        last[..rest.len()].copy_from_slice(rest);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}

pub(crate) fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Encodes every table of the font, sorted by tag, with the `head` checksum adjustment filled in.
pub fn compile(font: &Font) -> Result<Vec<Table>> {
    let glyf = glyf::encode(font)?;

    let mut tables = vec![
        Table::new(Tag::CMAP, cmap::encode(&font.char_to_glyph_id())?),
        Table::new(Tag::HEAD, tables::head(font, glyf.index_to_loc_format)?),
        Table::new(Tag::HHEA, tables::hhea(font)?),
        Table::new(Tag::HMTX, tables::hmtx(font)?),
        Table::new(Tag::MAXP, tables::maxp(font)?),
        Table::new(Tag::NAME, tables::name(&font.names)?),
        Table::new(Tag::OS2, tables::os2(font)?),
        Table::new(Tag::POST, tables::post(font)?),
        Table::new(Tag::GLYF, glyf.glyf),
        Table::new(Tag::LOCA, glyf.loca),
    ];
    tables.sort_by_key(|x| x.tag);
    for table in &tables {
        debug!("{} table: {} bytes", table.tag, table.data.len());
    }

    let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(&write_sfnt(&tables)));
    if let Some(head) = tables.iter_mut().find(|x| x.tag == Tag::HEAD) {
        BigEndian::write_u32(&mut head.data[HEAD_CHECKSUM_OFFSET..], adjustment);
    }
    Ok(tables)
}

/// The sfnt header fields used for binary searching `count` records of `size` bytes.
pub(crate) fn search_params(count: u16, size: u16) -> (u16, u16, u16) {
    let mut entry_selector = 0;
    while (2u32 << entry_selector) <= count as u32 {
        entry_selector += 1;
    }
    let search_range = (1u16 << entry_selector) * size;
    let range_shift = count * size - search_range;
    (search_range, entry_selector, range_shift)
}

/// Lays out a table set as a TrueType font file.
///
/// Tables are written in the order given, each aligned to four bytes.
pub fn write_sfnt(tables: &[Table]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let (search_range, entry_selector, range_shift) = search_params(num_tables, 16);

    let header_len = 12 + 16 * tables.len();
    let total_len = header_len + tables.iter().map(|x| padded_len(x.data.len())).sum::<usize>();
    let mut out = Vec::with_capacity(total_len);

    // writes into a `Vec` cannot fail
    let _ = write_header(&mut out, num_tables, search_range, entry_selector, range_shift);
    let mut offset = header_len;
    for table in tables {
        let _ = write_record(&mut out, table, offset as u32);
        offset += padded_len(table.data.len());
    }
    for table in tables {
        out.extend_from_slice(&table.data);
        out.resize(padded_len(out.len()), 0);
    }
    out
}

fn write_header(
    out: &mut Vec<u8>,
    num_tables: u16,
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
) -> std::io::Result<()> {
    out.write_u32::<BigEndian>(SFNT_VERSION_TRUETYPE)?;
    out.write_u16::<BigEndian>(num_tables)?;
    out.write_u16::<BigEndian>(search_range)?;
    out.write_u16::<BigEndian>(entry_selector)?;
    out.write_u16::<BigEndian>(range_shift)?;
    Ok(())
}

fn write_record(out: &mut Vec<u8>, table: &Table, offset: u32) -> std::io::Result<()> {
    out.write_u32::<BigEndian>(table.tag.to_u32())?;
    out.write_u32::<BigEndian>(table.checksum())?;
    out.write_u32::<BigEndian>(offset)?;
    out.write_u32::<BigEndian>(table.data.len() as u32)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_pads_last_word() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0, 0, 0, 1, 0, 0, 0, 2]), 3);
        assert_eq!(checksum(&[1, 2]), 0x0102_0000);
        assert_eq!(checksum(&[0xFF; 8]), 0xFFFF_FFFE);
    }

    #[test]
    fn search_params_match_table_counts() {
        assert_eq!(search_params(1, 16), (16, 0, 0));
        assert_eq!(search_params(10, 16), (128, 3, 32));
        assert_eq!(search_params(16, 16), (256, 4, 0));
        assert_eq!(search_params(2, 2), (4, 1, 0));
    }

    #[test]
    fn tables_are_aligned_and_recorded() {
        let tables = vec![
            Table::new(Tag(*b"aaaa"), vec![1, 2, 3]),
            Table::new(Tag(*b"bbbb"), vec![4, 5, 6, 7, 8]),
        ];
        let data = write_sfnt(&tables);
        assert_eq!(data.len(), 12 + 32 + 4 + 8);
        assert_eq!(&data[0..4], &[0, 1, 0, 0]);
        assert_eq!(BigEndian::read_u16(&data[4..]), 2);

        // second record
        assert_eq!(&data[28..32], b"bbbb");
        assert_eq!(BigEndian::read_u32(&data[36..]), 48);
        assert_eq!(BigEndian::read_u32(&data[40..]), 5);
        assert_eq!(&data[44..48], &[1, 2, 3, 0]);
        assert_eq!(&data[48..53], &[4, 5, 6, 7, 8]);
    }

    #[test]
    fn head_checksum_ignores_adjustment() {
        let mut data = vec![0; 54];
        data[0] = 1;
        let plain = Table::new(Tag::HEAD, data.clone()).checksum();
        data[8..12].copy_from_slice(&[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(Table::new(Tag::HEAD, data.clone()).checksum(), plain);
        assert_eq!(Table::new(Tag(*b"abcd"), data).checksum(), plain.wrapping_add(0x12345678));
    }
}
