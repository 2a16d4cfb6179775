//! WOFF2 container encoding.
//!
//! Every table is stored untransformed (`glyf` and `loca` use the null transform) and the table
//! data is compressed as one Brotli stream.

use crate::{
    error::{FontError, Result},
    sfnt::{padded_len, Table, Tag},
};
use byteorder::{BigEndian, WriteBytesExt};
use log::debug;
use std::io::{self, Write};

const SIGNATURE: u32 = 0x774F4632; // 'wOF2'
const HEADER_LEN: usize = 48;

const BROTLI_QUALITY: u32 = 11;
const BROTLI_WINDOW: u32 = 22;
const BROTLI_BUFFER: usize = 4096;

/// Table tags with a predefined index in the table directory flags byte.
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];
const ARBITRARY_TAG: u8 = 0x3F;

/// Transform version 3 is the null transform for `glyf` and `loca`; 0 is for everything else.
const NULL_TRANSFORM_GLYF: u8 = 3 << 6;

/// Writes a `UIntBase128`: big-endian groups of 7 bits, high bit set on all but the last.
pub fn write_base128(out: &mut Vec<u8>, value: u32) {
    let mut started = false;
    for shift in (0..5).rev() {
        let group = ((value >> (shift * 7)) & 0x7F) as u8;
        if group != 0 || started || shift == 0 {
            started = true;
            out.push(if shift == 0 { group } else { group | 0x80 });
        }
    }
}

fn directory_flags(tag: Tag) -> u8 {
    let index = KNOWN_TAGS
        .iter()
        .position(|x| **x == tag.0)
        .map_or(ARBITRARY_TAG, |x| x as u8);
    if tag == Tag::GLYF || tag == Tag::LOCA {
        index | NULL_TRANSFORM_GLYF
    } else {
        index
    }
}

fn write_directory(out: &mut Vec<u8>, tables: &[Table]) -> io::Result<()> {
    for table in tables {
        let flags = directory_flags(table.tag);
        out.write_u8(flags)?;
        if flags & 0x3F == ARBITRARY_TAG {
            out.write_u32::<BigEndian>(table.tag.to_u32())?;
        }
        write_base128(out, table.data.len() as u32);
    }
    Ok(())
}

fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut writer =
        brotli::CompressorWriter::new(Vec::new(), BROTLI_BUFFER, BROTLI_QUALITY, BROTLI_WINDOW);
    writer.write_all(data)?;
    writer.flush()?;
    Ok(writer.into_inner())
}

fn encode_tables(tables: &[Table]) -> io::Result<Vec<u8>> {
    let mut stream = Vec::new();
    for table in tables {
        stream.extend_from_slice(&table.data);
    }
    let compressed = compress(&stream)?;
    debug!("Compressed {} bytes of table data to {} bytes", stream.len(), compressed.len());

    let mut directory = Vec::new();
    write_directory(&mut directory, tables)?;

    let sfnt_size =
        12 + 16 * tables.len() + tables.iter().map(|x| padded_len(x.data.len())).sum::<usize>();
    let total_len = padded_len(HEADER_LEN + directory.len() + compressed.len());

    let mut out = Vec::with_capacity(total_len);
    out.write_u32::<BigEndian>(SIGNATURE)?;
    out.write_u32::<BigEndian>(0x00010000)?; // flavor: TrueType outlines
    out.write_u32::<BigEndian>(total_len as u32)?;
    out.write_u16::<BigEndian>(tables.len() as u16)?;
    out.write_u16::<BigEndian>(0)?; // reserved
    out.write_u32::<BigEndian>(sfnt_size as u32)?;
    out.write_u32::<BigEndian>(compressed.len() as u32)?;
    out.write_u16::<BigEndian>(1)?; // majorVersion
    out.write_u16::<BigEndian>(0)?; // minorVersion
    for _ in 0..5 {
        out.write_u32::<BigEndian>(0)?; // no metadata or private data
    }
    out.write_all(&directory)?;
    out.write_all(&compressed)?;
    out.resize(total_len, 0);
    Ok(out)
}

/// Packs a table set, as produced by [`crate::sfnt::compile`], into a WOFF2 file.
pub fn encode(tables: &[Table]) -> Result<Vec<u8>> {
    if tables.iter().any(|x| x.tag == Tag::LOCA) != tables.iter().any(|x| x.tag == Tag::GLYF) {
        return Err(FontError::Build("'glyf' and 'loca' must be stored together".to_string()));
    }
    encode_tables(tables).map_err(|e| FontError::Build(format!("failed to encode WOFF2: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base128(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        write_base128(&mut out, value);
        out
    }

    #[test]
    fn base128_encoding() {
        assert_eq!(base128(0), vec![0x00]);
        assert_eq!(base128(0x7F), vec![0x7F]);
        assert_eq!(base128(0x80), vec![0x81, 0x00]);
        assert_eq!(base128(63), vec![63]);
        assert_eq!(base128(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(base128(u32::MAX), vec![0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn known_tags_use_indices() {
        assert_eq!(directory_flags(Tag::CMAP), 0);
        assert_eq!(directory_flags(Tag::POST), 7);
        assert_eq!(directory_flags(Tag::GLYF), 0xCA);
        assert_eq!(directory_flags(Tag::LOCA), 0xCB);
        assert_eq!(directory_flags(Tag(*b"abcd")), ARBITRARY_TAG);
    }

    #[test]
    fn arbitrary_tags_are_spelled_out() {
        let mut out = Vec::new();
        write_directory(&mut out, &[Table::new(Tag(*b"abcd"), vec![0; 200])]).unwrap();
        assert_eq!(out, vec![0x3F, b'a', b'b', b'c', b'd', 0x81, 0x48]);
    }

    #[test]
    fn header_describes_file() {
        let tables = vec![
            Table::new(Tag::CMAP, vec![1; 10]),
            Table::new(Tag::HEAD, vec![2; 54]),
        ];
        let data = encode(&tables).unwrap();
        assert_eq!(&data[0..4], b"wOF2");
        assert_eq!(u32::from_be_bytes(data[8..12].try_into().unwrap()) as usize, data.len());
        assert_eq!(data.len() % 4, 0);
        assert_eq!(u16::from_be_bytes([data[12], data[13]]), 2);
        // 12 + 2 * 16 + 12 + 56
        assert_eq!(u32::from_be_bytes(data[16..20].try_into().unwrap()), 112);
        assert_eq!(&data[48..52], &[0, 10, 1, 54]);
    }

    #[test]
    fn glyf_without_loca_is_rejected() {
        assert!(encode(&[Table::new(Tag::GLYF, vec![])]).is_err());
    }
}
