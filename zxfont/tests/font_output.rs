use std::{fs, io::Read, path::Path};
use ttf_parser::{Face, GlyphId, OutlineBuilder};
use zxfont::{
    font::{build_font, glyph_name, Font, NOTDEF},
    raster::PixelGrid,
    rom::{read_charset, Bitmap},
    sfnt::{self, Table},
    woff2, FontConfig, FontError, OutputFormat,
};

/// A 16K image with a deterministic, fairly busy character set. Character 0 (the space) is blank.
fn synthetic_rom() -> Vec<u8> {
    let mut rom = vec![0xAA; 0x4000];
    let mut state = 0x1234_5678u32;
    for (i, byte) in rom[0x3D00..0x4000].iter_mut().enumerate() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *byte = if i < 8 { 0 } else { state as u8 };
    }
    // a full solid row and a single pixel, for good measure
    rom[0x3D00 + 8 * 10] = 0xFF;
    rom[0x3D00 + 8 * 11] = 0x10;
    rom
}

fn write_rom(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("48.rom");
    fs::write(&path, synthetic_rom()).unwrap();
    path
}

fn build(dir: &Path) -> (Vec<Bitmap>, Font) {
    let config = FontConfig::default();
    let charset = read_charset(&write_rom(dir), &config.layout).unwrap();
    let font = build_font(&config, &charset).unwrap();
    (charset, font)
}

/// Collects the closed contours of a glyph outline.
#[derive(Default)]
struct Contours {
    contours: Vec<Vec<(f32, f32)>>,
}
impl OutlineBuilder for Contours {
    fn move_to(&mut self, x: f32, y: f32) {
        self.contours.push(vec![(x, y)]);
    }
    fn line_to(&mut self, x: f32, y: f32) {
        self.contours.last_mut().unwrap().push((x, y));
    }
    fn quad_to(&mut self, _: f32, _: f32, _: f32, _: f32) {
        panic!("unexpected quadratic curve");
    }
    fn curve_to(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {
        panic!("unexpected cubic curve");
    }
    fn close(&mut self) {}
}

/// Paints the rectangular contours of an outline back onto a bitmap.
fn rasterize(contours: &Contours, grid: &PixelGrid, width: usize) -> Bitmap {
    let mut pixels = vec![vec![false; width]; grid.height];
    for contour in &contours.contours {
        let x_min = contour.iter().map(|p| p.0 as i32).min().unwrap();
        let x_max = contour.iter().map(|p| p.0 as i32).max().unwrap();
        let y_min = contour.iter().map(|p| p.1 as i32).min().unwrap();
        let y_max = contour.iter().map(|p| p.1 as i32).max().unwrap();
        for y in (y_min..y_max).step_by(grid.pixel_size as usize) {
            for x in (x_min..x_max).step_by(grid.pixel_size as usize) {
                let (col, row) = grid.cell(x, y).unwrap();
                assert!(!pixels[row][col], "overlapping contours at ({col}, {row})");
                pixels[row][col] = true;
            }
        }
    }
    Bitmap::from_pixels(&pixels)
}

#[test]
fn truetype_output_parses() {
    let dir = tempfile::tempdir().unwrap();
    let (_, font) = build(dir.path());
    let data = OutputFormat::Ttf.encode(&font).unwrap();
    let face = Face::parse(&data, 0).unwrap();

    assert_eq!(face.number_of_glyphs(), 97);
    assert_eq!(face.units_per_em(), 800);
    assert_eq!(face.ascender(), 700);
    assert_eq!(face.descender(), -100);
    assert!(face.is_monospaced());

    let family = face
        .names()
        .into_iter()
        .find(|x| x.name_id == ttf_parser::name_id::FAMILY && x.is_unicode())
        .and_then(|x| x.to_string());
    assert_eq!(family.as_deref(), Some("ZXSpectrum"));
}

#[test]
fn character_map_holds_exactly_printable_ascii() {
    let dir = tempfile::tempdir().unwrap();
    let (_, font) = build(dir.path());
    let data = OutputFormat::Ttf.encode(&font).unwrap();
    let face = Face::parse(&data, 0).unwrap();

    let mapped: Vec<u32> = (0..0xFFFF)
        .filter_map(char::from_u32)
        .filter(|&ch| face.glyph_index(ch).map_or(false, |id| id.0 != 0))
        .map(|ch| ch as u32)
        .collect();
    assert_eq!(mapped, (32..=127).collect::<Vec<_>>());

    for ch in 32..=127u32 {
        let id = face.glyph_index(char::from_u32(ch).unwrap()).unwrap();
        assert_eq!(face.glyph_name(id), Some(glyph_name(ch).as_str()));
    }
    assert_eq!(face.glyph_name(GlyphId(0)), Some(NOTDEF));
}

#[test]
fn every_glyph_advances_one_em() {
    let dir = tempfile::tempdir().unwrap();
    let (_, font) = build(dir.path());
    let data = OutputFormat::Ttf.encode(&font).unwrap();
    let face = Face::parse(&data, 0).unwrap();

    for id in 0..face.number_of_glyphs() {
        assert_eq!(face.glyph_hor_advance(GlyphId(id)), Some(800), "glyph {id}");
    }
}

#[test]
fn outlines_reproduce_bitmaps() {
    let dir = tempfile::tempdir().unwrap();
    let (charset, font) = build(dir.path());
    let config = FontConfig::default();
    let grid = PixelGrid::new(&config);
    let data = OutputFormat::Ttf.encode(&font).unwrap();
    let face = Face::parse(&data, 0).unwrap();

    for (ch, bitmap) in (32..=127u32).zip(&charset) {
        let id = face.glyph_index(char::from_u32(ch).unwrap()).unwrap();
        let mut contours = Contours::default();
        let bbox = face.outline_glyph(id, &mut contours);
        if bitmap.is_blank() {
            assert!(bbox.is_none(), "{ch:#X} should have no outline");
            continue;
        }

        // four corners, plus the closing point where the parser emits one
        assert!(contours.contours.iter().all(|x| (4..=5).contains(&x.len())));
        let decoded = rasterize(&contours, &grid, config.layout.char_width);
        assert_eq!(&decoded, bitmap, "{ch:#X}");
    }
}

#[test]
fn space_and_notdef_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (charset, font) = build(dir.path());
    assert!(charset[0].is_blank());

    let data = OutputFormat::Ttf.encode(&font).unwrap();
    let face = Face::parse(&data, 0).unwrap();
    let space = face.glyph_index(' ').unwrap();
    assert!(face.outline_glyph(space, &mut Contours::default()).is_none());
    assert!(face.outline_glyph(GlyphId(0), &mut Contours::default()).is_none());
}

#[test]
fn solid_row_and_single_pixel_glyphs() {
    let dir = tempfile::tempdir().unwrap();
    let (_, font) = build(dir.path());
    let data = OutputFormat::Ttf.encode(&font).unwrap();
    let face = Face::parse(&data, 0).unwrap();

    // character 10 has a full top row
    let mut contours = Contours::default();
    face.outline_glyph(face.glyph_index('*').unwrap(), &mut contours).unwrap();
    assert!(contours.contours.iter().any(|c| {
        c.iter().any(|&p| p == (0.0, 800.0)) && c.iter().any(|&p| p == (800.0, 900.0))
    }));

    // character 11 has a lone pixel in column 3 of the top row
    let mut contours = Contours::default();
    face.outline_glyph(face.glyph_index('+').unwrap(), &mut contours).unwrap();
    assert!(contours.contours.iter().any(|c| {
        c.iter().any(|&p| p == (300.0, 800.0)) && c.iter().any(|&p| p == (400.0, 900.0))
    }));
}

fn read_base128(data: &[u8], pos: &mut usize) -> u32 {
    let mut value = 0;
    loop {
        let byte = data[*pos];
        *pos += 1;
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return value;
        }
    }
}

#[test]
fn woff2_decompresses_to_truetype_tables() {
    let dir = tempfile::tempdir().unwrap();
    let (_, font) = build(dir.path());
    let tables = sfnt::compile(&font).unwrap();
    let data = woff2::encode(&tables).unwrap();

    assert_eq!(&data[0..4], b"wOF2");
    assert_eq!(u32::from_be_bytes(data[8..12].try_into().unwrap()) as usize, data.len());
    let num_tables = u16::from_be_bytes([data[12], data[13]]) as usize;
    assert_eq!(num_tables, tables.len());
    let compressed_len = u32::from_be_bytes(data[20..24].try_into().unwrap()) as usize;

    let mut pos = 48;
    let mut lengths = Vec::new();
    for table in &tables {
        let flags = data[pos];
        pos += 1;
        assert_ne!(flags & 0x3F, 0x3F, "{} should have a known tag index", table.tag);
        lengths.push(read_base128(&data, &mut pos) as usize);
    }

    let mut stream = Vec::new();
    brotli::Decompressor::new(&data[pos..pos + compressed_len], 4096)
        .read_to_end(&mut stream)
        .unwrap();
    assert_eq!(stream.len(), lengths.iter().sum::<usize>());

    let mut decoded = Vec::new();
    let mut offset = 0;
    for (table, len) in tables.iter().zip(lengths) {
        decoded.push(Table::new(table.tag, stream[offset..offset + len].to_vec()));
        offset += len;
    }
    assert_eq!(decoded, tables);

    // the rebuilt TrueType file is a valid font in its own right
    let rebuilt = sfnt::write_sfnt(&decoded);
    let face = Face::parse(&rebuilt, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), 97);
}

#[test]
fn head_checksum_adjustment_balances_file() {
    let dir = tempfile::tempdir().unwrap();
    let (_, font) = build(dir.path());
    let data = OutputFormat::Ttf.encode(&font).unwrap();
    assert_eq!(sfnt::checksum(&data), 0xB1B0AFBA);
}

#[test]
fn run_writes_woff2() {
    let dir = tempfile::tempdir().unwrap();
    let rom = write_rom(dir.path());
    let output = dir.path().join("public/fonts/zx-spectrum.woff2");

    let report = zxfont::run(&rom, &output, &FontConfig::default(), OutputFormat::Woff2).unwrap();
    assert_eq!(report.characters, 96);
    assert_eq!(report.stats.glyphs, 97);
    assert_eq!(report.bytes, fs::metadata(&output).unwrap().len());
    assert_eq!(&fs::read(&output).unwrap()[0..4], b"wOF2");
}

#[test]
fn missing_rom_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out/font.woff2");
    let err = zxfont::run(
        &dir.path().join("missing.rom"),
        &output,
        &FontConfig::default(),
        OutputFormat::Woff2,
    )
    .unwrap_err();

    assert!(matches!(err, FontError::NotFound { .. }));
    assert!(!output.exists());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn truncated_rom_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let rom = dir.path().join("short.rom");
    fs::write(&rom, &synthetic_rom()[..0x3F00]).unwrap();
    let output = dir.path().join("font.ttf");

    let err = zxfont::run(&rom, &output, &FontConfig::default(), OutputFormat::Ttf).unwrap_err();
    match err {
        FontError::TruncatedInput { offset, expected, actual, .. } => {
            assert_eq!(offset, 0x3D00);
            assert_eq!(expected, 768);
            assert_eq!(actual, 0x200);
        }
        e => panic!("unexpected error: {e:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn oversized_layout_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let rom = write_rom(dir.path());
    let output = dir.path().join("font.woff2");
    let config =
        FontConfig::default().layout(zxfont::RomLayout::default().char_height(usize::MAX / 2));

    let err = zxfont::run(&rom, &output, &config, OutputFormat::Woff2).unwrap_err();
    assert!(matches!(err, FontError::Config(_)));
    assert!(!output.exists());
}

#[test]
fn win_metrics_cover_glyph_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let (_, font) = build(dir.path());
    let tables = sfnt::compile(&font).unwrap();
    let os2 = &tables.iter().find(|x| x.tag == sfnt::Tag::OS2).unwrap().data;

    // the top row reaches y = 900, above the configured ascent of 700
    assert_eq!(font.bounds().unwrap().y_max, 900);
    assert_eq!(u16::from_be_bytes([os2[74], os2[75]]), 900); // usWinAscent
    assert_eq!(u16::from_be_bytes([os2[76], os2[77]]), 100); // usWinDescent
    assert_eq!(i16::from_be_bytes([os2[68], os2[69]]), 700); // sTypoAscender
}
