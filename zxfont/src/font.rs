//! Assembles glyph outlines into a complete font.

use crate::{
    config::{FontConfig, FontMetrics, FontNames},
    error::{FontError, Result},
    glyph::{BBox, Glyph},
    raster::{bitmap_to_rects, PixelGrid},
    rom::Bitmap,
};
use log::{debug, info};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

/// The name of the glyph drawn for characters missing from the font.
pub const NOTDEF: &str = ".notdef";

/// The glyph name used for a code point.
pub fn glyph_name(code_point: u32) -> String {
    format!("uni{code_point:04X}")
}

/// A glyph together with its name and horizontal metrics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedGlyph {
    pub name: String,
    pub glyph: Glyph,
    pub advance: u16,
    pub lsb: i16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FontStats {
    pub glyphs: usize,
    pub drawn_glyphs: usize,
    pub contours: usize,
}
impl fmt::Display for FontStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} glyphs, {} with outlines, {} contours",
            self.glyphs, self.drawn_glyphs, self.contours
        )
    }
}

/// A fully assembled font, ready to be serialized.
#[derive(Clone, Debug)]
pub struct Font {
    glyphs: Vec<NamedGlyph>,
    glyph_ids: HashMap<String, u16>,
    char_map: BTreeMap<u32, String>,
    pub metrics: FontMetrics,
    pub names: FontNames,
    /// The smallest readable size in pixels per em.
    pub lowest_rec_ppem: u16,
    /// Creation time in seconds since the Unix epoch.
    pub timestamp: u64,
}
impl Font {
    /// All glyphs in glyph id order. Glyph 0 is always `.notdef`.
    pub fn glyphs(&self) -> &[NamedGlyph] {
        &self.glyphs
    }

    pub fn glyph(&self, name: &str) -> Option<&NamedGlyph> {
        self.glyph_id(name).map(|id| &self.glyphs[id as usize])
    }

    pub fn glyph_id(&self, name: &str) -> Option<u16> {
        self.glyph_ids.get(name).copied()
    }

    /// The mapping from code points to glyph names.
    pub fn char_map(&self) -> &BTreeMap<u32, String> {
        &self.char_map
    }

    /// The mapping from code points to glyph ids, in code point order.
    pub fn char_to_glyph_id(&self) -> Vec<(u32, u16)> {
        self.char_map
            .iter()
            .filter_map(|(&ch, name)| self.glyph_id(name).map(|id| (ch, id)))
            .collect()
    }

    /// The bounding box over every glyph with an outline.
    pub fn bounds(&self) -> Option<BBox> {
        self.glyphs
            .iter()
            .filter_map(|x| x.glyph.bounds())
            .reduce(|a, b| a.union(&b))
    }

    pub fn stats(&self) -> FontStats {
        FontStats {
            glyphs: self.glyphs.len(),
            drawn_glyphs: self.glyphs.iter().filter(|x| !x.glyph.is_empty()).count(),
            contours: self.glyphs.iter().map(|x| x.glyph.contours().len()).sum(),
        }
    }
}

/// Builds glyph outlines for a character set.
pub fn build_glyphs(config: &FontConfig, charset: &[Bitmap]) -> Vec<Glyph> {
    let grid = PixelGrid::new(config);
    charset
        .iter()
        .map(|bitmap| Glyph::from_rects(&bitmap_to_rects(bitmap, &grid)))
        .collect()
}

/// Assembles one glyph per code point into a monospaced font.
///
/// `glyphs` must be in code point order, starting at the layout's first character.
pub fn assemble(config: &FontConfig, glyphs: Vec<Glyph>) -> Result<Font> {
    config.validate()?;
    let layout = &config.layout;
    if glyphs.len() != layout.char_count {
        return Err(FontError::Build(format!(
            "expected {} glyphs, got {}",
            layout.char_count,
            glyphs.len()
        )));
    }

    let advance = config.metrics.units_per_em;
    let mut named = Vec::with_capacity(glyphs.len() + 1);
    named.push(NamedGlyph { name: NOTDEF.to_string(), glyph: Glyph::empty(), advance, lsb: 0 });

    let mut char_map = BTreeMap::new();
    for (code_point, glyph) in layout.code_points().zip(glyphs) {
        let name = glyph_name(code_point);
        check_glyph(&name, &glyph)?;
        debug!("{name}: {} contours", glyph.contours().len());
        char_map.insert(code_point, name.clone());
        named.push(NamedGlyph { name, glyph, advance, lsb: 0 });
    }

    let mut glyph_ids = HashMap::new();
    for (id, glyph) in named.iter().enumerate() {
        if glyph_ids.insert(glyph.name.clone(), id as u16).is_some() {
            return Err(FontError::Build(format!("duplicate glyph name '{}'", glyph.name)));
        }
    }

    let font = Font {
        glyphs: named,
        glyph_ids,
        char_map,
        metrics: config.metrics,
        names: config.names.clone(),
        lowest_rec_ppem: layout.char_height as u16,
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|x| x.as_secs())
            .unwrap_or(0),
    };
    info!("Assembled font: {}", font.stats());
    Ok(font)
}

/// Builds the font for a decoded character set.
pub fn build_font(config: &FontConfig, charset: &[Bitmap]) -> Result<Font> {
    info!("Building font...");
    assemble(config, build_glyphs(config, charset))
}

fn check_glyph(name: &str, glyph: &Glyph) -> Result<()> {
    if let Some(contour) = glyph.contours().iter().find(|x| !x.is_rect()) {
        return Err(FontError::Build(format!("{name} has a malformed contour: {contour:?}")));
    }
    if let Some(bbox) = glyph.bounds() {
        let range = i16::MIN as i32..=i16::MAX as i32;
        if !range.contains(&bbox.x_min)
            || !range.contains(&bbox.y_min)
            || !range.contains(&bbox.x_max)
            || !range.contains(&bbox.y_max)
        {
            return Err(FontError::Build(format!(
                "{name} does not fit in 16-bit coordinates: {bbox:?}"
            )));
        }
    }
    if glyph.point_count() > u16::MAX as usize {
        return Err(FontError::Build(format!("{name} has too many points")));
    }
    Ok(())
}
