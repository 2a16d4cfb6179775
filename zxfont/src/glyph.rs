//! Glyph outlines built from pixel rectangles.

use crate::raster::Rect;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}
impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// A bounding box in design units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}
impl BBox {
    fn of_point(point: Point) -> Self {
        BBox { x_min: point.x, y_min: point.y, x_max: point.x, y_max: point.y }
    }

    fn extend(&mut self, point: Point) {
        self.x_min = self.x_min.min(point.x);
        self.y_min = self.y_min.min(point.y);
        self.x_max = self.x_max.max(point.x);
        self.y_max = self.y_max.max(point.y);
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// A closed contour made of on-curve points joined by straight lines.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Contour {
    points: Vec<Point>,
}
impl Contour {
    /// The contour of a rectangle: bottom left, bottom right, top right, top left.
    pub fn rect(rect: &Rect) -> Self {
        Contour {
            points: vec![
                Point::new(rect.x, rect.y),
                Point::new(rect.x_max(), rect.y),
                Point::new(rect.x_max(), rect.y_max()),
                Point::new(rect.x, rect.y_max()),
            ],
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Checks that this is a closed, axis-aligned rectangle with a positive area.
    pub fn is_rect(&self) -> bool {
        match self.points.as_slice() {
            [a, b, c, d] => {
                a.y == b.y && b.x == c.x && c.y == d.y && d.x == a.x && b.x > a.x && c.y > b.y
            }
            _ => false,
        }
    }
}

/// The outline of one glyph. An outline without contours draws nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Glyph {
    contours: Vec<Contour>,
}
impl Glyph {
    pub fn empty() -> Self {
        Glyph::default()
    }

    /// Builds a glyph with one contour per rectangle.
    pub fn from_rects(rects: &[Rect]) -> Self {
        Glyph { contours: rects.iter().map(Contour::rect).collect() }
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(|x| x.points.len()).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.contours.iter().flat_map(|x| x.points.iter().copied())
    }

    /// The bounding box of all points, or `None` for an empty glyph.
    pub fn bounds(&self) -> Option<BBox> {
        let mut points = self.points();
        let mut bbox = BBox::of_point(points.next()?);
        for point in points {
            bbox.extend(point);
        }
        Some(bbox)
    }
}
