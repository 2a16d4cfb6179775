//! Converts character bitmaps into rectangles in font design space.

use crate::{config::FontConfig, rom::Bitmap};

/// An axis-aligned rectangle in design units. `(x, y)` is the bottom left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}
impl Rect {
    pub fn x_max(&self) -> i32 {
        self.x + self.width
    }

    pub fn y_max(&self) -> i32 {
        self.y + self.height
    }
}

/// Maps bitmap cells to design-space coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    pub pixel_size: i32,
    pub descent: i32,
    pub height: usize,
}
impl PixelGrid {
    pub fn new(config: &FontConfig) -> Self {
        PixelGrid {
            pixel_size: config.pixel_size(),
            descent: config.metrics.descent as i32,
            height: config.layout.char_height,
        }
    }

    /// The x coordinate of the left edge of a column.
    pub fn x(&self, col: usize) -> i32 {
        col as i32 * self.pixel_size
    }

    /// The y coordinate of the bottom edge of a row. Row 0 is the top of the cell.
    pub fn y(&self, row: usize) -> i32 {
        (self.height as i32 - 1 - row as i32) * self.pixel_size - self.descent
    }

    /// The bitmap cell containing a design-space point, if any.
    pub fn cell(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let col = x.div_euclid(self.pixel_size);
        let row = self.height as i32 - 1 - (y + self.descent).div_euclid(self.pixel_size);
        if col < 0 || row < 0 || row >= self.height as i32 {
            None
        } else {
            Some((col as usize, row as usize))
        }
    }
}

/// Collapses each horizontal run of set pixels into one rectangle.
///
/// Rows are never merged with each other. Rectangles are returned top row first and left to
/// right within a row.
pub fn bitmap_to_rects(bitmap: &Bitmap, grid: &PixelGrid) -> Vec<Rect> {
    let mut rects = Vec::new();
    for row in 0..bitmap.height() {
        let y = grid.y(row);
        let mut col = 0;
        while col < bitmap.width() {
            if !bitmap.get(col, row) {
                col += 1;
                continue;
            }

            let start = col;
            while col < bitmap.width() && bitmap.get(col, row) {
                col += 1;
            }
            rects.push(Rect {
                x: grid.x(start),
                y,
                width: (col - start) as i32 * grid.pixel_size,
                height: grid.pixel_size,
            });
        }
    }
    rects
}
