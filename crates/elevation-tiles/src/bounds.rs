//! Bounding boxes, tile grids and pixel rectangles.
//!
//! All boxes are expressed in projected units with `y` increasing north;
//! pixel space has its origin at the top-left corner with `y` increasing
//! south.

use crate::matrix::TileMatrix;

/// Axis-aligned bounding box in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum x (west edge).
    pub min_x: f64,
    /// Minimum y (south edge).
    pub min_y: f64,
    /// Maximum x (east edge).
    pub max_x: f64,
    /// Maximum y (north edge).
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a bounding box from its edges.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Degenerate box covering a single point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// Width in projected units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height in projected units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check that the edges are ordered (zero width or height allowed).
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Check that every edge is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y].iter().all(|v| v.is_finite())
    }

    /// Check if a coordinate is within the bounds (edges inclusive).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Intersection of two boxes.
    ///
    /// Boxes that only touch produce a zero-width or zero-height overlap
    /// rather than `None`, so point requests still intersect the tiles
    /// they fall on.
    pub fn overlap(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let overlap = BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        overlap.is_valid().then_some(overlap)
    }

    /// Grow the box outward by the given distances on each side.
    pub fn pad(&self, dx: f64, dy: f64) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }
}

/// Inclusive rectangle of tile indices within one tile matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    /// First column.
    pub min_column: u64,
    /// First row.
    pub min_row: u64,
    /// Last column (inclusive).
    pub max_column: u64,
    /// Last row (inclusive).
    pub max_row: u64,
}

impl TileGrid {
    /// Tile index rectangle of `matrix` covering `bbox`, where the whole
    /// matrix spans `total`.
    ///
    /// Returns `None` when the box lies entirely outside the matrix.
    pub fn covering(total: &BoundingBox, matrix: &TileMatrix, bbox: &BoundingBox) -> Option<Self> {
        let width = matrix.matrix_width as i64;
        let height = matrix.matrix_height as i64;

        let min_column = tile_column(total, width, bbox.min_x);
        let max_column = tile_column(total, width, bbox.max_x);
        // Rows count down from the top edge
        let min_row = tile_row(total, height, bbox.max_y);
        let max_row = tile_row(total, height, bbox.min_y);

        if min_column >= width || max_column < 0 || min_row >= height || max_row < 0 {
            return None;
        }

        Some(Self {
            min_column: min_column.max(0) as u64,
            min_row: min_row.max(0) as u64,
            max_column: max_column.min(width - 1) as u64,
            max_row: max_row.min(height - 1) as u64,
        })
    }

    /// Check if a tile index is inside the grid.
    pub fn contains(&self, row: u64, column: u64) -> bool {
        row >= self.min_row && row <= self.max_row && column >= self.min_column && column <= self.max_column
    }

    /// Number of tiles in the grid.
    pub fn count(&self) -> u64 {
        (self.max_column - self.min_column + 1) * (self.max_row - self.min_row + 1)
    }
}

/// Column index for an x coordinate; `-1` before the matrix, `matrix_width` at or past its end.
fn tile_column(total: &BoundingBox, matrix_width: i64, x: f64) -> i64 {
    if x < total.min_x {
        -1
    } else if x >= total.max_x {
        matrix_width
    } else {
        let tile_span = total.width() / matrix_width as f64;
        ((x - total.min_x) / tile_span) as i64
    }
}

/// Row index for a y coordinate; `-1` above the matrix, `matrix_height` at or below its bottom.
fn tile_row(total: &BoundingBox, matrix_height: i64, y: f64) -> i64 {
    if y <= total.min_y {
        matrix_height
    } else if y > total.max_y {
        -1
    } else {
        let tile_span = total.height() / matrix_height as f64;
        ((total.max_y - y) / tile_span) as i64
    }
}

/// Fractional pixel rectangle (left/top inclusive origin, right/bottom edges).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub left: f64,
    /// Top edge in pixels.
    pub top: f64,
    /// Right edge in pixels.
    pub right: f64,
    /// Bottom edge in pixels.
    pub bottom: f64,
}

impl PixelRect {
    /// Empty rectangle anchored at the origin.
    pub const ORIGIN: PixelRect = PixelRect {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    /// Rectangle covering a whole `width` x `height` image.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: width as f64,
            bottom: height as f64,
        }
    }

    /// Pixel rectangle of `section` within an image of `width` x `height`
    /// pixels spanning `bounds`.
    pub fn within(width: usize, height: usize, bounds: &BoundingBox, section: &BoundingBox) -> Self {
        let x_pixel = |x: f64| (x - bounds.min_x) / bounds.width() * width as f64;
        let y_pixel = |y: f64| (bounds.max_y - y) / bounds.height() * height as f64;
        Self {
            left: x_pixel(section.min_x),
            top: y_pixel(section.max_y),
            right: x_pixel(section.max_x),
            bottom: y_pixel(section.min_y),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height in pixels.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Check that the edges are ordered (an empty rectangle is allowed).
    pub fn is_valid_allow_empty(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    /// Round each edge to the nearest whole pixel: `(left, top, right, bottom)`.
    pub fn rounded(&self) -> (i64, i64, i64, i64) {
        (
            self.left.round() as i64,
            self.top.round() as i64,
            self.right.round() as i64,
            self.bottom.round() as i64,
        )
    }
}
