//! Nearest neighbor, bilinear and bicubic elevation sampling.
//!
//! Source coordinates are continuous pixel coordinates: pixel `i` spans
//! `[i, i + 1)` and its center sits at `i + 0.5`.

use crate::bounds::PixelRect;
use crate::config::InterpolationAlgorithm;
use crate::edge::Neighbors;
use crate::pixel::{GriddedTile, PixelSource, TileImage};
use crate::Result;

/// Source pixels the interpolator can read from.
pub trait SampleWindow {
    /// Elevation at an integer pixel, `None` for no data or no pixel there.
    fn sample(&self, x: i64, y: i64) -> Result<Option<f64>>;
}

/// One tile image plus the edge buffers of its left, top and top-left neighbors.
///
/// Negative coordinates reach into the neighbor buffers; pixels right of or
/// below the tile are never available.
pub struct TileWindow<'a, P: PixelSource> {
    source: &'a P,
    tile: &'a GriddedTile,
    image: &'a P::Image,
    neighbors: Neighbors<'a>,
}

impl<'a, P: PixelSource> TileWindow<'a, P> {
    /// Create a window over a decoded tile.
    pub fn new(source: &'a P, tile: &'a GriddedTile, image: &'a P::Image, neighbors: Neighbors<'a>) -> Self {
        Self {
            source,
            tile,
            image,
            neighbors,
        }
    }
}

impl<P: PixelSource> SampleWindow for TileWindow<'_, P> {
    fn sample(&self, x: i64, y: i64) -> Result<Option<f64>> {
        let width = self.image.width() as i64;
        let height = self.image.height() as i64;
        if x >= width || y >= height {
            return Ok(None);
        }

        let value = match (x < 0, y < 0) {
            (false, false) => return self.source.elevation(self.tile, self.image, x as u32, y as u32),
            (true, true) => {
                if width + x < 0 {
                    return Ok(None);
                }
                self.neighbors
                    .top_left
                    .and_then(|edge| edge.row_value((-1 - y) as usize, (width + x) as usize))
            }
            (true, false) => self
                .neighbors
                .left
                .and_then(|edge| edge.column_value((-1 - x) as usize, y as usize)),
            (false, true) => self
                .neighbors
                .top
                .and_then(|edge| edge.row_value((-1 - y) as usize, x as usize)),
        };
        Ok(value)
    }
}

/// Linear mapping from destination pixels to source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMapping {
    /// Left edge of the destination rectangle.
    pub dest_left: f64,
    /// Top edge of the destination rectangle.
    pub dest_top: f64,
    /// Left edge of the source rectangle.
    pub src_left: f64,
    /// Top edge of the source rectangle.
    pub src_top: f64,
    /// Source pixels per destination pixel along x.
    pub width_ratio: f64,
    /// Source pixels per destination pixel along y.
    pub height_ratio: f64,
}

impl PixelMapping {
    /// Map the `dest` rectangle onto the `src` rectangle.
    ///
    /// A zero-sized destination axis gets a zero ratio, so every
    /// destination pixel samples the source edge on that axis.
    pub fn new(src: &PixelRect, dest: &PixelRect) -> Self {
        let ratio = |src_len: f64, dest_len: f64| if dest_len == 0.0 { 0.0 } else { src_len / dest_len };
        Self {
            dest_left: dest.left,
            dest_top: dest.top,
            src_left: src.left,
            src_top: src.top,
            width_ratio: ratio(src.width(), dest.width()),
            height_ratio: ratio(src.height(), dest.height()),
        }
    }

    /// Source x coordinate of the center of destination column `x`.
    pub fn source_x(&self, x: usize) -> f64 {
        self.src_left + (x as f64 + 0.5 - self.dest_left) * self.width_ratio
    }

    /// Source y coordinate of the center of destination row `y`.
    pub fn source_y(&self, y: usize) -> f64 {
        self.src_top + (y as f64 + 0.5 - self.dest_top) * self.height_ratio
    }

    /// Destination pixels, per axis, spanned by `overlapping_pixels` half source pixels.
    pub fn destination_reach(&self, overlapping_pixels: usize) -> (f64, f64) {
        let half = |ratio: f64| if ratio == 0.0 { 0.0 } else { 0.5 / ratio };
        (
            half(self.width_ratio) * overlapping_pixels as f64,
            half(self.height_ratio) * overlapping_pixels as f64,
        )
    }
}

/// Resamples elevations with one algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interpolator {
    algorithm: InterpolationAlgorithm,
}

impl Interpolator {
    /// Create an interpolator for `algorithm`.
    pub fn new(algorithm: InterpolationAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The configured algorithm.
    pub fn algorithm(&self) -> InterpolationAlgorithm {
        self.algorithm
    }

    /// Source pixels of neighboring tile context the algorithm needs.
    pub fn overlapping_pixels(&self) -> usize {
        self.algorithm.overlapping_pixels()
    }

    /// Elevation for destination pixel `(x, y)` under `mapping`.
    pub fn interpolate<W>(&self, window: &W, mapping: &PixelMapping, x: usize, y: usize) -> Result<Option<f64>>
    where
        W: SampleWindow + ?Sized,
    {
        self.sample(window, mapping.source_x(x), mapping.source_y(y))
    }

    /// Elevation at a continuous source coordinate.
    ///
    /// Returns `None` when any sample the algorithm needs is missing.
    pub fn sample<W>(&self, window: &W, x: f64, y: f64) -> Result<Option<f64>>
    where
        W: SampleWindow + ?Sized,
    {
        match self.algorithm {
            InterpolationAlgorithm::NearestNeighbor => window.sample(x.floor() as i64, y.floor() as i64),
            InterpolationAlgorithm::Bilinear => bilinear(window, x, y),
            InterpolationAlgorithm::Bicubic => bicubic(window, x, y),
        }
    }
}

/// Lower pixel of the pair bracketing `coord` and the offset past its center.
fn bracket(coord: f64) -> (i64, f64) {
    let floor = coord.floor();
    let center = floor + 0.5;
    if coord < center {
        (floor as i64 - 1, 1.0 - (center - coord))
    } else {
        (floor as i64, coord - center)
    }
}

fn bilinear<W: SampleWindow + ?Sized>(window: &W, x: f64, y: f64) -> Result<Option<f64>> {
    let (x0, dx) = bracket(x);
    let (y0, dy) = bracket(y);

    let (top_left, top_right, bottom_left, bottom_right) = match (
        window.sample(x0, y0)?,
        window.sample(x0 + 1, y0)?,
        window.sample(x0, y0 + 1)?,
        window.sample(x0 + 1, y0 + 1)?,
    ) {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => return Ok(None),
    };

    let top = top_left + (top_right - top_left) * dx;
    let bottom = bottom_left + (bottom_right - bottom_left) * dx;
    Ok(Some(top + (bottom - top) * dy))
}

fn bicubic<W: SampleWindow + ?Sized>(window: &W, x: f64, y: f64) -> Result<Option<f64>> {
    let (x0, dx) = bracket(x);
    let (y0, dy) = bracket(y);

    let mut rows = [0.0; 4];
    for (j, row) in rows.iter_mut().enumerate() {
        let sy = y0 - 1 + j as i64;
        let mut values = [0.0; 4];
        for (i, value) in values.iter_mut().enumerate() {
            match window.sample(x0 - 1 + i as i64, sy)? {
                Some(v) => *value = v,
                None => return Ok(None),
            }
        }
        *row = cubic_convolution(values, dx);
    }

    Ok(Some(cubic_convolution(rows, dy)))
}

/// Catmull-Rom cubic between `values[1]` (`t = 0`) and `values[2]` (`t = 1`).
pub fn cubic_convolution(values: [f64; 4], t: f64) -> f64 {
    let [v0, v1, v2, v3] = values;
    let c0 = 2.0 * v1;
    let c1 = v2 - v0;
    let c2 = 2.0 * v0 - 5.0 * v1 + 4.0 * v2 - v3;
    let c3 = -v0 + 3.0 * v1 - 3.0 * v2 + v3;
    0.5 * (((c3 * t + c2) * t + c1) * t + c0)
}
