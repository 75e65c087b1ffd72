//! Output elevation grids and query results.

use crate::matrix::TileMatrix;
use crate::{ElevationError, Result};

/// Dense grid of nullable elevations, row-major from the top-left corner.
///
/// `None` marks no data or a cell no stored tile covered.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    width: usize,
    height: usize,
    values: Vec<Option<f64>>,
}

impl ElevationGrid {
    /// Create a grid with every cell empty.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![None; width * height],
        }
    }

    /// Build a grid from rows of equal length.
    pub fn from_rows(rows: Vec<Vec<Option<f64>>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(ElevationError::InvalidRequest(
                "grid rows must all have the same length".to_string(),
            ));
        }
        Ok(Self {
            width,
            height,
            values: rows.into_iter().flatten().collect(),
        })
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Elevation at column `x` and row `y`, `None` for no data or out of range.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values[y * self.width + x]
    }

    /// Set the cell at column `x` and row `y`. Out of range cells are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: Option<f64>) {
        if x < self.width && y < self.height {
            self.values[y * self.width + x] = value;
        }
    }

    /// Cells in row-major order.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Copy the cells out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<Option<f64>>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.values.chunks(self.width).map(<[Option<f64>]>::to_vec).collect()
    }

    /// Number of cells holding a value.
    pub fn data_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Minimum and maximum elevation over cells with data.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
    }
}

/// An elevation grid with the tile matrix it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationTileResults {
    grid: ElevationGrid,
    tile_matrix: TileMatrix,
}

impl ElevationTileResults {
    /// Pair a grid with its source tile matrix.
    pub fn new(grid: ElevationGrid, tile_matrix: TileMatrix) -> Self {
        Self { grid, tile_matrix }
    }

    /// The elevation grid.
    pub fn grid(&self) -> &ElevationGrid {
        &self.grid
    }

    /// Take the elevation grid.
    pub fn into_grid(self) -> ElevationGrid {
        self.grid
    }

    /// Tile matrix the elevations were read from.
    pub fn tile_matrix(&self) -> &TileMatrix {
        &self.tile_matrix
    }

    /// Zoom level the elevations were read from.
    pub fn zoom_level(&self) -> u32 {
        self.tile_matrix.zoom_level
    }

    /// Grid width in cells.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Grid height in cells.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Elevation at column `x` and row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.grid.get(x, y)
    }
}
