//! Edge pixels carried between neighboring tiles during bounded assembly.

use crate::pixel::{GriddedTile, PixelSource, TileImage};
use crate::{ElevationError, Result};
use std::collections::HashMap;

/// Trailing columns and rows of one decoded tile.
///
/// Index 0 of `columns` is the last (rightmost) column and index 0 of
/// `rows` the last (bottom) row; each deeper index moves one pixel inward.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeBuffer {
    columns: Vec<Vec<Option<f64>>>,
    rows: Vec<Vec<Option<f64>>>,
}

impl EdgeBuffer {
    /// Decode the last `depth` columns and rows of a tile image.
    pub fn capture<P: PixelSource>(
        source: &P,
        tile: &GriddedTile,
        image: &P::Image,
        depth: usize,
    ) -> Result<Self> {
        let width = image.width();
        let height = image.height();

        let column_depth = depth.min(width as usize) as u32;
        let row_depth = depth.min(height as usize) as u32;

        let columns = (0..column_depth)
            .map(|i| {
                let x = width - 1 - i;
                (0..height).map(|y| source.elevation(tile, image, x, y)).collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = (0..row_depth)
            .map(|i| {
                let y = height - 1 - i;
                (0..width).map(|x| source.elevation(tile, image, x, y)).collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns, rows })
    }

    /// Value `from_right` columns in from the right edge (0 = last column), at row `y`.
    pub fn column_value(&self, from_right: usize, y: usize) -> Option<f64> {
        self.columns.get(from_right)?.get(y).copied().flatten()
    }

    /// Value `from_bottom` rows up from the bottom edge (0 = last row), at column `x`.
    pub fn row_value(&self, from_bottom: usize, x: usize) -> Option<f64> {
        self.rows.get(from_bottom)?.get(x).copied().flatten()
    }
}

/// Edge buffers adjacent to the tile being assembled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbors<'a> {
    /// Tile directly to the left, same row.
    pub left: Option<&'a EdgeBuffer>,
    /// Tile directly above.
    pub top: Option<&'a EdgeBuffer>,
    /// Tile above and to the left.
    pub top_left: Option<&'a EdgeBuffer>,
}

/// Assembly-local streaming state: edge buffers of the current and previous
/// tile rows, and the last tile position seen.
///
/// Only one row of look-back is kept. Buffers of the previous row are
/// retired as soon as a later row starts, and discarded outright when rows
/// are skipped.
#[derive(Debug, Default)]
pub struct EdgeState {
    previous_row: HashMap<u64, EdgeBuffer>,
    current_row: HashMap<u64, EdgeBuffer>,
    position: Option<(u64, u64)>,
}

impl EdgeState {
    /// Create an empty state for a new assembly pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the tile at `(row, column)`.
    ///
    /// Fails with [`ElevationError::TileOrder`] unless the position follows
    /// the previous one in row-major order.
    pub fn advance(&mut self, row: u64, column: u64) -> Result<()> {
        if let Some(previous) = self.position {
            if (row, column) <= previous {
                return Err(ElevationError::TileOrder {
                    previous,
                    current: (row, column),
                });
            }
            if row != previous.0 {
                let finished = std::mem::take(&mut self.current_row);
                self.previous_row = if row == previous.0 + 1 {
                    finished
                } else {
                    HashMap::new()
                };
            }
        }
        self.position = Some((row, column));
        Ok(())
    }

    /// Edge buffers bordering the tile at `column` of the current row.
    pub fn neighbors(&self, column: u64) -> Neighbors<'_> {
        let before = column.checked_sub(1);
        Neighbors {
            left: before.and_then(|c| self.current_row.get(&c)),
            top: self.previous_row.get(&column),
            top_left: before.and_then(|c| self.previous_row.get(&c)),
        }
    }

    /// Record the edge buffer of the tile at `column` of the current row.
    pub fn publish(&mut self, column: u64, buffer: EdgeBuffer) {
        self.current_row.insert(column, buffer);
    }
}
