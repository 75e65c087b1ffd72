//! Unbounded mosaic assembly at the tiles' native resolution.

use crate::bounds::{BoundingBox, PixelRect};
use crate::grid::ElevationGrid;
use crate::matrix::TileMatrix;
use crate::mosaic::check_dimensions;
use crate::pixel::PixelSource;
use crate::request::ElevationRequest;
use crate::store::TileCursor;
use crate::{ElevationError, Result};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Row and column range of the tiles that contributed pixels.
#[derive(Debug, Clone, Copy)]
struct TileSpan {
    min_row: u64,
    max_row: u64,
    min_column: u64,
    max_column: u64,
}

impl TileSpan {
    fn new(row: u64, column: u64) -> Self {
        Self {
            min_row: row,
            max_row: row,
            min_column: column,
            max_column: column,
        }
    }

    fn include(&mut self, row: u64, column: u64) {
        self.min_row = self.min_row.min(row);
        self.max_row = self.max_row.max(row);
        self.min_column = self.min_column.min(column);
        self.max_column = self.max_column.max(column);
    }
}

/// Copies the raw pixels of every overlapping tile into one grid, without resampling.
///
/// The output is as large as the union of the tiles' overlapping pixels.
/// Cells of tiles missing from a sparse pyramid stay empty.
pub struct UnboundedMosaicAssembler<'a, P: PixelSource> {
    source: &'a P,
}

impl<'a, P: PixelSource> UnboundedMosaicAssembler<'a, P> {
    /// Create an assembler decoding pixels with `source`.
    pub fn new(source: &'a P) -> Self {
        Self { source }
    }

    /// Assemble the native resolution grid covering the request's projected box.
    pub fn assemble<C: TileCursor + ?Sized>(
        &self,
        matrix: &TileMatrix,
        extent: &BoundingBox,
        cursor: &mut C,
        request: &ElevationRequest,
    ) -> Result<Option<ElevationGrid>> {
        let mut rows: BTreeMap<u64, BTreeMap<u64, ElevationGrid>> = BTreeMap::new();
        let mut span: Option<TileSpan> = None;
        let mut count = 0usize;
        let mut previous: Option<(u64, u64)> = None;

        let max_x = matrix.tile_width as i64 - 1;
        let max_y = matrix.tile_height as i64 - 1;

        while let Some(tile) = cursor.next_tile()? {
            let position = (tile.row, tile.column);
            if let Some(previous) = previous.filter(|p| position <= *p) {
                let err = ElevationError::TileOrder {
                    previous,
                    current: position,
                };
                warn!("Unbounded[z{}]: {}", matrix.zoom_level, err);
                return Err(err);
            }
            previous = Some(position);

            let tile_box = matrix.tile_bounds(extent, tile.row, tile.column);
            let overlap = match request.overlap(&tile_box).filter(|o| request.has_area_in(o)) {
                Some(overlap) => overlap,
                None => continue,
            };

            let src = PixelRect::within(
                matrix.tile_width as usize,
                matrix.tile_height as usize,
                &tile_box,
                &overlap,
            );
            if !src.is_valid_allow_empty() {
                continue;
            }

            // Half-open pixel edges, at least one pixel per axis
            let (left, top, right, bottom) = if request.is_point() {
                let (x, y) = (src.left.floor() as i64, src.top.floor() as i64);
                (x, y, x + 1, y + 1)
            } else {
                src.rounded()
            };
            let left = left.clamp(0, max_x);
            let top = top.clamp(0, max_y);
            let right = (right - 1).max(left).min(max_x);
            let bottom = (bottom - 1).max(top).min(max_y);

            let image = self.source.create_image(&tile).map_err(|e| {
                warn!("Unbounded[z{}]: tile ({}, {}) failed to decode: {}", matrix.zoom_level, tile.row, tile.column, e);
                e
            })?;
            check_dimensions(matrix, &tile, &image)?;

            let mut values = ElevationGrid::new((right - left + 1) as usize, (bottom - top + 1) as usize);
            for y in top..=bottom {
                for x in left..=right {
                    let value = self.source.elevation(&tile.gridded, &image, x as u32, y as u32)?;
                    values.set((x - left) as usize, (y - top) as usize, value);
                }
            }
            trace!(
                "Unbounded[z{}]: tile ({}, {}) contributed {}x{} pixels",
                matrix.zoom_level,
                tile.row,
                tile.column,
                values.width(),
                values.height()
            );

            rows.entry(tile.row).or_default().insert(tile.column, values);
            count += 1;
            match span.as_mut() {
                Some(span) => span.include(tile.row, tile.column),
                None => span = Some(TileSpan::new(tile.row, tile.column)),
            }
        }

        debug!("Unbounded[z{}]: {} tiles contributed", matrix.zoom_level, count);

        Ok(span.and_then(|span| format_results(matrix, rows, count, span)))
    }
}

/// Lay out per-tile grids at their pixel offsets from the first row and column.
fn format_results(
    matrix: &TileMatrix,
    mut rows: BTreeMap<u64, BTreeMap<u64, ElevationGrid>>,
    count: usize,
    span: TileSpan,
) -> Option<ElevationGrid> {
    if count == 0 {
        return None;
    }
    if count == 1 {
        return rows.remove(&span.min_row)?.remove(&span.min_column);
    }

    let tile_width = matrix.tile_width as usize;
    let tile_height = matrix.tile_height as usize;

    let row_height = |row: u64| rows.get(&row)?.values().next().map(ElevationGrid::height);
    let column_width = |column: u64| rows.values().find_map(|columns| columns.get(&column)).map(ElevationGrid::width);

    let first_height = row_height(span.min_row)?;
    let first_width = column_width(span.min_column)?;

    let height = if span.max_row == span.min_row {
        first_height
    } else {
        let middle = (span.max_row - span.min_row - 1) as usize * tile_height;
        first_height + middle + row_height(span.max_row)?
    };
    let width = if span.max_column == span.min_column {
        first_width
    } else {
        let middle = (span.max_column - span.min_column - 1) as usize * tile_width;
        first_width + middle + column_width(span.max_column)?
    };

    let offset = |index: u64, min: u64, first: usize, tile: usize| {
        if index == min {
            0
        } else {
            first + (index - min - 1) as usize * tile
        }
    };

    let mut grid = ElevationGrid::new(width, height);
    for (&row, columns) in &rows {
        let y_offset = offset(row, span.min_row, first_height, tile_height);
        for (&column, values) in columns {
            let x_offset = offset(column, span.min_column, first_width, tile_width);
            for y in 0..values.height() {
                for x in 0..values.width() {
                    grid.set(x_offset + x, y_offset + y, values.get(x, y));
                }
            }
        }
    }
    Some(grid)
}
