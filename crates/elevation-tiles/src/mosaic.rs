//! Bounded mosaic assembly: stored tiles resampled into a fixed size grid.

use crate::bounds::{BoundingBox, PixelRect};
use crate::edge::{EdgeBuffer, EdgeState};
use crate::grid::ElevationGrid;
use crate::interpolate::{Interpolator, PixelMapping, SampleWindow, TileWindow};
use crate::matrix::TileMatrix;
use crate::pixel::{PixelSource, TileImage};
use crate::request::ElevationRequest;
use crate::store::{StoredTile, TileCursor};
use crate::{ElevationError, Result};
use tracing::{debug, trace, warn};

/// Streams tiles in row-major order into a grid of a requested size.
///
/// Edge pixels of each tile are carried to its right and lower neighbors so
/// kernels that straddle a tile seam see the pixels on both sides.
pub struct MosaicAssembler<'a, P: PixelSource> {
    source: &'a P,
    interpolator: Interpolator,
}

impl<'a, P: PixelSource> MosaicAssembler<'a, P> {
    /// Create an assembler decoding pixels with `source`.
    pub fn new(source: &'a P, interpolator: Interpolator) -> Self {
        Self { source, interpolator }
    }

    /// Assemble a `width` x `height` grid covering the request's projected box.
    ///
    /// `extent` is the bounding box the whole tile matrix spans. Returns
    /// `None` when no tile contributed a value.
    pub fn assemble<C: TileCursor + ?Sized>(
        &self,
        matrix: &TileMatrix,
        extent: &BoundingBox,
        cursor: &mut C,
        request: &ElevationRequest,
        width: usize,
        height: usize,
    ) -> Result<Option<ElevationGrid>> {
        if width == 0 || height == 0 {
            return Err(ElevationError::InvalidRequest(format!(
                "cannot assemble a {}x{} grid",
                width, height
            )));
        }

        let depth = self.interpolator.overlapping_pixels();
        let mut grid = ElevationGrid::new(width, height);
        let mut state = EdgeState::new();
        let mut tiles_seen = 0usize;
        let mut tiles_used = 0usize;
        let mut written = 0usize;

        while let Some(tile) = cursor.next_tile()? {
            if let Err(e) = state.advance(tile.row, tile.column) {
                warn!("Mosaic[z{}]: {}", matrix.zoom_level, e);
                return Err(e);
            }
            tiles_seen += 1;

            let image = self.decode(matrix, &tile)?;
            let tile_box = matrix.tile_bounds(extent, tile.row, tile.column);

            let window = TileWindow::new(self.source, &tile.gridded, &image, state.neighbors(tile.column));
            let count = self.write_tile(&window, matrix, &tile_box, request, &mut grid)?;
            trace!(
                "Mosaic[z{}]: tile ({}, {}) wrote {} values",
                matrix.zoom_level,
                tile.row,
                tile.column,
                count
            );
            if count > 0 {
                tiles_used += 1;
                written += count;
            }

            let edge = EdgeBuffer::capture(self.source, &tile.gridded, &image, depth)?;
            state.publish(tile.column, edge);
        }

        debug!(
            "Mosaic[z{}]: {} tiles read, {} contributed {} values to {}x{} grid ({})",
            matrix.zoom_level,
            tiles_seen,
            tiles_used,
            written,
            width,
            height,
            self.interpolator.algorithm()
        );

        Ok((written > 0).then_some(grid))
    }

    /// Decode a tile image and check it against its matrix.
    fn decode(&self, matrix: &TileMatrix, tile: &StoredTile) -> Result<P::Image> {
        let image = self.source.create_image(tile).map_err(|e| {
            warn!("Mosaic[z{}]: tile ({}, {}) failed to decode: {}", matrix.zoom_level, tile.row, tile.column, e);
            e
        })?;
        check_dimensions(matrix, tile, &image)?;
        Ok(image)
    }

    /// Resample one tile into `grid`.
    ///
    /// Every cell whose kernel reaches into the tile is visited, including
    /// cells beyond the tile's own footprint. Cells missing a sample from a
    /// tile that has not been read yet stay untouched for that tile to fill.
    /// Returns the number of cells written.
    fn write_tile<W: SampleWindow>(
        &self,
        window: &W,
        matrix: &TileMatrix,
        tile_box: &BoundingBox,
        request: &ElevationRequest,
        grid: &mut ElevationGrid,
    ) -> Result<usize> {
        let width = grid.width();
        let height = grid.height();
        let projected = request.projected_bounding_box();
        let tile_width = matrix.tile_width as usize;
        let tile_height = matrix.tile_height as usize;

        // A point maps onto one fractional source pixel, possibly outside the tile
        let (src, dest) = if request.is_point() {
            (PixelRect::within(tile_width, tile_height, tile_box, projected), PixelRect::ORIGIN)
        } else {
            (
                PixelRect::full(tile_width, tile_height),
                PixelRect::within(width, height, projected, tile_box),
            )
        };

        let finite = [dest.left, dest.top, dest.right, dest.bottom, src.left, src.top]
            .iter()
            .all(|v| v.is_finite());
        if !finite || !src.is_valid_allow_empty() || !dest.is_valid_allow_empty() {
            return Ok(0);
        }

        let mapping = PixelMapping::new(&src, &dest);
        let (reach_x, reach_y) = mapping.destination_reach(self.interpolator.overlapping_pixels());

        let min_y = ((dest.top - reach_y).floor() as i64).max(0);
        let max_y = ((dest.bottom + reach_y).ceil() as i64).min(height as i64 - 1);
        let min_x = ((dest.left - reach_x).floor() as i64).max(0);
        let max_x = ((dest.right + reach_x).ceil() as i64).min(width as i64 - 1);

        let mut written = 0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (x, y) = (x as usize, y as usize);
                if let Some(value) = self.interpolator.interpolate(window, &mapping, x, y)? {
                    grid.set(x, y, Some(value));
                    written += 1;
                }
            }
        }
        Ok(written)
    }
}

/// Fail with [`ElevationError::MalformedTile`] unless the image matches the matrix tile size.
pub(crate) fn check_dimensions<I: TileImage>(matrix: &TileMatrix, tile: &StoredTile, image: &I) -> Result<()> {
    if image.width() != matrix.tile_width || image.height() != matrix.tile_height {
        let err = ElevationError::MalformedTile {
            zoom: tile.zoom,
            row: tile.row,
            column: tile.column,
            reason: format!(
                "image is {}x{}, tile matrix expects {}x{}",
                image.width(),
                image.height(),
                matrix.tile_width,
                matrix.tile_height
            ),
        };
        warn!("{}", err);
        return Err(err);
    }
    Ok(())
}
