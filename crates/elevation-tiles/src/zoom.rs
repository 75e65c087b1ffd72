//! Zoom level selection and zoom fallback search.

use crate::bounds::TileGrid;
use crate::config::QueryConfig;
use crate::matrix::{TileMatrix, TileMatrixCatalog};
use crate::request::ElevationRequest;
use crate::store::{CursorGuard, TileCursor, TileStore};
use crate::Result;
use tracing::{debug, trace};

/// Where to look when the selected zoom level has no tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomPolicy {
    /// Search finer levels.
    pub zoom_in: bool,
    /// Search coarser levels.
    pub zoom_out: bool,
    /// Search finer levels before coarser ones.
    pub zoom_in_before_out: bool,
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self {
            zoom_in: true,
            zoom_out: true,
            zoom_in_before_out: true,
        }
    }
}

impl From<&QueryConfig> for ZoomPolicy {
    fn from(config: &QueryConfig) -> Self {
        Self {
            zoom_in: config.zoom_in,
            zoom_out: config.zoom_out,
            zoom_in_before_out: config.zoom_in_before_out,
        }
    }
}

/// A tile matrix and the open cursor over its tiles matching one request.
///
/// The cursor is closed when this value is dropped.
#[derive(Debug)]
pub struct ElevationTileMatrixResults<'a> {
    tile_matrix: TileMatrix,
    cursor: CursorGuard<'a>,
}

impl<'a> ElevationTileMatrixResults<'a> {
    /// Tile matrix the cursor reads from.
    pub fn tile_matrix(&self) -> &TileMatrix {
        &self.tile_matrix
    }

    /// The open tile cursor.
    pub fn cursor(&mut self) -> &mut (dyn TileCursor + 'a) {
        &mut *self.cursor
    }

    /// Number of tiles the cursor matched.
    pub fn tile_count(&self) -> usize {
        self.cursor.tile_count()
    }
}

/// Picks the tile matrix to answer a request from.
pub struct ZoomResolver<'s, S: TileStore> {
    store: &'s S,
    policy: ZoomPolicy,
}

impl<'s, S: TileStore> ZoomResolver<'s, S> {
    /// Create a resolver over a tile store.
    pub fn new(store: &'s S, policy: ZoomPolicy) -> Self {
        Self { store, policy }
    }

    /// Candidate tile matrix for a request: the level whose tile ground size
    /// is closest to the request's projected extent.
    ///
    /// Returns `None` when the request misses the pyramid extent, could not
    /// be projected into it, or no level is registered.
    pub fn resolve(&self, request: &ElevationRequest) -> Option<TileMatrix> {
        let catalog = self.store.catalog();
        if !request.projected_bounding_box().is_finite() {
            return None;
        }
        request.overlap(&catalog.bounding_box())?;

        let projected = request.projected_bounding_box();
        let zoom = catalog.closest_zoom(projected.width(), projected.height())?;
        catalog.matrix_for(zoom)
    }

    /// Tile matrix and open cursor for a request, falling back to other zoom
    /// levels when the candidate level holds no overlapping tiles.
    ///
    /// The request box is padded by `overlapping_pixels` of the matrix pixel
    /// size so neighboring tiles supplying interpolation context are included.
    pub fn results(
        &self,
        request: &ElevationRequest,
        overlapping_pixels: usize,
    ) -> Result<Option<ElevationTileMatrixResults<'s>>> {
        let matrix = match self.resolve(request) {
            Some(matrix) => matrix,
            None => {
                debug!("ZoomResolver: no tile matrix for request {:?}", request.projected_bounding_box());
                return Ok(None);
            }
        };
        debug!("ZoomResolver: selected zoom {}", matrix.zoom_level);

        if let Some(results) = self.query(request, &matrix, overlapping_pixels)? {
            return Ok(Some(results));
        }

        let results = self.zoom_fallback(request, &matrix, overlapping_pixels)?;
        match &results {
            Some(found) => debug!(
                "ZoomResolver: zoom {} empty, using zoom {}",
                matrix.zoom_level, found.tile_matrix.zoom_level
            ),
            None => debug!("ZoomResolver: no tiles at zoom {} or any fallback level", matrix.zoom_level),
        }
        Ok(results)
    }

    fn zoom_fallback(
        &self,
        request: &ElevationRequest,
        matrix: &TileMatrix,
        overlapping_pixels: usize,
    ) -> Result<Option<ElevationTileMatrixResults<'s>>> {
        let policy = self.policy;
        if policy.zoom_in && policy.zoom_in_before_out {
            if let Some(results) = self.zoom_in(request, matrix, overlapping_pixels)? {
                return Ok(Some(results));
            }
        }
        if policy.zoom_out {
            if let Some(results) = self.zoom_out(request, matrix, overlapping_pixels)? {
                return Ok(Some(results));
            }
        }
        if policy.zoom_in && !policy.zoom_in_before_out {
            return self.zoom_in(request, matrix, overlapping_pixels);
        }
        Ok(None)
    }

    fn zoom_in(
        &self,
        request: &ElevationRequest,
        matrix: &TileMatrix,
        overlapping_pixels: usize,
    ) -> Result<Option<ElevationTileMatrixResults<'s>>> {
        let catalog = self.store.catalog();
        let max_zoom = match catalog.max_zoom() {
            Some(zoom) => zoom,
            None => return Ok(None),
        };
        for zoom in matrix.zoom_level.saturating_add(1)..=max_zoom {
            if let Some(candidate) = catalog.matrix_for(zoom) {
                if let Some(results) = self.query(request, &candidate, overlapping_pixels)? {
                    return Ok(Some(results));
                }
            }
        }
        Ok(None)
    }

    fn zoom_out(
        &self,
        request: &ElevationRequest,
        matrix: &TileMatrix,
        overlapping_pixels: usize,
    ) -> Result<Option<ElevationTileMatrixResults<'s>>> {
        let catalog = self.store.catalog();
        let min_zoom = match catalog.min_zoom() {
            Some(zoom) => zoom,
            None => return Ok(None),
        };
        for zoom in (min_zoom..matrix.zoom_level).rev() {
            if let Some(candidate) = catalog.matrix_for(zoom) {
                if let Some(results) = self.query(request, &candidate, overlapping_pixels)? {
                    return Ok(Some(results));
                }
            }
        }
        Ok(None)
    }

    /// Open a cursor over the tiles of `matrix` near the request, if any exist.
    fn query(
        &self,
        request: &ElevationRequest,
        matrix: &TileMatrix,
        overlapping_pixels: usize,
    ) -> Result<Option<ElevationTileMatrixResults<'s>>> {
        let padded = request.projected_bounding_box().pad(
            matrix.pixel_x_size * overlapping_pixels as f64,
            matrix.pixel_y_size * overlapping_pixels as f64,
        );
        let grid = match TileGrid::covering(&self.store.catalog().bounding_box(), matrix, &padded) {
            Some(grid) => grid,
            None => return Ok(None),
        };

        let cursor = CursorGuard::new(self.store.query_tiles(&grid, matrix.zoom_level)?);
        trace!(
            "ZoomResolver: zoom {} grid {:?} matched {} tiles",
            matrix.zoom_level,
            grid,
            cursor.tile_count()
        );
        if cursor.tile_count() == 0 {
            return Ok(None);
        }

        Ok(Some(ElevationTileMatrixResults {
            tile_matrix: *matrix,
            cursor,
        }))
    }
}
