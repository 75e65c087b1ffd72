//! Tile matrices (pyramid resolution levels) and the catalog that holds them.

use crate::bounds::BoundingBox;
use crate::projection::ProjectionId;
use crate::{ElevationError, Result};
use std::collections::BTreeMap;

/// One resolution level of a tile pyramid.
///
/// Lower zoom levels are coarser. Dimensions are fixed once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileMatrix {
    /// Zoom level, unique within a catalog.
    pub zoom_level: u32,
    /// Number of tile columns.
    pub matrix_width: u64,
    /// Number of tile rows.
    pub matrix_height: u64,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// Ground size of one pixel along x, in projected units.
    pub pixel_x_size: f64,
    /// Ground size of one pixel along y, in projected units.
    pub pixel_y_size: f64,
}

impl TileMatrix {
    /// Create a tile matrix.
    pub fn new(
        zoom_level: u32,
        matrix_width: u64,
        matrix_height: u64,
        tile_width: u32,
        tile_height: u32,
        pixel_x_size: f64,
        pixel_y_size: f64,
    ) -> Self {
        Self {
            zoom_level,
            matrix_width,
            matrix_height,
            tile_width,
            tile_height,
            pixel_x_size,
            pixel_y_size,
        }
    }

    /// Create a tile matrix whose tiles evenly divide `extent`, deriving the pixel size.
    pub fn for_extent(
        zoom_level: u32,
        extent: &BoundingBox,
        matrix_width: u64,
        matrix_height: u64,
        tile_width: u32,
        tile_height: u32,
    ) -> Self {
        let pixel_x_size = extent.width() / (matrix_width * tile_width as u64) as f64;
        let pixel_y_size = extent.height() / (matrix_height * tile_height as u64) as f64;
        Self::new(
            zoom_level,
            matrix_width,
            matrix_height,
            tile_width,
            tile_height,
            pixel_x_size,
            pixel_y_size,
        )
    }

    /// Ground width covered by one tile.
    pub fn tile_ground_width(&self) -> f64 {
        self.tile_width as f64 * self.pixel_x_size
    }

    /// Ground height covered by one tile.
    pub fn tile_ground_height(&self) -> f64 {
        self.tile_height as f64 * self.pixel_y_size
    }

    /// Footprint of the tile at `(row, column)` when the whole matrix spans `total`.
    pub fn tile_bounds(&self, total: &BoundingBox, row: u64, column: u64) -> BoundingBox {
        let tile_span_x = total.width() / self.matrix_width as f64;
        let tile_span_y = total.height() / self.matrix_height as f64;

        let min_x = total.min_x + tile_span_x * column as f64;
        let max_y = total.max_y - tile_span_y * row as f64;

        BoundingBox::new(min_x, max_y - tile_span_y, min_x + tile_span_x, max_y)
    }
}

/// Read-only access to the tile matrices of one elevation pyramid.
pub trait TileMatrixCatalog {
    /// Projection of the stored elevation data.
    fn projection(&self) -> &ProjectionId;

    /// Extent covered by every tile matrix.
    fn bounding_box(&self) -> BoundingBox;

    /// Tile matrix registered at `zoom`, if any.
    fn matrix_for(&self, zoom: u32) -> Option<TileMatrix>;

    /// Zoom level whose tile ground size is closest to the given footprint.
    fn closest_zoom(&self, width: f64, height: f64) -> Option<u32>;

    /// Lowest registered zoom level.
    fn min_zoom(&self) -> Option<u32>;

    /// Highest registered zoom level.
    fn max_zoom(&self) -> Option<u32>;
}

/// In-memory tile matrix set: a projection, an extent, and matrices by zoom level.
#[derive(Debug, Clone)]
pub struct TileMatrixSet {
    projection: ProjectionId,
    bounding_box: BoundingBox,
    matrices: BTreeMap<u32, TileMatrix>,
}

impl TileMatrixSet {
    /// Create an empty set.
    pub fn new(projection: ProjectionId, bounding_box: BoundingBox) -> Self {
        Self {
            projection,
            bounding_box,
            matrices: BTreeMap::new(),
        }
    }

    /// Register a tile matrix, replacing any matrix at the same zoom level.
    pub fn add_matrix(&mut self, matrix: TileMatrix) -> Result<()> {
        if matrix.matrix_width == 0 || matrix.matrix_height == 0 || matrix.tile_width == 0 || matrix.tile_height == 0 {
            return Err(ElevationError::InvalidRequest(format!(
                "tile matrix at zoom {} has an empty dimension",
                matrix.zoom_level
            )));
        }
        if !(matrix.pixel_x_size > 0.0 && matrix.pixel_y_size > 0.0) {
            return Err(ElevationError::InvalidRequest(format!(
                "tile matrix at zoom {} has a non-positive pixel size",
                matrix.zoom_level
            )));
        }
        self.matrices.insert(matrix.zoom_level, matrix);
        Ok(())
    }

    /// Builder form of [`TileMatrixSet::add_matrix`].
    pub fn with_matrix(mut self, matrix: TileMatrix) -> Result<Self> {
        self.add_matrix(matrix)?;
        Ok(self)
    }

    /// Registered zoom levels in ascending order.
    pub fn zoom_levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.matrices.keys().copied()
    }

    /// Number of registered matrices.
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Check if no matrix is registered.
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

impl TileMatrixCatalog for TileMatrixSet {
    fn projection(&self) -> &ProjectionId {
        &self.projection
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    fn matrix_for(&self, zoom: u32) -> Option<TileMatrix> {
        self.matrices.get(&zoom).copied()
    }

    fn closest_zoom(&self, width: f64, height: f64) -> Option<u32> {
        let mut best: Option<(f64, u32)> = None;
        // Ascending order; a tie replaces the coarser level
        for matrix in self.matrices.values() {
            let difference =
                (matrix.tile_ground_width() - width).abs() + (matrix.tile_ground_height() - height).abs();
            match best {
                Some((best_difference, _)) if difference > best_difference => {}
                _ => best = Some((difference, matrix.zoom_level)),
            }
        }
        best.map(|(_, zoom)| zoom)
    }

    fn min_zoom(&self) -> Option<u32> {
        self.matrices.keys().next().copied()
    }

    fn max_zoom(&self) -> Option<u32> {
        self.matrices.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pyramid() -> TileMatrixSet {
        let extent = BoundingBox::new(0.0, 0.0, 1024.0, 1024.0);
        let mut set = TileMatrixSet::new(ProjectionId::web_mercator(), extent);
        for zoom in [2, 3, 5] {
            let tiles = 1u64 << zoom;
            set.add_matrix(TileMatrix::for_extent(zoom, &extent, tiles, tiles, 16, 16))
                .unwrap();
        }
        set
    }

    #[test]
    fn test_tile_bounds() {
        let extent = BoundingBox::new(0.0, 0.0, 512.0, 256.0);
        let matrix = TileMatrix::for_extent(0, &extent, 2, 1, 256, 256);
        assert_eq!(matrix.pixel_x_size, 1.0);
        assert_eq!(matrix.pixel_y_size, 1.0);
        assert_eq!(matrix.tile_bounds(&extent, 0, 1), BoundingBox::new(256.0, 0.0, 512.0, 256.0));
    }

    #[test]
    fn test_min_max_zoom() {
        let set = pyramid();
        assert_eq!(set.min_zoom(), Some(2));
        assert_eq!(set.max_zoom(), Some(5));
        assert!(set.matrix_for(4).is_none());
        assert_eq!(set.zoom_levels().collect::<Vec<_>>(), vec![2, 3, 5]);
    }

    #[test]
    fn test_closest_zoom() {
        let set = pyramid();
        // Tile ground sizes: z2 = 256, z3 = 128, z5 = 32
        assert_eq!(set.closest_zoom(250.0, 250.0), Some(2));
        assert_eq!(set.closest_zoom(100.0, 140.0), Some(3));
        assert_eq!(set.closest_zoom(40.0, 20.0), Some(5));
        // Degenerate footprints pick the finest level
        assert_eq!(set.closest_zoom(0.0, 0.0), Some(5));
        // Ties go to the finer level
        assert_eq!(set.closest_zoom(192.0, 192.0), Some(3));
    }

    #[test]
    fn test_empty_catalog() {
        let set = TileMatrixSet::new(ProjectionId::web_mercator(), BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert!(set.is_empty());
        assert_eq!(set.closest_zoom(1.0, 1.0), None);
        assert_eq!(set.min_zoom(), None);
    }

    #[test]
    fn test_rejects_empty_matrix() {
        let mut set = pyramid();
        assert!(set.add_matrix(TileMatrix::new(9, 0, 1, 16, 16, 1.0, 1.0)).is_err());
        assert!(set.add_matrix(TileMatrix::new(9, 1, 1, 16, 16, 0.0, 1.0)).is_err());
    }
}
