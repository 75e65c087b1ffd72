//! Stored tiles, forward-only tile cursors and the storage seam.

use crate::bounds::TileGrid;
use crate::matrix::TileMatrixCatalog;
use crate::pixel::GriddedTile;
use crate::Result;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// One stored tile: its identity, encoded image data and decoding parameters.
#[derive(Debug, Clone)]
pub struct StoredTile {
    /// Zoom level.
    pub zoom: u32,
    /// Tile row (0 at the top of the matrix).
    pub row: u64,
    /// Tile column (0 at the left of the matrix).
    pub column: u64,
    /// Encoded tile image.
    pub data: Arc<[u8]>,
    /// Per-tile scale and offset.
    pub gridded: GriddedTile,
}

/// Forward-only sequence of stored tiles ordered by row, then column.
pub trait TileCursor {
    /// Number of tiles the query matched.
    fn tile_count(&self) -> usize;

    /// Next tile, or `None` once exhausted.
    fn next_tile(&mut self) -> Result<Option<StoredTile>>;

    /// Release the underlying storage cursor. Must tolerate repeated calls.
    fn close(&mut self);
}

/// Tiled raster container holding one elevation pyramid.
pub trait TileStore {
    /// Tile matrix catalog type.
    type Catalog: TileMatrixCatalog;

    /// Tile matrices of the pyramid.
    fn catalog(&self) -> &Self::Catalog;

    /// Tiles at `zoom` inside `grid`, ordered by row then column.
    fn query_tiles(&self, grid: &TileGrid, zoom: u32) -> Result<Box<dyn TileCursor + '_>>;
}

/// Owns a cursor and closes it when dropped, on every exit path.
pub struct CursorGuard<'a> {
    cursor: Box<dyn TileCursor + 'a>,
}

impl<'a> CursorGuard<'a> {
    /// Take ownership of an open cursor.
    pub fn new(cursor: Box<dyn TileCursor + 'a>) -> Self {
        Self { cursor }
    }
}

impl std::fmt::Debug for CursorGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorGuard")
            .field("tile_count", &self.cursor.tile_count())
            .finish()
    }
}

impl<'a> Deref for CursorGuard<'a> {
    type Target = dyn TileCursor + 'a;

    fn deref(&self) -> &Self::Target {
        self.cursor.as_ref()
    }
}

impl<'a> DerefMut for CursorGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.cursor.as_mut()
    }
}

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        self.cursor.close();
    }
}
