//! In-memory tile container.

use crate::bounds::TileGrid;
use crate::matrix::{TileMatrixCatalog, TileMatrixSet};
use crate::pixel::GriddedTile;
use crate::store::{StoredTile, TileCursor, TileStore};
use crate::{ElevationError, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Tile key ordered by zoom, then row, then column.
type TileKey = (u32, u64, u64);

/// Tile container held entirely in memory.
///
/// Tiles are kept sorted by `(zoom, row, column)`, so cursors come out in
/// row-major order without further sorting. The store counts cursors that
/// have been opened but not yet closed.
#[derive(Debug)]
pub struct MemoryTileStore {
    matrix_set: TileMatrixSet,
    tiles: BTreeMap<TileKey, StoredTile>,
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryTileStore {
    /// Create an empty store for a tile matrix set.
    pub fn new(matrix_set: TileMatrixSet) -> Self {
        Self {
            matrix_set,
            tiles: BTreeMap::new(),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Store a tile, replacing any tile at the same position.
    pub fn insert_tile(
        &mut self,
        zoom: u32,
        row: u64,
        column: u64,
        data: impl Into<Arc<[u8]>>,
        gridded: GriddedTile,
    ) -> Result<()> {
        let matrix = self.matrix_set.matrix_for(zoom).ok_or_else(|| {
            ElevationError::Storage(format!("no tile matrix at zoom {}", zoom))
        })?;
        if row >= matrix.matrix_height || column >= matrix.matrix_width {
            return Err(ElevationError::Storage(format!(
                "tile ({}, {}) outside the {}x{} matrix at zoom {}",
                row, column, matrix.matrix_width, matrix.matrix_height, zoom
            )));
        }

        self.tiles.insert(
            (zoom, row, column),
            StoredTile {
                zoom,
                row,
                column,
                data: data.into(),
                gridded,
            },
        );
        Ok(())
    }

    /// Number of stored tiles across all zoom levels.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Number of cursors opened and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }
}

impl TileStore for MemoryTileStore {
    type Catalog = TileMatrixSet;

    fn catalog(&self) -> &TileMatrixSet {
        &self.matrix_set
    }

    fn query_tiles(&self, grid: &TileGrid, zoom: u32) -> Result<Box<dyn TileCursor + '_>> {
        let tiles: Vec<StoredTile> = self
            .tiles
            .range((zoom, grid.min_row, grid.min_column)..=(zoom, grid.max_row, grid.max_column))
            .filter(|(key, _)| grid.contains(key.1, key.2))
            .map(|(_, tile)| tile.clone())
            .collect();

        self.open_cursors.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryTileCursor {
            count: tiles.len(),
            tiles: tiles.into_iter(),
            open: Some(Arc::clone(&self.open_cursors)),
        }))
    }
}

/// Cursor over a snapshot of matching tiles.
struct MemoryTileCursor {
    count: usize,
    tiles: std::vec::IntoIter<StoredTile>,
    /// Shared open-cursor counter, taken on close.
    open: Option<Arc<AtomicUsize>>,
}

impl TileCursor for MemoryTileCursor {
    fn tile_count(&self) -> usize {
        self.count
    }

    fn next_tile(&mut self) -> Result<Option<StoredTile>> {
        if self.open.is_none() {
            return Err(ElevationError::Storage("cursor already closed".to_string()));
        }
        Ok(self.tiles.next())
    }

    fn close(&mut self) {
        if let Some(open) = self.open.take() {
            open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
