//! Shared fixtures: TIFF tile encoding and small in-memory pyramids.

#![allow(dead_code)]

use elevation_tiles::{BoundingBox, GriddedTile, MemoryTileStore, ProjectionId, TileMatrix, TileMatrixSet};
use std::io::Cursor;
use tiff::encoder::{colortype, TiffEncoder};

pub const NODATA: f32 = -9999.0;

/// Encode a single-band 32-bit float TIFF.
pub fn encode_f32(width: u32, height: u32, samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = TiffEncoder::new(Cursor::new(&mut bytes)).unwrap();
        encoder
            .write_image::<colortype::Gray32Float>(width, height, samples)
            .unwrap();
    }
    bytes
}

/// Encode a single-band 16-bit integer TIFF.
pub fn encode_u16(width: u32, height: u32, samples: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = TiffEncoder::new(Cursor::new(&mut bytes)).unwrap();
        encoder.write_image::<colortype::Gray16>(width, height, samples).unwrap();
    }
    bytes
}

/// Square float tile filled with one value.
pub fn constant_tile(size: u32, value: f32) -> Vec<u8> {
    encode_f32(size, size, &vec![value; (size * size) as usize])
}

/// Extent of [`coordinate_store`].
pub fn coordinate_extent() -> BoundingBox {
    BoundingBox::new(0.0, 0.0, 8.0, 8.0)
}

/// One zoom level of 2x2 tiles, 4x4 pixels each, over (0, 0)..(8, 8).
///
/// Every pixel holds `100 * y + x` in global pixel coordinates, except the
/// pixels listed in `nodata`.
pub fn coordinate_store(nodata: &[(u64, u64)]) -> MemoryTileStore {
    let extent = coordinate_extent();
    let set = TileMatrixSet::new(ProjectionId::web_mercator(), extent)
        .with_matrix(TileMatrix::for_extent(0, &extent, 2, 2, 4, 4))
        .unwrap();
    let mut store = MemoryTileStore::new(set);

    for row in 0..2u64 {
        for column in 0..2u64 {
            let samples: Vec<f32> = (0..16u64)
                .map(|i| {
                    let x = column * 4 + i % 4;
                    let y = row * 4 + i / 4;
                    if nodata.contains(&(x, y)) {
                        NODATA
                    } else {
                        (100 * y + x) as f32
                    }
                })
                .collect();
            store
                .insert_tile(0, row, column, encode_f32(4, 4, &samples), GriddedTile::default())
                .unwrap();
        }
    }
    store
}

/// Zoom levels 3 to 8 over (0, 0)..(256, 256) with 4 pixel tiles, `2^(z-3)` tiles across.
///
/// Only the bottom-left tile of each level in `data_zooms` is stored,
/// filled with the zoom level as its elevation.
pub fn sparse_pyramid(data_zooms: &[u32]) -> MemoryTileStore {
    let extent = BoundingBox::new(0.0, 0.0, 256.0, 256.0);
    let mut set = TileMatrixSet::new(ProjectionId::web_mercator(), extent);
    for zoom in 3..=8 {
        let tiles = 1u64 << (zoom - 3);
        set.add_matrix(TileMatrix::for_extent(zoom, &extent, tiles, tiles, 4, 4)).unwrap();
    }
    let mut store = MemoryTileStore::new(set);
    for &zoom in data_zooms {
        let last = (1u64 << (zoom - 3)) - 1;
        store
            .insert_tile(zoom, last, 0, constant_tile(4, zoom as f32), GriddedTile::default())
            .unwrap();
    }
    store
}
