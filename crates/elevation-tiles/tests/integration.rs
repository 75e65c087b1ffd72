//! End-to-end queries through `ElevationTiles` over TIFF tiles held in memory.

mod common;

use approx::assert_relative_eq;
use common::{coordinate_extent, coordinate_store, constant_tile, encode_u16, sparse_pyramid, NODATA};
use elevation_tiles::{
    BoundingBox, CoordinateTransform, ElevationError, ElevationRequest, ElevationTiles, GriddedCoverage, GriddedTile,
    InterpolationAlgorithm, MemoryTileStore, ProjectionId, QueryConfig, Result, StoredTile, TiffPixelSource,
    TileCursor, TileGrid, TileMatrix, TileMatrixSet, TileStore, Wgs84ToWebMercator, ZoomPolicy,
};

fn float_source() -> TiffPixelSource {
    TiffPixelSource::new(GriddedCoverage::float(Some(NODATA as f64)))
}

fn coordinate_tiles(algorithm: InterpolationAlgorithm) -> ElevationTiles<MemoryTileStore, TiffPixelSource> {
    let mut tiles = ElevationTiles::new(coordinate_store(&[]), float_source());
    tiles.set_algorithm(algorithm);
    tiles
}

#[test]
fn test_request_outside_coverage() {
    let tiles = coordinate_tiles(InterpolationAlgorithm::NearestNeighbor);
    let result = tiles
        .get_elevations_sized(BoundingBox::new(20.0, 20.0, 30.0, 30.0), 4, 4)
        .unwrap();
    assert!(result.is_none());
    assert_eq!(tiles.get_elevation(-5.0, 3.0).unwrap(), None);
}

#[test]
fn test_native_size_nearest_matches_stored_pixels() {
    let tiles = ElevationTiles::new(coordinate_store(&[(5, 2)]), float_source());
    let results = tiles.get_elevations_sized(coordinate_extent(), 8, 8).unwrap().unwrap();

    assert_eq!(results.zoom_level(), 0);
    assert_eq!((results.width(), results.height()), (8, 8));
    for y in 0..8 {
        for x in 0..8 {
            let expected = if (x, y) == (5, 2) { None } else { Some((100 * y + x) as f64) };
            assert_eq!(results.get(x, y), expected, "pixel ({}, {})", x, y);
        }
    }
    assert_eq!(results.grid().data_count(), 63);
}

#[test]
fn test_two_tiles_into_two_pixels() {
    let extent = BoundingBox::new(0.0, 0.0, 512.0, 256.0);
    let set = TileMatrixSet::new(ProjectionId::web_mercator(), extent)
        .with_matrix(TileMatrix::for_extent(0, &extent, 2, 1, 256, 256))
        .unwrap();
    let mut store = MemoryTileStore::new(set);
    store.insert_tile(0, 0, 0, constant_tile(256, 10.0), GriddedTile::default()).unwrap();
    store.insert_tile(0, 0, 1, constant_tile(256, 20.0), GriddedTile::default()).unwrap();

    let tiles = ElevationTiles::new(store, float_source());
    let results = tiles.get_elevations_sized(extent, 2, 1).unwrap().unwrap();
    assert_eq!(results.grid().to_rows(), vec![vec![Some(10.0), Some(20.0)]]);
}

/// 2x2 tiles of 4x4 pixels over (0, 0)..(8, 8), every pixel `value`.
fn constant_store(value: f32) -> MemoryTileStore {
    let extent = coordinate_extent();
    let set = TileMatrixSet::new(ProjectionId::web_mercator(), extent)
        .with_matrix(TileMatrix::for_extent(0, &extent, 2, 2, 4, 4))
        .unwrap();
    let mut store = MemoryTileStore::new(set);
    for row in 0..2 {
        for column in 0..2 {
            store
                .insert_tile(0, row, column, constant_tile(4, value), GriddedTile::default())
                .unwrap();
        }
    }
    store
}

#[test]
fn test_point_under_every_algorithm() {
    let mut tiles = ElevationTiles::new(constant_store(42.0), float_source());
    for algorithm in [
        InterpolationAlgorithm::NearestNeighbor,
        InterpolationAlgorithm::Bilinear,
        InterpolationAlgorithm::Bicubic,
    ] {
        tiles.set_algorithm(algorithm);
        assert_eq!(tiles.get_elevation(1.7, 6.2).unwrap(), Some(42.0), "{}", algorithm);
    }
}

#[test]
fn test_points_near_right_and_lower_tile_edges() {
    let mut tiles = ElevationTiles::new(constant_store(42.0), float_source());
    for algorithm in [
        InterpolationAlgorithm::NearestNeighbor,
        InterpolationAlgorithm::Bilinear,
        InterpolationAlgorithm::Bicubic,
    ] {
        tiles.set_algorithm(algorithm);
        // Inside the top-left tile, but the kernel reaches into the tiles right of and below it
        assert_eq!(tiles.get_elevation(3.9, 6.0).unwrap(), Some(42.0), "{}", algorithm);
        assert_eq!(tiles.get_elevation(3.9, 4.1).unwrap(), Some(42.0), "{}", algorithm);
        assert_eq!(tiles.get_elevation(4.0, 4.0).unwrap(), Some(42.0), "{}", algorithm);
    }
}

#[test]
fn test_single_tile_box_fills_edges_from_neighbors() {
    let mut tiles = ElevationTiles::new(constant_store(42.0), float_source());
    tiles.set_algorithm(InterpolationAlgorithm::Bilinear);
    let results = tiles
        .get_elevations_sized(BoundingBox::new(0.0, 4.0, 4.0, 8.0), 4, 4)
        .unwrap()
        .unwrap();
    assert_eq!(results.grid().data_count(), 16);
    assert!(results.grid().values().iter().all(|v| *v == Some(42.0)));
}

#[test]
fn test_bilinear_is_seamless_across_tiles() {
    let tiles = coordinate_tiles(InterpolationAlgorithm::Bilinear);
    let results = tiles
        .get_elevations_sized(BoundingBox::new(1.0, 1.0, 7.0, 7.0), 12, 12)
        .unwrap()
        .unwrap();

    // Pixel values are linear in x and y, so bilinear output is exact everywhere
    for y in 0..12 {
        for x in 0..12 {
            let source_x = 1.0 + (x as f64 + 0.5) * 0.5;
            let source_y = 1.0 + (y as f64 + 0.5) * 0.5;
            let value = results.get(x, y).unwrap();
            assert_relative_eq!(value, 100.0 * (source_y - 0.5) + (source_x - 0.5), epsilon = 1e-9);
        }
    }
}

#[test]
fn test_integer_coverage_decoding() {
    let extent = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
    let set = TileMatrixSet::new(ProjectionId::web_mercator(), extent)
        .with_matrix(TileMatrix::for_extent(0, &extent, 1, 1, 4, 4))
        .unwrap();
    let mut samples = [100u16; 16];
    samples[0] = u16::MAX;
    let mut store = MemoryTileStore::new(set);
    store
        .insert_tile(0, 0, 0, encode_u16(4, 4, &samples), GriddedTile { scale: 2.0, offset: 1.0 })
        .unwrap();

    let source = TiffPixelSource::new(GriddedCoverage::integer(0.5, 10.0, Some(u16::MAX as f64)));
    let tiles = ElevationTiles::new(store, source);
    assert_eq!(tiles.get_elevation(2.5, 1.5).unwrap(), Some(110.5));
    assert_eq!(tiles.get_elevation(0.5, 3.5).unwrap(), None);
}

#[test]
fn test_zoom_out_fallback() {
    let mut tiles = ElevationTiles::new(sparse_pyramid(&[5]), float_source());
    tiles.set_zoom_policy(ZoomPolicy {
        zoom_in: false,
        zoom_out: true,
        zoom_in_before_out: true,
    });

    // Closest level for a 16 unit box is zoom 7, which holds no tiles
    let results = tiles
        .get_elevations_sized(BoundingBox::new(0.0, 0.0, 16.0, 16.0), 2, 2)
        .unwrap()
        .unwrap();
    assert_eq!(results.zoom_level(), 5);
    assert_eq!(results.grid().to_rows(), vec![vec![Some(5.0); 2]; 2]);
    assert_eq!(tiles.store().open_cursors(), 0);
}

#[test]
fn test_zoom_in_preferred_over_zoom_out() {
    let tiles = ElevationTiles::new(sparse_pyramid(&[5, 8]), float_source());
    let results = tiles
        .get_elevations_sized(BoundingBox::new(0.0, 0.0, 16.0, 16.0), 2, 2)
        .unwrap()
        .unwrap();
    assert_eq!(results.zoom_level(), 8);

    let mut tiles = tiles;
    tiles.set_zoom_policy(ZoomPolicy {
        zoom_in: false,
        zoom_out: false,
        zoom_in_before_out: true,
    });
    assert!(tiles
        .get_elevations_sized(BoundingBox::new(0.0, 0.0, 16.0, 16.0), 2, 2)
        .unwrap()
        .is_none());
}

#[test]
fn test_repeated_queries_are_identical() {
    let tiles = coordinate_tiles(InterpolationAlgorithm::Bicubic);
    let bbox = BoundingBox::new(0.5, 1.5, 7.5, 6.0);
    let first = tiles.get_elevations_sized(bbox, 9, 5).unwrap().unwrap();
    let second = tiles.get_elevations_sized(bbox, 9, 5).unwrap().unwrap();
    assert_eq!(first.grid(), second.grid());
    assert_eq!(tiles.store().open_cursors(), 0);
}

#[test]
fn test_unbounded_joins_tiles_without_seam() {
    let tiles = coordinate_tiles(InterpolationAlgorithm::NearestNeighbor);
    let results = tiles
        .get_elevations_unbounded(BoundingBox::new(0.0, 4.0, 8.0, 8.0))
        .unwrap()
        .unwrap();

    assert_eq!((results.width(), results.height()), (8, 4));
    for y in 0..4 {
        for x in 0..8 {
            assert_eq!(results.get(x, y), Some((100 * y + x) as f64));
        }
    }
}

/// Store whose cursors fail after yielding one tile.
struct FailingStore {
    inner: MemoryTileStore,
}

struct FailingCursor<'a> {
    inner: Box<dyn TileCursor + 'a>,
    yielded: usize,
}

impl TileCursor for FailingCursor<'_> {
    fn tile_count(&self) -> usize {
        self.inner.tile_count()
    }

    fn next_tile(&mut self) -> Result<Option<StoredTile>> {
        if self.yielded > 0 {
            return Err(ElevationError::Storage("connection lost".to_string()));
        }
        self.yielded += 1;
        self.inner.next_tile()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

impl TileStore for FailingStore {
    type Catalog = TileMatrixSet;

    fn catalog(&self) -> &TileMatrixSet {
        self.inner.catalog()
    }

    fn query_tiles(&self, grid: &TileGrid, zoom: u32) -> Result<Box<dyn TileCursor + '_>> {
        let inner = self.inner.query_tiles(grid, zoom)?;
        Ok(Box::new(FailingCursor { inner, yielded: 0 }))
    }
}

#[test]
fn test_cursor_released_on_storage_error() {
    let store = FailingStore {
        inner: coordinate_store(&[]),
    };
    let tiles = ElevationTiles::new(store, float_source());

    let result = tiles.get_elevations_sized(coordinate_extent(), 8, 8);
    assert!(matches!(result, Err(ElevationError::Storage(_))));
    assert_eq!(tiles.store().inner.open_cursors(), 0);

    let result = tiles.get_elevations_unbounded(coordinate_extent());
    assert!(matches!(result, Err(ElevationError::Storage(_))));
    assert_eq!(tiles.store().inner.open_cursors(), 0);
}

#[test]
fn test_malformed_tile_fails_query() {
    let extent = coordinate_extent();
    let set = TileMatrixSet::new(ProjectionId::web_mercator(), extent)
        .with_matrix(TileMatrix::for_extent(0, &extent, 2, 2, 4, 4))
        .unwrap();
    let mut store = MemoryTileStore::new(set);
    store.insert_tile(0, 0, 0, vec![1u8, 2, 3], GriddedTile::default()).unwrap();

    let tiles = ElevationTiles::new(store, float_source());
    let result = tiles.get_elevations_sized(extent, 8, 8);
    assert!(matches!(result, Err(ElevationError::MalformedTile { row: 0, column: 0, .. })));
    assert_eq!(tiles.store().open_cursors(), 0);
}

#[test]
fn test_wgs84_requests_against_web_mercator_tiles() {
    let extent = Wgs84ToWebMercator.transform_bounds(&BoundingBox::new(-10.0, -10.0, 10.0, 10.0));
    let set = TileMatrixSet::new(ProjectionId::web_mercator(), extent)
        .with_matrix(TileMatrix::for_extent(0, &extent, 2, 2, 16, 16))
        .unwrap();
    let mut store = MemoryTileStore::new(set);
    for row in 0..2 {
        for column in 0..2 {
            store
                .insert_tile(0, row, column, constant_tile(16, 7.0), GriddedTile::default())
                .unwrap();
        }
    }

    let tiles = ElevationTiles::new(store, float_source())
        .with_request_projection(ProjectionId::wgs84())
        .unwrap();
    assert!(!tiles.is_same_projection());

    let results = tiles
        .get_elevations_sized(BoundingBox::new(-5.0, -5.0, 5.0, 5.0), 4, 4)
        .unwrap()
        .unwrap();
    assert_eq!((results.width(), results.height()), (4, 4));
    for value in results.grid().values() {
        assert_relative_eq!(value.unwrap(), 7.0);
    }

    assert_eq!(tiles.get_elevation(1.0, 1.0).unwrap(), Some(7.0));
    assert_eq!(tiles.get_elevation(20.0, 1.0).unwrap(), None);
}

#[test]
fn test_unknown_request_projection() {
    let result = ElevationTiles::new(coordinate_store(&[]), float_source())
        .with_request_projection(ProjectionId::new("ESRI", 54030));
    assert!(matches!(result, Err(ElevationError::MissingTransform { .. })));
}

#[test]
fn test_registry_projection_is_accepted() {
    let tiles = ElevationTiles::new(coordinate_store(&[]), float_source())
        .with_request_projection(ProjectionId::new("EPSG", 27700))
        .unwrap();
    assert!(!tiles.is_same_projection());
}

#[test]
fn test_query_rejects_request_in_other_projection() {
    let tiles = coordinate_tiles(InterpolationAlgorithm::NearestNeighbor);
    let request = ElevationRequest::new(BoundingBox::new(1.0, 1.0, 3.0, 3.0), ProjectionId::wgs84()).unwrap();
    let result = tiles.query(request, Some(2), Some(2));
    assert!(matches!(result, Err(ElevationError::InvalidRequest(_))));

    let request = ElevationRequest::new(BoundingBox::new(1.0, 1.0, 3.0, 3.0), ProjectionId::web_mercator()).unwrap();
    let results = tiles.query(request, Some(2), Some(2)).unwrap().unwrap();
    assert_eq!(results.get(0, 0), Some(501.0));
}

#[test]
fn test_yaml_configuration() {
    let config = QueryConfig::from_yaml_str(
        "algorithm: bicubic\n\
         zoom_in: false\n\
         width: 4\n\
         height: 2\n",
    )
    .unwrap();
    assert_eq!(config.algorithm, InterpolationAlgorithm::Bicubic);
    assert!(!config.zoom_in);
    assert!(config.zoom_out);

    let tiles = ElevationTiles::new(coordinate_store(&[]), float_source()).with_config(config);
    let results = tiles.get_elevations(coordinate_extent()).unwrap().unwrap();
    assert_eq!((results.width(), results.height()), (4, 2));

    // Without a configured size the grid takes the tile size
    let tiles = ElevationTiles::new(coordinate_store(&[]), float_source());
    let results = tiles.get_elevations(coordinate_extent()).unwrap().unwrap();
    assert_eq!((results.width(), results.height()), (4, 4));
}

#[test]
fn test_invalid_requests() {
    let tiles = coordinate_tiles(InterpolationAlgorithm::NearestNeighbor);
    let inverted = tiles.get_elevations_sized(BoundingBox::new(4.0, 4.0, 2.0, 2.0), 2, 2);
    assert!(matches!(inverted, Err(ElevationError::InvalidRequest(_))));
    let line = tiles.get_elevations_sized(BoundingBox::new(1.0, 1.0, 5.0, 1.0), 2, 2);
    assert!(matches!(line, Err(ElevationError::InvalidRequest(_))));
    let empty = tiles.get_elevations_sized(coordinate_extent(), 0, 2);
    assert!(matches!(empty, Err(ElevationError::InvalidRequest(_))));
}
