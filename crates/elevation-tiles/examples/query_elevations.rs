//! Example: Query a synthetic elevation pyramid.
//!
//! Builds a two level pyramid of TIFF tiles in memory, then queries a point
//! and a bounding box with each interpolation algorithm.
//!
//! Usage: cargo run --example query_elevations -- [config.yaml]
//!
//! Set `RUST_LOG=elevation_tiles=debug` to see zoom selection and assembly.

use elevation_tiles::{
    BoundingBox, ElevationTiles, GriddedCoverage, GriddedTile, InterpolationAlgorithm, MemoryTileStore,
    ProjectionId, QueryConfig, TiffPixelSource, TileMatrix, TileMatrixSet,
};
use std::env;
use std::io::Cursor;
use std::time::Instant;
use tiff::encoder::{colortype, TiffEncoder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TILE_SIZE: u32 = 64;
const EXTENT: f64 = 4096.0;
const NODATA: f32 = -9999.0;

/// Rolling hills with a lake of no data in one corner.
fn terrain(x: f64, y: f64) -> f32 {
    if x < 300.0 && y < 300.0 {
        return NODATA;
    }
    (500.0 + 120.0 * (x / 700.0).sin() + 80.0 * (y / 450.0).cos()) as f32
}

fn encode_tile(matrix: &TileMatrix, row: u64, column: u64) -> Vec<u8> {
    let mut samples = Vec::with_capacity((TILE_SIZE * TILE_SIZE) as usize);
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            let ground_x = (column as f64 * TILE_SIZE as f64 + x as f64 + 0.5) * matrix.pixel_x_size;
            let ground_y = EXTENT - (row as f64 * TILE_SIZE as f64 + y as f64 + 0.5) * matrix.pixel_y_size;
            samples.push(terrain(ground_x, ground_y));
        }
    }

    let mut bytes = Vec::new();
    {
        let mut encoder = TiffEncoder::new(Cursor::new(&mut bytes)).expect("Failed to create TIFF encoder");
        encoder
            .write_image::<colortype::Gray32Float>(TILE_SIZE, TILE_SIZE, &samples)
            .expect("Failed to encode tile");
    }
    bytes
}

fn build_store() -> MemoryTileStore {
    let extent = BoundingBox::new(0.0, 0.0, EXTENT, EXTENT);
    let set = TileMatrixSet::new(ProjectionId::web_mercator(), extent)
        .with_matrix(TileMatrix::for_extent(0, &extent, 4, 4, TILE_SIZE, TILE_SIZE))
        .and_then(|set| set.with_matrix(TileMatrix::for_extent(1, &extent, 8, 8, TILE_SIZE, TILE_SIZE)))
        .expect("Failed to build tile matrix set");

    let mut store = MemoryTileStore::new(set);
    for (zoom, tiles) in [(0u32, 4u64), (1, 8)] {
        let matrix = TileMatrix::for_extent(zoom, &extent, tiles, tiles, TILE_SIZE, TILE_SIZE);
        for row in 0..tiles {
            for column in 0..tiles {
                store
                    .insert_tile(zoom, row, column, encode_tile(&matrix, row, column), GriddedTile::default())
                    .expect("Failed to store tile");
            }
        }
    }
    store
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match env::args().nth(1) {
        Some(path) => QueryConfig::from_yaml_file(&path).expect("Failed to load configuration"),
        None => QueryConfig::default(),
    };

    println!("Building pyramid...");
    let start = Instant::now();
    let store = build_store();
    println!("Stored {} tiles in {:.3}s", store.tile_count(), start.elapsed().as_secs_f64());

    let mut tiles = ElevationTiles::new(store, TiffPixelSource::new(GriddedCoverage::float(Some(NODATA as f64))))
        .with_config(config);

    let (x, y) = (1234.5, 2345.6);
    let bbox = BoundingBox::new(1000.0, 1000.0, 2000.0, 1500.0);

    for algorithm in [
        InterpolationAlgorithm::NearestNeighbor,
        InterpolationAlgorithm::Bilinear,
        InterpolationAlgorithm::Bicubic,
    ] {
        tiles.set_algorithm(algorithm);
        println!("\n{}:", algorithm);

        match tiles.get_elevation(x, y) {
            Ok(Some(elevation)) => println!("  Elevation at ({}, {}): {:.2} meters", x, y, elevation),
            Ok(None) => println!("  No elevation at ({}, {})", x, y),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        let query_start = Instant::now();
        match tiles.get_elevations_sized(bbox, 20, 10) {
            Ok(Some(results)) => {
                let grid = results.grid();
                println!(
                    "  {}x{} grid from zoom {} in {:.3}s, {} values",
                    grid.width(),
                    grid.height(),
                    results.zoom_level(),
                    query_start.elapsed().as_secs_f64(),
                    grid.data_count()
                );
                if let Some((min, max)) = grid.min_max() {
                    println!("  Range: {:.2} to {:.2} meters", min, max);
                }
            }
            Ok(None) => println!("  No elevations in {:?}", bbox),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    // The lake corner holds no data
    match tiles.get_elevation(100.0, 100.0) {
        Ok(value) => println!("\nElevation in the lake: {:?}", value),
        Err(e) => eprintln!("Error: {}", e),
    }

    match tiles.get_elevations_unbounded(BoundingBox::new(0.0, 0.0, 512.0, 512.0)) {
        Ok(Some(results)) => println!(
            "Native grid: {}x{} at zoom {}",
            results.width(),
            results.height(),
            results.zoom_level()
        ),
        Ok(None) => println!("No native grid"),
        Err(e) => eprintln!("Error: {}", e),
    }
}
