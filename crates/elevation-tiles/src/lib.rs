//! # elevation-tiles
//!
//! Elevation queries over tiled raster pyramids, such as the gridded
//! coverage tables of a GeoPackage.
//!
//! A pyramid stores elevation tiles at several zoom levels, each level a
//! [`TileMatrix`] of fixed size tiles laid over one projected extent. This
//! crate answers point and bounding box queries against such a pyramid:
//!
//! - [`ZoomResolver`] picks the zoom level whose tile size best matches the
//!   request, falling back to finer or coarser levels when tiles are missing
//! - [`MosaicAssembler`] streams the overlapping tiles in row-major order and
//!   resamples them into a fixed size grid, carrying edge pixels between
//!   neighboring tiles so interpolation is seamless
//! - [`UnboundedMosaicAssembler`] copies the native pixels of the overlapping
//!   tiles without resampling
//! - [`Interpolator`] samples with nearest neighbor, bilinear or bicubic
//!   interpolation
//! - [`Reprojector`] resamples results into the request projection when it
//!   differs from the data projection; EPSG projections other than WGS84 and
//!   Web Mercator are transformed with [`Proj4Transform`]
//!
//! [`ElevationTiles`] ties these together over a [`TileStore`] and a
//! [`PixelSource`].
//!
//! ## Tile storage
//!
//! Stores implement [`TileStore`] and hand out tiles through a [`TileCursor`]
//! in row-major order. [`MemoryTileStore`] keeps tiles in memory. Tile
//! payloads are decoded by a [`PixelSource`]; [`TiffPixelSource`] reads TIFF
//! encoded tiles and applies the coverage scale, offset and nodata value.
//!
//! ## Examples
//!
//! ```no_run
//! use elevation_tiles::{
//!     BoundingBox, ElevationTiles, GriddedCoverage, InterpolationAlgorithm, MemoryTileStore,
//!     ProjectionId, TiffPixelSource, TileMatrix, TileMatrixSet,
//! };
//!
//! let extent = BoundingBox::new(-20037508.34, -20037508.34, 20037508.34, 20037508.34);
//! let set = TileMatrixSet::new(ProjectionId::web_mercator(), extent)
//!     .with_matrix(TileMatrix::for_extent(0, &extent, 1, 1, 256, 256))?
//!     .with_matrix(TileMatrix::for_extent(1, &extent, 2, 2, 256, 256))?;
//! let store = MemoryTileStore::new(set);
//!
//! let mut tiles = ElevationTiles::new(store, TiffPixelSource::new(GriddedCoverage::float(Some(-9999.0))))
//!     .with_request_projection(ProjectionId::wgs84())?;
//! tiles.set_algorithm(InterpolationAlgorithm::Bicubic);
//!
//! // Single coordinate
//! if let Some(elevation) = tiles.get_elevation(-122.33, 47.61)? {
//!     println!("Elevation: {} meters", elevation);
//! }
//!
//! // A 64x64 grid over a box
//! if let Some(results) = tiles.get_elevations_sized(BoundingBox::new(-123.0, 47.0, -122.0, 48.0), 64, 64)? {
//!     println!("zoom {}: {:?}", results.zoom_level(), results.grid().min_max());
//! }
//! # Ok::<(), elevation_tiles::ElevationError>(())
//! ```

mod bounds;
mod codec;
mod config;
mod edge;
mod elevation;
mod error;
mod grid;
mod interpolate;
mod matrix;
mod memory;
mod mosaic;
mod pixel;
mod projection;
mod reproject;
mod request;
mod store;
mod unbounded;
mod zoom;

pub use bounds::{BoundingBox, PixelRect, TileGrid};
pub use codec::{TiffPixelSource, TiffTileImage};
pub use config::{InterpolationAlgorithm, QueryConfig};
pub use edge::{EdgeBuffer, EdgeState, Neighbors};
pub use elevation::ElevationTiles;
pub use error::ElevationError;
pub use grid::{ElevationGrid, ElevationTileResults};
pub use interpolate::{cubic_convolution, Interpolator, PixelMapping, SampleWindow, TileWindow};
pub use matrix::{TileMatrix, TileMatrixCatalog, TileMatrixSet};
pub use memory::MemoryTileStore;
pub use mosaic::MosaicAssembler;
pub use pixel::{GriddedCoverage, GriddedDataType, GriddedTile, PixelSource, TileImage};
pub use projection::{
    transform_between, CoordinateTransform, Identity, Proj4Transform, ProjectionId, WebMercatorToWgs84,
    Wgs84ToWebMercator,
};
pub use reproject::{GridWindow, Reprojector};
pub use request::ElevationRequest;
pub use store::{CursorGuard, StoredTile, TileCursor, TileStore};
pub use unbounded::UnboundedMosaicAssembler;
pub use zoom::{ElevationTileMatrixResults, ZoomPolicy, ZoomResolver};

/// Result type for elevation operations.
pub type Result<T> = std::result::Result<T, ElevationError>;
