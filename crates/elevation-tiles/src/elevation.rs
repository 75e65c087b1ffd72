//! Elevation query entry point.

use crate::bounds::BoundingBox;
use crate::config::{InterpolationAlgorithm, QueryConfig};
use crate::grid::ElevationTileResults;
use crate::interpolate::Interpolator;
use crate::matrix::TileMatrixCatalog;
use crate::mosaic::MosaicAssembler;
use crate::pixel::PixelSource;
use crate::projection::{transform_between, CoordinateTransform, Identity, ProjectionId};
use crate::reproject::Reprojector;
use crate::request::ElevationRequest;
use crate::store::TileStore;
use crate::unbounded::UnboundedMosaicAssembler;
use crate::zoom::{ZoomPolicy, ZoomResolver};
use crate::{ElevationError, Result};
use tracing::debug;

/// Answers elevation queries against one tile store.
///
/// Requests are given in the request projection, which defaults to the
/// projection of the stored data. When the two differ, requests are
/// transformed into the data projection, assembled there and reprojected
/// back.
///
/// # Example
///
/// ```no_run
/// use elevation_tiles::{
///     BoundingBox, ElevationTiles, GriddedCoverage, MemoryTileStore, ProjectionId,
///     QueryConfig, TiffPixelSource, TileMatrix, TileMatrixSet,
/// };
///
/// let extent = BoundingBox::new(0.0, 0.0, 512.0, 512.0);
/// let set = TileMatrixSet::new(ProjectionId::web_mercator(), extent)
///     .with_matrix(TileMatrix::for_extent(0, &extent, 2, 2, 256, 256))?;
/// let store = MemoryTileStore::new(set);
/// let tiles = ElevationTiles::new(store, TiffPixelSource::new(GriddedCoverage::float(None)))
///     .with_config(QueryConfig::from_yaml_str("algorithm: bilinear")?);
///
/// if let Some(elevation) = tiles.get_elevation(100.0, 100.0)? {
///     println!("elevation: {} meters", elevation);
/// }
/// # Ok::<(), elevation_tiles::ElevationError>(())
/// ```
pub struct ElevationTiles<S: TileStore, P: PixelSource> {
    store: S,
    source: P,
    config: QueryConfig,
    request_projection: ProjectionId,
    transform: Box<dyn CoordinateTransform + Send + Sync>,
}

impl<S: TileStore, P: PixelSource> ElevationTiles<S, P> {
    /// Query `store` in its own projection with the default configuration.
    pub fn new(store: S, source: P) -> Self {
        let request_projection = store.catalog().projection().clone();
        Self {
            store,
            source,
            config: QueryConfig::default(),
            request_projection,
            transform: Box::new(Identity),
        }
    }

    /// Replace the query configuration.
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Accept requests in `projection`, using a built-in transform to the data projection.
    pub fn with_request_projection(self, projection: ProjectionId) -> Result<Self> {
        let data_projection = self.data_projection().clone();
        let transform = transform_between(&projection, &data_projection).ok_or_else(|| {
            ElevationError::MissingTransform {
                from: projection.to_string(),
                to: data_projection.to_string(),
            }
        })?;
        Ok(self.with_transform(projection, transform))
    }

    /// Accept requests in `projection`, using `transform` to reach the data projection.
    pub fn with_transform(
        mut self,
        projection: ProjectionId,
        transform: Box<dyn CoordinateTransform + Send + Sync>,
    ) -> Self {
        self.request_projection = projection;
        self.transform = transform;
        self
    }

    /// Current query configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Replace the query configuration in place.
    pub fn set_config(&mut self, config: QueryConfig) {
        self.config = config;
    }

    /// Change the interpolation algorithm.
    pub fn set_algorithm(&mut self, algorithm: InterpolationAlgorithm) {
        self.config.algorithm = algorithm;
    }

    /// Change the zoom fallback policy.
    pub fn set_zoom_policy(&mut self, policy: ZoomPolicy) {
        self.config.zoom_in = policy.zoom_in;
        self.config.zoom_out = policy.zoom_out;
        self.config.zoom_in_before_out = policy.zoom_in_before_out;
    }

    /// The underlying tile store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The pixel source decoding tiles.
    pub fn pixel_source(&self) -> &P {
        &self.source
    }

    /// Projection of request coordinates.
    pub fn request_projection(&self) -> &ProjectionId {
        &self.request_projection
    }

    /// Projection of the stored elevation data.
    pub fn data_projection(&self) -> &ProjectionId {
        self.store.catalog().projection()
    }

    /// Check if requests are already in the data projection.
    pub fn is_same_projection(&self) -> bool {
        self.request_projection == *self.data_projection()
    }

    /// Elevation at a single coordinate, `None` without coverage or data.
    pub fn get_elevation(&self, x: f64, y: f64) -> Result<Option<f64>> {
        let request = ElevationRequest::point(x, y, self.request_projection.clone())?;
        let results = self.query(request, Some(1), Some(1))?;
        Ok(results.and_then(|r| r.get(0, 0)))
    }

    /// Elevations within a bounding box at the configured size.
    pub fn get_elevations(&self, bounding_box: BoundingBox) -> Result<Option<ElevationTileResults>> {
        let request = ElevationRequest::new(bounding_box, self.request_projection.clone())?;
        self.query(request, self.config.width, self.config.height)
    }

    /// Elevations within a bounding box resampled to `width` x `height`.
    pub fn get_elevations_sized(
        &self,
        bounding_box: BoundingBox,
        width: u32,
        height: u32,
    ) -> Result<Option<ElevationTileResults>> {
        let request = ElevationRequest::new(bounding_box, self.request_projection.clone())?;
        self.query(request, Some(width), Some(height))
    }

    /// Elevations within a bounding box at the native resolution of the stored tiles.
    pub fn get_elevations_unbounded(&self, bounding_box: BoundingBox) -> Result<Option<ElevationTileResults>> {
        let request = self.prepare(ElevationRequest::new(bounding_box, self.request_projection.clone())?)?;
        let interpolator = self.interpolator();

        let resolver = ZoomResolver::new(&self.store, ZoomPolicy::from(&self.config));
        let mut results = match resolver.results(&request, 0)? {
            Some(results) => results,
            None => return Ok(None),
        };
        let matrix = *results.tile_matrix();
        let extent = self.store.catalog().bounding_box();

        let grid = UnboundedMosaicAssembler::new(&self.source).assemble(&matrix, &extent, results.cursor(), &request)?;
        drop(results);

        let grid = match grid {
            Some(grid) if !self.is_same_projection() && !request.is_point() => {
                let (width, height) = (grid.width(), grid.height());
                Reprojector::new(interpolator).reproject(
                    &grid,
                    request.projected_bounding_box(),
                    self.transform.as_ref(),
                    request.bounding_box(),
                    width,
                    height,
                )?
            }
            Some(grid) => grid,
            None => return Ok(None),
        };
        Ok(Some(ElevationTileResults::new(grid, matrix)))
    }

    /// Run a bounded request, sized `width` x `height` or by the selected tile matrix.
    ///
    /// The request must be in the configured request projection; anything
    /// else fails with [`ElevationError::InvalidRequest`].
    pub fn query(
        &self,
        request: ElevationRequest,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Option<ElevationTileResults>> {
        let request = self.prepare(request)?;
        let interpolator = self.interpolator();

        let resolver = ZoomResolver::new(&self.store, ZoomPolicy::from(&self.config));
        let mut results = match resolver.results(&request, interpolator.overlapping_pixels())? {
            Some(results) => results,
            None => return Ok(None),
        };
        let matrix = *results.tile_matrix();
        let extent = self.store.catalog().bounding_box();

        let requested_width = width.unwrap_or(matrix.tile_width) as usize;
        let requested_height = height.unwrap_or(matrix.tile_height) as usize;

        // Native grid at the matrix resolution when the projections differ
        let reproject = !self.is_same_projection() && !request.is_point();
        let (native_width, native_height) = if self.is_same_projection() {
            (requested_width, requested_height)
        } else {
            let projected = request.projected_bounding_box();
            let native = |extent: f64, pixel: f64, fallback: usize| match (extent / pixel).round() {
                n if n >= 1.0 && n.is_finite() => n as usize,
                _ => fallback,
            };
            (
                native(projected.width(), matrix.pixel_x_size, requested_width),
                native(projected.height(), matrix.pixel_y_size, requested_height),
            )
        };

        let grid = MosaicAssembler::new(&self.source, interpolator).assemble(
            &matrix,
            &extent,
            results.cursor(),
            &request,
            native_width,
            native_height,
        )?;
        drop(results);

        let grid = match grid {
            Some(grid) if reproject => Reprojector::new(interpolator).reproject(
                &grid,
                request.projected_bounding_box(),
                self.transform.as_ref(),
                request.bounding_box(),
                requested_width,
                requested_height,
            )?,
            Some(grid) => grid,
            None => {
                debug!("ElevationTiles: no elevations at zoom {}", matrix.zoom_level);
                return Ok(None);
            }
        };
        Ok(Some(ElevationTileResults::new(grid, matrix)))
    }

    /// Project a request into the data projection when the projections differ.
    fn prepare(&self, request: ElevationRequest) -> Result<ElevationRequest> {
        if request.projection() != &self.request_projection {
            return Err(ElevationError::InvalidRequest(format!(
                "request is in {}, queries expect {}",
                request.projection(),
                self.request_projection
            )));
        }
        Ok(if self.is_same_projection() {
            request
        } else {
            request.project(self.transform.as_ref())
        })
    }

    fn interpolator(&self) -> Interpolator {
        Interpolator::new(self.config.algorithm)
    }
}

impl<S: TileStore, P: PixelSource> std::fmt::Debug for ElevationTiles<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevationTiles")
            .field("config", &self.config)
            .field("request_projection", &self.request_projection)
            .field("data_projection", self.data_projection())
            .finish()
    }
}
