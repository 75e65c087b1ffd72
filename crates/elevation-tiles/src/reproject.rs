//! Reprojection of assembled grids into the request projection.

use crate::bounds::BoundingBox;
use crate::grid::ElevationGrid;
use crate::interpolate::{Interpolator, SampleWindow};
use crate::projection::CoordinateTransform;
use crate::{ElevationError, Result};
use tracing::debug;

/// Sample window over an assembled grid; coordinates outside clamp to the edge.
pub struct GridWindow<'a> {
    grid: &'a ElevationGrid,
}

impl<'a> GridWindow<'a> {
    /// Wrap a non-empty grid.
    pub fn new(grid: &'a ElevationGrid) -> Self {
        Self { grid }
    }
}

impl SampleWindow for GridWindow<'_> {
    fn sample(&self, x: i64, y: i64) -> Result<Option<f64>> {
        let max_x = self.grid.width() as i64 - 1;
        let max_y = self.grid.height() as i64 - 1;
        if max_x < 0 || max_y < 0 {
            return Ok(None);
        }
        Ok(self.grid.get(x.clamp(0, max_x) as usize, y.clamp(0, max_y) as usize))
    }
}

/// Resamples a grid in the data projection onto a grid in the request projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reprojector {
    interpolator: Interpolator,
}

impl Reprojector {
    /// Create a reprojector sampling with `interpolator`.
    pub fn new(interpolator: Interpolator) -> Self {
        Self { interpolator }
    }

    /// Produce a `width` x `height` grid spanning `request_box`.
    ///
    /// Each destination pixel center is mapped through `transform` (request
    /// to data projection) into `grid`, which spans `native_box`.
    pub fn reproject<T>(
        &self,
        grid: &ElevationGrid,
        native_box: &BoundingBox,
        transform: &T,
        request_box: &BoundingBox,
        width: usize,
        height: usize,
    ) -> Result<ElevationGrid>
    where
        T: CoordinateTransform + ?Sized,
    {
        if width == 0 || height == 0 {
            return Err(ElevationError::InvalidRequest(format!(
                "cannot reproject into a {}x{} grid",
                width, height
            )));
        }

        let window = GridWindow::new(grid);
        let mut reprojected = ElevationGrid::new(width, height);

        let x_step = request_box.width() / width as f64;
        let y_step = request_box.height() / height as f64;
        let x_scale = grid.width() as f64 / native_box.width();
        let y_scale = grid.height() as f64 / native_box.height();

        for y in 0..height {
            let request_y = request_box.max_y - (y as f64 + 0.5) * y_step;
            for x in 0..width {
                let request_x = request_box.min_x + (x as f64 + 0.5) * x_step;
                let (native_x, native_y) = transform.transform(request_x, request_y);

                let pixel_x = (native_x - native_box.min_x) * x_scale;
                let pixel_y = (native_box.max_y - native_y) * y_scale;
                if !pixel_x.is_finite() || !pixel_y.is_finite() {
                    continue;
                }

                let value = self.interpolator.sample(&window, pixel_x, pixel_y)?;
                reprojected.set(x, y, value);
            }
        }

        debug!(
            "Reprojector: {}x{} native grid to {}x{} ({})",
            grid.width(),
            grid.height(),
            width,
            height,
            self.interpolator.algorithm()
        );
        Ok(reprojected)
    }
}
