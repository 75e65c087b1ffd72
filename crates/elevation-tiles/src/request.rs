//! Elevation requests.

use crate::bounds::BoundingBox;
use crate::projection::{CoordinateTransform, ProjectionId};
use crate::{ElevationError, Result};

/// A bounding box or point query in the caller's projection.
///
/// The box projected into the elevation data's projection is computed once
/// with [`ElevationRequest::project`] and fixed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationRequest {
    bounding_box: BoundingBox,
    projection: ProjectionId,
    projected_bounding_box: BoundingBox,
    point: bool,
}

impl ElevationRequest {
    /// Request the elevations within a bounding box.
    pub fn new(bounding_box: BoundingBox, projection: ProjectionId) -> Result<Self> {
        if !bounding_box.is_finite() || !bounding_box.is_valid() {
            return Err(ElevationError::InvalidRequest(format!(
                "bounding box {:?} is not a valid extent",
                bounding_box
            )));
        }

        let point = bounding_box.width() == 0.0 && bounding_box.height() == 0.0;
        if !point && (bounding_box.width() == 0.0 || bounding_box.height() == 0.0) {
            return Err(ElevationError::InvalidRequest(format!(
                "bounding box {:?} must be a point or have an area",
                bounding_box
            )));
        }

        Ok(Self {
            bounding_box,
            projection,
            projected_bounding_box: bounding_box,
            point,
        })
    }

    /// Request the elevation at a single coordinate.
    pub fn point(x: f64, y: f64, projection: ProjectionId) -> Result<Self> {
        Self::new(BoundingBox::point(x, y), projection)
    }

    /// Fix the projected bounding box using the request-to-data transform.
    pub fn project<T>(mut self, transform: &T) -> Self
    where
        T: CoordinateTransform + ?Sized,
    {
        self.projected_bounding_box = if self.point {
            let (x, y) = transform.transform(self.bounding_box.min_x, self.bounding_box.min_y);
            BoundingBox::point(x, y)
        } else {
            transform.transform_bounds(&self.bounding_box)
        };
        self
    }

    /// Requested bounding box in the request projection.
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// Requested bounding box in the elevation data projection.
    pub fn projected_bounding_box(&self) -> &BoundingBox {
        &self.projected_bounding_box
    }

    /// Projection of the request coordinates.
    pub fn projection(&self) -> &ProjectionId {
        &self.projection
    }

    /// Check if this is a single point query.
    pub fn is_point(&self) -> bool {
        self.point
    }

    /// Overlap of the projected request with a box in the data projection.
    pub fn overlap(&self, other: &BoundingBox) -> Option<BoundingBox> {
        self.projected_bounding_box.overlap(other)
    }

    /// Check that an overlap is not a sliver along an axis the request spans.
    ///
    /// Tiles that only touch an area request share an edge with it and
    /// contribute no pixels.
    pub fn has_area_in(&self, overlap: &BoundingBox) -> bool {
        let projected = &self.projected_bounding_box;
        let flat_x = overlap.width() == 0.0 && projected.width() > 0.0;
        let flat_y = overlap.height() == 0.0 && projected.height() > 0.0;
        !flat_x && !flat_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Wgs84ToWebMercator;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_request() {
        let request = ElevationRequest::point(3.0, 4.0, ProjectionId::web_mercator()).unwrap();
        assert!(request.is_point());
        assert_eq!(request.projected_bounding_box(), &BoundingBox::point(3.0, 4.0));
        assert!(request.overlap(&BoundingBox::new(0.0, 0.0, 3.0, 10.0)).is_some());
        assert!(request.overlap(&BoundingBox::new(5.0, 0.0, 6.0, 10.0)).is_none());
    }

    #[test]
    fn test_invalid_box_is_rejected() {
        let inverted = BoundingBox::new(10.0, 0.0, 0.0, 10.0);
        assert!(ElevationRequest::new(inverted, ProjectionId::wgs84()).is_err());
        let nan = BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0);
        assert!(ElevationRequest::new(nan, ProjectionId::wgs84()).is_err());
        let line = BoundingBox::new(0.0, 0.0, 0.0, 10.0);
        assert!(ElevationRequest::new(line, ProjectionId::wgs84()).is_err());
    }

    #[test]
    fn test_project_point() {
        let request = ElevationRequest::point(180.0, 0.0, ProjectionId::wgs84())
            .unwrap()
            .project(&Wgs84ToWebMercator);
        assert_relative_eq!(request.projected_bounding_box().min_x, 20_037_508.342789244, epsilon = 1e-6);
        assert_relative_eq!(request.projected_bounding_box().min_y, 0.0, epsilon = 1e-6);
        assert_eq!(request.bounding_box(), &BoundingBox::point(180.0, 0.0));
    }

    #[test]
    fn test_edge_contact_has_no_area() {
        let request = ElevationRequest::new(BoundingBox::new(0.0, 0.0, 4.0, 4.0), ProjectionId::web_mercator()).unwrap();
        let touching = request.overlap(&BoundingBox::new(4.0, 0.0, 8.0, 4.0)).unwrap();
        assert!(!request.has_area_in(&touching));
        let inside = request.overlap(&BoundingBox::new(2.0, 2.0, 8.0, 8.0)).unwrap();
        assert!(request.has_area_in(&inside));
    }
}
