//! Projection identifiers and coordinate transforms.

use crate::bounds::BoundingBox;
use proj4rs::proj::Proj;
use std::f64::consts::PI;
use std::fmt;
use tracing::{debug, trace};

/// Web Mercator sphere radius in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Web Mercator projection (arctan(sinh(π))).
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Number of points sampled along each edge when transforming a bounding box.
const EDGE_SAMPLES: usize = 16;

/// Projection identifier in `AUTHORITY:CODE` form, e.g. `EPSG:4326`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionId(String);

impl ProjectionId {
    /// Create an identifier from an authority and code.
    pub fn new(authority: &str, code: u32) -> Self {
        Self(format!("{}:{}", authority.to_ascii_uppercase(), code))
    }

    /// WGS84 geographic coordinates (EPSG:4326).
    pub fn wgs84() -> Self {
        Self::new("EPSG", 4326)
    }

    /// Spherical Web Mercator (EPSG:3857).
    pub fn web_mercator() -> Self {
        Self::new("EPSG", 3857)
    }

    /// The identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric code of an `EPSG:` identifier.
    pub fn epsg_code(&self) -> Option<u16> {
        self.0.strip_prefix("EPSG:")?.parse().ok()
    }

    /// PROJ.4 definition from the EPSG registry.
    fn proj_string(&self) -> Option<&'static str> {
        self.epsg_code()
            .and_then(crs_definitions::from_code)
            .map(|def| def.proj4)
    }
}

impl fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transform of coordinates from one projection into another.
pub trait CoordinateTransform {
    /// Transform a single coordinate.
    fn transform(&self, x: f64, y: f64) -> (f64, f64);

    /// Envelope of a transformed bounding box.
    ///
    /// Each edge is densified before transforming, so curved edges in the
    /// target projection are enclosed. Degenerate boxes stay degenerate.
    fn transform_bounds(&self, bbox: &BoundingBox) -> BoundingBox {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for i in 0..=EDGE_SAMPLES {
            let t = i as f64 / EDGE_SAMPLES as f64;
            let x = (1.0 - t) * bbox.min_x + t * bbox.max_x;
            let y = (1.0 - t) * bbox.min_y + t * bbox.max_y;
            for (px, py) in [(x, bbox.min_y), (x, bbox.max_y), (bbox.min_x, y), (bbox.max_x, y)] {
                let (tx, ty) = self.transform(px, py);
                min_x = min_x.min(tx);
                min_y = min_y.min(ty);
                max_x = max_x.max(tx);
                max_y = max_y.max(ty);
            }
        }

        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}

/// Transform that returns its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl CoordinateTransform for Identity {
    fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }
}

/// WGS84 longitude/latitude to Web Mercator meters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84ToWebMercator;

impl CoordinateTransform for Wgs84ToWebMercator {
    fn transform(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
        let x = lon.to_radians() * EARTH_RADIUS_M;
        let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M;
        (x, y)
    }
}

/// Web Mercator meters to WGS84 longitude/latitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercatorToWgs84;

impl CoordinateTransform for WebMercatorToWgs84 {
    fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }
}

/// Transform between two EPSG coordinate systems through proj4rs.
///
/// Geographic systems take and return degrees. Points that fail to
/// transform come back as `NaN`.
pub struct Proj4Transform {
    from: ProjectionId,
    to: ProjectionId,
    source: Proj,
    target: Proj,
    source_geographic: bool,
    target_geographic: bool,
}

impl Proj4Transform {
    /// Look up both projections in the EPSG registry.
    ///
    /// Returns `None` when either is not a known EPSG code.
    pub fn new(from: &ProjectionId, to: &ProjectionId) -> Option<Self> {
        let source_def = from.proj_string()?;
        let target_def = to.proj_string()?;
        let parse = |id: &ProjectionId, def: &str| {
            Proj::from_proj_string(def)
                .map_err(|e| debug!("Projection: cannot parse {} ({}): {:?}", id, def, e))
                .ok()
        };

        Some(Self {
            from: from.clone(),
            to: to.clone(),
            source: parse(from, source_def)?,
            target: parse(to, target_def)?,
            source_geographic: source_def.contains("+proj=longlat"),
            target_geographic: target_def.contains("+proj=longlat"),
        })
    }
}

impl CoordinateTransform for Proj4Transform {
    fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        let mut point = if self.source_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        match proj4rs::transform::transform(&self.source, &self.target, &mut point) {
            Ok(()) if self.target_geographic => (point.0.to_degrees(), point.1.to_degrees()),
            Ok(()) => (point.0, point.1),
            Err(e) => {
                trace!("Projection: ({}, {}) from {} to {} failed: {:?}", x, y, self.from, self.to, e);
                (f64::NAN, f64::NAN)
            }
        }
    }
}

impl fmt::Debug for Proj4Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proj4Transform")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Transform between two projections, if one is known.
///
/// WGS84 and Web Mercator convert with closed-form math; other EPSG pairs
/// go through [`Proj4Transform`].
pub fn transform_between(
    from: &ProjectionId,
    to: &ProjectionId,
) -> Option<Box<dyn CoordinateTransform + Send + Sync>> {
    if from == to {
        return Some(Box::new(Identity));
    }
    if *from == ProjectionId::wgs84() && *to == ProjectionId::web_mercator() {
        return Some(Box::new(Wgs84ToWebMercator));
    }
    if *from == ProjectionId::web_mercator() && *to == ProjectionId::wgs84() {
        return Some(Box::new(WebMercatorToWgs84));
    }
    Proj4Transform::new(from, to).map(|t| Box::new(t) as Box<dyn CoordinateTransform + Send + Sync>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_id() {
        assert_eq!(ProjectionId::new("epsg", 4326), ProjectionId::wgs84());
        assert_eq!(ProjectionId::web_mercator().to_string(), "EPSG:3857");
    }

    #[test]
    fn test_web_mercator_roundtrip() {
        let (x, y) = Wgs84ToWebMercator.transform(-122.3321, 47.6062);
        assert_relative_eq!(x, -13_617_947.08, max_relative = 1e-6);
        let (lon, lat) = WebMercatorToWgs84.transform(x, y);
        assert_relative_eq!(lon, -122.3321, epsilon = 1e-9);
        assert_relative_eq!(lat, 47.6062, epsilon = 1e-9);
    }

    #[test]
    fn test_equator_is_origin() {
        let (x, y) = Wgs84ToWebMercator.transform(0.0, 0.0);
        assert_relative_eq!(x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_transform_bounds_point_stays_point() {
        let bounds = Wgs84ToWebMercator.transform_bounds(&BoundingBox::point(10.0, 20.0));
        assert_eq!(bounds.width(), 0.0);
        assert_eq!(bounds.height(), 0.0);
    }

    #[test]
    fn test_transform_between() {
        assert!(transform_between(&ProjectionId::wgs84(), &ProjectionId::web_mercator()).is_some());
        assert!(transform_between(&ProjectionId::new("EPSG", 32610), &ProjectionId::wgs84()).is_some());
        assert!(transform_between(&ProjectionId::new("ESRI", 54030), &ProjectionId::wgs84()).is_none());
        let identity = transform_between(&ProjectionId::wgs84(), &ProjectionId::wgs84()).unwrap();
        assert_eq!(identity.transform(1.5, 2.5), (1.5, 2.5));
    }

    #[test]
    fn test_epsg_code() {
        assert_eq!(ProjectionId::new("epsg", 32633).epsg_code(), Some(32633));
        assert_eq!(ProjectionId::new("ESRI", 54030).epsg_code(), None);
        assert_eq!(ProjectionId::new("EPSG", 100_000).epsg_code(), None);
    }

    #[test]
    fn test_utm_zone_33() {
        let utm = ProjectionId::new("EPSG", 32633);
        let forward = transform_between(&ProjectionId::wgs84(), &utm).unwrap();
        // The zone's central meridian on the equator is the false easting
        let (x, y) = forward.transform(15.0, 0.0);
        assert_relative_eq!(x, 500_000.0, epsilon = 1e-3);
        assert_relative_eq!(y, 0.0, epsilon = 1e-3);

        let inverse = transform_between(&utm, &ProjectionId::wgs84()).unwrap();
        let (x, y) = forward.transform(16.2, 48.2);
        let (lon, lat) = inverse.transform(x, y);
        assert_relative_eq!(lon, 16.2, epsilon = 1e-7);
        assert_relative_eq!(lat, 48.2, epsilon = 1e-7);
    }

    #[test]
    fn test_proj4_matches_closed_form_mercator() {
        let proj = Proj4Transform::new(&ProjectionId::wgs84(), &ProjectionId::web_mercator()).unwrap();
        let (x, y) = proj.transform(-122.3321, 47.6062);
        let (expected_x, expected_y) = Wgs84ToWebMercator.transform(-122.3321, 47.6062);
        assert_relative_eq!(x, expected_x, max_relative = 1e-6);
        assert_relative_eq!(y, expected_y, max_relative = 1e-6);
    }
}
