//! Query configuration, loadable from YAML.

use crate::{ElevationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Resampling algorithm used to produce each output pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InterpolationAlgorithm {
    /// Value of the nearest source pixel.
    #[default]
    NearestNeighbor,
    /// Linear blend of the 2x2 surrounding source pixels.
    Bilinear,
    /// Cubic convolution over the 4x4 surrounding source pixels.
    Bicubic,
}

impl InterpolationAlgorithm {
    /// Source pixels of context the algorithm needs from neighboring tiles.
    pub fn overlapping_pixels(&self) -> usize {
        match self {
            InterpolationAlgorithm::NearestNeighbor | InterpolationAlgorithm::Bilinear => 1,
            InterpolationAlgorithm::Bicubic => 3,
        }
    }

    /// Configuration name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            InterpolationAlgorithm::NearestNeighbor => "nearest_neighbor",
            InterpolationAlgorithm::Bilinear => "bilinear",
            InterpolationAlgorithm::Bicubic => "bicubic",
        }
    }
}

impl fmt::Display for InterpolationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterpolationAlgorithm {
    type Err = ElevationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "nearest_neighbor" | "nearest" => Ok(InterpolationAlgorithm::NearestNeighbor),
            "bilinear" => Ok(InterpolationAlgorithm::Bilinear),
            "bicubic" => Ok(InterpolationAlgorithm::Bicubic),
            _ => Err(ElevationError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for InterpolationAlgorithm {
    type Error = ElevationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<InterpolationAlgorithm> for String {
    fn from(algorithm: InterpolationAlgorithm) -> Self {
        algorithm.name().to_string()
    }
}

/// Settings applied to every query of an [`crate::ElevationTiles`] instance.
///
/// # Example
///
/// ```
/// use elevation_tiles::{InterpolationAlgorithm, QueryConfig};
///
/// let config = QueryConfig::from_yaml_str("algorithm: bicubic\nzoom_in: false\n")?;
/// assert_eq!(config.algorithm, InterpolationAlgorithm::Bicubic);
/// assert!(!config.zoom_in);
/// assert!(config.zoom_out);
/// # Ok::<(), elevation_tiles::ElevationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Resampling algorithm.
    pub algorithm: InterpolationAlgorithm,
    /// Search finer zoom levels when the selected level has no tiles.
    pub zoom_in: bool,
    /// Search coarser zoom levels when the selected level has no tiles.
    pub zoom_out: bool,
    /// Search finer levels before coarser ones.
    pub zoom_in_before_out: bool,
    /// Response width in pixels; the tile matrix tile width when unset.
    pub width: Option<u32>,
    /// Response height in pixels; the tile matrix tile height when unset.
    pub height: Option<u32>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            algorithm: InterpolationAlgorithm::NearestNeighbor,
            zoom_in: true,
            zoom_out: true,
            zoom_in_before_out: true,
            width: None,
            height: None,
        }
    }
}

impl QueryConfig {
    /// Parse a configuration from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Serialize the configuration as YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Builder-style algorithm setter.
    pub fn with_algorithm(mut self, algorithm: InterpolationAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder-style zoom fallback setter.
    pub fn with_zoom_policy(mut self, zoom_in: bool, zoom_out: bool, zoom_in_before_out: bool) -> Self {
        self.zoom_in = zoom_in;
        self.zoom_out = zoom_out;
        self.zoom_in_before_out = zoom_in_before_out;
        self
    }

    /// Builder-style response size setter.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}
