//! Pixel decoding seams: tile images, raw samples and gridded coverage values.

use crate::store::StoredTile;
use crate::Result;

/// A decoded tile image exposing raw per-pixel samples.
pub trait TileImage {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Raw sample at a pixel. Callers keep `x < width` and `y < height`.
    fn pixel(&self, x: u32, y: u32) -> Result<f64>;
}

/// Decodes stored tiles into images and raw samples into elevations.
///
/// Implemented once per on-disk pixel encoding; the query engine is generic over it.
pub trait PixelSource {
    /// Decoded image type.
    type Image: TileImage;

    /// Decode a stored tile's image data.
    fn create_image(&self, tile: &StoredTile) -> Result<Self::Image>;

    /// Convert a raw sample into a physical elevation, `None` for no data.
    fn decode_value(&self, tile: &GriddedTile, raw: f64) -> Option<f64>;

    /// Decode the elevation at a pixel of a tile image.
    fn elevation(&self, tile: &GriddedTile, image: &Self::Image, x: u32, y: u32) -> Result<Option<f64>> {
        let raw = image.pixel(x, y)?;
        Ok(self.decode_value(tile, raw))
    }
}

/// Storage type of coverage samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GriddedDataType {
    /// Integer samples, scaled and offset into physical values.
    #[default]
    Integer,
    /// Floating point samples holding physical values directly.
    Float,
}

/// Coverage-wide decoding parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GriddedCoverage {
    /// Sample storage type.
    pub data_type: GriddedDataType,
    /// Multiplier applied after the tile scale and offset.
    pub scale: f64,
    /// Offset applied after the coverage scale.
    pub offset: f64,
    /// Raw sample value marking missing data.
    pub data_null: Option<f64>,
}

impl Default for GriddedCoverage {
    fn default() -> Self {
        Self {
            data_type: GriddedDataType::Integer,
            scale: 1.0,
            offset: 0.0,
            data_null: None,
        }
    }
}

impl GriddedCoverage {
    /// Float coverage with an optional no-data value.
    pub fn float(data_null: Option<f64>) -> Self {
        Self {
            data_type: GriddedDataType::Float,
            data_null,
            ..Self::default()
        }
    }

    /// Integer coverage with coverage-level scale and offset.
    pub fn integer(scale: f64, offset: f64, data_null: Option<f64>) -> Self {
        Self {
            data_type: GriddedDataType::Integer,
            scale,
            offset,
            data_null,
        }
    }

    /// Decode a raw sample of `tile` into a physical value.
    pub fn decode_value(&self, tile: &GriddedTile, raw: f64) -> Option<f64> {
        if raw.is_nan() || self.data_null.is_some_and(|null| raw == null) {
            return None;
        }
        match self.data_type {
            GriddedDataType::Float => Some(raw),
            GriddedDataType::Integer => Some((raw * tile.scale + tile.offset) * self.scale + self.offset),
        }
    }
}

/// Per-tile decoding parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GriddedTile {
    /// Multiplier applied to raw samples.
    pub scale: f64,
    /// Offset added after the scale.
    pub offset: f64,
}

impl Default for GriddedTile {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}
