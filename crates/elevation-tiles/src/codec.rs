//! TIFF tile image decoding.
//!
//! Elevation tiles are stored as single-band TIFF images, typically 32-bit
//! float. Any sample type the decoder yields is widened to `f64`.

use crate::pixel::{GriddedCoverage, GriddedTile, PixelSource, TileImage};
use crate::store::StoredTile;
use crate::{ElevationError, Result};
use std::io::Cursor;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::ColorType;

/// Upper bound for a single decoded tile buffer.
const MAX_TILE_BUFFER_BYTES: usize = 256 * 1024 * 1024;

/// A decoded single-band TIFF tile.
#[derive(Debug, Clone)]
pub struct TiffTileImage {
    /// Samples in row-major order (north to south, west to east).
    data: Vec<f64>,
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
}

impl TiffTileImage {
    /// Decode a TIFF image from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut decoder = Decoder::new(Cursor::new(bytes))?;

        let mut limits = Limits::default();
        limits.decoding_buffer_size = MAX_TILE_BUFFER_BYTES;
        limits.intermediate_buffer_size = MAX_TILE_BUFFER_BYTES;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;

        match decoder.colortype()? {
            ColorType::Gray(_) => {}
            other => {
                return Err(ElevationError::InvalidRequest(format!(
                    "elevation tiles must have a single gray band, found {:?}",
                    other
                )))
            }
        }

        let data = Self::decode_samples(&mut decoder)?;
        if data.len() != width as usize * height as usize {
            return Err(ElevationError::InvalidRequest(format!(
                "decoded {} samples for a {}x{} tile",
                data.len(),
                width,
                height
            )));
        }

        Ok(Self { data, width, height })
    }

    /// Create an image from already decoded samples.
    pub fn from_samples(width: u32, height: u32, data: Vec<f64>) -> Result<Self> {
        if data.len() != width as usize * height as usize {
            return Err(ElevationError::InvalidRequest(format!(
                "{} samples cannot fill a {}x{} tile",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { data, width, height })
    }

    fn decode_samples<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<Vec<f64>> {
        let result = decoder.read_image()?;

        match result {
            DecodingResult::F32(data) => Ok(data.into_iter().map(f64::from).collect()),
            DecodingResult::F64(data) => Ok(data),
            DecodingResult::I16(data) => Ok(data.into_iter().map(f64::from).collect()),
            DecodingResult::I32(data) => Ok(data.into_iter().map(f64::from).collect()),
            DecodingResult::U16(data) => Ok(data.into_iter().map(f64::from).collect()),
            DecodingResult::U32(data) => Ok(data.into_iter().map(f64::from).collect()),
            DecodingResult::U8(data) => Ok(data.into_iter().map(f64::from).collect()),
            DecodingResult::I8(data) => Ok(data.into_iter().map(f64::from).collect()),
            DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
            DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
        }
    }
}

impl TileImage for TiffTileImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Result<f64> {
        let idx = y as usize * self.width as usize + x as usize;
        self.data.get(idx).copied().ok_or_else(|| {
            ElevationError::InvalidRequest(format!(
                "pixel ({}, {}) outside {}x{} tile",
                x, y, self.width, self.height
            ))
        })
    }
}

/// Pixel source for TIFF-encoded tiles of one gridded coverage.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffPixelSource {
    coverage: GriddedCoverage,
}

impl TiffPixelSource {
    /// Create a pixel source decoding values with `coverage`.
    pub fn new(coverage: GriddedCoverage) -> Self {
        Self { coverage }
    }

    /// Coverage decoding parameters.
    pub fn coverage(&self) -> &GriddedCoverage {
        &self.coverage
    }
}

impl PixelSource for TiffPixelSource {
    type Image = TiffTileImage;

    fn create_image(&self, tile: &StoredTile) -> Result<Self::Image> {
        TiffTileImage::decode(&tile.data).map_err(|e| ElevationError::MalformedTile {
            zoom: tile.zoom,
            row: tile.row,
            column: tile.column,
            reason: e.to_string(),
        })
    }

    fn decode_value(&self, tile: &GriddedTile, raw: f64) -> Option<f64> {
        self.coverage.decode_value(tile, raw)
    }
}
