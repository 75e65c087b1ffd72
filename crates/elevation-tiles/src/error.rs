//! Error types for elevation tile queries.

use thiserror::Error;

/// Errors that can occur while resolving, assembling or resampling elevation tiles.
///
/// "No coverage" is not an error: queries return `Ok(None)` when no tile
/// matrix or no stored tile overlaps the request.
#[derive(Debug, Error)]
pub enum ElevationError {
    /// I/O error reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error for a stored tile image.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// Invalid YAML configuration.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// The configured interpolation algorithm is not implemented.
    #[error("Unsupported interpolation algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A stored tile could not be decoded or does not match its tile matrix.
    #[error("Malformed tile z={zoom} row={row} column={column}: {reason}")]
    MalformedTile {
        /// Zoom level.
        zoom: u32,
        /// Tile row.
        row: u64,
        /// Tile column.
        column: u64,
        /// Reason for failure.
        reason: String,
    },

    /// The tile cursor yielded tiles out of row-major order.
    #[error("Tile cursor out of order: ({}, {}) followed by ({}, {})", previous.0, previous.1, current.0, current.1)]
    TileOrder {
        /// Previous (row, column).
        previous: (u64, u64),
        /// Current (row, column).
        current: (u64, u64),
    },

    /// The underlying tile storage failed.
    #[error("Tile storage error: {0}")]
    Storage(String),

    /// The request cannot be answered as stated.
    #[error("Invalid elevation request: {0}")]
    InvalidRequest(String),

    /// The request projection differs from the data projection and no
    /// coordinate transform is available between them.
    #[error("No coordinate transform from {from} to {to}")]
    MissingTransform {
        /// Request projection.
        from: String,
        /// Elevation data projection.
        to: String,
    },
}
