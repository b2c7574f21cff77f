//! Error types for floodmap

use thiserror::Error;

/// Main error type for floodmap operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Missing required band '{band}' in raw scene")]
    MissingBand { band: &'static str },

    #[error("Insufficient sample for threshold selection: {0}")]
    InsufficientSample(String),

    #[error("Invalid configuration: {name} = {value}")]
    InvalidConfiguration { name: &'static str, value: String },

    #[error("No observations at pixel ({row}, {col})")]
    DegenerateObservation { row: usize, col: usize },

    #[error("Collaborator source error: {0}")]
    Source(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for floodmap operations
pub type Result<T> = std::result::Result<T, Error>;
