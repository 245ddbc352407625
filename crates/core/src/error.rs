//! Error types for taigamap

use thiserror::Error;

/// Main error type for taigamap operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({expected_rows}, {expected_cols}), got ({actual_rows}, {actual_cols})")]
    SizeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("Band not found: {0}")]
    MissingBand(String),

    #[error("Band already present: {0}")]
    DuplicateBand(String),

    #[error("No composite for year {0}")]
    MissingYear(i32),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("No samples of class {label} in region {region}, iteration {iteration}")]
    EmptyClass {
        region: u8,
        iteration: usize,
        label: i32,
    },

    #[error("Training failed in region {region}, iteration {iteration}: {message}")]
    Training {
        region: u8,
        iteration: usize,
        message: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for taigamap operations
pub type Result<T> = std::result::Result<T, Error>;
