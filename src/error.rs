//! Error types for the analytics engine
//!
//! Every pipeline stage returns [`Result`]; the CLI converts failures into a
//! `{"error": "..."}` payload at the pipeline boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Failure modes of the analytics pipelines
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Input resource is absent
    #[error("data file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Expected column is absent from an input table
    #[error("column '{column}' missing from {}", .path.display())]
    Schema { column: String, path: PathBuf },

    /// Fewer retained records than requested clusters
    #[error("insufficient data: {records} records available, at least {required} required")]
    InsufficientData { records: usize, required: usize },

    /// Too few months to estimate the seasonal model
    #[error("insufficient history: {actual} months available, at least {required} required")]
    InsufficientHistory { actual: usize, required: usize },

    /// Numerical failure while fitting or forecasting
    #[error("forecast fit failed: {0}")]
    ForecastFit(String),

    /// A record field could not be parsed
    #[error("malformed record at row {row}: {field} = '{value}'")]
    MalformedRecord {
        row: usize,
        field: &'static str,
        value: String,
    },

    /// Invalid engine configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Feature scaling backend failure
    #[error("scaling error: {0}")]
    Scaling(String),

    /// Clustering backend failure
    #[error("clustering error: {0}")]
    Clustering(String),

    /// A non-finite number reached the serialization boundary
    #[error("non-finite number at {path}")]
    NonFiniteOutput { path: String },

    /// CSV parsing or dataframe failure
    #[error("dataframe error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Generic IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
