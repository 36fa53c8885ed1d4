use thiserror::Error;

/// Errors raised while loading instrument tables and converting them into
/// datasets.
#[derive(Debug, Error)]
pub enum DataError {
    /// The file could not be loaded or holds no usable columns.
    #[error("cannot load instrument data: {0}")]
    LoadFailure(String),

    /// Malformed table content, with the 1-based line or row it was found at.
    #[error("malformed table data at line {line}: {details}")]
    Parse { line: usize, details: String },

    /// Strict role resolution would have had to guess a column.
    #[error("ambiguous column roles: {0}")]
    AmbiguousRoles(String),

    /// Arithmetic on channels with differently shaped series.
    /// Shapes are `(counters, monitors, points)`.
    #[error("data shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize, usize),
        right: (usize, usize, usize),
    },

    /// A count series whose errors do not match its values in length.
    #[error("series has {values} value(s) but {errors} error(s)")]
    LengthMismatch { values: usize, errors: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl DataError {
    pub fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}
