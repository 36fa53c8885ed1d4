use thiserror::Error;

/// Errors raised while reading a trajectory.
///
/// Line numbers are 1-based positions in the input stream.
#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header at line {line}: {details}")]
    InvalidHeader { line: usize, details: String },

    #[error("atom count mismatch at line {line}: {names} type name(s) but {counts} count(s)")]
    AtomCountMismatch {
        line: usize,
        names: usize,
        counts: usize,
    },

    #[error("invalid coordinate in frame {frame} at line {line}: {details}")]
    InvalidCoordinate {
        frame: usize,
        line: usize,
        details: String,
    },
}

impl TrajectoryError {
    pub fn header(line: usize, details: impl Into<String>) -> Self {
        Self::InvalidHeader {
            line,
            details: details.into(),
        }
    }

    pub fn coordinate(frame: usize, line: usize, details: impl Into<String>) -> Self {
        Self::InvalidCoordinate {
            frame,
            line,
            details: details.into(),
        }
    }
}
