//! Unified error handling.
//!
//! Per-point and per-run problems (duplicate points, weak runs, empty run
//! sets) are not errors: they surface as `None` or empty collections. Only
//! file-level failures and unrecoverable configuration reach this type.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SurveyError>;

/// Errors raised by survey processing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SurveyError {
    /// The batch had nothing to process.
    #[error("no input trajectory files found")]
    NoInputFiles,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path}: column {column} missing (row has {found} columns)")]
    MissingColumn {
        path: PathBuf,
        column: usize,
        found: usize,
    },

    #[error("flight {flight_id} has {point_count} points, need at least {minimum_required}")]
    InsufficientPoints {
        flight_id: String,
        point_count: usize,
        minimum_required: usize,
    },

    #[error("processing cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SurveyError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SurveyError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Conversions from `Option` into survey errors.
pub trait OptionExt<T> {
    /// Turn `None` into [`SurveyError::InsufficientPoints`].
    fn ok_or_insufficient_points(
        self,
        flight_id: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_points(
        self,
        flight_id: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T> {
        self.ok_or_else(|| SurveyError::InsufficientPoints {
            flight_id: flight_id.to_string(),
            point_count,
            minimum_required,
        })
    }
}
