//! Errors raised while loading the static datasets and serving the dashboard.
//! A selection that matches no voyage is not an error, see [`crate::VoyageTable::lookup`].

use std::io;

/// Everything that can go wrong outside of the lookup itself
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A row that parsed as CSV but does not describe a valid record
    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    /// A contour feature whose geometry is not a (multi)polygon
    #[error("invalid contour geometry in feature {index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
