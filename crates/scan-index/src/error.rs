//! Error types for scan indexing.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanIndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Scan set JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No timestamp in file name: {0}")]
    TimestampExtractionFailed(String),

    #[error("Scan index {index} out of range ({count} scans)")]
    ScanOutOfRange { index: usize, count: usize },

    #[error("File index {index} out of range in scan {scan} ({count} files)")]
    FileOutOfRange {
        scan: usize,
        index: usize,
        count: usize,
    },

    #[error("{} is not under base directory {}", .path.display(), .base.display())]
    NotUnderBaseDir { path: PathBuf, base: PathBuf },
}

pub type ScanIndexResult<T> = Result<T, ScanIndexError>;
