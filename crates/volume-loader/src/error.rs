//! Error types for background loading.

use std::path::PathBuf;
use std::sync::Arc;

use radar_common::RadarVolume;
use thiserror::Error;
use volume_parser::ParseError;

/// What a completion carries.
pub type LoadResult = Result<Arc<RadarVolume>, LoadError>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Worker panicked while loading {}", .path.display())]
    WorkerPanicked { path: PathBuf },

    #[error("Failed to build worker pool: {0}")]
    PoolBuild(String),
}

impl LoadError {
    /// The underlying parse error, if that is what failed.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            LoadError::Parse(e) => Some(e),
            _ => None,
        }
    }
}
