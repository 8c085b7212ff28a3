//! Error types for scan file parsing.

use radar_common::{Product, RadarError, VolumeShape};
use thiserror::Error;

/// Result type for volume parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Error types for scan file parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes do not form a valid MAT-file
    #[error("Invalid MAT-file: {0}")]
    InvalidFormat(String),

    /// Valid MAT-file using a feature this reader does not handle
    #[error("Unsupported MAT-file feature: {0}")]
    Unsupported(String),

    /// A compressed variable could not be inflated
    #[error("Failed to decompress variable: {0}")]
    Decompression(String),

    /// The file has no `volume` variable
    #[error("File does not contain a 'volume' record")]
    MissingVolumeKey,

    /// The `volume` record has no sweeps
    #[error("The 'volume' record is empty")]
    EmptyVolume,

    /// A required field is absent
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field is present but holds the wrong kind of value
    #[error("Invalid field '{name}': {reason}")]
    InvalidField { name: String, reason: String },

    /// A product's array disagrees with the volume dimensions
    #[error("Product {product} has shape {actual}, expected {expected}")]
    ShapeMismatch {
        product: Product,
        expected: VolumeShape,
        actual: VolumeShape,
    },
}

impl ParseError {
    pub(crate) fn invalid_field(name: &str, reason: impl Into<String>) -> Self {
        ParseError::InvalidField {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }
}

impl From<RadarError> for ParseError {
    fn from(err: RadarError) -> Self {
        match err {
            RadarError::ShapeMismatch {
                product,
                expected,
                actual,
            } => ParseError::ShapeMismatch {
                product,
                expected,
                actual,
            },
            RadarError::AngleCountMismatch { axis, .. } => {
                let field = if axis == "azimuth" { "az_deg" } else { "sweep_el_deg" };
                ParseError::invalid_field(field, err.to_string())
            }
            RadarError::InvalidResolution(_) => ParseError::invalid_field("dr", err.to_string()),
            RadarError::NoProducts => {
                ParseError::invalid_field("prod", "no recognised product codes")
            }
            other => ParseError::InvalidFormat(other.to_string()),
        }
    }
}
