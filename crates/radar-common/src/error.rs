//! Error types for the shared radar model.

use thiserror::Error;

use crate::product::Product;
use crate::volume::VolumeShape;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Errors raised while constructing volumes or loading color scales.
#[derive(Debug, Error)]
pub enum RadarError {
    // === Volume construction ===
    #[error("Product {product} has shape {actual}, expected {expected}")]
    ShapeMismatch {
        product: Product,
        expected: VolumeShape,
        actual: VolumeShape,
    },

    #[error("{axis} angle count {actual} does not match array dimension {expected}")]
    AngleCountMismatch {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Data length {actual} does not match shape {shape} ({expected} samples)")]
    DataLength {
        shape: VolumeShape,
        expected: usize,
        actual: usize,
    },

    #[error("Range resolution must be positive and finite, got {0} km")]
    InvalidResolution(f64),

    #[error("Volume contains no products")]
    NoProducts,

    // === Color scales ===
    #[error("Invalid color scale for {product}: {reason}")]
    InvalidColorScale { product: Product, reason: String },

    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
