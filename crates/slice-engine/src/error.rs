use radar_common::Product;
use thiserror::Error;

use crate::views::ViewId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SliceError {
    #[error("Product {0} is not present in the volume")]
    ProductMissing(Product),

    #[error("Elevation index {index} out of range ({count} sweeps)")]
    ElevationOutOfRange { index: usize, count: usize },

    #[error("Azimuth index {index} out of range ({count} radials)")]
    AzimuthOutOfRange { index: usize, count: usize },

    #[error("Degenerate slice geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Unknown view: {0}")]
    UnknownView(ViewId),
}

pub type SliceResult<T> = Result<T, SliceError>;
