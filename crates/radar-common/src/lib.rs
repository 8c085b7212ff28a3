//! Shared types for the phased-array radar viewer.
//!
//! This crate holds the canonical in-memory form of one radar scan
//! ([`RadarVolume`]), the closed set of radar products, the color scales used
//! to present them, and the composite scan timestamp carried in file names.
//! Every other crate in the workspace builds on these types.

pub mod color;
pub mod error;
pub mod product;
pub mod time;
pub mod volume;

pub use color::{ColorScale, ColorScales, Rgba};
pub use error::{RadarError, RadarResult};
pub use product::{Product, ProductTable};
pub use time::{format_timestamp, ScanTimestamp};
pub use volume::{RadarVolume, RadarVolumeBuilder, VolumeArray, VolumeMetadata, VolumeShape};
