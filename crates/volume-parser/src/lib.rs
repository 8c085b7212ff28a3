//! Radar scan file parser.
//!
//! Scan exports are MATLAB Level 5 MAT-files holding a `volume` struct array
//! (one element per sweep). Parsing happens in two stages:
//!
//! 1. [`mat`] decodes the container into a tree of [`mat::MatArray`] values,
//!    inflating compressed variables as it goes.
//! 2. [`volume`] walks that tree, checks every required field and the
//!    product dimensions, and builds an immutable [`RadarVolume`].
//!
//! Both stages are pure: the same bytes always yield the same volume.
//!
//! # Example
//!
//! ```ignore
//! let volume = volume_parser::parse("scan_12/MATLAB/HRUS_240428_020033000_100.mat")?;
//! println!("{} sweeps", volume.shape().elevations);
//! ```

pub mod error;
pub mod mat;
pub mod volume;

use std::path::Path;

use bytes::Bytes;
use radar_common::RadarVolume;
use tracing::debug;

pub use error::{ParseError, ParseResult};
pub use mat::{MatArray, MatFile};
pub use volume::{assemble_volume, VOLUME_KEY};

/// Read and parse a scan file.
pub fn parse(path: impl AsRef<Path>) -> ParseResult<RadarVolume> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), size = bytes.len(), "Read scan file");
    parse_bytes(bytes)
}

/// Parse a scan file already held in memory.
pub fn parse_bytes(bytes: impl Into<Bytes>) -> ParseResult<RadarVolume> {
    let file = MatFile::from_bytes(bytes.into())?;
    assemble_volume(&file)
}
