//! Scan discovery and timestamp indexing.
//!
//! Scans live on disk as `base/<scan_prefix>*/<data_subfolder>/*.mat`. Each
//! file name carries its acquisition time:
//!
//! ```text
//! HRUS_240428_020033000_100.mat
//!      ^^^^^^ ^^^^^^            ->  240428020033  ->  04/24/2028 02:00:33
//! ```
//!
//! [`discover_scans`] walks the folder layout, [`build_index`] turns a list of
//! files into timestamped [`IndexEntry`] values (in listing order), and
//! [`ScanSet`] is the user-editable, JSON-persisted grouping of files into
//! named scans.

pub mod discovery;
pub mod error;
pub mod filename;
pub mod index;
pub mod scanset;

pub use discovery::{discover_scans, DiscoveryConfig};
pub use error::{ScanIndexError, ScanIndexResult};
pub use filename::{extract_composite, extract_timestamp};
pub use index::{build_index, IndexEntry, ScanIndex};
pub use radar_common::{format_timestamp, ScanTimestamp};
pub use scanset::{Scan, ScanSet};
