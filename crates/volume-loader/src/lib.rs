//! Background volume loading.
//!
//! [`VolumeLoader`] owns a fixed-size rayon pool. Each submission parses one
//! scan file on a worker and reports back exactly once, either through a
//! callback ([`VolumeLoader::submit`]) or as a [`LoadEvent`] on a tokio
//! channel ([`VolumeLoader::submit_tracked`]).
//!
//! Submissions are independent: there is no deduplication and no
//! cancellation, and a failing (or panicking) parse only affects its own
//! completion. Consumers that only care about the most recent request use
//! [`LatestOnly`] to drop stale results.

pub mod config;
pub mod error;
pub mod latest;
pub mod loader;

pub use config::LoaderConfig;
pub use error::{LoadError, LoadResult};
pub use latest::LatestOnly;
pub use loader::{LoadEvent, RequestId, VolumeLoader};
