//! Slice extraction and polar display geometry.
//!
//! Given a [`RadarVolume`](radar_common::RadarVolume), the [`SliceEngine`]
//! cuts either a PPI (one sweep) or an RHI (one azimuth across all sweeps)
//! and pairs it with a resolved [`PolarTransform`] that places every
//! `(angle, range)` sample in display kilometres. Slices answer point
//! queries for hover readouts, and the [`ViewRegistry`] keeps track of the
//! open views and the shared selection.

pub mod engine;
pub mod error;
pub mod query;
pub mod slice;
pub mod transform;
pub mod views;

pub use engine::SliceEngine;
pub use error::{SliceError, SliceResult};
pub use query::PointValue;
pub use slice::{Slice, SliceAxes, SliceSummary, ViewKind};
pub use transform::{
    resolve_transform, PolarTransform, PoleEdge, SweepDirection, TransformParams, ZeroBearing,
};
pub use views::{View, ViewId, ViewRegistry};
