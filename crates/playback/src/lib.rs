//! Timeline playback over a scan's indexed files.
//!
//! [`PlaybackController`] is a two-state machine (`Stopped`, `Playing`)
//! with a cyclic cursor over a [`ScanIndex`]. It lives on the interactive
//! thread and never blocks; the owner drives [`PlaybackController::on_tick`]
//! from its own timer and reacts to [`PlaybackEvent`]s.
//!
//! [`ScanIndex`]: scan_index::ScanIndex

pub mod config;
pub mod controller;
pub mod error;

pub use config::PlaybackConfig;
pub use controller::{PlaybackController, PlaybackEvent, PlaybackStatus};
pub use error::{PlaybackError, PlaybackResult};
