//! The playback state machine.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use scan_index::{IndexEntry, ScanIndex};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, PlaybackResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Stopped => write!(f, "stopped"),
            PlaybackStatus::Playing => write!(f, "playing"),
        }
    }
}

/// Notifications sent to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The selected file changed.
    Selected {
        index: usize,
        path: PathBuf,
        label: String,
    },
    StatusChanged(PlaybackStatus),
}

/// Cyclic cursor over a scan's timeline.
///
/// ```text
///            play()             forward()/back(): index ± 1 mod N
///   Stopped ───────► Playing    on_tick(): forward() while Playing
///           ◄───────
///            pause()
/// ```
#[derive(Debug)]
pub struct PlaybackController {
    index: ScanIndex,
    position: usize,
    status: PlaybackStatus,
    config: PlaybackConfig,
    events: Option<UnboundedSender<PlaybackEvent>>,
}

impl PlaybackController {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            index: ScanIndex::default(),
            position: 0,
            status: PlaybackStatus::Stopped,
            config,
            events: None,
        }
    }

    /// Send [`PlaybackEvent`]s to `events`.
    pub fn with_events(mut self, events: UnboundedSender<PlaybackEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &ScanIndex {
        &self.index
    }

    pub fn tick_interval(&self) -> Duration {
        self.config.tick_interval()
    }

    pub fn current(&self) -> Option<&IndexEntry> {
        self.index.get(self.position)
    }

    /// Timeline caption for the current selection.
    pub fn label(&self) -> String {
        match self.current() {
            Some(entry) => format!("Selected Time: {}", entry.label()),
            None => "Selected Time:".to_string(),
        }
    }

    /// Replace the timeline, e.g. when the active scan changes.
    ///
    /// The cursor returns to the first file, which is announced. An empty
    /// timeline also stops playback.
    pub fn set_index(&mut self, index: ScanIndex) {
        info!(files = index.len(), "Timeline replaced");
        self.index = index;
        self.position = 0;
        if self.index.is_empty() {
            self.set_status(PlaybackStatus::Stopped);
        } else {
            self.announce();
        }
    }

    /// Start automatic advancing. Does nothing on an empty timeline.
    pub fn play(&mut self) {
        if self.index.is_empty() {
            debug!("Ignoring play on empty timeline");
            return;
        }
        self.set_status(PlaybackStatus::Playing);
    }

    pub fn pause(&mut self) {
        self.set_status(PlaybackStatus::Stopped);
    }

    pub fn toggle(&mut self) {
        match self.status {
            PlaybackStatus::Stopped => self.play(),
            PlaybackStatus::Playing => self.pause(),
        }
    }

    /// Select the next file, wrapping to the first.
    pub fn forward(&mut self) -> Option<&IndexEntry> {
        self.step(1)
    }

    /// Select the previous file, wrapping to the last.
    pub fn back(&mut self) -> Option<&IndexEntry> {
        let len = self.index.len();
        self.step(len.saturating_sub(1))
    }

    /// Jump to `position` without wrapping.
    pub fn seek(&mut self, position: usize) -> PlaybackResult<&IndexEntry> {
        let len = self.index.len();
        if position >= len {
            return Err(PlaybackError::SeekOutOfRange {
                index: position,
                len,
            });
        }
        self.position = position;
        self.announce();
        self.current().ok_or(PlaybackError::SeekOutOfRange {
            index: position,
            len,
        })
    }

    /// Timer callback. Advances only while playing.
    pub fn on_tick(&mut self) -> Option<&IndexEntry> {
        if !self.is_playing() {
            return None;
        }
        self.forward()
    }

    fn step(&mut self, delta: usize) -> Option<&IndexEntry> {
        let len = self.index.len();
        if len == 0 {
            return None;
        }
        self.position = (self.position + delta) % len;
        self.announce();
        self.current()
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status == status {
            return;
        }
        self.status = status;
        debug!(status = %status, "Playback status changed");
        self.emit(PlaybackEvent::StatusChanged(status));
    }

    fn announce(&self) {
        if let Some(entry) = self.current() {
            self.emit(PlaybackEvent::Selected {
                index: self.position,
                path: entry.path.clone(),
                label: entry.label(),
            });
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                debug!("Playback event dropped, receiver closed");
            }
        }
    }
}
