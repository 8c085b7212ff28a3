//! Stale-completion filtering for consumers.

use tracing::debug;

use crate::loader::{LoadEvent, RequestId};

/// Tracks the most recent request and drops completions of older ones.
///
/// The loader itself never cancels work, so a fast scrub through the
/// timeline can produce completions out of order. The consumer records each
/// id it submits with [`track`](Self::track) and passes every incoming event
/// through [`accept`](Self::accept).
#[derive(Debug, Default)]
pub struct LatestOnly {
    latest: Option<RequestId>,
}

impl LatestOnly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as the request whose result should be shown.
    pub fn track(&mut self, id: RequestId) {
        self.latest = Some(id);
    }

    pub fn latest(&self) -> Option<RequestId> {
        self.latest
    }

    /// Whether the most recent request is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.latest.is_some()
    }

    /// Return `event` if it completes the most recent request.
    pub fn accept(&mut self, event: LoadEvent) -> Option<LoadEvent> {
        if self.latest == Some(event.id) {
            self.latest = None;
            Some(event)
        } else {
            debug!(id = %event.id, path = %event.path.display(), "Discarding stale load");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use crate::loader::VolumeLoader;
    use volume_parser::ParseError;

    #[tokio::test]
    async fn test_only_latest_completion_is_accepted() {
        let loader = VolumeLoader::with_parser(
            &LoaderConfig {
                workers: 2,
                ..Default::default()
            },
            |_| Err(ParseError::EmptyVolume),
        )
        .unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut latest = LatestOnly::new();

        let older = loader.submit_tracked("one.mat", tx.clone());
        latest.track(older);
        let newer = loader.submit_tracked("two.mat", tx);
        latest.track(newer);
        assert!(latest.is_pending());

        let mut accepted = Vec::new();
        for _ in 0..2 {
            let event = rx.recv().await.unwrap();
            if let Some(event) = latest.accept(event) {
                accepted.push(event.id);
            }
        }

        assert_eq!(accepted, vec![newer]);
        assert!(!latest.is_pending());
    }
}
