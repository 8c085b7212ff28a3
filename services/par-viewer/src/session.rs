//! Headless playback session.
//!
//! One task drives everything: playback ticks select files, selections are
//! handed to the loader pool, and the newest completed load is sliced for
//! every registered view. Stale completions are dropped and failed loads
//! leave the previous frame in place.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use playback::{PlaybackConfig, PlaybackController, PlaybackEvent};
use radar_common::{Product, RadarVolume, VolumeShape};
use scan_index::ScanIndex;
use serde::Serialize;
use slice_engine::{SliceEngine, SliceSummary, ViewKind, ViewRegistry};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};
use volume_loader::{LatestOnly, LoadEvent, VolumeLoader};

/// What to show and for how long.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub views: Vec<(ViewKind, Product)>,
    pub elevation: usize,
    pub azimuth: usize,
    /// Stop after this many completed loads (rendered or failed).
    pub frames: Option<usize>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            views: vec![
                (ViewKind::Ppi, Product::Reflectivity),
                (ViewKind::Rhi, Product::Reflectivity),
            ],
            elevation: 0,
            azimuth: 0,
            frames: None,
        }
    }
}

/// One rendered view within a frame.
#[derive(Debug, Clone, Serialize)]
pub struct ViewFrame {
    pub view: String,
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SliceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A displayed volume.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub label: String,
    pub path: PathBuf,
    pub volume_shape: VolumeShape,
    pub views: Vec<ViewFrame>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub frames_rendered: usize,
    pub load_failures: usize,
}

pub struct Session {
    loader: VolumeLoader,
    engine: SliceEngine,
    registry: ViewRegistry,
    playback: PlaybackConfig,
    options: SessionOptions,
    /// Volume behind the last frame.
    current: Option<Arc<RadarVolume>>,
}

impl Session {
    pub fn new(
        loader: VolumeLoader,
        engine: SliceEngine,
        playback: PlaybackConfig,
        options: SessionOptions,
    ) -> Self {
        let mut registry = ViewRegistry::new();
        for (kind, product) in &options.views {
            registry.register_with_product(*kind, *product);
        }
        Self {
            loader,
            engine,
            registry,
            playback,
            options,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Arc<RadarVolume>> {
        self.current.as_ref()
    }

    /// Play `index` until the frame limit is reached or ctrl-c arrives,
    /// passing every rendered frame to `on_frame`.
    pub async fn run<F>(&mut self, index: ScanIndex, mut on_frame: F) -> Result<SessionReport>
    where
        F: FnMut(&Frame) -> Result<()>,
    {
        let mut report = SessionReport::default();
        if index.is_empty() {
            warn!("No indexed files to play");
            return Ok(report);
        }

        let (playback_tx, mut playback_rx) = mpsc::unbounded_channel();
        let (load_tx, mut load_rx) = mpsc::unbounded_channel::<LoadEvent>();
        let mut controller = PlaybackController::new(self.playback.clone()).with_events(playback_tx);
        let mut latest = LatestOnly::new();

        let period = controller.tick_interval();
        let mut ticker = interval_at(Instant::now() + period, period);

        info!(
            files = index.len(),
            interval_ms = period.as_millis() as u64,
            views = self.registry.len(),
            "Starting playback"
        );
        controller.set_index(index);
        controller.play();

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    controller.on_tick();
                }
                Some(event) = playback_rx.recv() => match event {
                    PlaybackEvent::Selected { index, path, label } => {
                        debug!(index, label = %label, "Loading selection");
                        let id = self.loader.submit_tracked(path, load_tx.clone());
                        latest.track(id);
                    }
                    PlaybackEvent::StatusChanged(status) => {
                        info!(status = %status, "Playback status changed");
                    }
                },
                Some(event) = load_rx.recv() => {
                    let Some(event) = latest.accept(event) else {
                        continue;
                    };
                    match event.result {
                        Ok(volume) => {
                            let label = controller
                                .index()
                                .position(&event.path)
                                .and_then(|i| controller.index().get(i))
                                .map(|entry| entry.label())
                                .unwrap_or_default();
                            let frame = self.show(volume, event.path, label);
                            on_frame(&frame)?;
                            report.frames_rendered += 1;
                        }
                        Err(e) => {
                            warn!(
                                id = %event.id,
                                path = %event.path.display(),
                                error = %e,
                                "Load failed, keeping previous volume"
                            );
                            report.load_failures += 1;
                        }
                    }
                    if let Some(limit) = self.options.frames {
                        if report.frames_rendered + report.load_failures >= limit {
                            break;
                        }
                    }
                }
                _ = &mut ctrl_c => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        controller.pause();
        info!(
            frames = report.frames_rendered,
            failures = report.load_failures,
            "Playback finished"
        );
        Ok(report)
    }

    fn show(&mut self, volume: Arc<RadarVolume>, path: PathBuf, label: String) -> Frame {
        if let Err(e) = self
            .registry
            .select(&volume, self.options.elevation, self.options.azimuth)
        {
            warn!(error = %e, "Selection does not fit this volume, keeping previous selection");
        }

        let views = self
            .registry
            .render_all(&self.engine, &volume)
            .into_iter()
            .map(|(id, result)| {
                let (title, product) = self
                    .registry
                    .get(id)
                    .map(|v| (v.title.clone(), v.product))
                    .unwrap_or_else(|| (id.to_string(), Product::Reflectivity));
                match result {
                    Ok(slice) => ViewFrame {
                        view: title,
                        product,
                        shape: Some(slice.shape()),
                        summary: Some(slice.summary()),
                        error: None,
                    },
                    Err(e) => ViewFrame {
                        view: title,
                        product,
                        shape: None,
                        summary: None,
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect();

        let frame = Frame {
            label,
            path,
            volume_shape: volume.shape(),
            views,
        };
        self.current = Some(volume);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_common::ColorScales;
    use scan_index::{build_index, discover_scans, DiscoveryConfig};
    use test_utils::{create_scan_tree, temp_test_dir, MatOptions, SyntheticVolume};
    use volume_loader::LoaderConfig;

    fn session(frames: usize, elevation: usize) -> Session {
        let loader = VolumeLoader::new(&LoaderConfig {
            workers: 2,
            thread_name_prefix: "session-test".to_string(),
        })
        .unwrap();
        let engine = SliceEngine::new(Arc::new(ColorScales::default()));
        let options = SessionOptions {
            elevation,
            azimuth: 1,
            frames: Some(frames),
            ..Default::default()
        };
        Session::new(
            loader,
            engine,
            PlaybackConfig {
                tick_interval_ms: 50,
            },
            options,
        )
    }

    #[tokio::test]
    async fn test_plays_scan_and_renders_every_view() {
        let bytes = SyntheticVolume::default().to_mat_bytes(MatOptions::default());
        let dir = temp_test_dir();
        let base = dir.path();
        create_scan_tree(
            base,
            "MATLAB",
            &[(
                "scan_a",
                &[
                    "HRUS_240428_020033000_100.mat",
                    "HRUS_240428_020105000_100.mat",
                ],
            )],
            &bytes,
        );
        let scans = discover_scans(base, &DiscoveryConfig::default()).unwrap();
        let index = build_index(scans[0].files.clone());
        assert_eq!(index.len(), 2);

        let mut frames = Vec::new();
        let mut session = session(3, 2);
        let report = session
            .run(index, |frame| {
                frames.push(frame.clone());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(report.frames_rendered, 3);
        assert_eq!(report.load_failures, 0);
        assert!(session.current().is_some());

        let first = &frames[0];
        assert_eq!(first.label, "04/24/2028 02:00:33");
        assert_eq!(first.volume_shape, VolumeShape::new(3, 4, 5));
        assert_eq!(first.views.len(), 2);
        assert_eq!(first.views[0].view, "PPI View 1");
        assert_eq!(first.views[0].shape, Some((4, 5)));
        assert_eq!(first.views[1].view, "RHI View 1");
        assert_eq!(first.views[1].shape, Some((3, 5)));
    }

    #[tokio::test]
    async fn test_failed_loads_are_counted_not_fatal() {
        let dir = temp_test_dir();
        let base = dir.path();
        create_scan_tree(
            base,
            "MATLAB",
            &[("scan_a", &["HRUS_240428_020033000_100.mat"])],
            b"not a mat file",
        );
        let scans = discover_scans(base, &DiscoveryConfig::default()).unwrap();
        let index = build_index(scans[0].files.clone());

        let mut session = session(2, 0);
        let report = session.run(index, |_| Ok(())).await.unwrap();

        assert_eq!(report.frames_rendered, 0);
        assert_eq!(report.load_failures, 2);
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_selection_keeps_previous() {
        let bytes = SyntheticVolume::default().to_mat_bytes(MatOptions::default());
        let dir = temp_test_dir();
        let base = dir.path();
        create_scan_tree(
            base,
            "MATLAB",
            &[("scan_a", &["HRUS_240428_020033000_100.mat"])],
            &bytes,
        );
        let scans = discover_scans(base, &DiscoveryConfig::default()).unwrap();
        let index = build_index(scans[0].files.clone());

        let mut frames = Vec::new();
        let mut session = session(1, 99);
        session
            .run(index, |frame| {
                frames.push(frame.clone());
                Ok(())
            })
            .await
            .unwrap();

        // Falls back to sweep 0.
        assert_eq!(frames[0].views[0].shape, Some((4, 5)));
        assert!(frames[0].views.iter().all(|v| v.error.is_none()));
    }

    #[test]
    fn test_views_open_with_requested_products() {
        let loader = VolumeLoader::new(&LoaderConfig::default()).unwrap();
        let engine = SliceEngine::new(Arc::new(ColorScales::default()));
        let options = SessionOptions {
            views: vec![
                (ViewKind::Ppi, Product::Velocity),
                (ViewKind::Rhi, Product::SpectrumWidth),
            ],
            ..Default::default()
        };
        let session = Session::new(loader, engine, PlaybackConfig::default(), options);

        let views: Vec<_> = session
            .registry
            .views()
            .map(|v| (v.title.as_str(), v.product))
            .collect();
        assert_eq!(
            views,
            vec![("PPI View 1", Product::Velocity), ("RHI View 1", Product::SpectrumWidth)]
        );
    }

    #[tokio::test]
    async fn test_empty_index_returns_immediately() {
        let mut session = session(1, 0);
        let report = session.run(ScanIndex::default(), |_| Ok(())).await.unwrap();
        assert_eq!(report, SessionReport::default());
    }
}
