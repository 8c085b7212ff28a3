//! The worker pool and its two completion flavours.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use radar_common::RadarVolume;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use volume_parser::ParseResult;

use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadResult};

type ParserFn = dyn Fn(&Path) -> ParseResult<RadarVolume> + Send + Sync;

/// Identity of a tracked submission. Ids increase monotonically per loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Completion of a tracked submission.
#[derive(Debug)]
pub struct LoadEvent {
    pub id: RequestId,
    pub path: PathBuf,
    pub result: LoadResult,
}

/// Parses scan files on a bounded pool of reusable workers.
pub struct VolumeLoader {
    pool: ThreadPool,
    parser: Arc<ParserFn>,
    next_id: AtomicU64,
}

impl VolumeLoader {
    /// Create a loader that parses with [`volume_parser::parse`].
    pub fn new(config: &LoaderConfig) -> Result<Self, LoadError> {
        Self::with_parser(config, |path| volume_parser::parse(path))
    }

    /// Create a loader with a custom parse function.
    pub fn with_parser<F>(config: &LoaderConfig, parser: F) -> Result<Self, LoadError>
    where
        F: Fn(&Path) -> ParseResult<RadarVolume> + Send + Sync + 'static,
    {
        config.validate().map_err(LoadError::PoolBuild)?;

        let prefix = config.thread_name_prefix.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(move |n| format!("{}-{}", prefix, n))
            .build()
            .map_err(|e| LoadError::PoolBuild(e.to_string()))?;

        info!(workers = config.workers, "Volume loader started");

        Ok(Self {
            pool,
            parser: Arc::new(parser),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue `path` for parsing and return immediately.
    ///
    /// `on_complete` runs exactly once on a worker thread.
    pub fn submit<F>(&self, path: impl Into<PathBuf>, on_complete: F)
    where
        F: FnOnce(LoadResult) + Send + 'static,
    {
        let path = path.into();
        let parser = Arc::clone(&self.parser);
        debug!(path = %path.display(), "Submitted volume load");

        self.pool.spawn(move || {
            let result = run_parse(parser.as_ref(), &path);
            if panic::catch_unwind(AssertUnwindSafe(|| on_complete(result))).is_err() {
                warn!(path = %path.display(), "Load completion callback panicked");
            }
        });
    }

    /// Queue `path` and deliver the completion as a [`LoadEvent`] on `events`.
    pub fn submit_tracked(
        &self,
        path: impl Into<PathBuf>,
        events: UnboundedSender<LoadEvent>,
    ) -> RequestId {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let path = path.into();
        let event_path = path.clone();

        self.submit(path, move |result| {
            let event = LoadEvent {
                id,
                path: event_path,
                result,
            };
            if events.send(event).is_err() {
                debug!(id = %id, "Load completion dropped, receiver closed");
            }
        });

        id
    }
}

fn run_parse(parser: &ParserFn, path: &Path) -> LoadResult {
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| parser(path)));
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(volume)) => {
            info!(
                path = %path.display(),
                shape = %volume.shape(),
                elapsed_ms,
                "Loaded volume"
            );
            Ok(Arc::new(volume))
        }
        Ok(Err(e)) => {
            warn!(path = %path.display(), error = %e, elapsed_ms, "Volume load failed");
            Err(LoadError::Parse(e))
        }
        Err(_) => {
            warn!(path = %path.display(), elapsed_ms, "Volume parser panicked");
            Err(LoadError::WorkerPanicked {
                path: path.to_path_buf(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn config(workers: usize) -> LoaderConfig {
        LoaderConfig {
            workers,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = VolumeLoader::new(&config(0));
        assert!(matches!(result, Err(LoadError::PoolBuild(_))));
    }

    #[test]
    fn test_workers_are_named() {
        let loader = VolumeLoader::with_parser(
            &LoaderConfig {
                workers: 1,
                thread_name_prefix: "unit".to_string(),
            },
            |_| Err(volume_parser::ParseError::EmptyVolume),
        )
        .unwrap();
        assert_eq!(loader.workers(), 1);

        let (tx, rx) = mpsc::channel();
        loader.submit("a.mat", move |_| {
            let name = std::thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        });
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("unit-0"));
    }

    #[test]
    fn test_panicking_parser_reports_once() {
        let loader = VolumeLoader::with_parser(&config(1), |_| panic!("decoder bug")).unwrap();
        let (tx, rx) = mpsc::channel();
        loader.submit("bad.mat", move |result| tx.send(result).unwrap());

        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        match result {
            Err(LoadError::WorkerPanicked { path }) => assert_eq!(path, PathBuf::from("bad.mat")),
            other => panic!("expected WorkerPanicked, got {:?}", other),
        }
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        // The worker survives the panic.
        let (tx, rx) = mpsc::channel();
        loader.submit("next.mat", move |result| tx.send(result.is_err()).unwrap());
        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn test_panicking_callback_does_not_stop_the_pool() {
        let loader =
            VolumeLoader::with_parser(&config(1), |_| Err(volume_parser::ParseError::EmptyVolume))
                .unwrap();
        loader.submit("a.mat", |_| panic!("consumer bug"));

        let (tx, rx) = mpsc::channel();
        loader.submit("b.mat", move |result| tx.send(result.is_err()).unwrap());
        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn test_request_ids_increase() {
        let loader =
            VolumeLoader::with_parser(&config(1), |_| Err(volume_parser::ParseError::EmptyVolume))
                .unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let first = loader.submit_tracked("a.mat", tx.clone());
        let second = loader.submit_tracked("a.mat", tx);
        assert!(second > first);
        assert_eq!(second.value(), first.value() + 1);
    }
}
