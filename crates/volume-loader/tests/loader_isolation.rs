//! Loader behaviour against real files on disk.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use test_utils::{temp_test_dir, MatOptions, SyntheticVolume};
use volume_loader::{LoadError, LoaderConfig, VolumeLoader};
use volume_parser::ParseError;

const TIMEOUT: Duration = Duration::from_secs(10);

fn loader(workers: usize) -> VolumeLoader {
    VolumeLoader::new(&LoaderConfig {
        workers,
        ..Default::default()
    })
    .unwrap()
}

fn write_scans(dir: &std::path::Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("HRUS_24042{}_020033000_100.mat", i));
            SyntheticVolume::with_dims(2, 3, 4 + i)
                .write_to(&path, MatOptions::compressed())
                .unwrap();
            path
        })
        .collect()
}

// ============================================================================
// Callback flavour
// ============================================================================

#[test]
fn test_failing_submission_is_isolated() {
    let dir = temp_test_dir();
    let mut paths = write_scans(dir.path(), 4);
    paths.push(dir.path().join("missing.mat"));

    let loader = loader(2);
    let (tx, rx) = mpsc::channel();
    for (i, path) in paths.iter().enumerate() {
        let tx = tx.clone();
        loader.submit(path.clone(), move |result| tx.send((i, result)).unwrap());
    }
    drop(tx);

    let mut results: Vec<_> = (0..5).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    results.sort_by_key(|(i, _)| *i);

    for (i, result) in &results[..4] {
        let volume = result.as_ref().unwrap();
        assert_eq!(volume.shape().ranges, 4 + i);
    }
    match &results[4].1 {
        Err(LoadError::Parse(ParseError::Io(_))) => {}
        other => panic!("expected an I/O parse error, got {:?}", other),
    }
}

#[test]
fn test_duplicate_paths_are_independent() {
    let dir = temp_test_dir();
    let path = write_scans(dir.path(), 1).remove(0);

    let loader = loader(2);
    let (tx, rx) = mpsc::channel();
    for _ in 0..3 {
        let tx = tx.clone();
        loader.submit(path.clone(), move |result| tx.send(result).unwrap());
    }

    let volumes: Vec<_> = (0..3)
        .map(|_| rx.recv_timeout(TIMEOUT).unwrap().unwrap())
        .collect();
    assert_eq!(*volumes[0], *volumes[1]);
    assert_eq!(*volumes[1], *volumes[2]);
}

#[test]
fn test_submit_returns_before_completion() {
    let loader = VolumeLoader::with_parser(
        &LoaderConfig {
            workers: 1,
            ..Default::default()
        },
        |_| {
            std::thread::sleep(Duration::from_millis(200));
            Err(ParseError::EmptyVolume)
        },
    )
    .unwrap();

    let (tx, rx) = mpsc::channel();
    let started = std::time::Instant::now();
    loader.submit("slow.mat", move |result| tx.send(result.is_err()).unwrap());
    assert!(started.elapsed() < Duration::from_millis(150));
    assert!(rx.recv_timeout(TIMEOUT).unwrap());
}

// ============================================================================
// Channel flavour
// ============================================================================

#[tokio::test]
async fn test_tracked_events_carry_id_and_path() {
    let dir = temp_test_dir();
    let paths = write_scans(dir.path(), 2);

    let loader = loader(2);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let ids: Vec<_> = paths
        .iter()
        .map(|p| loader.submit_tracked(p.clone(), tx.clone()))
        .collect();
    drop(tx);

    let mut seen = Vec::new();
    while let Some(event) = rx.recv().await {
        assert!(event.result.is_ok());
        let index = ids.iter().position(|id| *id == event.id).unwrap();
        assert_eq!(event.path, paths[index]);
        seen.push(index);
    }
    seen.sort();
    assert_eq!(seen, vec![0, 1]);
}
