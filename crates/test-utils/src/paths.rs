//! Path utilities for locating test data and laying out scan folders.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns `crates/{crate_name}/testdata/`.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join(crate_name)
        .join("testdata")
}

/// Searches for a recorded scan file.
///
/// Checks `TEST_DATA_DIR` (if set), `crates/volume-parser/testdata/`, then the
/// workspace-level `testdata/`.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(test_data_dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(test_data_dir).join(name));
    }

    let root = workspace_root();
    candidates.extend([
        crate_testdata_dir("volume-parser").join(name),
        root.join("testdata").join(name),
    ]);

    candidates.into_iter().find(|path| path.exists())
}

/// Creates a temporary directory that is removed when dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("par_viewer_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Lays out `root/<scan>/<data_subfolder>/<file>` for each entry and returns
/// the created file paths in the order given. Files are written with
/// `contents`.
///
/// A scan listed with no files still gets its data subfolder. Use
/// [`create_scan_folder_without_data`] for a scan missing it.
pub fn create_scan_tree(
    root: &Path,
    data_subfolder: &str,
    scans: &[(&str, &[&str])],
    contents: &[u8],
) -> Vec<PathBuf> {
    let mut created = Vec::new();
    for (scan, files) in scans {
        let dir = root.join(scan).join(data_subfolder);
        std::fs::create_dir_all(&dir).expect("Failed to create scan folder");
        for file in *files {
            let path = dir.join(file);
            std::fs::write(&path, contents).expect("Failed to write scan file");
            created.push(path);
        }
    }
    created
}

/// Creates `root/<scan>/` with no data subfolder inside it.
pub fn create_scan_folder_without_data(root: &Path, scan: &str) -> PathBuf {
    let dir = root.join(scan);
    std::fs::create_dir_all(&dir).expect("Failed to create scan folder");
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_is_valid() {
        let root = workspace_root();
        assert!(
            root.join("Cargo.toml").exists(),
            "Workspace root should contain Cargo.toml: {:?}",
            root
        );
    }

    #[test]
    fn test_create_scan_tree_layout() {
        let dir = temp_test_dir();
        let files = create_scan_tree(
            dir.path(),
            "MATLAB",
            &[("scan_10", &["a.mat", "b.mat"]), ("scan_11", &[])],
            b"",
        );

        assert_eq!(files.len(), 2);
        assert!(dir.path().join("scan_10/MATLAB/a.mat").is_file());
        assert!(dir.path().join("scan_11/MATLAB").is_dir());
    }
}
