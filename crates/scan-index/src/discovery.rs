//! Scan folder discovery.
//!
//! ```text
//! base/
//! ├── scan_10/
//! │   └── MATLAB/
//! │       ├── HRUS_240428_020033000_100.mat
//! │       └── HRUS_240428_020105000_100.mat
//! └── scan_11/          (no MATLAB folder: empty scan, warning)
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::ScanIndexResult;
use crate::scanset::Scan;

/// Folder naming used to find scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Scan folders are the subfolders of the base directory with this prefix.
    pub scan_prefix: String,

    /// Folder inside each scan holding the data files.
    pub data_subfolder: String,

    /// Data file extension, without the dot. Matched case-insensitively.
    pub extension: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            scan_prefix: "scan_".to_string(),
            data_subfolder: "MATLAB".to_string(),
            extension: "mat".to_string(),
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `PAR_SCAN_PREFIX`, `PAR_DATA_SUBFOLDER` and `PAR_SCAN_EXTENSION`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("PAR_SCAN_PREFIX") {
            self.scan_prefix = val;
        }
        if let Ok(val) = std::env::var("PAR_DATA_SUBFOLDER") {
            self.data_subfolder = val;
        }
        if let Ok(val) = std::env::var("PAR_SCAN_EXTENSION") {
            self.extension = val.trim_start_matches('.').to_string();
        }
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.data_subfolder.trim().is_empty() {
            return Err("data_subfolder must not be empty".to_string());
        }
        if self.extension.trim().is_empty() {
            return Err("extension must not be empty".to_string());
        }
        Ok(())
    }
}

/// List the scans under `base`, sorted by folder name.
///
/// Each returned [`Scan`] holds absolute file paths in directory listing
/// order. Scans without a data folder, or without matching files, are kept
/// with no files. Only a failure to read `base` itself is an error; unreadable
/// entries below it are logged and skipped.
pub fn discover_scans(base: &Path, config: &DiscoveryConfig) -> ScanIndexResult<Vec<Scan>> {
    let mut scans = Vec::new();

    for entry in WalkDir::new(base)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            // The base directory itself could not be read.
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!(base = %base.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if !entry.file_type().is_dir() || !name.starts_with(&config.scan_prefix) {
            continue;
        }

        let files = scan_files(entry.path(), &name, config);
        scans.push(Scan::with_files(name, files));
    }

    debug!(base = %base.display(), scans = scans.len(), "Discovered scans");
    Ok(scans)
}

fn scan_files(scan_dir: &Path, scan: &str, config: &DiscoveryConfig) -> Vec<PathBuf> {
    let data_dir = scan_dir.join(&config.data_subfolder);
    if !data_dir.is_dir() {
        warn!(
            scan = %scan,
            folder = %config.data_subfolder,
            "Scan has no data folder"
        );
        return Vec::new();
    }

    let entries = WalkDir::new(&data_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .map(|entry| entry.map(|e| (e.file_type().is_file(), e.into_path())));
    let files = matching_files(scan, entries, &config.extension);

    if files.is_empty() {
        info!(scan = %scan, "Scan has no data files");
    }
    files
}

/// Regular files with `extension`, in listing order. Entries that fail to
/// read are logged and skipped so one bad entry never hides the rest.
fn matching_files<I, E>(scan: &str, entries: I, extension: &str) -> Vec<PathBuf>
where
    I: IntoIterator<Item = Result<(bool, PathBuf), E>>,
    E: std::fmt::Display,
{
    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok((true, path)) if has_extension(&path, extension) => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(scan = %scan, error = %e, "Skipping unreadable scan entry"),
        }
    }
    files
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_match_ignores_case() {
        assert!(has_extension(Path::new("a.MAT"), "mat"));
        assert!(has_extension(Path::new("a.mat"), "mat"));
        assert!(!has_extension(Path::new("a.mat.bak"), "mat"));
        assert!(!has_extension(Path::new("mat"), "mat"));
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let entries = vec![
            Ok((true, PathBuf::from("a.mat"))),
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")),
            Ok((false, PathBuf::from("sub.mat"))),
            Ok((true, PathBuf::from("notes.txt"))),
            Ok((true, PathBuf::from("b.MAT"))),
        ];
        let files = matching_files("scan_1", entries, "mat");
        assert_eq!(files, vec![PathBuf::from("a.mat"), PathBuf::from("b.MAT")]);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("PAR_SCAN_PREFIX", "vol_");
        std::env::set_var("PAR_SCAN_EXTENSION", ".h5");
        let config = DiscoveryConfig::from_env();
        std::env::remove_var("PAR_SCAN_PREFIX");
        std::env::remove_var("PAR_SCAN_EXTENSION");

        assert_eq!(config.scan_prefix, "vol_");
        assert_eq!(config.data_subfolder, "MATLAB");
        assert_eq!(config.extension, "h5");
    }
}
