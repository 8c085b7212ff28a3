//! Named groupings of scan files, persisted as JSON.
//!
//! ```json
//! {
//!   "name": "April storms",
//!   "base_dir": "/data/par",
//!   "scans": [
//!     { "name": "scan_10", "files": ["scan_10/MATLAB/HRUS_240428_020033000_100.mat"] }
//!   ]
//! }
//! ```
//!
//! File paths under `base_dir` are stored relative to it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::discovery::{discover_scans, DiscoveryConfig};
use crate::error::{ScanIndexError, ScanIndexResult};
use crate::index::{build_index, ScanIndex};

/// A named, ordered list of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scan {
    pub name: String,
    pub files: Vec<PathBuf>,
}

impl Scan {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_files(name, Vec::new())
    }

    pub fn with_files(name: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Timestamp index over this scan's files as stored.
    pub fn index(&self) -> ScanIndex {
        build_index(self.files.iter().cloned())
    }
}

/// A base directory and the scans defined under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSet {
    name: String,
    base_dir: PathBuf,
    #[serde(default)]
    scans: Vec<Scan>,
}

impl ScanSet {
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            scans: Vec::new(),
        }
    }

    /// One scan per discovered scan folder.
    pub fn from_discovery(
        name: impl Into<String>,
        base_dir: impl Into<PathBuf>,
        config: &DiscoveryConfig,
    ) -> ScanIndexResult<Self> {
        let mut set = Self::new(name, base_dir);
        for scan in discover_scans(&set.base_dir, config)? {
            let index = set.add_named_scan(scan.name);
            set.add_files(index, scan.files)?;
        }
        Ok(set)
    }

    /// Read a scan set from a JSON file.
    pub fn load(path: &Path) -> ScanIndexResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let set: Self = serde_json::from_str(&text)?;
        info!(path = %path.display(), scans = set.scans.len(), "Loaded scan set");
        Ok(set)
    }

    /// Write the scan set as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> ScanIndexResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        info!(path = %path.display(), scans = self.scans.len(), "Saved scan set");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    pub fn scan(&self, index: usize) -> ScanIndexResult<&Scan> {
        let count = self.scans.len();
        self.scans
            .get(index)
            .ok_or(ScanIndexError::ScanOutOfRange { index, count })
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.scans.iter().position(|s| s.name == name)
    }

    fn scan_mut(&mut self, index: usize) -> ScanIndexResult<&mut Scan> {
        let count = self.scans.len();
        self.scans
            .get_mut(index)
            .ok_or(ScanIndexError::ScanOutOfRange { index, count })
    }

    /// Append an empty scan named `Scan {n}` and return its index.
    pub fn add_scan(&mut self) -> usize {
        let name = format!("Scan {}", self.scans.len() + 1);
        self.add_named_scan(name)
    }

    pub fn add_named_scan(&mut self, name: impl Into<String>) -> usize {
        self.scans.push(Scan::new(name));
        self.scans.len() - 1
    }

    pub fn remove_scan(&mut self, index: usize) -> ScanIndexResult<Scan> {
        self.scan_mut(index)?;
        Ok(self.scans.remove(index))
    }

    pub fn rename_scan(&mut self, index: usize, name: impl Into<String>) -> ScanIndexResult<()> {
        self.scan_mut(index)?.name = name.into();
        Ok(())
    }

    /// Append files to a scan.
    ///
    /// Paths under the base directory are stored relative to it. Other
    /// relative paths are taken as already relative, and other absolute
    /// paths are rejected. Nothing is added if any path is rejected.
    pub fn add_files<I, P>(&mut self, index: usize, paths: I) -> ScanIndexResult<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let relative = paths
            .into_iter()
            .map(|p| self.relativize(p.as_ref()))
            .collect::<ScanIndexResult<Vec<_>>>()?;
        self.scan_mut(index)?.files.extend(relative);
        Ok(())
    }

    pub fn remove_file(&mut self, scan: usize, file: usize) -> ScanIndexResult<PathBuf> {
        let files = &mut self.scan_mut(scan)?.files;
        if file >= files.len() {
            return Err(ScanIndexError::FileOutOfRange {
                scan,
                index: file,
                count: files.len(),
            });
        }
        Ok(files.remove(file))
    }

    /// Absolute paths of a scan's files.
    pub fn resolve(&self, index: usize) -> ScanIndexResult<Vec<PathBuf>> {
        Ok(self
            .scan(index)?
            .files
            .iter()
            .map(|f| self.base_dir.join(f))
            .collect())
    }

    /// Timestamp index over a scan's resolved files.
    pub fn index(&self, scan: usize) -> ScanIndexResult<ScanIndex> {
        Ok(build_index(self.resolve(scan)?))
    }

    fn relativize(&self, path: &Path) -> ScanIndexResult<PathBuf> {
        if let Ok(relative) = path.strip_prefix(&self.base_dir) {
            return Ok(relative.to_path_buf());
        }
        if path.is_relative() {
            return Ok(path.to_path_buf());
        }
        Err(ScanIndexError::NotUnderBaseDir {
            path: path.to_path_buf(),
            base: self.base_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_scan_names() {
        let mut set = ScanSet::new("set", "/data");
        assert_eq!(set.add_scan(), 0);
        assert_eq!(set.add_scan(), 1);
        set.remove_scan(0).unwrap();
        assert_eq!(set.add_scan(), 1);

        let names: Vec<_> = set.scans().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Scan 2", "Scan 2"]);
    }

    #[test]
    fn test_files_are_stored_relative() {
        let mut set = ScanSet::new("set", "/data");
        let scan = set.add_named_scan("scan_1");
        set.add_files(
            scan,
            ["/data/scan_1/MATLAB/a.mat", "scan_1/MATLAB/b.mat"],
        )
        .unwrap();

        assert_eq!(
            set.scan(scan).unwrap().files,
            vec![
                PathBuf::from("scan_1/MATLAB/a.mat"),
                PathBuf::from("scan_1/MATLAB/b.mat"),
            ]
        );
        assert_eq!(
            set.resolve(scan).unwrap(),
            vec![
                PathBuf::from("/data/scan_1/MATLAB/a.mat"),
                PathBuf::from("/data/scan_1/MATLAB/b.mat"),
            ]
        );
    }

    #[test]
    fn test_rejects_files_outside_base() {
        let mut set = ScanSet::new("set", "/data");
        let scan = set.add_scan();
        let result = set.add_files(scan, ["/data/a.mat", "/elsewhere/b.mat"]);

        assert!(matches!(result, Err(ScanIndexError::NotUnderBaseDir { .. })));
        assert!(set.scan(scan).unwrap().is_empty());
    }

    #[test]
    fn test_index_errors() {
        let mut set = ScanSet::new("set", "/data");
        assert!(matches!(
            set.rename_scan(0, "x"),
            Err(ScanIndexError::ScanOutOfRange { index: 0, count: 0 })
        ));

        let scan = set.add_scan();
        set.add_files(scan, ["a.mat"]).unwrap();
        assert!(matches!(
            set.remove_file(scan, 1),
            Err(ScanIndexError::FileOutOfRange { scan: 0, index: 1, count: 1 })
        ));
        assert_eq!(set.remove_file(scan, 0).unwrap(), PathBuf::from("a.mat"));
    }

    #[test]
    fn test_rename_and_find() {
        let mut set = ScanSet::new("set", "/data");
        set.add_scan();
        set.rename_scan(0, "morning").unwrap();
        assert_eq!(set.find("morning"), Some(0));
        assert_eq!(set.find("Scan 1"), None);
    }
}
