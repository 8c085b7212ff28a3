//! Ordered timestamp index over a scan's files.

use std::path::{Path, PathBuf};

use radar_common::{format_timestamp, ScanTimestamp};
use serde::Serialize;
use tracing::debug;

use crate::filename::extract_composite;

/// One indexed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Raw `DDMMYYHHMMSS` composite from the file name.
    pub composite: String,
    /// `None` when the composite is not a valid date and time.
    pub timestamp: Option<ScanTimestamp>,
    pub path: PathBuf,
}

impl IndexEntry {
    /// `MM/DD/YYYY HH:MM:SS`, or the raw composite when it does not parse.
    pub fn label(&self) -> String {
        format_timestamp(&self.composite)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Files of one scan that carry a timestamp composite, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanIndex {
    entries: Vec<IndexEntry>,
    excluded: Vec<PathBuf>,
}

impl ScanIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&IndexEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Files left out because their names have fewer than three tokens.
    pub fn excluded(&self) -> &[PathBuf] {
        &self.excluded
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|e| e.path == path)
    }
}

/// Index `paths`, keeping their order and excluding files whose names do not
/// yield a timestamp composite. A composite that fails to parse still gets
/// an entry, labelled with the raw string.
pub fn build_index<I, P>(paths: I) -> ScanIndex
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut index = ScanIndex::default();

    for path in paths {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match extract_composite(&file_name) {
            Some(composite) => {
                let timestamp = ScanTimestamp::parse_composite(&composite);
                if timestamp.is_none() {
                    debug!(
                        path = %path.display(),
                        composite = %composite,
                        "Timestamp does not parse, keeping raw label"
                    );
                }
                index.entries.push(IndexEntry {
                    composite,
                    timestamp,
                    path,
                });
            }
            None => {
                debug!(path = %path.display(), "Excluding file without a timestamp composite");
                index.excluded.push(path);
            }
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_listing_order() {
        let index = build_index([
            "HRUS_240428_020100000_100.mat",
            "HRUS_240428_020033000_100.mat",
            "HRUS_230428_235959000_100.mat",
        ]);

        let labels: Vec<_> = index.iter().map(|e| e.label()).collect();
        assert_eq!(
            labels,
            vec![
                "04/24/2028 02:01:00",
                "04/24/2028 02:00:33",
                "04/23/2028 23:59:59",
            ]
        );
    }

    #[test]
    fn test_excludes_bad_names_and_continues() {
        let index = build_index([
            "HRUS_240428_020033000_100.mat",
            "notes.mat",
            "HRUS_240428.mat",
            "HRUS_240428_020034000_100.mat",
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.excluded(),
            &[PathBuf::from("notes.mat"), PathBuf::from("HRUS_240428.mat")]
        );
        assert_eq!(index.get(1).unwrap().file_name(), "HRUS_240428_020034000_100.mat");
        assert_eq!(
            index.position(Path::new("HRUS_240428_020034000_100.mat")),
            Some(1)
        );
    }

    #[test]
    fn test_empty_input() {
        let index = build_index(Vec::<PathBuf>::new());
        assert!(index.is_empty());
        assert!(index.get(0).is_none());
    }

    #[test]
    fn test_unparseable_composite_keeps_raw_label() {
        let index = build_index(["HRUS_241328_020033000_100.mat", "HRUS_240428_0200.mat"]);

        assert_eq!(index.len(), 2);
        assert!(index.excluded().is_empty());

        let month_13 = index.get(0).unwrap();
        assert_eq!(month_13.timestamp, None);
        assert_eq!(month_13.composite, "241328020033");
        assert_eq!(month_13.label(), "241328020033");

        let short = index.get(1).unwrap();
        assert_eq!(short.timestamp, None);
        assert_eq!(short.label(), "2404280200.m");
    }

    #[test]
    fn test_parsed_entries_carry_timestamp() {
        let index = build_index(["HRUS_280407_123000000_1.mat"]);
        let entry = index.get(0).unwrap();
        assert_eq!(entry.timestamp.map(|t| t.year()), Some(2024));
        assert_eq!(entry.label(), "04/28/2024 12:30:00");
    }
}
