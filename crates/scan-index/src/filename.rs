//! Timestamps embedded in scan file names.

use std::path::Path;

use radar_common::ScanTimestamp;

use crate::error::{ScanIndexError, ScanIndexResult};

/// Characters taken from the third name token (`HHMMSS`).
const TIME_DIGITS: usize = 6;

/// Build the `DDMMYYHHMMSS` composite from a file name.
///
/// The name is split on `_`; the composite is the second token followed by
/// up to six characters of the third. Only names with fewer than three
/// tokens yield `None`; whether the composite parses is a separate question.
pub fn extract_composite(file_name: &str) -> Option<String> {
    let mut tokens = file_name.split('_');
    let _site = tokens.next()?;
    let date = tokens.next()?;
    let time = tokens.next()?;
    let time: String = time.chars().take(TIME_DIGITS).collect();
    Some(format!("{}{}", date, time))
}

/// Parse the acquisition time from the file name of `path`.
pub fn extract_timestamp(path: &Path) -> ScanIndexResult<ScanTimestamp> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    extract_composite(&file_name)
        .and_then(|composite| ScanTimestamp::parse_composite(&composite))
        .ok_or(ScanIndexError::TimestampExtractionFailed(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_composite() {
        assert_eq!(
            extract_composite("HRUS_240428_020033000_100.mat").as_deref(),
            Some("240428020033")
        );
    }

    #[test]
    fn test_extract_timestamp_formats() {
        let ts = extract_timestamp(Path::new("/data/scan_1/MATLAB/HRUS_240428_020033000_100.mat"))
            .unwrap();
        assert_eq!(ts.format(), "04/24/2028 02:00:33");
    }

    #[test]
    fn test_too_few_tokens() {
        assert_eq!(extract_composite("HRUS_240428.mat"), None);
        assert!(matches!(
            extract_timestamp(Path::new("HRUS_240428.mat")),
            Err(ScanIndexError::TimestampExtractionFailed(name)) if name == "HRUS_240428.mat"
        ));
    }

    #[test]
    fn test_short_third_token() {
        assert_eq!(
            extract_composite("HRUS_240428_0200.mat").as_deref(),
            Some("2404280200.m")
        );
        assert!(extract_timestamp(Path::new("HRUS_240428_0200.mat")).is_err());
    }

    #[test]
    fn test_unparseable_composite() {
        // Month 13.
        assert!(extract_timestamp(Path::new("HRUS_241328_020033000_100.mat")).is_err());
        assert!(extract_timestamp(Path::new("HRUS_24ab28_020033000_100.mat")).is_err());
    }

    #[test]
    fn test_firmware_year_is_rebased() {
        let ts = extract_timestamp(Path::new("HRUS_280407_123000000_1.mat")).unwrap();
        assert_eq!(ts.year(), 2024);
    }
}
