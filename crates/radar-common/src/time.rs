//! Composite scan timestamps.
//!
//! Scan files carry their acquisition time as twelve digits laid out as
//! `DDMMYYHHMMSS`. The radar's firmware clock is known to report 2007 when the
//! real year is 2024, so that single year is rebased on parse.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Number of digits in a composite timestamp.
pub const COMPOSITE_LEN: usize = 12;

/// Display layout, e.g. `04/24/2028 02:00:33`.
pub const DISPLAY_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

const FIRMWARE_CLOCK_YEAR: i32 = 2007;
const FIRMWARE_CLOCK_REBASE: i32 = 2024;

/// A parsed scan acquisition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScanTimestamp(NaiveDateTime);

impl ScanTimestamp {
    pub fn new(datetime: NaiveDateTime) -> Self {
        Self(datetime)
    }

    /// Parse a `DDMMYYHHMMSS` composite string.
    ///
    /// Two-digit years use the POSIX pivot: `00..=68` map to 20xx and
    /// `69..=99` to 19xx.
    pub fn parse_composite(raw: &str) -> Option<Self> {
        if raw.len() != COMPOSITE_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let field = |start: usize| raw[start..start + 2].parse::<u32>().ok();
        let day = field(0)?;
        let month = field(2)?;
        let yy = field(4)? as i32;
        let hour = field(6)?;
        let minute = field(8)?;
        let second = field(10)?;

        let mut year = if yy < 69 { 2000 + yy } else { 1900 + yy };
        if year == FIRMWARE_CLOCK_YEAR {
            year = FIRMWARE_CLOCK_REBASE;
        }

        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, second)
            .map(Self)
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Render as `MM/DD/YYYY HH:MM:SS`.
    pub fn format(&self) -> String {
        self.0.format(DISPLAY_FORMAT).to_string()
    }
}

impl fmt::Display for ScanTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Format a raw composite string for display, returning it unchanged when it
/// does not parse.
pub fn format_timestamp(raw: &str) -> String {
    ScanTimestamp::parse_composite(raw)
        .map(|ts| ts.format())
        .unwrap_or_else(|| raw.to_string())
}
