//! Extracted 2-D slices and their presentation metadata.

use std::fmt;
use std::str::FromStr;

use radar_common::Product;
use serde::{Deserialize, Serialize};

use crate::transform::PolarTransform;

/// Viewing geometry of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Plan position indicator: one sweep, azimuth by range.
    Ppi,
    /// Range height indicator: one azimuth, elevation by range.
    Rhi,
}

impl ViewKind {
    pub fn name(self) -> &'static str {
        match self {
            ViewKind::Ppi => "PPI",
            ViewKind::Rhi => "RHI",
        }
    }

    pub fn x_label(self) -> &'static str {
        match self {
            ViewKind::Ppi => "Zonal Distance (km)",
            ViewKind::Rhi => "Range (km)",
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            ViewKind::Ppi => "Meridional Distance (km)",
            ViewKind::Rhi => "Height (km)",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ppi" => Ok(ViewKind::Ppi),
            "rhi" => Ok(ViewKind::Rhi),
            other => Err(format!("unknown view kind '{}', expected ppi or rhi", other)),
        }
    }
}

/// Range and angular sampling of a slice, in volume units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceAxes {
    /// Sample angles along the rows, radians.
    pub angles_rad: Vec<f64>,
    /// Angle covered by each row.
    pub angle_step_rad: f64,
    pub start_range_km: f64,
    pub range_resolution_km: f64,
}

/// Min, max and mean over the finite samples of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliceSummary {
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub mean: Option<f64>,
    pub finite_count: usize,
    pub total_count: usize,
}

/// A display-ready cross-section.
///
/// `data` is row-major with one row per angular sample and one column per
/// range bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub kind: ViewKind,
    pub product: Product,
    pub elevation_index: usize,
    pub azimuth_index: usize,
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
    pub axes: SliceAxes,
    pub transform: PolarTransform,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub product_name: String,
    pub units: String,
    pub color_domain: (f64, f64),
}

impl Slice {
    /// `(rows, cols)`, i.e. angles by range bins.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.rows {
            return None;
        }
        Some(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    pub fn summary(&self) -> SliceSummary {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        let mut finite_count = 0;

        for &v in self.data.iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
            finite_count += 1;
        }

        let any = finite_count > 0;
        SliceSummary {
            min: any.then_some(min),
            max: any.then_some(max),
            mean: any.then(|| sum / finite_count as f64),
            finite_count,
            total_count: self.data.len(),
        }
    }
}
