//! Point queries for hover readouts.

use std::f64::consts::TAU;

use serde::Serialize;

use crate::slice::Slice;

/// Tolerance on the slice edges, in index units.
const EDGE_TOLERANCE: f64 = 1e-9;

/// The sample under a queried point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointValue {
    pub value: f32,
    pub angle_index: usize,
    pub range_index: usize,
    /// Range of the sample's bin.
    pub range_km: f64,
    /// Angle of the sample's row.
    pub angle_deg: f64,
}

impl Slice {
    /// Sample at `range_km` and `angle_deg` (azimuth for PPI, elevation for
    /// RHI), or `None` inside the start range, beyond the last bin, or
    /// outside the swath.
    ///
    /// Angles are taken relative to the first row modulo 360°. A point on
    /// the outer edge of either axis maps to the last index.
    pub fn query(&self, range_km: f64, angle_deg: f64) -> Option<PointValue> {
        if !range_km.is_finite() || !angle_deg.is_finite() {
            return None;
        }
        let first = *self.axes.angles_rad.first()?;
        let r = (range_km - self.axes.start_range_km) / self.axes.range_resolution_km;
        let a = (angle_deg.to_radians() - first).rem_euclid(TAU) / self.axes.angle_step_rad;
        self.point_at(a, r)
    }

    /// Sample under a display point in kilometres.
    pub fn query_display(&self, x_km: f64, y_km: f64) -> Option<PointValue> {
        let (a, r) = self.transform.from_display(x_km, y_km)?;
        self.point_at(a, r)
    }

    fn point_at(&self, a: f64, r: f64) -> Option<PointValue> {
        let angle_index = cell_index(a, self.rows)?;
        let range_index = cell_index(r, self.cols)?;
        Some(PointValue {
            value: self.get(angle_index, range_index)?,
            angle_index,
            range_index,
            range_km: self.axes.start_range_km
                + range_index as f64 * self.axes.range_resolution_km,
            angle_deg: self.axes.angles_rad.get(angle_index)?.to_degrees(),
        })
    }
}

fn cell_index(x: f64, count: usize) -> Option<usize> {
    let n = count as f64;
    if count == 0 || !x.is_finite() || x < -EDGE_TOLERANCE || x > n + EDGE_TOLERANCE {
        return None;
    }
    Some((x.max(0.0).floor() as usize).min(count - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use radar_common::{ColorScales, Product};
    use test_utils::{sample_value, synthetic_radar_volume};

    use crate::engine::SliceEngine;
    use crate::slice::ViewKind;

    // 4 azimuths from -30° in 15° steps (swath 60°), 5 bins from 2 km every 250 m.
    fn ppi() -> Slice {
        let volume = synthetic_radar_volume(3, 4, 5);
        SliceEngine::new(Arc::new(ColorScales::default()))
            .extract(&volume, Product::Reflectivity, 1, 0, ViewKind::Ppi)
            .unwrap()
    }

    #[test]
    fn test_query_inside() {
        let point = ppi().query(2.6, 7.5).unwrap();
        assert_eq!(point.angle_index, 2);
        assert_eq!(point.range_index, 2);
        assert_eq!(point.value, sample_value(0, 1, 2, 2) as f32);
        assert!((point.range_km - 2.5).abs() < 1e-12);
        assert!((point.angle_deg - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_query_inside_start_range() {
        assert!(ppi().query(1.9, 0.0).is_none());
    }

    #[test]
    fn test_query_beyond_last_bin() {
        assert!(ppi().query(3.3, 0.0).is_none());
    }

    #[test]
    fn test_query_outside_swath() {
        let slice = ppi();
        assert!(slice.query(2.5, 31.0).is_none());
        assert!(slice.query(2.5, -31.0).is_none());
        assert!(slice.query(2.5, 180.0).is_none());
    }

    #[test]
    fn test_query_outer_edges_clamp() {
        let slice = ppi();
        let point = slice.query(3.25, 30.0).unwrap();
        assert_eq!(point.angle_index, 3);
        assert_eq!(point.range_index, 4);
    }

    #[test]
    fn test_query_first_edges() {
        let point = ppi().query(2.0, -30.0).unwrap();
        assert_eq!(point.angle_index, 0);
        assert_eq!(point.range_index, 0);
    }

    #[test]
    fn test_query_display_agrees_with_transform() {
        let slice = ppi();
        let (x, y) = slice.transform.to_display(2.5, 1.5);
        let point = slice.query_display(x, y).unwrap();
        assert_eq!(point.angle_index, 2);
        assert_eq!(point.range_index, 1);
        assert!(slice.query_display(0.0, -1.0).is_none());
    }

    #[test]
    fn test_cell_index() {
        assert_eq!(cell_index(0.0, 3), Some(0));
        assert_eq!(cell_index(2.999, 3), Some(2));
        assert_eq!(cell_index(3.0, 3), Some(2));
        assert_eq!(cell_index(3.1, 3), None);
        assert_eq!(cell_index(-0.1, 3), None);
        assert_eq!(cell_index(0.5, 0), None);
    }
}
