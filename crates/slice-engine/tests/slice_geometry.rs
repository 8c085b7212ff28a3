//! Slices of full-size volumes.

use std::sync::Arc;

use radar_common::{ColorScales, Product};
use slice_engine::{SliceEngine, ViewKind};
use test_utils::{
    assert_approx_eq, assert_coords_approx_eq, sample_value, synthetic_radar_volume, SyntheticVolume,
};

fn engine() -> SliceEngine {
    SliceEngine::new(Arc::new(ColorScales::default()))
}

// ============================================================================
// Slice shapes
// ============================================================================

#[test]
fn test_full_size_slice_shapes() {
    let volume = synthetic_radar_volume(20, 44, 1822);
    let engine = engine();

    let ppi = engine
        .extract(&volume, Product::Reflectivity, 0, 0, ViewKind::Ppi)
        .unwrap();
    assert_eq!(ppi.shape(), (44, 1822));

    let rhi = engine
        .extract(&volume, Product::Reflectivity, 0, 22, ViewKind::Rhi)
        .unwrap();
    assert_eq!(rhi.shape(), (20, 1822));
    assert_eq!(rhi.get(19, 1821), Some(sample_value(0, 19, 22, 1821) as f32));
}

// ============================================================================
// Display geometry
// ============================================================================

#[test]
fn test_ppi_wedge_is_centred_on_north() {
    // Azimuths -30°, -15°, 0°, 15°: swath 60° starting 30° west of north.
    let volume = SyntheticVolume::default().expected_volume();
    let slice = engine()
        .extract(&volume, Product::Reflectivity, 0, 0, ViewKind::Ppi)
        .unwrap();

    let (x_west, y_west) = slice.transform.to_display(0.0, 5.0);
    let (x_east, y_east) = slice.transform.to_display(4.0, 5.0);
    assert!(x_west < 0.0 && y_west > 0.0);
    assert!(x_east > 0.0 && y_east > 0.0);
    assert_coords_approx_eq!((x_west, y_west), (-x_east, y_east), 1e-9);
}

#[test]
fn test_rhi_grows_upwards_from_east() {
    let volume = SyntheticVolume::default().expected_volume();
    let slice = engine()
        .extract(&volume, Product::Reflectivity, 0, 0, ViewKind::Rhi)
        .unwrap();

    let (x_low, y_low) = slice.transform.to_display(0.0, 5.0);
    let (x_high, y_high) = slice.transform.to_display(3.0, 5.0);
    assert!(x_low > 0.0 && x_high > 0.0);
    assert!(y_high > y_low);
    assert_eq!(slice.y_label, "Height (km)");
}

#[test]
fn test_range_scale_follows_last_bin() {
    let volume = SyntheticVolume::default().expected_volume();
    let slice = engine()
        .extract(&volume, Product::Reflectivity, 0, 0, ViewKind::Ppi)
        .unwrap();

    // Bins start 8 units out (2 km / 250 m); 5 bins end at 3 km.
    assert_approx_eq!(slice.transform.km_per_unit(), 3.0 / 13.0, 1e-12);
    assert_approx_eq!(slice.transform.radial_offset(), 8.0, 1e-12);
    assert_approx_eq!(slice.transform.max_radius_km(), 3.0, 1e-12);
}

// ============================================================================
// Queries and summaries
// ============================================================================

#[test]
fn test_round_trip_query_through_display() {
    // 1° radials so the wedge does not overlap itself.
    let volume = SyntheticVolume {
        products: vec![Product::Reflectivity],
        azimuth_step_deg: 1.0,
        ..SyntheticVolume::with_dims(3, 44, 100)
    }
    .expected_volume();
    let slice = engine()
        .extract(&volume, Product::Reflectivity, 2, 0, ViewKind::Ppi)
        .unwrap();

    for &(a, r) in &[(0usize, 0usize), (21, 50), (43, 99)] {
        let (x, y) = slice.transform.to_display(a as f64 + 0.5, r as f64 + 0.5);
        let point = slice.query_display(x, y).unwrap();
        assert_eq!((point.angle_index, point.range_index), (a, r));
        assert_eq!(point.value, sample_value(0, 2, a, r) as f32);
    }
}

#[test]
fn test_summary_and_json_dump() {
    let volume = synthetic_radar_volume(1, 2, 3);
    let slice = engine()
        .extract(&volume, Product::Reflectivity, 0, 0, ViewKind::Ppi)
        .unwrap();

    let summary = slice.summary();
    assert_eq!(summary.finite_count, 6);
    assert_eq!(summary.min, Some(0.0));
    assert_eq!(summary.max, Some(102.0));
    assert_approx_eq!(summary.mean.unwrap(), 51.0, 1e-9);

    let json = serde_json::to_value(&slice).unwrap();
    assert_eq!(json["kind"], "ppi");
    assert_eq!(json["product"], "Z");
    assert_eq!(json["rows"], 2);
    assert_eq!(json["data"].as_array().unwrap().len(), 6);
}
