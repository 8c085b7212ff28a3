//! Synthetic radar scans with predictable values.
//!
//! [`SyntheticVolume`] describes a small scan and can produce it three ways:
//! as a MAT value tree laid out like the radar's export files, as the bytes
//! of a MAT-file, and as the [`RadarVolume`] a correct parser should return.
//! Sample values follow [`sample_value`], so any cell can be checked by index.

use std::path::Path;

use radar_common::{Product, RadarVolume, VolumeArray, VolumeMetadata, VolumeShape};

use crate::mat::{write_mat, MatOptions, MatValue};

/// Value stored at `(elevation, azimuth, range)` for the product at position
/// `slot` in the synthetic product list.
///
/// `slot * 1_000_000 + elevation * 10_000 + azimuth * 100 + range % 100`
///
/// Every value stays below 2^24 for up to 16 products, so it survives the
/// `f64 -> f32` conversion exactly.
///
/// ```
/// use test_utils::sample_value;
///
/// assert_eq!(sample_value(0, 0, 0, 0), 0.0);
/// assert_eq!(sample_value(1, 2, 3, 4), 1_020_304.0);
/// assert_eq!(sample_value(0, 0, 0, 123), 23.0);
/// ```
pub fn sample_value(slot: usize, elevation: usize, azimuth: usize, range: usize) -> f64 {
    (slot * 1_000_000 + elevation * 10_000 + azimuth * 100 + range % 100) as f64
}

/// Description of a synthetic scan.
#[derive(Debug, Clone)]
pub struct SyntheticVolume {
    pub elevations: usize,
    pub azimuths: usize,
    pub ranges: usize,
    pub products: Vec<Product>,
    /// Products written as complex matrices (`0.6v + 0.8vi`, magnitude `v`).
    pub complex_products: Vec<Product>,
    /// Reflectivity cells written as NaN.
    pub nan_reflectivity: Vec<(usize, usize, usize)>,
    pub azimuth_start_deg: f64,
    pub azimuth_step_deg: f64,
    pub elevation_start_deg: f64,
    pub elevation_step_deg: f64,
    pub start_range_km: f64,
    pub range_resolution_m: f64,
    pub radar: String,
    pub datestr: String,
}

impl Default for SyntheticVolume {
    fn default() -> Self {
        Self {
            elevations: 3,
            azimuths: 4,
            ranges: 5,
            products: vec![Product::Reflectivity, Product::Velocity],
            complex_products: Vec::new(),
            nan_reflectivity: Vec::new(),
            azimuth_start_deg: -30.0,
            azimuth_step_deg: 15.0,
            elevation_start_deg: 0.5,
            elevation_step_deg: 2.0,
            start_range_km: 2.0,
            range_resolution_m: 250.0,
            radar: "HRUS".to_string(),
            datestr: "28-Apr-2024".to_string(),
        }
    }
}

impl SyntheticVolume {
    pub fn with_dims(elevations: usize, azimuths: usize, ranges: usize) -> Self {
        Self {
            elevations,
            azimuths,
            ranges,
            ..Default::default()
        }
    }

    pub fn azimuths_deg(&self) -> Vec<f64> {
        (0..self.azimuths)
            .map(|i| self.azimuth_start_deg + i as f64 * self.azimuth_step_deg)
            .collect()
    }

    pub fn elevations_deg(&self) -> Vec<f64> {
        (0..self.elevations)
            .map(|i| self.elevation_start_deg + i as f64 * self.elevation_step_deg)
            .collect()
    }

    fn slot_value(&self, product: Product, slot: usize, e: usize, a: usize, r: usize) -> f64 {
        if product == Product::Reflectivity && self.nan_reflectivity.contains(&(e, a, r)) {
            return f64::NAN;
        }
        sample_value(slot, e, a, r)
    }

    fn product_block(&self, product: Product, slot: usize, elevation: usize) -> MatValue {
        // Stored as ranges x azimuths, column-major.
        let mut data = Vec::with_capacity(self.ranges * self.azimuths);
        for a in 0..self.azimuths {
            for r in 0..self.ranges {
                data.push(self.slot_value(product, slot, elevation, a, r));
            }
        }
        let dims = vec![self.ranges, self.azimuths];
        if self.complex_products.contains(&product) {
            MatValue::Complex {
                dims,
                real: data.iter().map(|v| v * 0.6).collect(),
                imag: data.iter().map(|v| v * 0.8).collect(),
            }
        } else {
            MatValue::Double { dims, data }
        }
    }

    fn sweep(&self, elevation: usize) -> Vec<(&'static str, MatValue)> {
        let elevation_deg = self.elevations_deg()[elevation];
        let prod = MatValue::struct_row(
            self.products
                .iter()
                .enumerate()
                .map(|(slot, product)| {
                    vec![
                        ("type", MatValue::text(&product.code().to_string())),
                        ("dr", MatValue::scalar(self.range_resolution_m)),
                        ("data", self.product_block(*product, slot, elevation)),
                    ]
                })
                .collect(),
        );

        vec![
            ("radar", MatValue::text(&self.radar)),
            ("lat", MatValue::scalar(35.18)),
            ("lon", MatValue::scalar(-97.44)),
            ("elev_m", MatValue::scalar(357.0)),
            ("height_m", MatValue::scalar(12.0)),
            ("lambda_m", MatValue::scalar(0.0938)),
            ("prf_hz", MatValue::scalar(1250.0)),
            ("nyq_m_per_s", MatValue::scalar(29.3)),
            ("datestr", MatValue::text(&self.datestr)),
            ("time", MatValue::scalar(7233.0)),
            ("vcp", MatValue::scalar(12.0)),
            ("el_deg", MatValue::row(&vec![elevation_deg; self.azimuths])),
            ("az_deg", MatValue::row(&self.azimuths_deg())),
            ("aze_deg", MatValue::Empty),
            ("bw_deg", MatValue::scalar(1.8)),
            ("sweep_el_deg", MatValue::scalar(elevation_deg)),
            ("sweep_az_deg", MatValue::scalar(0.0)),
            ("prod", prod),
            ("type", MatValue::text("PAR")),
            ("start_range_km", MatValue::scalar(self.start_range_km)),
        ]
    }

    /// The `volume` struct array, one element per sweep.
    pub fn to_mat_value(&self) -> MatValue {
        MatValue::struct_row((0..self.elevations).map(|e| self.sweep(e)).collect())
    }

    pub fn to_mat_bytes(&self, options: MatOptions) -> Vec<u8> {
        write_mat(&[("volume", self.to_mat_value())], options)
    }

    pub fn write_to(&self, path: impl AsRef<Path>, options: MatOptions) -> std::io::Result<()> {
        std::fs::write(path, self.to_mat_bytes(options))
    }

    /// The volume a parser should produce from [`Self::to_mat_bytes`].
    pub fn expected_volume(&self) -> RadarVolume {
        let shape = VolumeShape::new(self.elevations, self.azimuths, self.ranges);
        let metadata = VolumeMetadata {
            radar: Some(self.radar.clone()),
            radar_type: Some("PAR".to_string()),
            latitude: Some(35.18),
            longitude: Some(-97.44),
            antenna_elevation_m: Some(357.0),
            antenna_height_m: Some(12.0),
            wavelength_m: Some(0.0938),
            prf_hz: Some(1250.0),
            nyquist_velocity_ms: Some(29.3),
            date: Some(self.datestr.clone()),
            time: Some(7233.0),
            vcp: Some(12.0),
            azimuth_beamwidth_deg: Some(1.8),
            start_range_km: self.start_range_km,
            range_resolution_km: self.range_resolution_m / 1000.0,
        };

        let mut builder = RadarVolume::builder(metadata)
            .azimuths_rad(self.azimuths_deg().iter().map(|d| d.to_radians()).collect())
            .elevations_rad(self.elevations_deg().iter().map(|d| d.to_radians()).collect());

        for (slot, product) in self.products.iter().enumerate() {
            let mut data = Vec::with_capacity(shape.len());
            for e in 0..self.elevations {
                for a in 0..self.azimuths {
                    for r in 0..self.ranges {
                        let value = self.slot_value(*product, slot, e, a, r);
                        let value = if value.is_nan() { 0.0 } else { value };
                        let value = if self.complex_products.contains(product) {
                            (value * 0.6).hypot(value * 0.8)
                        } else {
                            value
                        };
                        data.push(value as f32);
                    }
                }
            }
            let array = VolumeArray::new(shape, data).expect("synthetic data matches shape");
            builder = builder.product(*product, array);
        }

        builder.build().expect("synthetic volume is valid")
    }
}

/// An in-memory volume of the given size filled with [`sample_value`] data
/// for reflectivity only. Skips the MAT encoding step entirely.
pub fn synthetic_radar_volume(elevations: usize, azimuths: usize, ranges: usize) -> RadarVolume {
    SyntheticVolume {
        products: vec![Product::Reflectivity],
        ..SyntheticVolume::with_dims(elevations, azimuths, ranges)
    }
    .expected_volume()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_volume_uses_sample_values() {
        let synthetic = SyntheticVolume::default();
        let volume = synthetic.expected_volume();
        let z = volume.product(Product::Reflectivity).unwrap();
        let v = volume.product(Product::Velocity).unwrap();

        assert_eq!(volume.shape(), VolumeShape::new(3, 4, 5));
        assert_eq!(z.get(2, 3, 4), Some(20_304.0));
        assert_eq!(v.get(0, 1, 2), Some(1_000_102.0));
    }

    #[test]
    fn test_nan_reflectivity_becomes_zero_in_expected_volume() {
        let synthetic = SyntheticVolume {
            nan_reflectivity: vec![(0, 0, 1)],
            ..Default::default()
        };
        let volume = synthetic.expected_volume();
        assert_eq!(volume.product(Product::Reflectivity).unwrap().get(0, 0, 1), Some(0.0));
    }

    #[test]
    fn test_mat_value_has_one_element_per_sweep() {
        match SyntheticVolume::with_dims(4, 2, 2).to_mat_value() {
            MatValue::Struct { dims, elements, .. } => {
                assert_eq!(dims, vec![1, 4]);
                assert_eq!(elements.len(), 4);
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }
}
