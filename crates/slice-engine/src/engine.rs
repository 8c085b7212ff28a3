//! Slice extraction.

use std::sync::Arc;

use radar_common::{ColorScales, Product, RadarVolume, Rgba};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{SliceError, SliceResult};
use crate::slice::{Slice, SliceAxes, ViewKind};
use crate::transform::{resolve_transform, PoleEdge, TransformParams};

/// Cuts display-ready slices out of radar volumes.
///
/// The engine holds no per-volume state; one instance serves every view.
#[derive(Debug, Clone)]
pub struct SliceEngine {
    scales: Arc<ColorScales>,
    pole_edge: PoleEdge,
}

impl SliceEngine {
    pub fn new(scales: Arc<ColorScales>) -> Self {
        Self {
            scales,
            pole_edge: PoleEdge::Near,
        }
    }

    /// Place the far end of the range axis at the pole instead.
    pub fn with_pole_edge(mut self, pole_edge: PoleEdge) -> Self {
        self.pole_edge = pole_edge;
        self
    }

    pub fn scales(&self) -> &ColorScales {
        &self.scales
    }

    /// Extract one slice.
    ///
    /// PPI takes sweep `elevation` (azimuth by range); RHI takes radial
    /// `azimuth` from every sweep (elevation by range). Only the index the
    /// view uses is checked.
    pub fn extract(
        &self,
        volume: &RadarVolume,
        product: Product,
        elevation: usize,
        azimuth: usize,
        kind: ViewKind,
    ) -> SliceResult<Slice> {
        let array = volume
            .product(product)
            .ok_or(SliceError::ProductMissing(product))?;
        let shape = array.shape();

        let (rows, data, angles_rad) = match kind {
            ViewKind::Ppi => {
                let sweep = array.sweep(elevation).ok_or(SliceError::ElevationOutOfRange {
                    index: elevation,
                    count: shape.elevations,
                })?;
                (shape.azimuths, sweep.to_vec(), volume.azimuths_rad().to_vec())
            }
            ViewKind::Rhi => {
                if azimuth >= shape.azimuths {
                    return Err(SliceError::AzimuthOutOfRange {
                        index: azimuth,
                        count: shape.azimuths,
                    });
                }
                let mut data = Vec::with_capacity(shape.elevations * shape.ranges);
                for e in 0..shape.elevations {
                    if let Some(ray) = array.ray(e, azimuth) {
                        data.extend_from_slice(ray);
                    }
                }
                (shape.elevations, data, volume.elevations_rad().to_vec())
            }
        };

        let params = TransformParams {
            pole_edge: self.pole_edge,
            ..TransformParams::for_view(kind, volume)
        };
        let transform = resolve_transform(&params)?;
        let scale = self.scales.get(product);

        debug!(
            view = %kind,
            product = %product,
            elevation,
            azimuth,
            rows,
            cols = shape.ranges,
            "Extracted slice"
        );

        Ok(Slice {
            kind,
            product,
            elevation_index: elevation,
            azimuth_index: azimuth,
            rows,
            cols: shape.ranges,
            data,
            axes: SliceAxes {
                angles_rad,
                angle_step_rad: params.swath_rad / rows as f64,
                start_range_km: volume.start_range_km(),
                range_resolution_km: volume.range_resolution_km(),
            },
            transform,
            title: format!("{} ({})", kind.name(), product.code()),
            x_label: kind.x_label().to_string(),
            y_label: kind.y_label().to_string(),
            product_name: product.name().to_string(),
            units: product.units().to_string(),
            color_domain: scale.domain(),
        })
    }

    /// Colors for every sample of `slice`, in the same order as its data.
    pub fn colorize(&self, slice: &Slice) -> Vec<Rgba> {
        let scale = self.scales.get(slice.product);
        slice
            .data
            .par_iter()
            .map(|&v| scale.color_for(v as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{sample_value, synthetic_radar_volume, SyntheticVolume};

    fn engine() -> SliceEngine {
        SliceEngine::new(Arc::new(ColorScales::default()))
    }

    #[test]
    fn test_ppi_slice_is_one_sweep() {
        let volume = synthetic_radar_volume(3, 4, 5);
        let slice = engine()
            .extract(&volume, Product::Reflectivity, 1, 0, ViewKind::Ppi)
            .unwrap();

        assert_eq!(slice.shape(), (4, 5));
        assert_eq!(slice.get(2, 3), Some(sample_value(0, 1, 2, 3) as f32));
        assert_eq!(slice.axes.angles_rad, volume.azimuths_rad());
        assert_eq!(slice.title, "PPI (Z)");
        assert_eq!(slice.color_domain, (-10.0, 70.0));
    }

    #[test]
    fn test_rhi_slice_is_one_radial_from_every_sweep() {
        let volume = synthetic_radar_volume(3, 4, 5);
        let slice = engine()
            .extract(&volume, Product::Reflectivity, 0, 2, ViewKind::Rhi)
            .unwrap();

        assert_eq!(slice.shape(), (3, 5));
        for e in 0..3 {
            assert_eq!(slice.get(e, 4), Some(sample_value(0, e, 2, 4) as f32));
        }
        assert_eq!(slice.x_label, "Range (km)");
        assert_eq!(slice.axes.angles_rad, volume.elevations_rad());
    }

    #[test]
    fn test_only_the_used_index_is_checked() {
        let volume = synthetic_radar_volume(3, 4, 5);
        let engine = engine();
        assert!(engine
            .extract(&volume, Product::Reflectivity, 0, 99, ViewKind::Ppi)
            .is_ok());
        assert_eq!(
            engine
                .extract(&volume, Product::Reflectivity, 3, 0, ViewKind::Ppi)
                .unwrap_err(),
            SliceError::ElevationOutOfRange { index: 3, count: 3 }
        );
        assert_eq!(
            engine
                .extract(&volume, Product::Reflectivity, 0, 4, ViewKind::Rhi)
                .unwrap_err(),
            SliceError::AzimuthOutOfRange { index: 4, count: 4 }
        );
    }

    #[test]
    fn test_missing_product() {
        let volume = synthetic_radar_volume(2, 2, 2);
        assert_eq!(
            engine()
                .extract(&volume, Product::Velocity, 0, 0, ViewKind::Ppi)
                .unwrap_err(),
            SliceError::ProductMissing(Product::Velocity)
        );
    }

    #[test]
    fn test_velocity_slice_uses_velocity_scale() {
        let volume = SyntheticVolume::default().expected_volume();
        let slice = engine()
            .extract(&volume, Product::Velocity, 0, 0, ViewKind::Ppi)
            .unwrap();
        assert_eq!(slice.color_domain, (-50.0, 50.0));
        assert_eq!(slice.units, "m/s");
    }

    #[test]
    fn test_colorize_matches_scale() {
        let volume = synthetic_radar_volume(1, 2, 3);
        let engine = engine();
        let slice = engine
            .extract(&volume, Product::Reflectivity, 0, 0, ViewKind::Ppi)
            .unwrap();
        let colors = engine.colorize(&slice);

        let scale = engine.scales().get(Product::Reflectivity);
        assert_eq!(colors.len(), 6);
        assert_eq!(colors[4], scale.color_for(slice.data[4] as f64));
    }
}
