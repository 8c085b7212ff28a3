//! The radar volume: one scan's full measurement cube.
//!
//! ```text
//!   product ──► VolumeArray [elevation][azimuth][range]   (row-major f32)
//!                    │
//!   elevations_rad ──┘ one per sweep
//!   azimuths_rad   ──── one per radial
//!   range axis     ──── start_range_km + i * range_resolution_km
//! ```
//!
//! A [`RadarVolume`] is validated once by [`RadarVolumeBuilder::build`] and
//! never mutated afterwards, so it can be shared between threads behind an
//! `Arc` without locking.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RadarError, RadarResult};
use crate::product::{Product, ProductTable};

/// Angular extent assumed for a single-sample axis with no recorded beamwidth.
const DEFAULT_SINGLE_SAMPLE_SWATH_DEG: f64 = 1.0;

/// Dimensions of a product array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeShape {
    pub elevations: usize,
    pub azimuths: usize,
    pub ranges: usize,
}

impl VolumeShape {
    pub fn new(elevations: usize, azimuths: usize, ranges: usize) -> Self {
        Self {
            elevations,
            azimuths,
            ranges,
        }
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.elevations * self.azimuths * self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for VolumeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.elevations, self.azimuths, self.ranges)
    }
}

/// Dense 3-D product array in elevation, azimuth, range order.
#[derive(Debug, Clone)]
pub struct VolumeArray {
    shape: VolumeShape,
    data: Vec<f32>,
}

impl VolumeArray {
    pub fn new(shape: VolumeShape, data: Vec<f32>) -> RadarResult<Self> {
        if data.len() != shape.len() {
            return Err(RadarError::DataLength {
                shape,
                expected: shape.len(),
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Array of the given shape with every sample set to `value`.
    pub fn filled(shape: VolumeShape, value: f32) -> Self {
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }

    pub fn shape(&self) -> VolumeShape {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    fn offset(&self, elevation: usize, azimuth: usize, range: usize) -> Option<usize> {
        if elevation >= self.shape.elevations
            || azimuth >= self.shape.azimuths
            || range >= self.shape.ranges
        {
            return None;
        }
        Some((elevation * self.shape.azimuths + azimuth) * self.shape.ranges + range)
    }

    pub fn get(&self, elevation: usize, azimuth: usize, range: usize) -> Option<f32> {
        self.offset(elevation, azimuth, range).map(|i| self.data[i])
    }

    /// All samples of one sweep, azimuth-major.
    pub fn sweep(&self, elevation: usize) -> Option<&[f32]> {
        if elevation >= self.shape.elevations {
            return None;
        }
        let len = self.shape.azimuths * self.shape.ranges;
        let start = elevation * len;
        Some(&self.data[start..start + len])
    }

    /// The range samples of one radial.
    pub fn ray(&self, elevation: usize, azimuth: usize) -> Option<&[f32]> {
        let start = self.offset(elevation, azimuth, 0)?;
        Some(&self.data[start..start + self.shape.ranges])
    }
}

/// Bitwise sample comparison, so NaN samples compare equal to themselves.
impl PartialEq for VolumeArray {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Scalar metadata recorded with a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeMetadata {
    pub radar: Option<String>,
    pub radar_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub antenna_elevation_m: Option<f64>,
    pub antenna_height_m: Option<f64>,
    pub wavelength_m: Option<f64>,
    pub prf_hz: Option<f64>,
    pub nyquist_velocity_ms: Option<f64>,
    pub date: Option<String>,
    pub time: Option<f64>,
    pub vcp: Option<f64>,
    pub azimuth_beamwidth_deg: Option<f64>,
    pub start_range_km: f64,
    pub range_resolution_km: f64,
}

/// One scan's measurement cube plus its angular and scalar metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarVolume {
    metadata: VolumeMetadata,
    azimuths_rad: Vec<f64>,
    elevations_rad: Vec<f64>,
    products: ProductTable,
    shape: VolumeShape,
}

impl RadarVolume {
    pub fn builder(metadata: VolumeMetadata) -> RadarVolumeBuilder {
        RadarVolumeBuilder {
            metadata,
            azimuths_rad: Vec::new(),
            elevations_rad: Vec::new(),
            products: ProductTable::new(),
        }
    }

    pub fn metadata(&self) -> &VolumeMetadata {
        &self.metadata
    }

    pub fn azimuths_rad(&self) -> &[f64] {
        &self.azimuths_rad
    }

    pub fn elevations_rad(&self) -> &[f64] {
        &self.elevations_rad
    }

    /// Shape shared by every product in the volume.
    pub fn shape(&self) -> VolumeShape {
        self.shape
    }

    pub fn product(&self, product: Product) -> Option<&VolumeArray> {
        self.products.get(product)
    }

    pub fn products(&self) -> &ProductTable {
        &self.products
    }

    pub fn start_range_km(&self) -> f64 {
        self.metadata.start_range_km
    }

    pub fn range_resolution_km(&self) -> f64 {
        self.metadata.range_resolution_km
    }

    /// Range of bin `index` in kilometres.
    pub fn range_km(&self, index: usize) -> f64 {
        self.metadata.start_range_km + index as f64 * self.metadata.range_resolution_km
    }

    pub fn ranges_km(&self) -> Vec<f64> {
        (0..self.shape.ranges).map(|i| self.range_km(i)).collect()
    }

    /// Range of the outermost bin, or the start range for an empty range axis.
    pub fn last_range_km(&self) -> f64 {
        self.range_km(self.shape.ranges.saturating_sub(1))
    }

    /// Number of whole range bins between the radar and the first sample.
    pub fn range_offset_index(&self) -> f64 {
        (self.metadata.start_range_km / self.metadata.range_resolution_km).floor()
    }

    pub fn azimuth_swath_rad(&self) -> f64 {
        swath_rad(&self.azimuths_rad, self.single_sample_swath_rad())
    }

    pub fn elevation_swath_rad(&self) -> f64 {
        swath_rad(&self.elevations_rad, self.single_sample_swath_rad())
    }

    fn single_sample_swath_rad(&self) -> f64 {
        self.metadata
            .azimuth_beamwidth_deg
            .filter(|bw| bw.is_finite() && *bw > 0.0)
            .unwrap_or(DEFAULT_SINGLE_SAMPLE_SWATH_DEG)
            .to_radians()
    }
}

/// Angular extent covered by `angles`, counting one full sample step at the
/// far edge so that `n` samples span `n` cells.
fn swath_rad(angles: &[f64], single_sample: f64) -> f64 {
    match angles {
        [] => 0.0,
        [_] => single_sample,
        [first, .., last] => {
            let n = angles.len() as f64;
            (last - first).abs() * n / (n - 1.0)
        }
    }
}

/// Collects the parts of a [`RadarVolume`] and checks its invariants.
#[derive(Debug, Clone)]
pub struct RadarVolumeBuilder {
    metadata: VolumeMetadata,
    azimuths_rad: Vec<f64>,
    elevations_rad: Vec<f64>,
    products: ProductTable,
}

impl RadarVolumeBuilder {
    pub fn azimuths_rad(mut self, azimuths: Vec<f64>) -> Self {
        self.azimuths_rad = azimuths;
        self
    }

    pub fn elevations_rad(mut self, elevations: Vec<f64>) -> Self {
        self.elevations_rad = elevations;
        self
    }

    pub fn product(mut self, product: Product, array: VolumeArray) -> Self {
        self.products.insert(product, array);
        self
    }

    /// Validate and freeze the volume.
    ///
    /// The first product present (in [`Product::ALL`] order) defines the shape
    /// every other product must match.
    pub fn build(self) -> RadarResult<RadarVolume> {
        let resolution = self.metadata.range_resolution_km;
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(RadarError::InvalidResolution(resolution));
        }

        let mut iter = self.products.iter();
        let (_, first) = iter.next().ok_or(RadarError::NoProducts)?;
        let shape = first.shape();

        for (product, array) in iter {
            if array.shape() != shape {
                return Err(RadarError::ShapeMismatch {
                    product,
                    expected: shape,
                    actual: array.shape(),
                });
            }
        }

        if self.elevations_rad.len() != shape.elevations {
            return Err(RadarError::AngleCountMismatch {
                axis: "elevation",
                expected: shape.elevations,
                actual: self.elevations_rad.len(),
            });
        }
        if self.azimuths_rad.len() != shape.azimuths {
            return Err(RadarError::AngleCountMismatch {
                axis: "azimuth",
                expected: shape.azimuths,
                actual: self.azimuths_rad.len(),
            });
        }

        Ok(RadarVolume {
            metadata: self.metadata,
            azimuths_rad: self.azimuths_rad,
            elevations_rad: self.elevations_rad,
            products: self.products,
            shape,
        })
    }
}
