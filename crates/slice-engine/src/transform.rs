//! Index-plane to display-plane transform for polar slices.
//!
//! A slice is an image indexed by `(a, r)`: `a` walks the angular axis
//! (`W` samples) and `r` the range bins (`H` samples). Displaying it means
//! bending that rectangle into a wedge. The composition, outermost first:
//!
//! ```text
//!   (x, y) km = km_per_unit * polar(θ, ρ)
//!   (θ, ρ)    = S(step, 1)            angular index -> radians
//!             · T(k·W/2, -k·H)        pole edge switch (k = 1 for the far edge)
//!             · T(rot, 0)             zero bearing and first sample angle
//!             · M(dir, 1)             sweep direction
//!             · T(0, offset)          range bins hidden inside the start range
//!             · (a, r)
//! ```
//!
//! The affine part is a single homogeneous [`Matrix3`]. Display angles are
//! measured counter-clockwise from +x (east).

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Matrix3, Point2, Vector2};
use radar_common::RadarVolume;
use serde::Serialize;

use crate::error::{SliceError, SliceResult};
use crate::slice::ViewKind;

/// Slack allowed on the slice edges when inverting.
const EDGE_EPSILON: f64 = 1e-9;

/// Display bearing of angular sample value zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZeroBearing {
    North,
    East,
}

impl ZeroBearing {
    pub fn display_angle(self) -> f64 {
        match self {
            ZeroBearing::North => FRAC_PI_2,
            ZeroBearing::East => 0.0,
        }
    }
}

/// Direction in which increasing sample angles turn on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SweepDirection {
    Clockwise,
    CounterClockwise,
}

impl SweepDirection {
    pub fn sign(self) -> f64 {
        match self {
            SweepDirection::Clockwise => -1.0,
            SweepDirection::CounterClockwise => 1.0,
        }
    }
}

/// Which end of the range axis sits at the pole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PoleEdge {
    /// Bin 0 is nearest the radar.
    #[default]
    Near,
    /// The last bin is nearest the radar.
    Far,
}

/// Inputs of [`resolve_transform`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransformParams {
    /// Angular extent covered by the `angle_count` samples.
    pub swath_rad: f64,
    /// Angle of the first sample, in the sample's own convention.
    pub first_angle_rad: f64,
    pub angle_count: usize,
    pub range_count: usize,
    /// Whole range bins between the radar and the first bin.
    pub range_offset_index: f64,
    /// Range of the last bin.
    pub last_range_km: f64,
    pub zero: ZeroBearing,
    pub direction: SweepDirection,
    pub pole_edge: PoleEdge,
}

impl TransformParams {
    /// Parameters for a slice of `volume` as displayed by `kind`.
    pub fn for_view(kind: ViewKind, volume: &RadarVolume) -> Self {
        let shape = volume.shape();
        let (swath_rad, angles, angle_count) = match kind {
            ViewKind::Ppi => (volume.azimuth_swath_rad(), volume.azimuths_rad(), shape.azimuths),
            ViewKind::Rhi => (
                volume.elevation_swath_rad(),
                volume.elevations_rad(),
                shape.elevations,
            ),
        };
        let (zero, direction) = match kind {
            ViewKind::Ppi => (ZeroBearing::North, SweepDirection::Clockwise),
            ViewKind::Rhi => (ZeroBearing::East, SweepDirection::CounterClockwise),
        };

        Self {
            swath_rad,
            first_angle_rad: angles.first().copied().unwrap_or(0.0),
            angle_count,
            range_count: shape.ranges,
            range_offset_index: volume.range_offset_index(),
            last_range_km: volume.last_range_km(),
            zero,
            direction,
            pole_edge: PoleEdge::Near,
        }
    }
}

/// A resolved display transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolarTransform {
    params: TransformParams,
    km_per_unit: f64,
    angle_scale_rad: f64,
    angle_offset_rad: f64,
    radial_offset: f64,
    #[serde(skip)]
    affine: Matrix3<f64>,
    #[serde(skip)]
    inverse: Matrix3<f64>,
}

/// Compose the display transform for a slice.
pub fn resolve_transform(params: &TransformParams) -> SliceResult<PolarTransform> {
    let w = params.angle_count as f64;
    let h = params.range_count as f64;

    if params.angle_count == 0 || params.range_count == 0 {
        return Err(SliceError::DegenerateGeometry(format!(
            "slice has {} angles and {} range bins",
            params.angle_count, params.range_count
        )));
    }
    if !params.swath_rad.is_finite() || params.swath_rad <= 0.0 {
        return Err(SliceError::DegenerateGeometry(format!(
            "swath of {} rad",
            params.swath_rad
        )));
    }

    let km_per_unit = params.last_range_km / (params.range_offset_index + h);
    if !km_per_unit.is_finite() || km_per_unit <= 0.0 {
        return Err(SliceError::DegenerateGeometry(format!(
            "{} km per index unit",
            km_per_unit
        )));
    }

    let step = params.swath_rad / w;
    let sign = params.direction.sign();
    let k = match params.pole_edge {
        PoleEdge::Near => 0.0,
        PoleEdge::Far => 1.0,
    };
    let rotation = (params.zero.display_angle() + sign * params.first_angle_rad) / step;

    let affine = Matrix3::new_nonuniform_scaling(&Vector2::new(step, 1.0))
        * Matrix3::new_translation(&Vector2::new(k * w / 2.0, -k * h))
        * Matrix3::new_translation(&Vector2::new(rotation, 0.0))
        * Matrix3::new_nonuniform_scaling(&Vector2::new(sign, 1.0))
        * Matrix3::new_translation(&Vector2::new(0.0, params.range_offset_index));

    let inverse = affine.try_inverse().ok_or_else(|| {
        SliceError::DegenerateGeometry("display transform is not invertible".to_string())
    })?;

    Ok(PolarTransform {
        params: *params,
        km_per_unit,
        angle_scale_rad: sign * step,
        angle_offset_rad: (rotation + k * w / 2.0) * step,
        radial_offset: params.range_offset_index - k * h,
        affine,
        inverse,
    })
}

impl PolarTransform {
    pub fn params(&self) -> &TransformParams {
        &self.params
    }

    /// Kilometres per radial index unit.
    pub fn km_per_unit(&self) -> f64 {
        self.km_per_unit
    }

    /// Display radians per angular index, negative for clockwise sweeps.
    pub fn angle_scale_rad(&self) -> f64 {
        self.angle_scale_rad
    }

    /// Display angle of angular index zero.
    pub fn angle_offset_rad(&self) -> f64 {
        self.angle_offset_rad
    }

    /// Radial units added to a range index before scaling.
    pub fn radial_offset(&self) -> f64 {
        self.radial_offset
    }

    /// The homogeneous affine taking `(a, r)` to `(θ, ρ)`.
    pub fn affine(&self) -> &Matrix3<f64> {
        &self.affine
    }

    /// Distance from the pole to the outer edge of the slice.
    pub fn max_radius_km(&self) -> f64 {
        let h = self.params.range_count as f64;
        self.km_per_unit * self.radial_offset.abs().max((h + self.radial_offset).abs())
    }

    /// `(θ, ρ)` of continuous index coordinates.
    pub fn to_polar(&self, a: f64, r: f64) -> (f64, f64) {
        let p = self.affine.transform_point(&Point2::new(a, r));
        (p.x, p.y)
    }

    /// Cartesian kilometres of continuous index coordinates.
    pub fn to_display(&self, a: f64, r: f64) -> (f64, f64) {
        let (theta, rho) = self.to_polar(a, r);
        let rho_km = rho * self.km_per_unit;
        (rho_km * theta.cos(), rho_km * theta.sin())
    }

    /// Continuous index coordinates of a display point, or `None` outside
    /// the slice.
    pub fn from_display(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let w = self.params.angle_count as f64;
        let h = self.params.range_count as f64;
        let rho = x.hypot(y) / self.km_per_unit;
        let theta = y.atan2(x);

        let edge_a = self.angle_offset_rad;
        let edge_b = self.angle_offset_rad + self.angle_scale_rad * w;
        let (lo, hi) = (edge_a.min(edge_b), edge_a.max(edge_b));

        // A point is reachable with a positive radius at θ, or with a
        // negative one at θ + π; each modulo full turns.
        for (rho, theta) in [(rho, theta), (-rho, theta + PI)] {
            let mut turn = ((lo - EDGE_EPSILON - theta) / TAU).ceil();
            while theta + turn * TAU <= hi + EDGE_EPSILON {
                let candidate = Point2::new(theta + turn * TAU, rho);
                let index = self.inverse.transform_point(&candidate);
                let in_angle = (-EDGE_EPSILON..=w + EDGE_EPSILON).contains(&index.x);
                let in_range = (-EDGE_EPSILON..=h + EDGE_EPSILON).contains(&index.y);
                if in_angle && in_range {
                    return Some((index.x.clamp(0.0, w), index.y.clamp(0.0, h)));
                }
                turn += 1.0;
            }
        }
        None
    }
}
