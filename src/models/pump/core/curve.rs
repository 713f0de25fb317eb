//! Per-rotor head and efficiency interpolants.
//!
//! Rotor points arrive unordered and may repeat a flow value. They are
//! sorted by flow and collapsed to the first point at each flow before the
//! flow→head and flow→efficiency interpolants are built. Each rotor keeps its
//! own flow domain.

use thiserror::Error;

use crate::support::{
    constraint::Percentage,
    interp::{Interp1d, InterpolationError, InterpolationKind, linspace, sort_and_dedup},
};

use super::{
    calibration::{CalibrationError, CoordinateMapper},
    rotor::{PhysicalPoint, RotorSet},
};

/// Resampling and interpolation settings for rotor curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveConfig {
    /// Number of evenly spaced flows in a resampled curve.
    pub samples: usize,

    /// Interpolation scheme between points.
    pub kind: InterpolationKind,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            samples: 100,
            kind: InterpolationKind::Linear,
        }
    }
}

/// Reasons a rotor is left out of the interpolated outputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// One resampled point of a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub flow: f64,
    pub head: f64,
    pub efficiency: f64,
}

/// Head and efficiency of one rotor as functions of flow.
#[derive(Debug, Clone, PartialEq)]
pub struct RotorCurve {
    name: String,
    parallel: bool,
    head: Interp1d,
    efficiency: Interp1d,
}

impl RotorCurve {
    /// Builds the interpolants for one rotor.
    ///
    /// # Errors
    ///
    /// Returns an [`InterpolationError`] if fewer than two points are given
    /// or fewer than two unique flows remain after duplicates are collapsed.
    pub fn new(
        name: impl Into<String>,
        parallel: bool,
        points: &[PhysicalPoint],
        kind: InterpolationKind,
    ) -> Result<Self, InterpolationError> {
        let name = name.into();
        if points.len() < 2 {
            return Err(InterpolationError::TooFewPoints {
                count: points.len(),
            });
        }

        let (unique, dropped) = sort_and_dedup(points.to_vec(), PhysicalPoint::flow);
        if dropped > 0 {
            tracing::debug!(rotor = %name, dropped, "collapsed points sharing a flow value");
        }
        if unique.len() < 2 {
            return Err(InterpolationError::TooFewUniqueAbscissae {
                unique: unique.len(),
            });
        }

        let flows: Vec<f64> = unique.iter().map(PhysicalPoint::flow).collect();
        let heads = unique.iter().map(PhysicalPoint::head).collect();
        let efficiencies = unique.iter().map(PhysicalPoint::efficiency).collect();

        Ok(Self {
            head: Interp1d::new(flows.clone(), heads, kind)?,
            efficiency: Interp1d::new(flows, efficiencies, kind)?,
            name,
            parallel,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Lowest and highest flow with data.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        self.head.domain()
    }

    /// Interpolated head, `NaN` outside the domain.
    #[must_use]
    pub fn head_at(&self, flow: f64) -> f64 {
        self.head.eval(flow)
    }

    /// Interpolated efficiency clamped to `0..=100`, `NaN` outside the domain.
    #[must_use]
    pub fn efficiency_at(&self, flow: f64) -> f64 {
        let value = self.efficiency.eval(flow);
        if value.is_nan() {
            value
        } else {
            Percentage::clamp(value)
        }
    }

    /// Samples the curve at `n` evenly spaced flows across its own domain.
    ///
    /// Head is clamped to be non-negative and efficiency to `0..=100`.
    #[must_use]
    pub fn resample(&self, n: usize) -> Vec<CurveSample> {
        let (lo, hi) = self.domain();
        linspace(lo, hi, n)
            .into_iter()
            .map(|flow| CurveSample {
                flow,
                head: self.head_at(flow).max(0.0),
                efficiency: self.efficiency_at(flow),
            })
            .collect()
    }
}

/// A rotor left out of the interpolated outputs, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRotor {
    pub rotor: String,
    pub reason: CurveError,
}

/// The result of [`build_interpolants`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpolants {
    /// Curves in rotor order.
    pub curves: Vec<RotorCurve>,

    /// Rotors that could not be interpolated.
    pub skipped: Vec<SkippedRotor>,
}

/// Builds head and efficiency interpolants for every rotor.
///
/// Failures are isolated per rotor: a rotor that cannot be resolved or
/// interpolated is reported in [`Interpolants::skipped`] and the rest proceed.
#[must_use]
pub fn build_interpolants(
    rotors: &RotorSet,
    mapper: &CoordinateMapper,
    config: &CurveConfig,
) -> Interpolants {
    let mut out = Interpolants::default();

    for rotor in rotors {
        let curve = rotor
            .physical_points(mapper)
            .map_err(CurveError::from)
            .and_then(|points| {
                RotorCurve::new(rotor.name(), rotor.is_parallel(), &points, config.kind)
                    .map_err(CurveError::from)
            });

        match curve {
            Ok(curve) => out.curves.push(curve),
            Err(reason) => {
                tracing::warn!(rotor = rotor.name(), %reason, "rotor not interpolated");
                out.skipped.push(SkippedRotor {
                    rotor: rotor.name().to_owned(),
                    reason,
                });
            }
        }
    }

    out
}
