//! System resistance curves.
//!
//! A system curve gives the head the piping system demands at each flow,
//! usually `H = H0 + K·Q²`. It is specified either by the equation directly
//! or by a handful of points read off a drawing. Two independent curves can
//! be analysed side by side.
//!
//! For manual points the plotted curve is the piecewise-linear interpolant of
//! the points (extended to the target flow), while the reported equation is a
//! least-squares fit of `H0 + K·Q²` to the same points. The two are
//! deliberately kept separate.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::support::{
    constraint::NonNegative,
    interp::{
        Interp1d, InterpolationError, InterpolationKind, fit_offset_quadratic, linspace,
        sort_and_dedup,
    },
};

use super::error::ParameterError;

/// Label used when the equation cannot be fitted.
pub const UNFITTED_EQUATION: &str = "Não foi possível calcular a equação";

/// Which of the two system-curve slots a curve occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemCurveId {
    First,
    Second,
}

impl SystemCurveId {
    pub const ALL: [Self; 2] = [Self::First, Self::Second];

    /// One-based slot number.
    #[must_use]
    pub fn number(self) -> usize {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }

    /// Zero-based slot index.
    #[must_use]
    pub fn index(self) -> usize {
        self.number() - 1
    }
}

impl fmt::Display for SystemCurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A manually entered system-curve point with non-negative flow and head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemPoint {
    flow: f64,
    head: f64,
}

impl SystemPoint {
    /// Creates a point.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Negative`] if flow or head is negative and
    /// [`ParameterError::NonFinite`] if either is `NaN` or infinite.
    pub fn new(flow: f64, head: f64) -> Result<Self, ParameterError> {
        for (what, value) in [("flow", flow), ("head", head)] {
            if !value.is_finite() {
                return Err(ParameterError::NonFinite { what });
            }
            NonNegative::new(value).map_err(|_| ParameterError::Negative { what, value })?;
        }
        Ok(Self { flow, head })
    }

    #[must_use]
    pub fn flow(&self) -> f64 {
        self.flow
    }

    #[must_use]
    pub fn head(&self) -> f64 {
        self.head
    }
}

/// How a system curve is specified.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SystemCurveSpec {
    /// The slot is unused.
    #[default]
    None,

    /// Points read off a drawing; at least two are required.
    ManualPoints(Vec<SystemPoint>),

    /// `H = static_head + k_factor·Q²`; both coefficients are required.
    Equation {
        static_head: Option<f64>,
        k_factor: Option<f64>,
    },
}

/// `H = H0 + K·Q²` with head in m and flow in m³/h.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticLaw {
    pub static_head: f64,
    pub k_factor: f64,
}

impl QuadraticLaw {
    #[must_use]
    pub fn eval(&self, flow: f64) -> f64 {
        self.static_head + self.k_factor * flow * flow
    }

    /// Display form, e.g. `"H = 10.00 + 0.0100 × Q²"`.
    #[must_use]
    pub fn equation(&self) -> String {
        format!("H = {:.2} + {:.4} × Q²", self.static_head, self.k_factor)
    }
}

/// Sampling settings for system curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemCurveConfig {
    /// Number of evenly spaced flows in `[0, Qmax]`.
    pub samples: usize,

    /// `Qmax` as a multiple of the largest rotor flow.
    pub flow_factor: f64,

    /// `Qmax` used when no positive rotor flow is available (m³/h).
    pub default_max_flow: f64,
}

impl Default for SystemCurveConfig {
    fn default() -> Self {
        Self {
            samples: 100,
            flow_factor: 1.1,
            default_max_flow: 50.0,
        }
    }
}

impl SystemCurveConfig {
    /// Target maximum flow for the system curves.
    ///
    /// Returns `None` if the largest rotor flow is missing or not positive,
    /// in which case [`default_max_flow`](Self::default_max_flow) applies.
    #[must_use]
    pub fn max_flow(&self, max_rotor_flow: Option<f64>) -> Option<f64> {
        max_rotor_flow
            .map(|q| q * self.flow_factor)
            .filter(|q| q.is_finite() && *q > 0.0)
    }
}

/// Errors that prevent a system curve from being computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SystemCurveError {
    /// The selected mode lacks its required data.
    #[error("system curve {id} is underspecified: {missing}")]
    Underspecified { id: SystemCurveId, missing: &'static str },

    /// The manual points do not define a curve.
    #[error("system curve {id} cannot be interpolated")]
    Interpolation {
        id: SystemCurveId,
        #[source]
        source: InterpolationError,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Equation(QuadraticLaw),
    Sampled(Interp1d),
}

/// A computed system curve over `[0, Qmax]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemCurve {
    id: SystemCurveId,
    law: Option<QuadraticLaw>,
    equation: String,
    points: Vec<(f64, f64)>,
    max_flow: f64,
    shape: Shape,
}

impl SystemCurve {
    #[must_use]
    pub fn id(&self) -> SystemCurveId {
        self.id
    }

    /// The equation coefficients; `None` if the manual points could not be fitted.
    #[must_use]
    pub fn law(&self) -> Option<QuadraticLaw> {
        self.law
    }

    #[must_use]
    pub fn equation(&self) -> &str {
        &self.equation
    }

    /// Sampled `(flow, head)` pairs, heads clamped to be non-negative.
    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (0.0, self.max_flow)
    }

    /// Head demanded at `flow`, `NaN` outside the domain.
    #[must_use]
    pub fn head_at(&self, flow: f64) -> f64 {
        let (lo, hi) = self.domain();
        if !(lo..=hi).contains(&flow) {
            return f64::NAN;
        }
        match &self.shape {
            Shape::Equation(law) => law.eval(flow).max(0.0),
            Shape::Sampled(interp) => interp.eval(flow),
        }
    }
}

/// Computes a system curve from its specification.
///
/// Returns `Ok(None)` for [`SystemCurveSpec::None`]. A non-positive or
/// non-finite `max_flow` is replaced by `config.default_max_flow`.
///
/// # Errors
///
/// Returns a [`SystemCurveError`] if the selected mode is missing its data
/// or the manual points do not span at least two distinct flows.
///
/// # Examples
///
/// ```
/// use pump_curves::models::pump::{
///     SystemCurveConfig, SystemCurveId, SystemCurveSpec, compute_system_curve,
/// };
///
/// let spec = SystemCurveSpec::Equation { static_head: Some(10.0), k_factor: Some(0.01) };
/// let curve = compute_system_curve(SystemCurveId::First, &spec, 100.0, &SystemCurveConfig::default())
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(curve.equation(), "H = 10.00 + 0.0100 × Q²");
/// assert_eq!(curve.points().len(), 100);
/// assert!((curve.head_at(100.0) - 110.0).abs() < 1e-9);
/// ```
pub fn compute_system_curve(
    id: SystemCurveId,
    spec: &SystemCurveSpec,
    max_flow: f64,
    config: &SystemCurveConfig,
) -> Result<Option<SystemCurve>, SystemCurveError> {
    let max_flow = if max_flow.is_finite() && max_flow > 0.0 {
        max_flow
    } else {
        tracing::warn!(
            %id,
            max_flow,
            fallback = config.default_max_flow,
            "invalid maximum flow for system curve, using default"
        );
        config.default_max_flow
    };

    let curve = match spec {
        SystemCurveSpec::None => return Ok(None),
        SystemCurveSpec::ManualPoints(points) => from_points(id, points, max_flow, config)?,
        SystemCurveSpec::Equation {
            static_head,
            k_factor,
        } => {
            let (Some(static_head), Some(k_factor)) = (*static_head, *k_factor) else {
                return Err(SystemCurveError::Underspecified {
                    id,
                    missing: "equation mode needs both H0 and K",
                });
            };
            if !static_head.is_finite() || !k_factor.is_finite() {
                return Err(SystemCurveError::Underspecified {
                    id,
                    missing: "equation coefficients must be finite",
                });
            }
            from_law(
                id,
                QuadraticLaw {
                    static_head,
                    k_factor,
                },
                max_flow,
                config,
            )
        }
    };

    tracing::debug!(%id, equation = curve.equation(), max_flow, "computed system curve");
    Ok(Some(curve))
}

fn from_law(
    id: SystemCurveId,
    law: QuadraticLaw,
    max_flow: f64,
    config: &SystemCurveConfig,
) -> SystemCurve {
    let points = linspace(0.0, max_flow, config.samples)
        .into_iter()
        .map(|q| (q, law.eval(q).max(0.0)))
        .collect();

    SystemCurve {
        id,
        law: Some(law),
        equation: law.equation(),
        points,
        max_flow,
        shape: Shape::Equation(law),
    }
}

fn from_points(
    id: SystemCurveId,
    points: &[SystemPoint],
    max_flow: f64,
    config: &SystemCurveConfig,
) -> Result<SystemCurve, SystemCurveError> {
    if points.len() < 2 {
        return Err(SystemCurveError::Underspecified {
            id,
            missing: "manual mode needs at least 2 points",
        });
    }

    let (sorted, _) = sort_and_dedup(points.to_vec(), SystemPoint::flow);
    let mut flows: Vec<f64> = sorted.iter().map(SystemPoint::flow).collect();
    let mut heads: Vec<f64> = sorted.iter().map(SystemPoint::head).collect();

    if let &[.., q1, q2] = flows.as_slice()
        && let &[.., h1, h2] = heads.as_slice()
        && q2 < max_flow
        && q2 > q1
    {
        let slope = (h2 - h1) / (q2 - q1);
        let extrapolated = h2 + slope * (max_flow - q2);
        if extrapolated > 0.0 {
            flows.push(max_flow);
            heads.push(extrapolated);
        } else {
            tracing::debug!(%id, extrapolated, "system curve ends at its last point");
        }
    }

    let interp = Interp1d::new(flows, heads, InterpolationKind::Linear)
        .map_err(|source| SystemCurveError::Interpolation { id, source })?
        .extrapolating();

    let samples: Vec<(f64, f64)> = linspace(0.0, max_flow, config.samples)
        .into_iter()
        .map(|q| (q, interp.eval(q).max(0.0)))
        .collect();

    let (qs, hs): (Vec<f64>, Vec<f64>) = samples.iter().copied().unzip();
    let shape = Interp1d::new(qs, hs, InterpolationKind::Linear)
        .map_err(|source| SystemCurveError::Interpolation { id, source })?;

    let manual_flows: Vec<f64> = points.iter().map(SystemPoint::flow).collect();
    let manual_heads: Vec<f64> = points.iter().map(SystemPoint::head).collect();
    let law = fit_offset_quadratic(&manual_flows, &manual_heads).map(|(static_head, k_factor)| {
        QuadraticLaw {
            static_head,
            k_factor,
        }
    });
    let equation = law.map_or_else(|| UNFITTED_EQUATION.to_owned(), |law| law.equation());

    Ok(SystemCurve {
        id,
        law,
        equation,
        points: samples,
        max_flow,
        shape: Shape::Sampled(shape),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn manual(points: &[(f64, f64)]) -> SystemCurveSpec {
        SystemCurveSpec::ManualPoints(
            points
                .iter()
                .map(|&(q, h)| SystemPoint::new(q, h).unwrap())
                .collect(),
        )
    }

    fn compute(spec: &SystemCurveSpec, max_flow: f64) -> SystemCurve {
        compute_system_curve(SystemCurveId::First, spec, max_flow, &SystemCurveConfig::default())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn equation_mode_samples_law() {
        let curve = compute(
            &SystemCurveSpec::Equation {
                static_head: Some(10.0),
                k_factor: Some(0.01),
            },
            100.0,
        );
        let points = curve.points();
        assert_eq!(points.len(), 100);
        assert_relative_eq!(points[0].0, 0.0);
        assert_relative_eq!(points[0].1, 10.0);
        assert_relative_eq!(points[99].0, 100.0);
        assert_relative_eq!(points[99].1, 110.0, epsilon = 1e-9);
        assert!(points.windows(2).all(|w| w[1].1 > w[0].1));
    }

    #[test]
    fn equation_mode_clamps_negative_heads() {
        let curve = compute(
            &SystemCurveSpec::Equation {
                static_head: Some(5.0),
                k_factor: Some(-0.01),
            },
            50.0,
        );
        assert!(curve.points().iter().all(|&(_, h)| h >= 0.0));
        assert_relative_eq!(curve.head_at(50.0), 0.0);
    }

    #[test]
    fn manual_points_extend_to_max_flow() {
        let curve = compute(&manual(&[(20.0, 14.0), (0.0, 10.0), (10.0, 11.0)]), 40.0);
        // Slope of the last segment is 0.3 m per m³/h.
        assert_relative_eq!(curve.head_at(40.0), 20.0, epsilon = 1e-9);
        assert_relative_eq!(curve.head_at(5.0), 10.5, epsilon = 1e-9);
        assert_eq!(curve.domain(), (0.0, 40.0));
    }

    #[test]
    fn manual_points_do_not_extrapolate_below_zero() {
        let curve = compute(&manual(&[(0.0, 20.0), (10.0, 10.0)]), 50.0);
        // Extrapolating to 50 would give -30 m, so the curve is clamped instead.
        assert!(curve.points().iter().all(|&(_, h)| h >= 0.0));
        assert_relative_eq!(curve.head_at(15.0), 5.0, epsilon = 1e-6);
        assert_relative_eq!(curve.head_at(40.0), 0.0);
    }

    #[test]
    fn manual_points_report_fit_separately() {
        let curve = compute(&manual(&[(0.0, 5.0), (10.0, 6.0), (20.0, 9.0)]), 30.0);
        let law = curve.law().unwrap();
        assert_relative_eq!(law.static_head, 5.0, epsilon = 1e-9);
        assert_relative_eq!(law.k_factor, 0.01, epsilon = 1e-12);
        assert_eq!(curve.equation(), "H = 5.00 + 0.0100 × Q²");

        // The sampled curve is the linear extension, not the fitted law.
        assert_relative_eq!(curve.head_at(30.0), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn underspecified_curves() {
        let config = SystemCurveConfig::default();
        let err = compute_system_curve(SystemCurveId::Second, &manual(&[(1.0, 2.0)]), 50.0, &config)
            .unwrap_err();
        assert!(matches!(
            err,
            SystemCurveError::Underspecified {
                id: SystemCurveId::Second,
                ..
            }
        ));

        let spec = SystemCurveSpec::Equation {
            static_head: Some(10.0),
            k_factor: None,
        };
        assert!(compute_system_curve(SystemCurveId::First, &spec, 50.0, &config).is_err());

        let err = compute_system_curve(
            SystemCurveId::First,
            &manual(&[(5.0, 2.0), (5.0, 3.0)]),
            50.0,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, SystemCurveError::Interpolation { .. }));

        assert!(
            compute_system_curve(SystemCurveId::First, &SystemCurveSpec::None, 50.0, &config)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn invalid_max_flow_falls_back_to_default() {
        let spec = SystemCurveSpec::Equation {
            static_head: Some(1.0),
            k_factor: Some(0.0),
        };
        let curve = compute(&spec, 0.0);
        assert_eq!(curve.domain(), (0.0, 50.0));

        let config = SystemCurveConfig::default();
        assert_eq!(config.max_flow(Some(0.0)), None);
        assert_eq!(config.max_flow(None), None);
        assert_relative_eq!(config.max_flow(Some(40.0)).unwrap(), 44.0, epsilon = 1e-12);
    }

    #[test]
    fn system_points_reject_negative_values() {
        assert_eq!(
            SystemPoint::new(-1.0, 2.0),
            Err(ParameterError::Negative {
                what: "flow",
                value: -1.0
            })
        );
        assert_eq!(
            SystemPoint::new(1.0, -2.0),
            Err(ParameterError::Negative {
                what: "head",
                value: -2.0
            })
        );
    }
}
