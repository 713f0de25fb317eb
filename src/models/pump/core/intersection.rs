//! Operating points: where rotor curves cross a system curve.
//!
//! Each rotor is scanned on a dense flow grid over the flow range it shares
//! with the system curve. Every sign change of `rotor_head - system_head`
//! between adjacent grid flows brackets one crossing, so all crossings in
//! range are found, not only the first. A crossing is estimated by linear
//! interpolation inside its bracket and then optionally refined by bisection.

mod config;
mod problem;

pub use config::{IntersectionConfig, MIN_GRID_POINTS};

use twine_solvers::equation::bisection;
use uom::si::f64::Power;

use crate::support::{interp::linspace, units};

use super::{
    curve::RotorCurve,
    power::{Fluid, mechanical_power},
    system_curve::{SystemCurve, SystemCurveId},
};

use problem::{HeadGapModel, HeadGapProblem};

/// A rotor's operating point on one system curve.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatingPoint {
    pub rotor: String,
    pub system_curve: SystemCurveId,
    /// Flow in m³/h.
    pub flow: f64,
    /// Head in m.
    pub head: f64,
    /// Efficiency in percent.
    pub efficiency: f64,
    pub hydraulic_power: Power,
    /// Infinite when the efficiency is zero.
    pub mechanical_power: Power,
}

impl OperatingPoint {
    #[must_use]
    pub fn hydraulic_watts(&self) -> f64 {
        units::watts(self.hydraulic_power)
    }

    #[must_use]
    pub fn mechanical_watts(&self) -> f64 {
        units::watts(self.mechanical_power)
    }
}

/// Finds the operating points of every rotor on one system curve.
///
/// Rotors whose flow range does not overlap the system curve are skipped.
/// Results are grouped by rotor, in input order, and by ascending flow within
/// a rotor.
#[must_use]
pub fn find_intersections(
    curves: &[RotorCurve],
    system: &SystemCurve,
    config: &IntersectionConfig,
    fluid: &Fluid,
) -> Vec<OperatingPoint> {
    let mut points = Vec::new();

    for curve in curves {
        let (rotor_lo, rotor_hi) = curve.domain();
        let (system_lo, system_hi) = system.domain();
        let lo = rotor_lo.max(system_lo);
        let hi = rotor_hi.min(system_hi);
        if lo >= hi {
            tracing::debug!(
                rotor = curve.name(),
                system_curve = %system.id(),
                "no overlapping flow range"
            );
            continue;
        }

        for flow in crossings(curve, system, lo, hi, config) {
            let head = curve.head_at(flow);
            let efficiency = curve.efficiency_at(flow);
            let hydraulic_power = fluid.hydraulic_power(units::flow(flow), units::head(head));

            tracing::debug!(
                rotor = curve.name(),
                system_curve = %system.id(),
                flow,
                head,
                efficiency,
                "found operating point"
            );

            points.push(OperatingPoint {
                rotor: curve.name().to_owned(),
                system_curve: system.id(),
                flow,
                head,
                efficiency,
                hydraulic_power,
                mechanical_power: mechanical_power(hydraulic_power, efficiency),
            });
        }
    }

    points
}

/// Crossing flows of one rotor inside `[lo, hi]`, ascending.
fn crossings(
    curve: &RotorCurve,
    system: &SystemCurve,
    lo: f64,
    hi: f64,
    config: &IntersectionConfig,
) -> Vec<f64> {
    let grid = linspace(lo, hi, config.grid());
    let gaps: Vec<f64> = grid
        .iter()
        .map(|&q| curve.head_at(q) - system.head_at(q))
        .collect();

    let mut flows = Vec::new();
    for i in 0..grid.len() {
        let (q1, d1) = (grid[i], gaps[i]);

        // A zero at a shared node is recorded once, here.
        if d1 == 0.0 {
            flows.push(q1);
            continue;
        }

        let Some(&d2) = gaps.get(i + 1) else {
            continue;
        };
        if d1 * d2 < 0.0 {
            let q2 = grid[i + 1];
            let estimate = q1 - d1 * (q2 - q1) / (d2 - d1);
            flows.push(if config.refine {
                refine(curve, system, [q1, q2], estimate, config)
            } else {
                estimate
            });
        }
    }
    flows
}

/// Refines a bracketed crossing by bisection, falling back to `estimate`.
fn refine(
    curve: &RotorCurve,
    system: &SystemCurve,
    bracket: [f64; 2],
    estimate: f64,
    config: &IntersectionConfig,
) -> f64 {
    let model = HeadGapModel::new(curve, system);

    let solution = bisection::solve(
        &model,
        &HeadGapProblem,
        bracket,
        &config.bisection(),
        |event: &bisection::Event<'_, _, _>| {
            // Both curves are defined across the bracket, so this only
            // guards against a flow landing outside one of them.
            if event.result().is_err() {
                return Some(bisection::Action::assume_positive());
            }
            None
        },
    );

    match solution {
        Ok(solution) if solution.status == bisection::Status::Converged => {
            solution.snapshot.output.flow
        }
        Ok(solution) => {
            tracing::debug!(
                rotor = curve.name(),
                residual = solution.residual,
                iters = solution.iters,
                "bisection did not converge, keeping linear estimate"
            );
            estimate
        }
        Err(err) => {
            tracing::debug!(rotor = curve.name(), %err, "bisection failed, keeping linear estimate");
            estimate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::models::pump::core::{
        curve::RotorCurve,
        rotor::PhysicalPoint,
        system_curve::{SystemCurveConfig, SystemCurveSpec, SystemPoint, compute_system_curve},
        test_support::parabolic,
    };
    use crate::support::interp::InterpolationKind;

    fn curve_of(rotor: &crate::models::pump::core::rotor::Rotor) -> RotorCurve {
        let points = rotor
            .physical_points(&Default::default())
            .unwrap();
        RotorCurve::new(rotor.name(), false, &points, InterpolationKind::Linear).unwrap()
    }

    fn equation(static_head: f64, k_factor: f64, max_flow: f64) -> SystemCurve {
        compute_system_curve(
            SystemCurveId::First,
            &SystemCurveSpec::Equation {
                static_head: Some(static_head),
                k_factor: Some(k_factor),
            },
            max_flow,
            &SystemCurveConfig::default(),
        )
        .unwrap()
        .unwrap()
    }

    #[test]
    fn finds_single_crossing_of_parabolas() {
        let rotor = curve_of(&parabolic("A", 50.0, 0.02, 50.0, 51));
        let system = equation(5.0, 0.01, 55.0);

        let points = find_intersections(
            &[rotor],
            &system,
            &IntersectionConfig::default(),
            &Fluid::water(),
        );
        assert_eq!(points.len(), 1);

        let op = &points[0];
        let exact = 1500_f64.sqrt();
        assert_relative_eq!(op.flow, exact, epsilon = 5e-3);
        assert_relative_eq!(op.head, 5.0 + 0.01 * exact * exact, epsilon = 2e-2);
        assert_eq!(op.system_curve, SystemCurveId::First);

        let expected = 997.0 * 9.81 * op.flow / 3600.0 * op.head;
        assert_relative_eq!(op.hydraulic_watts(), expected, max_relative = 1e-9);
        assert_relative_eq!(
            op.mechanical_watts(),
            expected / (op.efficiency / 100.0),
            max_relative = 1e-9
        );
    }

    #[test]
    fn refinement_matches_linear_estimate_closely() {
        let rotor = curve_of(&parabolic("A", 50.0, 0.02, 50.0, 51));
        let system = equation(5.0, 0.01, 55.0);
        let fluid = Fluid::water();

        let refined = find_intersections(
            std::slice::from_ref(&rotor),
            &system,
            &IntersectionConfig::default(),
            &fluid,
        );
        let linear = find_intersections(
            &[rotor],
            &system,
            &IntersectionConfig {
                refine: false,
                ..IntersectionConfig::default()
            },
            &fluid,
        );
        assert_relative_eq!(refined[0].flow, linear[0].flow, epsilon = 1e-3);
    }

    #[test]
    fn finds_every_crossing() {
        // A rotor curve that dips below and rises back above a flat system curve.
        let points: Vec<_> = [(0.0, 20.0), (10.0, 5.0), (20.0, 20.0), (30.0, 5.0)]
            .iter()
            .map(|&(q, h)| PhysicalPoint::new(q, h, 60.0).unwrap())
            .collect();
        let rotor = RotorCurve::new("W", false, &points, InterpolationKind::Linear).unwrap();
        let system = equation(10.0, 0.0, 30.0);

        let found = find_intersections(
            &[rotor],
            &system,
            &IntersectionConfig::default(),
            &Fluid::water(),
        );
        let flows: Vec<f64> = found.iter().map(|p| p.flow).collect();
        assert_eq!(flows.len(), 3);
        for (found, expected) in flows.iter().zip([20.0 / 3.0, 40.0 / 3.0, 80.0 / 3.0]) {
            assert_relative_eq!(*found, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_on_grid_node_is_counted_once() {
        // Crossing exactly at flow 10, which is a grid node of [0, 20].
        let points: Vec<_> = [(0.0, 20.0), (20.0, 0.0)]
            .iter()
            .map(|&(q, h)| PhysicalPoint::new(q, h, 50.0).unwrap())
            .collect();
        let rotor = RotorCurve::new("Z", false, &points, InterpolationKind::Linear).unwrap();
        let system = compute_system_curve(
            SystemCurveId::Second,
            &SystemCurveSpec::ManualPoints(vec![
                SystemPoint::new(0.0, 10.0).unwrap(),
                SystemPoint::new(20.0, 10.0).unwrap(),
            ]),
            20.0,
            &SystemCurveConfig::default(),
        )
        .unwrap()
        .unwrap();

        let config = IntersectionConfig {
            grid_points: 1001,
            ..IntersectionConfig::default()
        };
        let found = find_intersections(&[rotor], &system, &config, &Fluid::water());
        assert_eq!(found.len(), 1);
        assert_relative_eq!(found[0].flow, 10.0, epsilon = 1e-9);
        assert_eq!(found[0].system_curve, SystemCurveId::Second);
    }

    #[test]
    fn disjoint_ranges_are_skipped() {
        let points: Vec<_> = [(60.0, 20.0), (80.0, 10.0)]
            .iter()
            .map(|&(q, h)| PhysicalPoint::new(q, h, 50.0).unwrap())
            .collect();
        let rotor = RotorCurve::new("Far", false, &points, InterpolationKind::Linear).unwrap();
        let system = equation(5.0, 0.01, 50.0);

        assert!(
            find_intersections(&[rotor], &system, &IntersectionConfig::default(), &Fluid::water())
                .is_empty()
        );
    }

    #[test]
    fn zero_efficiency_gives_infinite_shaft_power() {
        let points: Vec<_> = [(0.0, 20.0, 0.0), (20.0, 0.0, 0.0)]
            .iter()
            .map(|&(q, h, e)| PhysicalPoint::new(q, h, e).unwrap())
            .collect();
        let rotor = RotorCurve::new("Idle", false, &points, InterpolationKind::Linear).unwrap();
        let system = equation(5.0, 0.0, 20.0);

        let found =
            find_intersections(&[rotor], &system, &IntersectionConfig::default(), &Fluid::water());
        assert_eq!(found.len(), 1);
        assert!(found[0].mechanical_watts().is_infinite());
        assert!(found[0].hydraulic_watts() > 0.0);
    }

    #[test]
    fn small_grids_are_raised_to_minimum() {
        let config = IntersectionConfig {
            grid_points: 10,
            ..IntersectionConfig::default()
        };
        assert_eq!(config.grid(), MIN_GRID_POINTS);
    }
}
