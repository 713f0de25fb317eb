//! Shared fixtures for pump core tests.

use crate::support::units::{self, Rpm};

use super::{
    calibration::{CalibrationScale, CoordinateMapper, PixelRect},
    rotor::{PhysicalPoint, Rotor, RotorSet},
};

/// A 600×400 px chart at (100, 50) spanning 0–60 m³/h and 0–40 m.
pub(crate) fn chart_mapper() -> CoordinateMapper {
    CoordinateMapper::new(
        PixelRect {
            left: 100,
            top: 50,
            width: 600,
            height: 400,
        },
        CalibrationScale {
            x0: 0.0,
            y0: 0.0,
            x1: 60.0,
            y1: 40.0,
        },
    )
}

pub(crate) fn rpm(value: f64) -> Rpm {
    units::rpm(value).unwrap()
}

/// A tabulated rotor from `(flow, head, efficiency)` triples.
pub(crate) fn tabulated(name: &str, speed: f64, points: &[(f64, f64, f64)]) -> Rotor {
    Rotor::tabulated(
        name,
        rpm(speed),
        points
            .iter()
            .map(|&(q, h, e)| PhysicalPoint::new(q, h, e).unwrap())
            .collect(),
    )
}

/// A rotor following `H = shutoff - k·Q²` sampled at `n` flows over `[0, max_flow]`.
///
/// Efficiency peaks at 75 % in the middle of the range.
pub(crate) fn parabolic(name: &str, shutoff: f64, k: f64, max_flow: f64, n: usize) -> Rotor {
    let points: Vec<_> = (0..n)
        .map(|i| {
            let q = max_flow * i as f64 / (n - 1) as f64;
            let x = q / max_flow;
            (q, shutoff - k * q * q, 300.0 * x * (1.0 - x))
        })
        .collect();
    tabulated(name, 3500.0, &points)
}

pub(crate) fn set_of(rotors: impl IntoIterator<Item = Rotor>) -> RotorSet {
    let mut set = RotorSet::new();
    for rotor in rotors {
        set.insert(rotor).unwrap();
    }
    set
}
