//! Rotor data model.
//!
//! A [`Rotor`] is a named impeller curve at a fixed rotational speed. Its
//! points are either digitized (pixel positions on a calibrated chart),
//! tabulated (physical values), or a multi-rotor parallel combination.
//! Rotors are collected in a [`RotorSet`], which enforces unique names.

mod points;
mod set;

pub use points::{CombinedPoint, Contribution, EfficiencyPoint, PhysicalPoint, RotorPoints};
pub use set::RotorSet;

use thiserror::Error;

use crate::support::units::{self, Rpm};

use super::{
    calibration::{CalibrationError, CoordinateMapper, PixelPoint, compute_coordinate_mapping},
    error::ParameterError,
};

/// Where a rotor's points came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Entered by the user, either digitized or typed.
    Measured,

    /// Rescaled from another rotor with the affinity laws.
    SpeedScaled { source: String },

    /// A single rotor run as two identical pumps in parallel.
    Parallel { base: String },

    /// Several rotors run in parallel.
    Combined { sources: Vec<String> },
}

/// Errors that can occur while adding a digitized point to a rotor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AddPointError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// A named pump rotor curve at a fixed rotational speed.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotor {
    name: String,
    rpm: Rpm,
    points: RotorPoints,
    origin: Origin,
    parallel: bool,
}

impl Rotor {
    /// Creates an empty rotor to be filled with digitized points.
    pub fn digitized(name: impl Into<String>, rpm: Rpm) -> Self {
        Self {
            name: name.into(),
            rpm,
            points: RotorPoints::Digitized(Vec::new()),
            origin: Origin::Measured,
            parallel: false,
        }
    }

    /// Creates a rotor from physical points typed by hand.
    pub fn tabulated(name: impl Into<String>, rpm: Rpm, points: Vec<PhysicalPoint>) -> Self {
        Self {
            name: name.into(),
            rpm,
            points: RotorPoints::Tabulated(points),
            origin: Origin::Measured,
            parallel: false,
        }
    }

    pub(crate) fn derived(
        name: String,
        rpm: Rpm,
        points: RotorPoints,
        origin: Origin,
        parallel: bool,
    ) -> Self {
        Self {
            name,
            rpm,
            points,
            origin,
            parallel,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn rpm(&self) -> &Rpm {
        &self.rpm
    }

    /// Rotational speed in revolutions per minute.
    #[must_use]
    pub fn rpm_value(&self) -> f64 {
        units::rpm_value(&self.rpm)
    }

    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Returns `true` for parallel variants, including speed-scaled copies of them.
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    #[must_use]
    pub fn points(&self) -> &RotorPoints {
        &self.points
    }

    /// Whether the rotor's points depend on the chart calibration.
    #[must_use]
    pub fn is_digitized(&self) -> bool {
        matches!(self.points, RotorPoints::Digitized(_))
    }

    /// Appends a point clicked on the chart.
    ///
    /// # Errors
    ///
    /// Fails if the rotor does not hold digitized points, the calibration is
    /// invalid, or the point lies outside the calibrated rectangle.
    pub fn add_point(
        &mut self,
        point: EfficiencyPoint,
        mapper: &CoordinateMapper,
    ) -> Result<(), AddPointError> {
        let RotorPoints::Digitized(points) = &mut self.points else {
            return Err(ParameterError::NotDigitized(self.name.clone()).into());
        };
        mapper.validate()?;
        if !mapper.contains(point.position()) {
            return Err(CalibrationError::OutsideChart {
                point: point.position(),
            }
            .into());
        }
        points.push(point);
        Ok(())
    }

    /// Resolves every point to physical units.
    ///
    /// # Errors
    ///
    /// Returns a [`CalibrationError`] if the rotor is digitized and the
    /// calibration is invalid.
    pub fn physical_points(
        &self,
        mapper: &CoordinateMapper,
    ) -> Result<Vec<PhysicalPoint>, CalibrationError> {
        match &self.points {
            RotorPoints::Digitized(points) => compute_coordinate_mapping(mapper, points),
            RotorPoints::Tabulated(points) => Ok(points.clone()),
            RotorPoints::Combined(points) => Ok(points.iter().map(CombinedPoint::physical).collect()),
        }
    }

    /// Points positioned on the chart image, with their efficiencies.
    ///
    /// Physical points are projected back through the calibration; with an
    /// invalid calibration they all land on the origin pixel.
    #[must_use]
    pub fn pixel_points(&self, mapper: &CoordinateMapper) -> Vec<(PixelPoint, f64)> {
        match &self.points {
            RotorPoints::Digitized(points) => points
                .iter()
                .map(|p| (p.position(), p.efficiency()))
                .collect(),
            RotorPoints::Tabulated(points) => points
                .iter()
                .map(|p| (mapper.to_pixel(p.flow(), p.head()), p.efficiency()))
                .collect(),
            RotorPoints::Combined(points) => points
                .iter()
                .map(|p| (mapper.to_pixel(p.flow(), p.head()), p.efficiency()))
                .collect(),
        }
    }

    /// The raw point with the highest efficiency (first one on ties).
    ///
    /// # Errors
    ///
    /// Returns a [`CalibrationError`] if the rotor is digitized and the
    /// calibration is invalid.
    pub fn best_efficiency_point(
        &self,
        mapper: &CoordinateMapper,
    ) -> Result<Option<PhysicalPoint>, CalibrationError> {
        let points = self.physical_points(mapper)?;
        Ok(points.into_iter().fold(None, |best, p| match best {
            Some(b) if b.efficiency() >= p.efficiency() => Some(b),
            _ => Some(p),
        }))
    }

    /// Points with flow and head multiplied by the given factors.
    ///
    /// Digitized points are resolved first, so the result is never digitized.
    pub(crate) fn transformed(
        &self,
        mapper: &CoordinateMapper,
        flow_factor: f64,
        head_factor: f64,
    ) -> Result<RotorPoints, CalibrationError> {
        Ok(match &self.points {
            RotorPoints::Combined(points) => RotorPoints::Combined(
                points
                    .iter()
                    .map(|p| p.scaled(flow_factor, head_factor))
                    .collect(),
            ),
            _ => RotorPoints::Tabulated(
                self.physical_points(mapper)?
                    .iter()
                    .map(|p| p.scaled(flow_factor, head_factor))
                    .collect(),
            ),
        })
    }
}
