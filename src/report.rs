//! Report generation.
//!
//! [`assemble_report`] turns a [`Session`] into a [`Report`]: plain tables of
//! raw and resampled rotor data, the computed system curves, and the
//! operating points on each of them. Degraded parts of the analysis do not
//! abort it; they are left out and described by a [`Warning`].
//!
//! [`render_workbook`] lays a report out as a spreadsheet, and
//! [`write_report`] persists it without ever leaving a partial file behind.

mod persist;
mod workbook;

use std::fmt;

use thiserror::Error;

pub use persist::{PersistenceError, fallback_path, write_atomic, write_report};
pub use workbook::render_workbook;

use crate::{
    config::AnalysisConfig,
    models::pump::{
        CoordinateMapper, CurveError, Fluid, OperatingPoint, PhysicalPoint, Rotor, RotorPoints,
        Session, SystemCurve, SystemCurveError, SystemCurveId, SystemCurveSpec, build_interpolants,
        compute_system_curve, find_intersections, mechanical_power,
    },
    support::units,
};

/// The report cannot be assembled at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("there are no rotors to report")]
    NoRotors,
}

/// A part of the analysis that was left out of the report.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A rotor without points.
    EmptyRotor { rotor: String },

    /// A rotor whose curve could not be built.
    RotorSkipped { rotor: String, reason: CurveError },

    /// A selected system curve that could not be computed.
    SystemCurveOmitted {
        id: SystemCurveId,
        reason: SystemCurveError,
    },

    /// No rotor flow bounds the system curves, so a default span was used.
    DefaultMaxFlow { max_flow: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRotor { rotor } => write!(f, "rotor `{rotor}` has no points"),
            Self::RotorSkipped { rotor, reason } => {
                write!(f, "rotor `{rotor}` not interpolated: {reason}")
            }
            Self::SystemCurveOmitted { id, reason } => {
                write!(f, "system curve {id} omitted: {reason}")
            }
            Self::DefaultMaxFlow { max_flow } => write!(
                f,
                "no rotor flow available, system curves span 0 to {max_flow} m³/h"
            ),
        }
    }
}

/// Flow, head, and efficiency with the power they imply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerRow {
    /// m³/h
    pub flow: f64,
    /// m
    pub head: f64,
    /// %
    pub efficiency: f64,
    /// W
    pub hydraulic_power: f64,
    /// W, infinite at zero efficiency.
    pub mechanical_power: f64,
}

impl PowerRow {
    #[must_use]
    pub fn new(flow: f64, head: f64, efficiency: f64, fluid: &Fluid) -> Self {
        let hydraulic = fluid.hydraulic_power(units::flow(flow), units::head(head));
        Self {
            flow,
            head,
            efficiency,
            hydraulic_power: units::watts(hydraulic),
            mechanical_power: units::watts(mechanical_power(hydraulic, efficiency)),
        }
    }

    fn from_point(point: &PhysicalPoint, fluid: &Fluid) -> Self {
        Self::new(point.flow(), point.head(), point.efficiency(), fluid)
    }
}

/// A rotor's points as entered or derived.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub rotor: String,
    pub parallel: bool,
    pub rows: Vec<PowerRow>,

    /// Per-rotor efficiencies of each row; empty unless the rotor is a
    /// multi-rotor combination.
    pub breakdown: Vec<String>,

    pub best_efficiency: Option<PowerRow>,
}

/// A rotor curve resampled over its own flow range.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveTable {
    pub rotor: String,
    pub parallel: bool,
    pub rows: Vec<PowerRow>,
}

/// Operating points on one system curve.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionBlock {
    pub system_curve: SystemCurveId,
    pub points: Vec<OperatingPoint>,
}

/// Everything written to the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub raw: Vec<RawTable>,
    pub interpolated: Vec<CurveTable>,
    pub system_curves: Vec<SystemCurve>,
    /// One block per computed system curve.
    pub intersections: Vec<IntersectionBlock>,
    pub warnings: Vec<Warning>,
}

impl Report {
    /// Every operating point, in system-curve order.
    pub fn operating_points(&self) -> impl Iterator<Item = &OperatingPoint> {
        self.intersections.iter().flat_map(|block| &block.points)
    }
}

/// Computes every table, curve, and operating point for a session.
///
/// # Errors
///
/// Returns [`ReportError::NoRotors`] if the session has no rotors.
pub fn assemble_report(session: &Session, config: &AnalysisConfig) -> Result<Report, ReportError> {
    if session.rotors.is_empty() {
        return Err(ReportError::NoRotors);
    }

    let fluid = config.fluid();
    let mut warnings = Vec::new();

    let mut raw = Vec::new();
    let mut empty = Vec::new();
    for rotor in &session.rotors {
        if rotor.points().is_empty() {
            tracing::warn!(rotor = rotor.name(), "rotor has no points");
            empty.push(rotor.name());
            warnings.push(Warning::EmptyRotor {
                rotor: rotor.name().to_owned(),
            });
            continue;
        }
        // An unresolvable rotor is reported once, as skipped from interpolation.
        if let Some(table) = raw_table(rotor, &session.mapper, &fluid) {
            raw.push(table);
        }
    }

    let interpolants = build_interpolants(&session.rotors, &session.mapper, &config.curves());
    warnings.extend(
        interpolants
            .skipped
            .iter()
            .filter(|skipped| !empty.contains(&skipped.rotor.as_str()))
            .map(|skipped| Warning::RotorSkipped {
                rotor: skipped.rotor.clone(),
                reason: skipped.reason.clone(),
            }),
    );

    let interpolated = interpolants
        .curves
        .iter()
        .map(|curve| CurveTable {
            rotor: curve.name().to_owned(),
            parallel: curve.is_parallel(),
            rows: curve
                .resample(config.curve_samples)
                .iter()
                .map(|s| PowerRow::new(s.flow, s.head, s.efficiency, &fluid))
                .collect(),
        })
        .collect();

    let system_curves = system_curves(session, config, &mut warnings);

    let intersection_config = config.intersections();
    let intersections = system_curves
        .iter()
        .map(|system| IntersectionBlock {
            system_curve: system.id(),
            points: find_intersections(&interpolants.curves, system, &intersection_config, &fluid),
        })
        .collect();

    Ok(Report {
        raw,
        interpolated,
        system_curves,
        intersections,
        warnings,
    })
}

fn raw_table(rotor: &Rotor, mapper: &CoordinateMapper, fluid: &Fluid) -> Option<RawTable> {
    let points = rotor.physical_points(mapper).ok()?;
    let breakdown = match rotor.points() {
        RotorPoints::Combined(points) => points.iter().map(|p| p.breakdown()).collect(),
        _ => Vec::new(),
    };
    let best_efficiency = rotor
        .best_efficiency_point(mapper)
        .ok()
        .flatten()
        .map(|p| PowerRow::from_point(&p, fluid));

    Some(RawTable {
        rotor: rotor.name().to_owned(),
        parallel: rotor.is_parallel(),
        rows: points.iter().map(|p| PowerRow::from_point(p, fluid)).collect(),
        breakdown,
        best_efficiency,
    })
}

fn system_curves(
    session: &Session,
    config: &AnalysisConfig,
    warnings: &mut Vec<Warning>,
) -> Vec<SystemCurve> {
    let curve_config = config.system_curves();
    let selected: Vec<SystemCurveId> = SystemCurveId::ALL
        .into_iter()
        .filter(|&id| !matches!(session.system_curve(id), SystemCurveSpec::None))
        .collect();
    if selected.is_empty() {
        return Vec::new();
    }

    let max_flow = curve_config
        .max_flow(session.max_rotor_flow())
        .unwrap_or_else(|| {
            let max_flow = curve_config.default_max_flow;
            tracing::warn!(max_flow, "no rotor flow available, using default system-curve span");
            warnings.push(Warning::DefaultMaxFlow { max_flow });
            max_flow
        });

    let mut curves = Vec::with_capacity(selected.len());
    for id in selected {
        match compute_system_curve(id, session.system_curve(id), max_flow, &curve_config) {
            Ok(Some(curve)) => curves.push(curve),
            Ok(None) => {}
            Err(reason) => {
                tracing::warn!(%id, %reason, "system curve omitted from report");
                warnings.push(Warning::SystemCurveOmitted { id, reason });
            }
        }
    }
    curves
}
