//! Pump curve digitization and operating-point analysis.
//!
//! The pipeline runs leaf-first: chart calibration maps digitized points to
//! physical units, affinity and parallel derivations add rotor variants,
//! every rotor gets head and efficiency interpolants, up to two system
//! curves are computed, and their crossings with the rotor curves give the
//! operating points.

mod affinity;
mod calibration;
mod curve;
mod error;
mod input;
mod intersection;
mod parallel;
mod power;
mod rotor;
mod session;
mod system_curve;

#[cfg(test)]
pub(crate) mod test_support;

pub use affinity::{apply_affinity_law, format_rpm, scale_points, speed_ratio, speed_variant_name};
pub use calibration::{
    Axis, CalibrationError, CalibrationScale, CoordinateMapper, PixelPoint, PixelRect,
    compute_coordinate_mapping,
};
pub use curve::{
    CurveConfig, CurveError, CurveSample, Interpolants, RotorCurve, SkippedRotor,
    build_interpolants,
};
pub use error::{DeriveError, DuplicateNameError, ParameterError};
pub use input::{InputError, parse_cell, parse_rotor_rows, parse_system_rows};
pub use intersection::{IntersectionConfig, MIN_GRID_POINTS, OperatingPoint, find_intersections};
pub use parallel::{
    CombineConfig, ParallelMode, combine_parallel, combine_points, combine_rotors, duplicate_rotor,
};
pub use power::{Fluid, mechanical_power};
pub use rotor::{
    AddPointError, CombinedPoint, Contribution, EfficiencyPoint, Origin, PhysicalPoint, Rotor,
    RotorPoints, RotorSet,
};
pub use session::Session;
pub use system_curve::{
    QuadraticLaw, SystemCurve, SystemCurveConfig, SystemCurveError, SystemCurveId,
    SystemCurveSpec, SystemPoint, UNFITTED_EQUATION, compute_system_curve,
};
