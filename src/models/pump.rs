//! Centrifugal pump performance curves.
//!
//! The computational core is in the internal `core` module; its public API
//! is re-exported here.
//!
//! # Example
//!
//! ```
//! use pump_curves::models::pump::{
//!     CoordinateMapper, CurveConfig, Fluid, IntersectionConfig, PhysicalPoint, Rotor, RotorSet,
//!     SystemCurveConfig, SystemCurveId, SystemCurveSpec, build_interpolants,
//!     compute_system_curve, find_intersections,
//! };
//! use pump_curves::support::units;
//!
//! let points = (0..=10)
//!     .map(|i| {
//!         let q = 5.0 * f64::from(i);
//!         PhysicalPoint::new(q, 50.0 - 0.02 * q * q, 60.0).unwrap()
//!     })
//!     .collect();
//!
//! let mut rotors = RotorSet::new();
//! rotors.insert(Rotor::tabulated("A", units::rpm(3500.0).unwrap(), points)).unwrap();
//!
//! let mapper = CoordinateMapper::default();
//! let curves = build_interpolants(&rotors, &mapper, &CurveConfig::default()).curves;
//!
//! let spec = SystemCurveSpec::Equation { static_head: Some(5.0), k_factor: Some(0.01) };
//! let system = compute_system_curve(SystemCurveId::First, &spec, 55.0, &SystemCurveConfig::default())
//!     .unwrap()
//!     .unwrap();
//!
//! let points = find_intersections(&curves, &system, &IntersectionConfig::default(), &Fluid::water());
//! assert_eq!(points.len(), 1);
//! assert!((points[0].flow - 1500_f64.sqrt()).abs() < 0.05);
//! ```

mod core;

pub use self::core::*;
