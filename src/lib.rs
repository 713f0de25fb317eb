//! # Pump Curves
//!
//! Pump performance curves from catalog charts or typed tables, and the
//! operating points they reach on a piping system.
//!
//! ## Crate layout
//!
//! - [`models`]: The pump domain: chart calibration, rotors, affinity-law and
//!   parallel variants, curve interpolation, system curves, and operating points.
//! - [`config`]: Analysis settings, loadable from TOML.
//! - [`project`]: On-disk description of one analysis.
//! - [`report`]: Report assembly, workbook rendering, and persistence.
//! - [`support`]: Supporting utilities used by models.
//!
//! ## Pipeline
//!
//! A [`models::pump::Session`] holds everything entered for an analysis.
//! [`report::assemble_report`] derives every table from it, and
//! [`report::write_report`] writes the workbook.
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.
//!
//! Utility code starts in a model's internal `core` module and moves to
//! [`support`] once it is useful outside that model.

pub mod config;
pub mod models;
pub mod project;
pub mod report;
pub mod support;
