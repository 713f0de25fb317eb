//! Analysis settings.
//!
//! Every constant the analysis depends on lives in [`AnalysisConfig`], which
//! can be loaded from a TOML file. Missing keys take their defaults, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! parallel_head_tolerance = 0.5
//! interpolation = "quadratic"
//!
//! [bisection]
//! max_iters = 200
//!
//! [fluid]
//! density = 1000.0
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    models::pump::{
        CombineConfig, CurveConfig, Fluid, IntersectionConfig, MIN_GRID_POINTS,
        SystemCurveConfig,
    },
    support::interp::InterpolationKind,
};

/// Errors that can occur while loading or saving a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in `{}`", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration in `{}`", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: InvalidSetting,
    },

    #[error("cannot serialize configuration")]
    Serialize(#[from] toml::ser::Error),
}

/// A setting whose value cannot drive an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("`{key}` {requirement}, got {value}")]
pub struct InvalidSetting {
    pub key: &'static str,
    pub requirement: &'static str,
    pub value: f64,
}

/// Most decimal places a head level can be rounded to in `f64`.
pub const MAX_HEAD_DECIMALS: u32 = 15;

/// Bisection refinement of operating points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BisectionSettings {
    pub max_iters: usize,
    /// Absolute flow tolerance (m³/h).
    pub flow_tol: f64,
    /// Absolute head tolerance (m).
    pub head_tol: f64,
}

impl Default for BisectionSettings {
    fn default() -> Self {
        let defaults = IntersectionConfig::default();
        Self {
            max_iters: defaults.max_iters,
            flow_tol: defaults.flow_tol,
            head_tol: defaults.head_tol,
        }
    }
}

/// Properties of the pumped fluid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FluidSettings {
    /// Density in kg/m³.
    pub density: f64,
    /// Gravitational acceleration in m/s².
    pub gravity: f64,
}

impl Default for FluidSettings {
    fn default() -> Self {
        Self {
            density: 997.0,
            gravity: 9.81,
        }
    }
}

/// All tunable constants of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Head band (m) within which rotor points match for parallel combination.
    pub parallel_head_tolerance: f64,
    /// Decimal places candidate head levels are rounded to.
    pub head_rounding_decimals: u32,
    /// Points per resampled rotor curve and per system curve.
    pub curve_samples: usize,
    /// Points in the dense intersection scan; at least 1000.
    pub intersection_grid: usize,
    /// System-curve `Qmax` as a multiple of the largest rotor flow.
    pub system_flow_factor: f64,
    /// System-curve `Qmax` when no rotor flow is available (m³/h).
    pub default_system_max_flow: f64,
    pub interpolation: InterpolationKind,
    pub refine_intersections: bool,
    pub bisection: BisectionSettings,
    pub fluid: FluidSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let combine = CombineConfig::default();
        let curves = CurveConfig::default();
        let system = SystemCurveConfig::default();
        let intersections = IntersectionConfig::default();
        Self {
            parallel_head_tolerance: combine.head_tolerance,
            head_rounding_decimals: combine.head_decimals,
            curve_samples: curves.samples,
            intersection_grid: intersections.grid_points,
            system_flow_factor: system.flow_factor,
            default_system_max_flow: system.default_max_flow,
            interpolation: curves.kind,
            refine_intersections: intersections.refine,
            bisection: BisectionSettings::default(),
            fluid: FluidSettings::default(),
        }
    }
}

impl AnalysisConfig {
    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or if
    /// a setting fails [`AnalysisConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate().map_err(|source| ConfigError::Invalid {
            path: path.to_owned(),
            source,
        })?;
        if config.intersection_grid < MIN_GRID_POINTS {
            tracing::warn!(
                requested = config.intersection_grid,
                used = MIN_GRID_POINTS,
                "intersection grid raised to minimum"
            );
        }
        tracing::debug!(path = %path.display(), "loaded analysis configuration");
        Ok(config)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the given file cannot be read or parsed.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Checks that every setting can drive an analysis.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidSetting`] found.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        fn require(
            key: &'static str,
            requirement: &'static str,
            value: f64,
            ok: bool,
        ) -> Result<(), InvalidSetting> {
            if ok {
                Ok(())
            } else {
                Err(InvalidSetting {
                    key,
                    requirement,
                    value,
                })
            }
        }

        let positive = |value: f64| value.is_finite() && value > 0.0;
        let non_negative = |value: f64| value.is_finite() && value >= 0.0;

        #[allow(clippy::cast_precision_loss)]
        let samples = self.curve_samples as f64;
        require("curve_samples", "must be at least 2", samples, self.curve_samples >= 2)?;
        require(
            "head_rounding_decimals",
            "must be at most 15",
            f64::from(self.head_rounding_decimals),
            self.head_rounding_decimals <= MAX_HEAD_DECIMALS,
        )?;
        require(
            "parallel_head_tolerance",
            "must be finite and not negative",
            self.parallel_head_tolerance,
            non_negative(self.parallel_head_tolerance),
        )?;
        require(
            "system_flow_factor",
            "must be finite and positive",
            self.system_flow_factor,
            positive(self.system_flow_factor),
        )?;
        require(
            "default_system_max_flow",
            "must be finite and positive",
            self.default_system_max_flow,
            positive(self.default_system_max_flow),
        )?;
        require(
            "bisection.flow_tol",
            "must be finite and not negative",
            self.bisection.flow_tol,
            non_negative(self.bisection.flow_tol),
        )?;
        require(
            "bisection.head_tol",
            "must be finite and not negative",
            self.bisection.head_tol,
            non_negative(self.bisection.head_tol),
        )?;
        require(
            "fluid.density",
            "must be finite and positive",
            self.fluid.density,
            positive(self.fluid.density),
        )?;
        require(
            "fluid.gravity",
            "must be finite and positive",
            self.fluid.gravity,
            positive(self.fluid.gravity),
        )
    }

    /// Serializes this configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn combine(&self) -> CombineConfig {
        CombineConfig {
            head_tolerance: self.parallel_head_tolerance,
            head_decimals: self.head_rounding_decimals,
        }
    }

    #[must_use]
    pub fn curves(&self) -> CurveConfig {
        CurveConfig {
            samples: self.curve_samples,
            kind: self.interpolation,
        }
    }

    #[must_use]
    pub fn system_curves(&self) -> SystemCurveConfig {
        SystemCurveConfig {
            samples: self.curve_samples,
            flow_factor: self.system_flow_factor,
            default_max_flow: self.default_system_max_flow,
        }
    }

    #[must_use]
    pub fn intersections(&self) -> IntersectionConfig {
        IntersectionConfig {
            grid_points: self.intersection_grid,
            refine: self.refine_intersections,
            max_iters: self.bisection.max_iters,
            flow_tol: self.bisection.flow_tol,
            head_tol: self.bisection.head_tol,
        }
    }

    #[must_use]
    pub fn fluid(&self) -> Fluid {
        Fluid::new(self.fluid.density, self.fluid.gravity)
    }
}
