//! Project files.
//!
//! A [`Project`] is the on-disk description of one analysis: the chart
//! calibration, the measured rotors, the variants derived from them, and the
//! two system-curve slots. Typed tables keep their cells as text so a decimal
//! comma survives until [`into_session`](Project::into_session) parses it.
//!
//! ```toml
//! [calibration.rect]
//! left = 100
//! top = 50
//! width = 600
//! height = 400
//!
//! [calibration.scale]
//! x0 = 0.0
//! y0 = 0.0
//! x1 = 60.0
//! y1 = 40.0
//!
//! [[rotor]]
//! name = "A"
//! rpm = 3500.0
//! rows = [["0", "32", "0"], ["20", "28,5", "65"], ["40", "18", "72"]]
//!
//! [[derived]]
//! kind = "speed"
//! rotor = "A"
//! rpm = 2900.0
//!
//! [system_curve_1]
//! mode = "equation"
//! static_head = 10.0
//! k_factor = 0.005
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::AnalysisConfig,
    models::pump::{
        AddPointError, CoordinateMapper, DeriveError, DuplicateNameError, EfficiencyPoint,
        InputError, ParallelMode, ParameterError, PixelPoint, Rotor, Session, SystemCurveId,
        SystemCurveSpec, apply_affinity_law, combine_parallel, parse_rotor_rows,
        parse_system_rows, speed_variant_name,
    },
    support::units,
};

/// Errors that can occur while loading, saving, or resolving a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("cannot access `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project file `{}`", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize project")]
    Serialize(#[from] toml::ser::Error),

    #[error("rotor `{rotor}`")]
    Rotor {
        rotor: String,
        #[source]
        source: ParameterError,
    },

    #[error("rotor `{rotor}` has both typed rows and digitized pixels")]
    MixedInput { rotor: String },

    #[error("rotor `{rotor}`, pixel {index}")]
    Pixel {
        rotor: String,
        index: usize,
        #[source]
        source: AddPointError,
    },

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Duplicate(#[from] DuplicateNameError),

    #[error("derivation {step} failed")]
    Derive {
        step: usize,
        #[source]
        source: DeriveError,
    },
}

/// One digitized point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PixelEntry {
    pub x: i32,
    pub y: i32,
    pub efficiency: f64,
}

/// A measured rotor, either typed or digitized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotorEntry {
    pub name: String,
    pub rpm: f64,

    /// `(flow, head, efficiency)` cells.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<[String; 3]>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pixels: Vec<PixelEntry>,
}

/// A rotor variant derived from rotors defined earlier in the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derivation {
    /// Affinity-law rescaling to a new speed.
    Speed { rotor: String, rpm: f64 },

    /// Two identical copies of one rotor in parallel.
    Parallel { rotor: String },

    /// Several distinct rotors in parallel.
    Combine { rotors: Vec<String> },
}

/// One system-curve slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SystemCurveEntry {
    #[default]
    None,

    /// `(flow, head)` cells.
    ManualPoints { rows: Vec<[String; 2]> },

    Equation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        static_head: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        k_factor: Option<f64>,
    },
}

/// A complete analysis description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    #[serde(default)]
    pub system_curve_1: SystemCurveEntry,

    #[serde(default)]
    pub system_curve_2: SystemCurveEntry,

    #[serde(default)]
    pub calibration: CoordinateMapper,

    #[serde(default, rename = "rotor")]
    pub rotors: Vec<RotorEntry>,

    /// Applied in order, so a step may build on an earlier one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derived: Vec<Derivation>,
}

impl Project {
    /// Loads a project from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_owned(),
            source,
        })?;
        let project = toml::from_str(&text).map_err(|source| ProjectError::Parse {
            path: path.to_owned(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded project");
        Ok(project)
    }

    /// Writes this project as TOML.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectError`] if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ProjectError::Io {
            path: path.to_owned(),
            source,
        })?;
        tracing::info!(path = %path.display(), "saved project");
        Ok(())
    }

    fn system_curve(&self, id: SystemCurveId) -> &SystemCurveEntry {
        match id {
            SystemCurveId::First => &self.system_curve_1,
            SystemCurveId::Second => &self.system_curve_2,
        }
    }

    /// Parses and validates every entry into a [`Session`].
    ///
    /// Measured rotors are inserted first, then each derivation is applied in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProjectError`] met, with the rotor name, row, or
    /// derivation step that triggered it.
    pub fn into_session(&self, config: &AnalysisConfig) -> Result<Session, ProjectError> {
        let mut session = Session {
            mapper: self.calibration,
            ..Session::default()
        };

        for entry in &self.rotors {
            let rotor = entry.resolve(&session.mapper)?;
            session.rotors.insert(rotor)?;
        }

        let combine = config.combine();
        for (index, derivation) in self.derived.iter().enumerate() {
            let result = match derivation {
                Derivation::Speed { rotor, rpm } => {
                    apply_affinity_law(&mut session.rotors, rotor, *rpm, &session.mapper)
                }
                Derivation::Parallel { rotor } => combine_parallel(
                    &mut session.rotors,
                    ParallelMode::SameRotor(rotor),
                    &session.mapper,
                    &combine,
                ),
                Derivation::Combine { rotors } => {
                    let names: Vec<&str> = rotors.iter().map(String::as_str).collect();
                    combine_parallel(
                        &mut session.rotors,
                        ParallelMode::Rotors(&names),
                        &session.mapper,
                        &combine,
                    )
                }
            };
            result.map_err(|source| ProjectError::Derive {
                step: index + 1,
                source,
            })?;
        }

        for id in SystemCurveId::ALL {
            let spec = match self.system_curve(id) {
                SystemCurveEntry::None => SystemCurveSpec::None,
                SystemCurveEntry::ManualPoints { rows } => SystemCurveSpec::ManualPoints(
                    parse_system_rows(&format!("system curve {id}"), rows)?,
                ),
                SystemCurveEntry::Equation {
                    static_head,
                    k_factor,
                } => SystemCurveSpec::Equation {
                    static_head: *static_head,
                    k_factor: *k_factor,
                },
            };
            session.set_system_curve(id, spec);
        }

        Ok(session)
    }

    /// Appends an affinity-law variant of `rotor` at `rpm`.
    ///
    /// The whole project is re-resolved with the new step, and the step is
    /// dropped again if that fails. Returns the name of the new rotor.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectError`] if the project does not resolve with the
    /// new step.
    pub fn add_speed_variant(
        &mut self,
        rotor: &str,
        rpm: f64,
        config: &AnalysisConfig,
    ) -> Result<String, ProjectError> {
        self.derived.push(Derivation::Speed {
            rotor: rotor.to_owned(),
            rpm,
        });
        if let Err(err) = self.into_session(config) {
            self.derived.pop();
            return Err(err);
        }
        Ok(speed_variant_name(rotor, rpm))
    }
}

impl RotorEntry {
    fn resolve(&self, mapper: &CoordinateMapper) -> Result<Rotor, ProjectError> {
        let rpm = units::rpm(self.rpm).map_err(|_| ProjectError::Rotor {
            rotor: self.name.clone(),
            source: ParameterError::Speed { rpm: self.rpm },
        })?;

        if !self.rows.is_empty() && !self.pixels.is_empty() {
            return Err(ProjectError::MixedInput {
                rotor: self.name.clone(),
            });
        }

        if !self.rows.is_empty() {
            let points = parse_rotor_rows(&self.name, &self.rows)?;
            return Ok(Rotor::tabulated(self.name.clone(), rpm, points));
        }

        let mut rotor = Rotor::digitized(self.name.clone(), rpm);
        for (index, pixel) in self.pixels.iter().enumerate() {
            let pixel_error = |source: AddPointError| ProjectError::Pixel {
                rotor: self.name.clone(),
                index: index + 1,
                source,
            };
            let point = EfficiencyPoint::new(PixelPoint::new(pixel.x, pixel.y), pixel.efficiency)
                .map_err(|err| pixel_error(err.into()))?;
            rotor.add_point(point, mapper).map_err(pixel_error)?;
        }
        Ok(rotor)
    }
}
