use thiserror::Error;

use super::calibration::CalibrationError;

/// Invalid input parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// A rotational speed is zero, negative, or `NaN`.
    #[error("rotational speed must be positive and finite, got {rpm} rpm")]
    Speed { rpm: f64 },

    /// An efficiency lies outside `0..=100` percent.
    #[error("efficiency must be within 0-100 %, got {value}")]
    Efficiency { value: f64 },

    /// A value is `NaN` or infinite.
    #[error("{what} must be finite")]
    NonFinite { what: &'static str },

    /// A value that must be non-negative is negative.
    #[error("{what} must not be negative, got {value}")]
    Negative { what: &'static str, value: f64 },

    /// No rotor with the given name exists.
    #[error("unknown rotor `{0}`")]
    UnknownRotor(String),

    /// A multi-rotor combination was requested with fewer than two rotors.
    #[error("at least 2 rotors are required for a combination, got {0}")]
    TooFewRotors(usize),

    /// A pixel point was added to a rotor that holds physical points.
    #[error("rotor `{0}` does not hold digitized points")]
    NotDigitized(String),
}

/// A rotor with the requested name already exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a rotor named `{name}` already exists")]
pub struct DuplicateNameError {
    pub name: String,
}

/// Errors that can occur while deriving a rotor from existing ones.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeriveError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Duplicate(#[from] DuplicateNameError),

    /// A digitized source rotor could not be mapped to physical units.
    #[error("source rotor `{rotor}` cannot be mapped")]
    Calibration {
        rotor: String,
        #[source]
        source: CalibrationError,
    },

    /// No head level was matched by at least two of the selected rotors.
    #[error("no common head level between rotors {}", .rotors.join(", "))]
    NoMatchingHeads { rotors: Vec<String> },
}
