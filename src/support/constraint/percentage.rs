use std::cmp::Ordering;

use super::{Constrained, Constraint, ConstraintError};

/// Marker type enforcing that a value lies in the closed percentage interval:
/// `0 ≤ x ≤ 100`.
///
/// Pump efficiencies are read off charts and typed into tables in percent,
/// so this is the scale they are validated on.
///
/// # Examples
///
/// ```
/// use pump_curves::support::constraint::{Constrained, Percentage};
///
/// let eta = Constrained::<f64, Percentage>::new(72.5).unwrap();
/// assert_eq!(eta.into_inner(), 72.5);
///
/// assert!(Percentage::new(0.0).is_ok());
/// assert!(Percentage::new(100.0).is_ok());
/// assert!(Percentage::new(-0.1).is_err());
/// assert!(Percentage::new(100.1).is_err());
/// assert!(Percentage::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percentage;

impl Percentage {
    /// Upper bound of the interval.
    pub const MAX: f64 = 100.0;

    /// Constructs `Constrained<f64, Percentage>` if `0 ≤ value ≤ 100`.
    ///
    /// # Errors
    ///
    /// - [`ConstraintError::BelowMinimum`] if less than zero.
    /// - [`ConstraintError::AboveMaximum`] if greater than one hundred.
    /// - [`ConstraintError::NotANumber`] if comparison is undefined (e.g., NaN).
    pub fn new(value: f64) -> Result<Constrained<f64, Percentage>, ConstraintError> {
        Constrained::<f64, Percentage>::new(value)
    }

    /// Clamps a value into the interval.
    ///
    /// `NaN` maps to zero.
    #[must_use]
    pub fn clamp(value: f64) -> f64 {
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, Self::MAX)
        }
    }
}

impl Constraint<f64> for Percentage {
    fn check(value: &f64) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&0.0), value.partial_cmp(&Self::MAX)) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}
