use std::cmp::Ordering;

use num_traits::Zero;

use super::{Constrained, Constraint, ConstraintError};

/// Marker type enforcing that a value is non-negative (zero or greater).
///
/// System-curve points typed by hand use this for both flow and head.
///
/// # Examples
///
/// ```
/// use pump_curves::support::constraint::{Constrained, NonNegative};
///
/// let q = Constrained::<_, NonNegative>::new(12.5).unwrap();
/// assert_eq!(q.into_inner(), 12.5);
///
/// let h = NonNegative::new(0.0).unwrap();
/// assert_eq!(h.into_inner(), 0.0);
///
/// assert!(NonNegative::new(-7.0).is_err());
/// assert!(NonNegative::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NonNegative;

impl NonNegative {
    /// Constructs a [`Constrained<T, NonNegative>`] if the value is non-negative.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative or not a number (`NaN`).
    pub fn new<T: PartialOrd + Zero>(
        value: T,
    ) -> Result<Constrained<T, NonNegative>, ConstraintError> {
        Constrained::<T, NonNegative>::new(value)
    }
}

impl<T: PartialOrd + Zero> Constraint<T> for NonNegative {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match value.partial_cmp(&T::zero()) {
            Some(Ordering::Greater | Ordering::Equal) => Ok(()),
            Some(Ordering::Less) => Err(ConstraintError::Negative),
            None => Err(ConstraintError::NotANumber),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::{f64::VolumeRate, volume_rate::cubic_meter_per_hour};

    #[test]
    fn floats() {
        assert!(Constrained::<f64, NonNegative>::new(2.0).is_ok());
        assert!(NonNegative::new(0.0).is_ok());
        assert_eq!(NonNegative::new(-2.0), Err(ConstraintError::Negative));
        assert_eq!(NonNegative::new(f64::NAN), Err(ConstraintError::NotANumber));
    }

    #[test]
    fn flow_rates() {
        let flow = VolumeRate::new::<cubic_meter_per_hour>(36.0);
        assert!(NonNegative::new(flow).is_ok());

        let flow = VolumeRate::new::<cubic_meter_per_hour>(0.0);
        assert!(NonNegative::new(flow).is_ok());

        let flow = VolumeRate::new::<cubic_meter_per_hour>(-1.0);
        assert!(NonNegative::new(flow).is_err());
    }
}
