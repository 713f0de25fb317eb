//! Pump unit conventions on top of [`uom`].
//!
//! Curves are digitized from catalog charts whose axes are flow in m³/h and
//! head in meters, with efficiency in percent. Those *working units* are what
//! the interpolation and root-finding code operates on as plain `f64` values.
//! Quantities that leave the chart (rotational speed, fluid properties, power)
//! are carried as [`uom`] quantities so their units are checked at compile time.
//!
//! ```
//! use pump_curves::support::units;
//! use uom::si::volume_rate::cubic_meter_per_second;
//!
//! let q = units::flow(36.0);
//! assert!((q.get::<cubic_meter_per_second>() - 0.01).abs() < 1e-12);
//!
//! let n = units::rpm(1750.0).unwrap();
//! assert!((units::rpm_value(&n) - 1750.0).abs() < 1e-9);
//! ```

use uom::si::{
    angular_velocity::revolution_per_minute,
    f64::{AngularVelocity, Length, Power, VolumeRate},
    length::meter,
    power::watt,
    volume_rate::cubic_meter_per_hour,
};

use crate::support::constraint::{
    Constrained, ConstraintError, ConstraintResult, StrictlyPositive,
};

/// A rotational speed that is guaranteed to be strictly positive.
pub type Rpm = Constrained<AngularVelocity, StrictlyPositive>;

/// Builds a volumetric flow from a value in m³/h.
#[must_use]
pub fn flow(m3_per_hour: f64) -> VolumeRate {
    VolumeRate::new::<cubic_meter_per_hour>(m3_per_hour)
}

/// Returns a volumetric flow in m³/h.
#[must_use]
pub fn flow_value(flow: VolumeRate) -> f64 {
    flow.get::<cubic_meter_per_hour>()
}

/// Builds a pump head from a value in meters.
#[must_use]
pub fn head(meters: f64) -> Length {
    Length::new::<meter>(meters)
}

/// Returns a pump head in meters.
#[must_use]
pub fn head_value(head: Length) -> f64 {
    head.get::<meter>()
}

/// Builds a validated rotational speed from revolutions per minute.
///
/// # Errors
///
/// Returns an error if the speed is zero, negative, infinite, or `NaN`.
pub fn rpm(value: f64) -> ConstraintResult<Rpm> {
    if value.is_infinite() {
        return Err(ConstraintError::NotFinite);
    }
    StrictlyPositive::new(AngularVelocity::new::<revolution_per_minute>(value))
}

/// Returns a rotational speed in revolutions per minute.
#[must_use]
pub fn rpm_value(rpm: &Rpm) -> f64 {
    rpm.as_ref().get::<revolution_per_minute>()
}

/// Returns a power in watts.
#[must_use]
pub fn watts(power: Power) -> f64 {
    power.get::<watt>()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{angular_velocity::radian_per_second, volume_rate::liter_per_second};

    #[test]
    fn flow_roundtrips_through_si() {
        let q = flow(3.6);
        assert_relative_eq!(q.get::<liter_per_second>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(flow_value(q), 3.6, epsilon = 1e-12);
    }

    #[test]
    fn rpm_is_validated() {
        let n = rpm(60.0).unwrap();
        assert_relative_eq!(
            n.as_ref().get::<radian_per_second>(),
            2.0 * std::f64::consts::PI,
            epsilon = 1e-12
        );
        assert!(rpm(0.0).is_err());
        assert!(rpm(-10.0).is_err());
        assert_eq!(rpm(f64::INFINITY).unwrap_err(), ConstraintError::NotFinite);
        assert_eq!(rpm(f64::NAN).unwrap_err(), ConstraintError::NotANumber);
    }
}
