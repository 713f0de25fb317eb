//! Hydraulic and shaft power at an operating point.

use uom::si::{
    acceleration::meter_per_second_squared,
    f64::{Acceleration, Length, MassDensity, Power, VolumeRate},
    mass_density::kilogram_per_cubic_meter,
    power::watt,
};

use crate::support::constraint::Percentage;

/// The pumped fluid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fluid {
    pub density: MassDensity,
    pub gravity: Acceleration,
}

impl Fluid {
    /// Creates a fluid from a density in kg/m³ and gravity in m/s².
    #[must_use]
    pub fn new(density: f64, gravity: f64) -> Self {
        Self {
            density: MassDensity::new::<kilogram_per_cubic_meter>(density),
            gravity: Acceleration::new::<meter_per_second_squared>(gravity),
        }
    }

    /// Water at ambient conditions: 997 kg/m³ under 9.81 m/s².
    #[must_use]
    pub fn water() -> Self {
        Self::new(997.0, 9.81)
    }

    /// Power delivered to the fluid, `ρ·g·Q·H`.
    #[must_use]
    pub fn hydraulic_power(&self, flow: VolumeRate, head: Length) -> Power {
        self.density * self.gravity * flow * head
    }
}

impl Default for Fluid {
    fn default() -> Self {
        Self::water()
    }
}

/// Shaft power needed to deliver `hydraulic` at `efficiency` percent.
///
/// Zero efficiency yields infinite power: the pump moves no useful energy
/// into the fluid at that point.
///
/// # Examples
///
/// ```
/// use pump_curves::models::pump::mechanical_power;
/// use uom::si::{f64::Power, power::watt};
///
/// let shaft = mechanical_power(Power::new::<watt>(700.0), 70.0);
/// assert!((shaft.get::<watt>() - 1000.0).abs() < 1e-9);
///
/// let idle = mechanical_power(Power::new::<watt>(700.0), 0.0);
/// assert!(idle.get::<watt>().is_infinite());
/// ```
#[must_use]
pub fn mechanical_power(hydraulic: Power, efficiency: f64) -> Power {
    let efficiency = Percentage::clamp(efficiency);
    if efficiency > 0.0 {
        hydraulic / (efficiency / Percentage::MAX)
    } else {
        Power::new::<watt>(f64::INFINITY)
    }
}
