use crate::support::constraint::Percentage;

use super::super::{calibration::PixelPoint, error::ParameterError};

/// A point on a rotor's performance curve, in chart working units.
///
/// Flow is in m³/h, head in m, efficiency in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalPoint {
    flow: f64,
    head: f64,
    efficiency: f64,
}

impl PhysicalPoint {
    /// Creates a validated point.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if flow or head is not finite or the
    /// efficiency lies outside `0..=100`.
    pub fn new(flow: f64, head: f64, efficiency: f64) -> Result<Self, ParameterError> {
        if !flow.is_finite() {
            return Err(ParameterError::NonFinite { what: "flow" });
        }
        if !head.is_finite() {
            return Err(ParameterError::NonFinite { what: "head" });
        }
        Percentage::new(efficiency).map_err(|_| ParameterError::Efficiency { value: efficiency })?;
        Ok(Self::new_unchecked(flow, head, efficiency))
    }

    /// Creates a point without validation.
    ///
    /// It is the caller's responsibility to ensure the values are physical.
    #[must_use]
    pub fn new_unchecked(flow: f64, head: f64, efficiency: f64) -> Self {
        Self {
            flow,
            head,
            efficiency,
        }
    }

    #[must_use]
    pub fn flow(&self) -> f64 {
        self.flow
    }

    #[must_use]
    pub fn head(&self) -> f64 {
        self.head
    }

    #[must_use]
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Multiplies flow and head by the given factors; efficiency is unchanged.
    #[must_use]
    pub fn scaled(&self, flow_factor: f64, head_factor: f64) -> Self {
        Self {
            flow: self.flow * flow_factor,
            head: self.head * head_factor,
            efficiency: self.efficiency,
        }
    }
}

/// A point clicked on a chart image, tagged with the efficiency read there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyPoint {
    position: PixelPoint,
    efficiency: f64,
}

impl EfficiencyPoint {
    /// Creates a digitized point.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Efficiency`] if the efficiency lies outside `0..=100`.
    pub fn new(position: PixelPoint, efficiency: f64) -> Result<Self, ParameterError> {
        Percentage::new(efficiency).map_err(|_| ParameterError::Efficiency { value: efficiency })?;
        Ok(Self {
            position,
            efficiency,
        })
    }

    #[must_use]
    pub fn position(&self) -> PixelPoint {
        self.position
    }

    #[must_use]
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }
}

/// One rotor's share of a combined parallel point.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub rotor: String,
    pub flow: f64,
    pub head: f64,
    pub efficiency: f64,
}

/// A point of a multi-rotor parallel combination at one head level.
///
/// The efficiency of each contributing rotor is kept. The scalar
/// [`efficiency`](Self::efficiency) is the set efficiency
/// `ΣQᵢ / Σ(Qᵢ/ηᵢ)`, i.e. total hydraulic power over total shaft power at
/// the shared head. It is zero if any contributor has zero efficiency.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedPoint {
    flow: f64,
    head: f64,
    efficiency: f64,
    contributions: Vec<Contribution>,
}

impl CombinedPoint {
    /// Builds a combined point from the matched points of each rotor.
    ///
    /// Returns `None` if `contributions` is empty.
    #[must_use]
    pub fn new(contributions: Vec<Contribution>) -> Option<Self> {
        if contributions.is_empty() {
            return None;
        }

        let flow: f64 = contributions.iter().map(|c| c.flow).sum();
        let head = contributions.iter().map(|c| c.head).sum::<f64>() / contributions.len() as f64;
        let efficiency = set_efficiency(&contributions);

        Some(Self {
            flow,
            head,
            efficiency,
            contributions,
        })
    }

    #[must_use]
    pub fn flow(&self) -> f64 {
        self.flow
    }

    #[must_use]
    pub fn head(&self) -> f64 {
        self.head
    }

    #[must_use]
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    #[must_use]
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    #[must_use]
    pub fn physical(&self) -> PhysicalPoint {
        PhysicalPoint::new_unchecked(self.flow, self.head, self.efficiency)
    }

    /// Per-rotor efficiencies, e.g. `"A: 70.0%, B: 65.5%"`.
    #[must_use]
    pub fn breakdown(&self) -> String {
        self.contributions
            .iter()
            .map(|c| format!("{}: {:.1}%", c.rotor, c.efficiency))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Multiplies every flow and head by the given factors.
    #[must_use]
    pub fn scaled(&self, flow_factor: f64, head_factor: f64) -> Self {
        Self {
            flow: self.flow * flow_factor,
            head: self.head * head_factor,
            efficiency: self.efficiency,
            contributions: self
                .contributions
                .iter()
                .map(|c| Contribution {
                    rotor: c.rotor.clone(),
                    flow: c.flow * flow_factor,
                    head: c.head * head_factor,
                    efficiency: c.efficiency,
                })
                .collect(),
        }
    }
}

fn set_efficiency(contributions: &[Contribution]) -> f64 {
    if contributions.iter().any(|c| c.efficiency <= 0.0) {
        return 0.0;
    }
    let flow: f64 = contributions.iter().map(|c| c.flow).sum();
    let shaft: f64 = contributions.iter().map(|c| c.flow / c.efficiency).sum();
    if shaft > 0.0 {
        Percentage::clamp(flow / shaft)
    } else {
        0.0
    }
}

/// The points owned by a rotor.
#[derive(Debug, Clone, PartialEq)]
pub enum RotorPoints {
    /// Points clicked on a calibrated chart image.
    Digitized(Vec<EfficiencyPoint>),

    /// Points typed as physical values, or derived from another rotor.
    Tabulated(Vec<PhysicalPoint>),

    /// Points of a multi-rotor parallel combination.
    Combined(Vec<CombinedPoint>),
}

impl RotorPoints {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Digitized(points) => points.len(),
            Self::Tabulated(points) => points.len(),
            Self::Combined(points) => points.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn contribution(rotor: &str, flow: f64, head: f64, efficiency: f64) -> Contribution {
        Contribution {
            rotor: rotor.into(),
            flow,
            head,
            efficiency,
        }
    }

    #[test]
    fn physical_point_validation() {
        assert!(PhysicalPoint::new(10.0, 20.0, 70.0).is_ok());
        assert_eq!(
            PhysicalPoint::new(10.0, 20.0, 101.0),
            Err(ParameterError::Efficiency { value: 101.0 })
        );
        assert_eq!(
            PhysicalPoint::new(f64::NAN, 20.0, 50.0),
            Err(ParameterError::NonFinite { what: "flow" })
        );
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn scaling_keeps_efficiency_exactly() {
        let point = PhysicalPoint::new(10.0, 20.0, 71.3).unwrap();
        let scaled = point.scaled(0.5, 0.25);
        assert_relative_eq!(scaled.flow(), 5.0);
        assert_relative_eq!(scaled.head(), 5.0);
        assert_eq!(scaled.efficiency(), 71.3);
    }

    #[test]
    fn combined_point_sums_flow_and_averages_head() {
        let point = CombinedPoint::new(vec![
            contribution("A", 10.0, 20.2, 70.0),
            contribution("B", 15.0, 19.8, 60.0),
        ])
        .unwrap();

        assert_relative_eq!(point.flow(), 25.0);
        assert_relative_eq!(point.head(), 20.0);
        // 25 / (10/70 + 15/60)
        assert_relative_eq!(point.efficiency(), 25.0 / (10.0 / 70.0 + 15.0 / 60.0));
        assert_eq!(point.breakdown(), "A: 70.0%, B: 60.0%");
    }

    #[test]
    fn combined_point_with_idle_contributor_has_zero_efficiency() {
        let point = CombinedPoint::new(vec![
            contribution("A", 10.0, 20.0, 70.0),
            contribution("B", 15.0, 20.0, 0.0),
        ])
        .unwrap();
        assert_relative_eq!(point.efficiency(), 0.0);
        assert!(CombinedPoint::new(Vec::new()).is_none());
    }
}
