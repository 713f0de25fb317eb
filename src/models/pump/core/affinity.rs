//! Affinity-law rescaling of rotor curves to a new rotational speed.
//!
//! For a speed ratio `r = N₂ / N₁`, flow scales with `r` and head with `r²`.
//! Efficiency is unchanged.

use crate::support::units::{self, Rpm};

use super::{
    calibration::CoordinateMapper,
    error::{DeriveError, ParameterError},
    rotor::{Origin, Rotor, RotorSet},
};

/// Speed ratio `to / from`.
#[must_use]
pub fn speed_ratio(from: &Rpm, to: &Rpm) -> f64 {
    units::rpm_value(to) / units::rpm_value(from)
}

/// Name of the variant of `source` running at `rpm`, e.g. `"A (1750 RPM)"`.
#[must_use]
pub fn speed_variant_name(source: &str, rpm: f64) -> String {
    format!("{source} ({} RPM)", format_rpm(rpm))
}

/// Formats a speed without a trailing `.0` when it is integral.
#[must_use]
pub fn format_rpm(rpm: f64) -> String {
    if rpm.fract() == 0.0 {
        format!("{rpm:.0}")
    } else {
        format!("{rpm}")
    }
}

/// Derives a new rotor running at `new_rpm` from the named source rotor.
///
/// The source is left untouched and the variant is inserted into `rotors`
/// under the name given by [`speed_variant_name`].
///
/// # Errors
///
/// - [`ParameterError::Speed`] if `new_rpm` is not strictly positive and finite.
/// - [`ParameterError::UnknownRotor`] if the source does not exist.
/// - [`DeriveError::Calibration`] if a digitized source cannot be mapped.
/// - [`DeriveError::Duplicate`] if the derived name is already taken.
///
/// # Examples
///
/// ```
/// use pump_curves::models::pump::{
///     CoordinateMapper, PhysicalPoint, Rotor, RotorSet, apply_affinity_law,
/// };
/// use pump_curves::support::units;
///
/// let mut rotors = RotorSet::new();
/// let points = vec![PhysicalPoint::new(10.0, 40.0, 60.0).unwrap()];
/// rotors.insert(Rotor::tabulated("A", units::rpm(3500.0).unwrap(), points)).unwrap();
///
/// let variant = apply_affinity_law(&mut rotors, "A", 1750.0, &CoordinateMapper::default()).unwrap();
/// assert_eq!(variant.name(), "A (1750 RPM)");
/// assert_eq!(rotors.len(), 2);
/// ```
pub fn apply_affinity_law<'a>(
    rotors: &'a mut RotorSet,
    source: &str,
    new_rpm: f64,
    mapper: &CoordinateMapper,
) -> Result<&'a Rotor, DeriveError> {
    let target = units::rpm(new_rpm).map_err(|_| ParameterError::Speed { rpm: new_rpm })?;

    let original = rotors
        .get(source)
        .ok_or_else(|| ParameterError::UnknownRotor(source.to_owned()))?;

    let ratio = speed_ratio(original.rpm(), &target);
    let points = original
        .transformed(mapper, ratio, ratio * ratio)
        .map_err(|source| DeriveError::Calibration {
            rotor: original.name().to_owned(),
            source,
        })?;

    let name = speed_variant_name(original.name(), new_rpm);
    let rotor = Rotor::derived(
        name,
        target,
        points,
        Origin::SpeedScaled {
            source: original.name().to_owned(),
        },
        original.is_parallel(),
    );

    tracing::info!(source, variant = rotor.name(), ratio, "derived speed variant");
    Ok(rotors.insert(rotor)?)
}

/// Rescales `(flow, head)` pairs by the speed ratio `to / from`.
///
/// Used to preview manual system-curve points at another speed.
#[must_use]
pub fn scale_points(points: &[(f64, f64)], from: &Rpm, to: &Rpm) -> Vec<(f64, f64)> {
    let ratio = speed_ratio(from, to);
    points
        .iter()
        .map(|&(flow, head)| (flow * ratio, head * ratio * ratio))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::models::pump::core::{
        calibration::PixelPoint,
        rotor::{EfficiencyPoint, RotorPoints},
        test_support::{chart_mapper, rpm, set_of, tabulated},
    };

    fn sample() -> RotorSet {
        set_of([tabulated(
            "A",
            3500.0,
            &[(0.0, 40.0, 0.0), (10.0, 36.0, 55.0), (20.0, 28.0, 70.0), (30.0, 15.0, 62.0)],
        )])
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn follows_similarity_laws() {
        let mut rotors = sample();
        let mapper = CoordinateMapper::default();
        let ratio = 2900.0 / 3500.0;

        let variant = apply_affinity_law(&mut rotors, "A", 2900.0, &mapper)
            .unwrap()
            .clone();
        assert_eq!(variant.name(), "A (2900 RPM)");
        assert_eq!(variant.origin(), &Origin::SpeedScaled { source: "A".into() });

        let before = rotors.get("A").unwrap().physical_points(&mapper).unwrap();
        let after = variant.physical_points(&mapper).unwrap();
        for (old, new) in before.iter().zip(&after) {
            assert_relative_eq!(new.flow(), old.flow() * ratio, epsilon = 1e-12);
            assert_relative_eq!(new.head(), old.head() * ratio * ratio, epsilon = 1e-12);
            assert_eq!(new.efficiency(), old.efficiency());
        }
    }

    #[test]
    fn source_is_unchanged_and_duplicates_rejected() {
        let mut rotors = sample();
        let mapper = CoordinateMapper::default();
        let original = rotors.get("A").unwrap().clone();

        apply_affinity_law(&mut rotors, "A", 1750.0, &mapper).unwrap();
        assert_eq!(rotors.get("A").unwrap(), &original);

        let err = apply_affinity_law(&mut rotors, "A", 1750.0, &mapper).unwrap_err();
        assert_eq!(
            err,
            DeriveError::Duplicate(crate::models::pump::core::error::DuplicateNameError {
                name: "A (1750 RPM)".into()
            })
        );
        assert_eq!(rotors.len(), 2);
    }

    #[test]
    fn rejects_bad_requests() {
        let mut rotors = sample();
        let mapper = CoordinateMapper::default();

        for bad in [0.0, -1750.0, f64::NAN, f64::INFINITY] {
            let err = apply_affinity_law(&mut rotors, "A", bad, &mapper).unwrap_err();
            assert!(matches!(
                err,
                DeriveError::Parameter(ParameterError::Speed { .. })
            ));
        }

        assert_eq!(rotors.len(), 1);

        let err = apply_affinity_law(&mut rotors, "Z", 1750.0, &mapper).unwrap_err();
        assert_eq!(
            err,
            DeriveError::Parameter(ParameterError::UnknownRotor("Z".into()))
        );
    }

    #[test]
    fn digitized_source_becomes_tabulated() {
        let mapper = chart_mapper();
        let mut rotor = Rotor::digitized("D", rpm(3500.0));
        rotor
            .add_point(EfficiencyPoint::new(PixelPoint::new(400, 250), 65.0).unwrap(), &mapper)
            .unwrap();
        let mut rotors = set_of([rotor]);

        let variant = apply_affinity_law(&mut rotors, "D", 1750.0, &mapper).unwrap();
        let RotorPoints::Tabulated(points) = variant.points() else {
            panic!("expected tabulated points");
        };
        assert_relative_eq!(points[0].flow(), 15.0, epsilon = 1e-9);
        assert_relative_eq!(points[0].head(), 5.0, epsilon = 1e-9);

        let err = apply_affinity_law(&mut rotors, "D", 2900.0, &CoordinateMapper::default())
            .unwrap_err();
        assert!(matches!(err, DeriveError::Calibration { .. }));
    }

    #[test]
    fn names_fractional_speeds() {
        assert_eq!(speed_variant_name("B", 1450.0), "B (1450 RPM)");
        assert_eq!(speed_variant_name("B", 1450.5), "B (1450.5 RPM)");
    }

    #[test]
    fn previews_system_points() {
        let scaled = scale_points(&[(10.0, 20.0), (0.0, 5.0)], &rpm(1000.0), &rpm(2000.0));
        assert_relative_eq!(scaled[0].0, 20.0);
        assert_relative_eq!(scaled[0].1, 80.0);
        assert_relative_eq!(scaled[1].1, 20.0);
    }
}
