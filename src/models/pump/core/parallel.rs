//! Parallel operation of pumps.
//!
//! Two identical pumps in parallel deliver twice the flow at the same head.
//! Different rotors in parallel share a common head; the combined curve is
//! found by matching head levels across rotors and summing their flows.

use super::{
    calibration::CoordinateMapper,
    error::{DeriveError, ParameterError},
    rotor::{CombinedPoint, Contribution, Origin, PhysicalPoint, Rotor, RotorPoints, RotorSet},
};

/// Head matching rules for multi-rotor combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombineConfig {
    /// Largest head difference (m) for a rotor point to match a head level.
    pub head_tolerance: f64,

    /// Decimal places candidate head levels are rounded to.
    pub head_decimals: u32,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            head_tolerance: 0.5,
            head_decimals: 2,
        }
    }
}

/// Which kind of parallel variant to derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelMode<'a> {
    /// Two identical copies of one rotor.
    SameRotor(&'a str),

    /// Two or more distinct rotors.
    Rotors(&'a [&'a str]),
}

/// Derives a parallel variant and inserts it into `rotors`.
///
/// # Errors
///
/// See [`duplicate_rotor`] and [`combine_rotors`].
pub fn combine_parallel<'a>(
    rotors: &'a mut RotorSet,
    mode: ParallelMode<'_>,
    mapper: &CoordinateMapper,
    config: &CombineConfig,
) -> Result<&'a Rotor, DeriveError> {
    match mode {
        ParallelMode::SameRotor(source) => duplicate_rotor(rotors, source, mapper),
        ParallelMode::Rotors(sources) => combine_rotors(rotors, sources, mapper, config),
    }
}

/// Derives the curve of two identical copies of `source` in parallel.
///
/// Every flow is doubled; head and efficiency are unchanged. The variant is
/// named `"<source> - Paralelo"`, with a sequential suffix on repeats.
///
/// # Errors
///
/// - [`ParameterError::UnknownRotor`] if the source does not exist.
/// - [`DeriveError::Calibration`] if a digitized source cannot be mapped.
pub fn duplicate_rotor<'a>(
    rotors: &'a mut RotorSet,
    source: &str,
    mapper: &CoordinateMapper,
) -> Result<&'a Rotor, DeriveError> {
    let base = rotors
        .get(source)
        .ok_or_else(|| ParameterError::UnknownRotor(source.to_owned()))?;

    let points = base
        .transformed(mapper, 2.0, 1.0)
        .map_err(|err| DeriveError::Calibration {
            rotor: source.to_owned(),
            source: err,
        })?;

    let name = sequential_name(rotors, &format!("{source} - Paralelo"));
    let rotor = Rotor::derived(
        name,
        *base.rpm(),
        points,
        Origin::Parallel {
            base: source.to_owned(),
        },
        true,
    );

    tracing::info!(base = source, variant = rotor.name(), "derived parallel variant");
    Ok(rotors.insert(rotor)?)
}

/// Derives the curve of several distinct rotors running in parallel.
///
/// The combination inherits the speed of the first source and is named
/// `"Rotores <a>,<b> em Paralelo"` from the first word of each source name.
///
/// # Errors
///
/// - [`ParameterError::TooFewRotors`] if fewer than two distinct rotors are given.
/// - [`ParameterError::UnknownRotor`] if a source does not exist.
/// - [`DeriveError::Calibration`] if a digitized source cannot be mapped.
/// - [`DeriveError::NoMatchingHeads`] if no head level is shared by two rotors.
pub fn combine_rotors<'a>(
    rotors: &'a mut RotorSet,
    sources: &[&str],
    mapper: &CoordinateMapper,
    config: &CombineConfig,
) -> Result<&'a Rotor, DeriveError> {
    let mut names: Vec<&str> = Vec::with_capacity(sources.len());
    for &name in sources {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    if names.len() < 2 {
        return Err(ParameterError::TooFewRotors(names.len()).into());
    }

    let mut resolved = Vec::with_capacity(names.len());
    for &name in &names {
        let rotor = rotors
            .get(name)
            .ok_or_else(|| ParameterError::UnknownRotor(name.to_owned()))?;
        let points = rotor
            .physical_points(mapper)
            .map_err(|source| DeriveError::Calibration {
                rotor: name.to_owned(),
                source,
            })?;
        resolved.push((name, points));
    }

    let inputs: Vec<(&str, &[PhysicalPoint])> = resolved
        .iter()
        .map(|(name, points)| (*name, points.as_slice()))
        .collect();
    let combined = combine_points(&inputs, config);
    if combined.is_empty() {
        return Err(DeriveError::NoMatchingHeads {
            rotors: names.iter().map(|&n| n.to_owned()).collect(),
        });
    }

    let rpm = match rotors.get(names[0]) {
        Some(first) => *first.rpm(),
        None => return Err(ParameterError::UnknownRotor(names[0].to_owned()).into()),
    };

    let short: Vec<&str> = names
        .iter()
        .map(|n| n.split_whitespace().next().unwrap_or(n))
        .collect();
    let name = sequential_name(rotors, &format!("Rotores {} em Paralelo", short.join(",")));

    let rotor = Rotor::derived(
        name,
        rpm,
        RotorPoints::Combined(combined),
        Origin::Combined {
            sources: names.iter().map(|&n| n.to_owned()).collect(),
        },
        true,
    );

    tracing::info!(
        variant = rotor.name(),
        points = rotor.points().len(),
        "derived parallel combination"
    );
    Ok(rotors.insert(rotor)?)
}

/// Combines rotor curves at matched head levels.
///
/// Candidate head levels are every head in the input, rounded to
/// `config.head_decimals`. At each level, every rotor contributes its point
/// closest in head if it lies within `config.head_tolerance`. Levels matched
/// by at least two rotors yield a combined point with the summed flow and the
/// average head. Points are returned in ascending head order.
#[must_use]
pub fn combine_points(
    sources: &[(&str, &[PhysicalPoint])],
    config: &CombineConfig,
) -> Vec<CombinedPoint> {
    let scale = 10_f64.powi(i32::try_from(config.head_decimals).unwrap_or(i32::MAX));
    let mut levels: Vec<f64> = sources
        .iter()
        .flat_map(|(_, points)| points.iter().map(|p| (p.head() * scale).round() / scale))
        .filter(|h| h.is_finite())
        .collect();
    levels.sort_by(f64::total_cmp);
    levels.dedup();

    levels
        .into_iter()
        .filter_map(|level| {
            let matched: Vec<Contribution> = sources
                .iter()
                .filter_map(|(rotor, points)| {
                    closest_in_head(points, level, config.head_tolerance).map(|p| Contribution {
                        rotor: (*rotor).to_owned(),
                        flow: p.flow(),
                        head: p.head(),
                        efficiency: p.efficiency(),
                    })
                })
                .collect();
            if matched.len() < 2 {
                return None;
            }
            CombinedPoint::new(matched)
        })
        .collect()
}

fn closest_in_head(points: &[PhysicalPoint], level: f64, tolerance: f64) -> Option<&PhysicalPoint> {
    let mut best: Option<(&PhysicalPoint, f64)> = None;
    for point in points {
        let diff = (point.head() - level).abs();
        if diff > tolerance {
            continue;
        }
        if best.is_none_or(|(_, d)| diff < d) {
            best = Some((point, diff));
        }
    }
    best.map(|(point, _)| point)
}

/// Returns `base` if free, otherwise `"<base> (n)"` with `n` one past the
/// number of existing names sharing the prefix.
fn sequential_name(rotors: &RotorSet, base: &str) -> String {
    if !rotors.contains(base) {
        return base.to_owned();
    }
    let mut n = rotors.names().filter(|name| name.starts_with(base)).count() + 1;
    loop {
        let candidate = format!("{base} ({n})");
        if !rotors.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
