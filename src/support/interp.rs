//! One-dimensional interpolation over tabulated samples.
//!
//! [`Interp1d`] interpolates `y(x)` over strictly increasing, unique abscissae.
//! Digitized data is rarely that tidy, so [`sort_and_dedup`] is provided to
//! bring an arbitrary point set into shape first.
//!
//! ```
//! use pump_curves::support::interp::{Interp1d, InterpolationKind};
//!
//! let f = Interp1d::new(vec![0.0, 10.0, 20.0], vec![30.0, 28.0, 22.0], InterpolationKind::Linear)
//!     .unwrap();
//! assert_eq!(f.eval(5.0), 29.0);
//! assert!(f.eval(25.0).is_nan());
//!
//! let f = f.extrapolating();
//! assert_eq!(f.eval(25.0), 19.0);
//! ```

mod fit;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fit::fit_offset_quadratic;

/// Interpolation scheme used between knots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationKind {
    /// Straight segments between adjacent knots.
    #[default]
    Linear,

    /// Local quadratic through the three knots nearest the evaluation point.
    ///
    /// Requires at least three knots; fewer falls back to [`Linear`](Self::Linear).
    Quadratic,
}

/// Errors raised while building an interpolant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpolationError {
    /// Fewer than two samples were supplied.
    #[error("at least 2 points are required, got {count}")]
    TooFewPoints { count: usize },

    /// Fewer than two unique abscissae remain after duplicates are collapsed.
    #[error("at least 2 unique flow values are required, got {unique}")]
    TooFewUniqueAbscissae { unique: usize },

    /// The abscissa and ordinate arrays have different lengths.
    #[error("length mismatch: {xs} abscissae and {ys} ordinates")]
    LengthMismatch { xs: usize, ys: usize },

    /// A sample is `NaN` or infinite.
    #[error("non-finite sample at index {index}")]
    NonFinite { index: usize },

    /// Abscissae are not strictly increasing.
    #[error("abscissae must be strictly increasing (index {index})")]
    NotIncreasing { index: usize },
}

/// A one-dimensional interpolant.
///
/// Outside `[x_first, x_last]` evaluation returns `NaN` unless the interpolant
/// was built with [`extrapolating`](Self::extrapolating), in which case the
/// end segments are continued.
#[derive(Debug, Clone, PartialEq)]
pub struct Interp1d {
    xs: Vec<f64>,
    ys: Vec<f64>,
    kind: InterpolationKind,
    extrapolate: bool,
}

impl Interp1d {
    /// Builds an interpolant over strictly increasing abscissae.
    ///
    /// A quadratic request with fewer than three knots is downgraded to linear.
    ///
    /// # Errors
    ///
    /// Returns an [`InterpolationError`] if fewer than two knots are supplied,
    /// the arrays differ in length, a value is not finite, or the abscissae
    /// are not strictly increasing.
    pub fn new(
        xs: Vec<f64>,
        ys: Vec<f64>,
        kind: InterpolationKind,
    ) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::LengthMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        if xs.len() < 2 {
            return Err(InterpolationError::TooFewPoints { count: xs.len() });
        }
        if let Some(index) = xs
            .iter()
            .zip(&ys)
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(InterpolationError::NonFinite { index });
        }
        if let Some(index) = xs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(InterpolationError::NotIncreasing { index: index + 1 });
        }

        let kind = match kind {
            InterpolationKind::Quadratic if xs.len() < 3 => {
                tracing::debug!(knots = xs.len(), "quadratic needs 3 knots, using linear");
                InterpolationKind::Linear
            }
            kind => kind,
        };

        Ok(Self {
            xs,
            ys,
            kind,
            extrapolate: false,
        })
    }

    /// Returns this interpolant with boundary extrapolation enabled.
    #[must_use]
    pub fn extrapolating(mut self) -> Self {
        self.extrapolate = true;
        self
    }

    /// The scheme actually in use, after any fallback.
    #[must_use]
    pub fn kind(&self) -> InterpolationKind {
        self.kind
    }

    /// First and last knot abscissae.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Knot abscissae.
    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Knot ordinates.
    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Evaluates the interpolant at `x`.
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        let (lo, hi) = self.domain();
        if x.is_nan() || (!self.extrapolate && (x < lo || x > hi)) {
            return f64::NAN;
        }

        let n = self.xs.len();
        let i = self
            .xs
            .partition_point(|&knot| knot <= x)
            .saturating_sub(1)
            .min(n - 2);

        match self.kind {
            InterpolationKind::Linear => self.linear(i, x),
            InterpolationKind::Quadratic => self.quadratic(self.stencil(i, x), x),
        }
    }

    fn linear(&self, i: usize, x: f64) -> f64 {
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    /// Start index of the three-knot stencil around segment `i`.
    fn stencil(&self, i: usize, x: f64) -> usize {
        let last = self.xs.len() - 3;
        if i == 0 {
            return 0;
        }
        let closer_to_left = x - self.xs[i] < self.xs[i + 1] - x;
        let start = if closer_to_left { i - 1 } else { i };
        start.min(last)
    }

    fn quadratic(&self, j: usize, x: f64) -> f64 {
        let (x0, x1, x2) = (self.xs[j], self.xs[j + 1], self.xs[j + 2]);
        let (y0, y1, y2) = (self.ys[j], self.ys[j + 1], self.ys[j + 2]);
        let l0 = (x - x1) * (x - x2) / ((x0 - x1) * (x0 - x2));
        let l1 = (x - x0) * (x - x2) / ((x1 - x0) * (x1 - x2));
        let l2 = (x - x0) * (x - x1) / ((x2 - x0) * (x2 - x1));
        y0 * l0 + y1 * l1 + y2 * l2
    }
}

/// Returns `n` evenly spaced values over `[start, end]`, both ends included.
#[must_use]
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|k| if k == n - 1 { end } else { start + step * k as f64 })
                .collect()
        }
    }
}

/// Sorts items by `key` and collapses equal keys to their first occurrence.
///
/// Sorting is stable, so "first" means first in the input order.
/// Returns the surviving items and the number of items dropped.
pub fn sort_and_dedup<T>(mut items: Vec<T>, key: impl Fn(&T) -> f64) -> (Vec<T>, usize) {
    let before = items.len();
    items.sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal));
    items.dedup_by(|later, earlier| key(later) == key(earlier));
    let dropped = before - items.len();
    (items, dropped)
}
