/// Least-squares fit of `y = a + b·x²` to a set of samples.
///
/// Returns `(a, b)`, or `None` when fewer than two samples are given or the
/// normal equations are singular (every `x²` identical).
///
/// ```
/// use pump_curves::support::interp::fit_offset_quadratic;
///
/// let xs = [0.0, 10.0, 20.0];
/// let ys = [5.0, 6.0, 9.0];
/// let (a, b) = fit_offset_quadratic(&xs, &ys).unwrap();
/// assert!((a - 5.0).abs() < 1e-9);
/// assert!((b - 0.01).abs() < 1e-12);
/// ```
#[must_use]
pub fn fit_offset_quadratic(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let (mut s_u, mut s_uu, mut s_y, mut s_uy) = (0.0, 0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(ys) {
        let u = x * x;
        s_u += u;
        s_uu += u * u;
        s_y += y;
        s_uy += u * y;
    }

    let det = n * s_uu - s_u * s_u;
    if det.abs() <= f64::EPSILON * s_uu.abs().max(1.0) * n {
        return None;
    }

    let b = (n * s_uy - s_u * s_y) / det;
    let a = (s_y - b * s_u) / n;
    (a.is_finite() && b.is_finite()).then_some((a, b))
}
