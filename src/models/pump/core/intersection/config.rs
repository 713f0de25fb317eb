use twine_solvers::equation::bisection;

/// Smallest dense-scan size accepted.
pub const MIN_GRID_POINTS: usize = 1000;

/// Settings for the operating-point search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionConfig {
    /// Number of flows in the dense sign-change scan.
    ///
    /// Values below [`MIN_GRID_POINTS`] are raised to it.
    pub grid_points: usize,

    /// Refine each bracket by bisection after the linear estimate.
    pub refine: bool,

    /// Maximum iteration count for the bisection solve.
    pub max_iters: usize,

    /// Absolute tolerance on flow (m³/h).
    pub flow_tol: f64,

    /// Absolute tolerance on the head difference (m).
    pub head_tol: f64,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            grid_points: MIN_GRID_POINTS,
            refine: true,
            max_iters: 100,
            flow_tol: 1e-9,
            head_tol: 1e-9,
        }
    }
}

impl IntersectionConfig {
    /// Scan size actually used.
    #[must_use]
    pub fn grid(&self) -> usize {
        self.grid_points.max(MIN_GRID_POINTS)
    }

    /// Converts this configuration into a bisection solver configuration.
    pub(super) fn bisection(&self) -> bisection::Config {
        bisection::Config {
            max_iters: self.max_iters,
            x_abs_tol: self.flow_tol,
            x_rel_tol: 0.0,
            residual_tol: self.head_tol,
        }
    }
}
