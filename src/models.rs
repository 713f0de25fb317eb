//! Public pump models.
//!
//! # Model structure
//!
//! Each model lives in its own module and contains an internal `core` submodule
//! where the actual computation and domain logic lives. The `core` module is an
//! implementation detail; its public items are re-exported by the model module.
//!
//! Numeric refinement steps are expressed as [`twine_core::Model`] /
//! [`twine_core::EquationProblem`] pairs and solved with `twine_solvers`.

pub mod pump;
