//! Problem formulation for refining a rotor / system-curve crossing.

use std::convert::Infallible;

use thiserror::Error;
use twine_core::{EquationProblem, Model};

use crate::models::pump::core::{curve::RotorCurve, system_curve::SystemCurve};

/// Heads of both curves at one flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct HeadGap {
    pub(super) flow: f64,
    pub(super) rotor_head: f64,
    pub(super) system_head: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("flow {flow} lies outside a curve's domain")]
pub(super) struct OutsideDomain {
    flow: f64,
}

/// Model evaluating both curves at a flow in m³/h.
pub(super) struct HeadGapModel<'a> {
    curve: &'a RotorCurve,
    system: &'a SystemCurve,
}

impl<'a> HeadGapModel<'a> {
    pub(super) fn new(curve: &'a RotorCurve, system: &'a SystemCurve) -> Self {
        Self { curve, system }
    }
}

impl Model for HeadGapModel<'_> {
    type Input = f64;
    type Output = HeadGap;
    type Error = OutsideDomain;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let flow = *input;
        let rotor_head = self.curve.head_at(flow);
        let system_head = self.system.head_at(flow);
        if rotor_head.is_nan() || system_head.is_nan() {
            return Err(OutsideDomain { flow });
        }
        Ok(HeadGap {
            flow,
            rotor_head,
            system_head,
        })
    }
}

/// Equation problem whose root is the operating flow.
///
/// Computes the residual as `rotor_head - system_head`.
pub(super) struct HeadGapProblem;

impl EquationProblem<1> for HeadGapProblem {
    type Input = f64;
    type Output = HeadGap;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(x[0])
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        Ok([output.rotor_head - output.system_head])
    }
}
