//! Supporting utilities shared across models.
//!
//! These modules are public because they are useful on their own, but their
//! APIs are not stable.

pub mod constraint;
pub mod interp;
pub mod units;
