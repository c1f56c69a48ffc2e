//! Shared types, error taxonomy and alpha arithmetic.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
