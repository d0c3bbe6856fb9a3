//! Core building blocks shared by every subsystem
//!
//! - **time**: deterministic tick counter and validation cadence
//! - **math**: clamping and logistic helpers for unit-interval scalars
//! - **config**: read-only simulation coefficients, loaded once

pub mod config;
pub mod math;
pub mod time;
