//! Scalar helpers for unit-interval state
//!
//! Every affect, loyalty and probability value in the simulation lives in
//! `[0, 1]`. These helpers are the single place that enforces it.

/// Clamp a value into `[0, 1]`. NaN collapses to `0.0`.
///
/// # Example
/// ```
/// use settlement_sim_core::core::math::clamp_unit;
///
/// assert_eq!(clamp_unit(1.3), 1.0);
/// assert_eq!(clamp_unit(-0.2), 0.0);
/// assert_eq!(clamp_unit(f64::NAN), 0.0);
/// ```
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// True when `value` is a finite number inside `[0, 1]`
pub fn is_unit(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Standard logistic function `1 / (1 + e^-x)`
///
/// # Example
/// ```
/// use settlement_sim_core::core::math::sigmoid;
///
/// assert_eq!(sigmoid(0.0), 0.5);
/// assert!((sigmoid(2.0) - 0.8808).abs() < 1e-4);
/// ```
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
