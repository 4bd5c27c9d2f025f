//! Math utilities.

use num_traits::Float;

/// Square of a number.
#[inline(always)]
pub fn sqr<F: Float>(x: F) -> F { x * x }

/// Reciprocal of a number.
#[inline(always)]
pub fn rcp_f64(x: f64) -> f64 { 1.0 / x }

/// Arc cosine with the argument clamped to [-1, 1].
///
/// Floating-point error can push an analytically bounded cosine marginally
/// outside the valid domain; `acos` would return NaN for such input.
#[inline]
pub fn safe_acos(cos: f64) -> f64 { cos.clamp(-1.0, 1.0).acos() }

/// Arithmetic mean of the values, NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() * rcp_f64(values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_acos_clamps_out_of_domain() {
        assert_eq!(safe_acos(1.0 + 1e-12), 0.0);
        assert_eq!(safe_acos(-1.0 - 1e-12), std::f64::consts::PI);
        assert!((1.0f64 + 1e-12).acos().is_nan());
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert!(mean(&[]).is_nan());
    }
}
