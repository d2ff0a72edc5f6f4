//! Count arithmetic. Every multiplicative scaling of a head count (r0 growth, exposure buffer,
//! cohort fractions) is rounded to the nearest integer, ties away from zero, before it is used.

use approx::AbsDiffEq;

/// Tolerance for comparing configuration fractions, e.g. that the outcome shares sum to one.
pub const FRACTION_TOLERANCE: f64 = 1e-9;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Rounds a non-negative real to the nearest count, ties away from zero. Negative and NaN
/// inputs give zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_count(value: f64) -> usize {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    value.round() as usize
}

/// `round(factor × count)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn scale_count(count: usize, factor: f64) -> usize {
    round_count(factor * count as f64)
}
