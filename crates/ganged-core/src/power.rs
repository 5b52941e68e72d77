//! The diminishing-returns power curve.
//!
//! Maps a combined quantity to a throughput multiplier (1.0 = baseline
//! single-machine throughput). The first machine always contributes 1.0;
//! each further machine contributes `1.0 - (k-1) * penalty`, clamped from
//! below by `minimum_effect`. The floor applies per unit, not to the
//! aggregate, so the curve flattens to a constant slope of `minimum_effect`
//! but never decreases.
//!
//! Pure and deterministic; also consulted by the display layer for the
//! "Power: N%" readout.

use crate::fixed::{Fixed64, fixed64_to_f64};

/// The power added by the k-th merged unit (k >= 2), after floor clamping.
pub fn marginal_contribution(k: u32, penalty: Fixed64, minimum_effect: Fixed64) -> Fixed64 {
    let decayed = Fixed64::ONE - Fixed64::from_num(k - 1) * penalty;
    decayed.max(minimum_effect)
}

/// Total throughput multiplier for `quantity` merged machines.
///
/// `compute_power(1, ..) == 1.0`; with `penalty == 0` the result is exactly
/// `quantity`; the result is monotonically non-decreasing in `quantity` for
/// any `penalty >= 0` and `minimum_effect >= 0`.
pub fn compute_power(quantity: u32, penalty: Fixed64, minimum_effect: Fixed64) -> Fixed64 {
    let mut multiplier = Fixed64::ONE;
    for k in 2..=quantity.max(1) {
        multiplier += marginal_contribution(k, penalty, minimum_effect);
    }
    multiplier
}

/// Multiplier expressed as a percentage for display (1.97 -> 197.0).
pub fn power_percent(multiplier: Fixed64) -> f64 {
    fixed64_to_f64(multiplier) * 100.0
}

// ===========================================================================
// Tests
// ===========================================================================
