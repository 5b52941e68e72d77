use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of host time. One tick = one in-game minute.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only at the config/display boundary,
/// never inside the adjustment path.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display/UI.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Round to the nearest integer, ties away from zero.
///
/// 2.5 -> 3, 2.49 -> 2, -2.5 -> -3.
#[inline]
pub fn round_half_away(v: Fixed64) -> i64 {
    let half = Fixed64::from_num(0.5);
    if v >= 0 {
        (v + half).floor().to_num()
    } else {
        (v - half).ceil().to_num()
    }
}
