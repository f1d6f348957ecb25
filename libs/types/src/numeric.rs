//! Integer amount types
//!
//! All protocol arithmetic is unsigned integer math with truncating division.
//! Intermediate products are widened to `u128` so `a * b / c` never overflows
//! before the division.

/// Token amount in the asset's smallest unit.
pub type Amount = u64;

/// Blockchain time unit.
pub type Slot = u64;

/// Basis-point denominator (10,000 bps = 100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// `floor(a * b / c)`.
///
/// Returns `None` when `c == 0` or the quotient does not fit in `u64`.
pub fn mul_div_floor(a: u64, b: u64, c: u64) -> Option<u64> {
    if c == 0 {
        return None;
    }
    let q = (a as u128 * b as u128) / c as u128;
    u64::try_from(q).ok()
}
