use anchor_lang::prelude::*;
use std::panic::Location;

use crate::errors::{ErrorCodes, VaultResult};

// Full-precision a * b / d on u128 operands with a 256-bit intermediate
// product, so WAD-scaled amounts never overflow mid-calculation. The
// quotient must fit back into u128.

const MASK_64: u128 = (1 << 64) - 1;

/// 256-bit product of two u128 values as (hi, lo) limbs.
fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let a_lo = a & MASK_64;
    let a_hi = a >> 64;
    let b_lo = b & MASK_64;
    let b_hi = b >> 64;

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    // mid collects the three 64-bit-shifted partial products; fits u128
    let mid = (ll >> 64) + (lh & MASK_64) + (hl & MASK_64);

    let lo = (mid << 64) | (ll & MASK_64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);

    (hi, lo)
}

/// Long division of the 256-bit value (hi, lo) by d.
/// Returns (quotient, remainder); None when d == 0 or the quotient
/// does not fit into u128.
fn div_wide(hi: u128, lo: u128, d: u128) -> Option<(u128, u128)> {
    if d == 0 {
        return None;
    }
    if hi == 0 {
        return Some((lo / d, lo % d));
    }
    if hi >= d {
        // quotient would need more than 128 bits
        return None;
    }

    // Bitwise restoring division over the low 128 bits; rem starts at hi
    // which is already < d. A shift out of bit 127 is handled with a
    // wrapping subtract since 2*rem + bit < 2*d always holds.
    let mut rem = hi;
    let mut quo: u128 = 0;
    for i in (0..128).rev() {
        let bit = (lo >> i) & 1;
        let carry = rem >> 127;
        rem = (rem << 1) | bit;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quo |= 1 << i;
        }
    }

    Some((quo, rem))
}

/// a * b / d, truncated toward zero.
#[track_caller]
pub fn mul_div_down(a: u128, b: u128, d: u128) -> VaultResult<u128> {
    let (hi, lo) = mul_wide(a, b);
    match div_wide(hi, lo, d) {
        Some((quo, _)) => Ok(quo),
        None => {
            let caller = Location::caller();
            msg!("Math error thrown at {}:{}", caller.file(), caller.line());
            if d == 0 {
                Err(ErrorCodes::LibraryDivisionByZero)
            } else {
                Err(ErrorCodes::LibraryMulDivOverflow)
            }
        }
    }
}

/// a * b / d, rounded away from zero.
#[track_caller]
pub fn mul_div_up(a: u128, b: u128, d: u128) -> VaultResult<u128> {
    let (hi, lo) = mul_wide(a, b);
    match div_wide(hi, lo, d) {
        Some((quo, rem)) => {
            if rem == 0 {
                Ok(quo)
            } else {
                quo.checked_add(1).ok_or(ErrorCodes::LibraryMulDivOverflow)
            }
        }
        None => {
            let caller = Location::caller();
            msg!("Math error thrown at {}:{}", caller.file(), caller.line());
            if d == 0 {
                Err(ErrorCodes::LibraryDivisionByZero)
            } else {
                Err(ErrorCodes::LibraryMulDivOverflow)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matches_native_when_in_range() {
        assert_eq!(mul_div_down(6, 7, 2).unwrap(), 21);
        assert_eq!(mul_div_down(7, 7, 2).unwrap(), 24);
        assert_eq!(mul_div_up(7, 7, 2).unwrap(), 25);
        assert_eq!(mul_div_up(6, 7, 2).unwrap(), 21);
    }

    #[test]
    fn wide_intermediate() {
        // (2^127) * 6 / (2^127) needs a 256-bit product
        let big = 1u128 << 127;
        assert_eq!(mul_div_down(big, 6, big).unwrap(), 6);

        // 1e30 * 1e18 / 1e18 overflows u128 mid-product
        let e30 = 10u128.pow(30);
        let e18 = 10u128.pow(18);
        assert_eq!(mul_div_down(e30, e18, e18).unwrap(), e30);
        assert_eq!(mul_div_up(e30, e18, e18).unwrap(), e30);
    }

    #[test]
    fn rounding_directions() {
        let e18 = 10u128.pow(18);
        // 1 wei of value across a huge denominator
        assert_eq!(mul_div_down(1, 1, e18).unwrap(), 0);
        assert_eq!(mul_div_up(1, 1, e18).unwrap(), 1);
    }

    #[test]
    fn quotient_overflow() {
        assert!(mul_div_down(u128::MAX, u128::MAX, 1).is_err());
        assert!(mul_div_up(u128::MAX, 2, 1).is_err());
    }

    #[test]
    fn division_by_zero() {
        assert!(mul_div_down(1, 1, 0).is_err());
        assert!(mul_div_up(1, 1, 0).is_err());
    }

    #[test]
    fn max_operands_in_range() {
        // u128::MAX * u128::MAX / u128::MAX round-trips exactly
        assert_eq!(
            mul_div_down(u128::MAX, u128::MAX, u128::MAX).unwrap(),
            u128::MAX
        );
    }
}
