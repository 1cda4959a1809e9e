use crate::errors::{ErrorCodes, VaultResult};
use crate::math::full_math::{mul_div_down, mul_div_up};
use crate::math::safe_math::SafeMath;

/// 18-decimal fixed point scale for all ratios (fees, LTV, exchange rates).
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Largest token decimals the scaling helpers accept.
pub const MAX_DECIMALS: u8 = 18;

pub fn mul_wad_down(a: u128, b: u128) -> VaultResult<u128> {
    mul_div_down(a, b, WAD)
}

pub fn mul_wad_up(a: u128, b: u128) -> VaultResult<u128> {
    mul_div_up(a, b, WAD)
}

pub fn div_wad_down(a: u128, b: u128) -> VaultResult<u128> {
    mul_div_down(a, WAD, b)
}

pub fn div_wad_up(a: u128, b: u128) -> VaultResult<u128> {
    mul_div_up(a, WAD, b)
}

fn pow10(exp: u8) -> VaultResult<u128> {
    if exp > MAX_DECIMALS {
        return Err(ErrorCodes::LibraryDecimalsOutOfRange);
    }
    Ok(10u128.pow(exp as u32))
}

fn check_decimals(from_decimals: u8, to_decimals: u8) -> VaultResult<()> {
    if from_decimals > MAX_DECIMALS || to_decimals > MAX_DECIMALS {
        return Err(ErrorCodes::LibraryDecimalsOutOfRange);
    }
    Ok(())
}

/// Rescale an amount between decimal bases, truncating toward zero when
/// precision is lost.
pub fn rescale_down(amount: u128, from_decimals: u8, to_decimals: u8) -> VaultResult<u128> {
    check_decimals(from_decimals, to_decimals)?;
    if from_decimals == to_decimals {
        return Ok(amount);
    }
    if to_decimals > from_decimals {
        amount.safe_mul(pow10(to_decimals - from_decimals)?)
    } else {
        amount.safe_div(pow10(from_decimals - to_decimals)?)
    }
}

/// Rescale an amount between decimal bases, rounding away from zero when
/// precision is lost.
pub fn rescale_up(amount: u128, from_decimals: u8, to_decimals: u8) -> VaultResult<u128> {
    check_decimals(from_decimals, to_decimals)?;
    if from_decimals == to_decimals {
        return Ok(amount);
    }
    if to_decimals > from_decimals {
        amount.safe_mul(pow10(to_decimals - from_decimals)?)
    } else {
        amount.safe_div_ceil(pow10(from_decimals - to_decimals)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wad_ops() {
        assert_eq!(mul_wad_down(3 * WAD, WAD / 2).unwrap(), 3 * WAD / 2);
        assert_eq!(mul_wad_down(1, WAD - 1).unwrap(), 0);
        assert_eq!(mul_wad_up(1, WAD - 1).unwrap(), 1);
        assert_eq!(div_wad_down(1, 3).unwrap(), WAD / 3);
        assert_eq!(div_wad_up(1, 3).unwrap(), WAD / 3 + 1);
    }

    #[test]
    fn rescale_widening_is_exact() {
        assert_eq!(rescale_down(1_000_000, 6, 18).unwrap(), WAD);
        assert_eq!(rescale_up(1_000_000, 6, 18).unwrap(), WAD);
        assert_eq!(rescale_down(5, 6, 6).unwrap(), 5);
    }

    #[test]
    fn rescale_narrowing_rounds() {
        // 1.5 units at 18 decimals down to 6 decimals
        let amount = WAD + WAD / 2;
        assert_eq!(rescale_down(amount, 18, 6).unwrap(), 1_500_000);
        // one wei above an exact boundary
        assert_eq!(rescale_down(WAD + 1, 18, 6).unwrap(), 1_000_000);
        assert_eq!(rescale_up(WAD + 1, 18, 6).unwrap(), 1_000_001);
    }

    #[test]
    fn rescale_rejects_oversized_decimals() {
        assert!(rescale_down(1, 19, 6).is_err());
        assert!(rescale_up(1, 6, 19).is_err());
        // equal but out of range is still rejected
        assert!(rescale_down(1, 19, 19).is_err());
    }
}
