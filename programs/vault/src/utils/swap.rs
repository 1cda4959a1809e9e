use library::errors::VaultResult;
use library::math::casting::Cast;
use library::math::full_math::{mul_div_down, mul_div_up};
use library::math::safe_math::SafeMath;
use library::math::wad::{mul_wad_down, rescale_down, rescale_up, MAX_DECIMALS};

use crate::constants::WAD;
use crate::state::SwapVenue;

// Deterministic peg-stability quotes. Both legs price through an
// 18-decimal intermediate pegged 1:1 to the base asset; the staked
// collateral trades against that intermediate at the venue's floating
// exchange rate. Every rounding step favors the venue.

/// Collateral units received for selling `base_in` base units.
pub fn preview_forward_swap(venue: &SwapVenue, base_in: u64) -> VaultResult<u128> {
    let sell_fee = venue.sell_fee_rate as u128;
    let rate = venue.stake_exchange_rate as u128;

    let base_wad = rescale_down(base_in as u128, venue.base_decimals, MAX_DECIMALS)?;
    let intermediate = mul_div_down(base_wad, WAD.safe_sub(sell_fee)?, WAD)?;
    let collateral_wad = mul_div_down(intermediate, WAD, rate)?;
    rescale_down(collateral_wad, MAX_DECIMALS, venue.collateral_decimals)
}

/// Base units received for selling `collateral_in` collateral units.
pub fn preview_reverse_swap(venue: &SwapVenue, collateral_in: u128) -> VaultResult<u64> {
    let buy_fee = venue.buy_fee_rate as u128;
    let rate = venue.stake_exchange_rate as u128;

    let collateral_wad = rescale_down(collateral_in, venue.collateral_decimals, MAX_DECIMALS)?;
    let intermediate = mul_wad_down(collateral_wad, rate)?;
    let base_wad = mul_div_down(intermediate, WAD, WAD.safe_add(buy_fee)?)?;
    rescale_down(base_wad, MAX_DECIMALS, venue.base_decimals)?.cast()
}

/// Collateral units that must be sold to receive at least `base_out`
/// base units. Each stage rounds up, so selling the returned amount is
/// guaranteed to cover `base_out`.
pub fn collateral_in_for_base_out(venue: &SwapVenue, base_out: u64) -> VaultResult<u128> {
    let buy_fee = venue.buy_fee_rate as u128;
    let rate = venue.stake_exchange_rate as u128;

    let base_wad = rescale_up(base_out as u128, venue.base_decimals, MAX_DECIMALS)?;
    let intermediate = mul_div_up(base_wad, WAD.safe_add(buy_fee)?, WAD)?;
    let collateral_wad = mul_div_up(intermediate, WAD, rate)?;
    rescale_up(collateral_wad, MAX_DECIMALS, venue.collateral_decimals)
}

/// Base value of a collateral holding, quoted through the reverse leg
/// (fee inclusive). This is the valuation LTV and NAV are built on.
pub fn value_in_base(venue: &SwapVenue, collateral: u128) -> VaultResult<u64> {
    preview_reverse_swap(venue, collateral)
}

/// Fee-free mid rate: collateral units received per whole base unit.
pub fn spot_rate(venue: &SwapVenue) -> VaultResult<u128> {
    let rate = venue.stake_exchange_rate as u128;
    let collateral_wad = mul_div_down(WAD, WAD, rate)?;
    rescale_down(collateral_wad, MAX_DECIMALS, venue.collateral_decimals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn venue(sell_fee: u64, buy_fee: u64, rate: u128) -> SwapVenue {
        let mut v = SwapVenue::zeroed();
        v.sell_fee_rate = sell_fee;
        v.buy_fee_rate = buy_fee;
        v.stake_exchange_rate = rate as u64;
        v.base_decimals = 6;
        v.collateral_decimals = 18;
        v
    }

    #[test]
    fn fee_free_unit_rate_is_identity_across_decimals() {
        let v = venue(0, 0, WAD);
        // 1.0 base (6 decimals) -> 1.0 collateral (18 decimals)
        assert_eq!(preview_forward_swap(&v, 1_000_000).unwrap(), WAD);
        assert_eq!(preview_reverse_swap(&v, WAD).unwrap(), 1_000_000);
    }

    #[test]
    fn forward_then_reverse_never_profits() {
        let cases = [
            venue(0, 0, WAD),
            venue(1_000_000_000_000_000, 2_000_000_000_000_000, WAD), // 0.1% / 0.2%
            venue(0, 0, WAD + WAD / 20),                              // rate 1.05
            venue(500_000_000_000_000, 500_000_000_000_000, 2 * WAD),
        ];
        for v in &cases {
            for base_in in [1u64, 999, 1_000_000, 123_456_789, 5_000_000_000_000] {
                let collateral = preview_forward_swap(v, base_in).unwrap();
                let back = preview_reverse_swap(v, collateral).unwrap();
                assert!(back <= base_in, "profit from a round trip");
            }
        }
    }

    #[test]
    fn units_for_base_out_always_covers() {
        let cases = [
            venue(0, 0, WAD),
            venue(1_000_000_000_000_000, 2_000_000_000_000_000, WAD + WAD / 30),
            venue(0, 3_000_000_000_000_000, 3 * WAD / 2),
        ];
        for v in &cases {
            for base_out in [1u64, 7, 999_999, 1_000_001, 987_654_321] {
                let units = collateral_in_for_base_out(v, base_out).unwrap();
                let received = preview_reverse_swap(v, units).unwrap();
                assert!(received >= base_out, "undershot the requested base");
                // overshoot stays within one base unit of the request
                assert!(received <= base_out + 1);
            }
        }
    }

    #[test]
    fn higher_stake_rate_means_fewer_collateral_units() {
        let cheap = venue(0, 0, WAD);
        let rich = venue(0, 0, WAD + WAD / 10);
        let base_in = 50_000_000;
        assert!(
            preview_forward_swap(&rich, base_in).unwrap()
                < preview_forward_swap(&cheap, base_in).unwrap()
        );
        // but each unit is worth more on the way back
        assert!(
            preview_reverse_swap(&rich, WAD).unwrap() > preview_reverse_swap(&cheap, WAD).unwrap()
        );
        // spot quotes collateral per base, so the richer rate buys less
        assert_eq!(spot_rate(&cheap).unwrap(), WAD);
        assert_eq!(spot_rate(&rich).unwrap(), WAD * 10 / 11);
    }

    #[test]
    fn sell_fee_only_hits_the_forward_leg() {
        let free = venue(0, 0, WAD);
        let taxed = venue(10_000_000_000_000_000, 0, WAD); // 1%
        let base_in = 1_000_000;
        let col_free = preview_forward_swap(&free, base_in).unwrap();
        let col_taxed = preview_forward_swap(&taxed, base_in).unwrap();
        assert_eq!(col_taxed, col_free * 99 / 100);
        assert_eq!(
            preview_reverse_swap(&taxed, WAD).unwrap(),
            preview_reverse_swap(&free, WAD).unwrap()
        );
    }
}
