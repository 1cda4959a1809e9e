use anchor_lang::prelude::*;

use library::math::casting::Cast;
use library::math::full_math::mul_div_down;
use library::math::safe_math::SafeMath;
use library::math::wad::mul_wad_down;

use crate::constants::BPS_DENOMINATOR;
use crate::errors::ErrorCodes;
use crate::state::{LendingMarket, MarketPosition, SwapVenue, VaultState};
use crate::utils::{lend, swap};

/// Net asset value of the vault in base units: collateral valued
/// through the reverse swap leg, plus idle and supplied base, minus
/// debt. A vault worth less than its debt refuses to price shares.
pub fn total_assets(
    market: &LendingMarket,
    position: &MarketPosition,
    venue: &SwapVenue,
    idle_base: u64,
) -> Result<u64> {
    let collateral_value = swap::value_in_base(venue, position.collateral_units)?;
    let supplied = lend::supplied_assets(market, position)?;
    let debt = lend::current_debt(market, position)?;

    let gross = (collateral_value as u128)
        .safe_add(idle_base as u128)?
        .safe_add(supplied as u128)?;
    require!(gross >= debt as u128, ErrorCodes::VaultNavUnderwater);
    Ok(gross.safe_sub(debt as u128)?.cast()?)
}

pub struct CheckpointOutcome {
    pub nav: u64,
    /// NAV per share before any fee dilution, WAD
    pub nav_per_share: u128,
    pub fee_value: u64,
    pub fee_shares: u128,
}

/// Crystallize the performance fee above the high-water mark by
/// minting fee shares. The mark moves to the pre-dilution NAV per
/// share, so the same gain can never be charged twice, and dilution
/// from the fee itself never lowers the mark.
pub fn accrual_checkpoint(
    state: &mut VaultState,
    performance_fee_bps: u16,
    nav: u64,
    now: u64,
) -> Result<CheckpointOutcome> {
    state.last_checkpoint_timestamp = now;

    let total_shares = state.total_shares;
    let nav_per_share = state.nav_per_share(nav)?;
    let high_water_mark = state.high_water_mark;

    let mut outcome = CheckpointOutcome {
        nav,
        nav_per_share,
        fee_value: 0,
        fee_shares: 0,
    };

    if total_shares == 0 || nav_per_share <= high_water_mark {
        return Ok(outcome);
    }

    let gain_per_share = nav_per_share.safe_sub(high_water_mark)?;
    let gain_value: u64 = mul_wad_down(gain_per_share, total_shares)?.cast()?;
    let fee_value: u64 = mul_div_down(
        gain_value as u128,
        performance_fee_bps as u128,
        BPS_DENOMINATOR,
    )?
    .cast()?;

    // The mark rises even when the fee rounds away, otherwise dust
    // gains would accumulate into a chargeable gap.
    state.high_water_mark = nav_per_share;

    if fee_value == 0 {
        return Ok(outcome);
    }

    // Mint shares so the recipient's post-mint claim redeems to
    // fee_value: s = f * S / (nav - f).
    let fee_shares = mul_div_down(
        fee_value as u128,
        total_shares,
        (nav as u128).safe_sub(fee_value as u128)?,
    )?;
    state.mint_shares(fee_shares)?;
    state.fee_shares = state.fee_shares.safe_add(fee_shares)?;

    outcome.fee_value = fee_value;
    outcome.fee_shares = fee_shares;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;
    use bytemuck::Zeroable;

    fn state_with(total_shares: u128, hwm: u128) -> VaultState {
        let mut state = VaultState::zeroed();
        state.total_shares = total_shares;
        state.high_water_mark = hwm;
        state
    }

    #[test]
    fn no_fee_at_or_below_the_mark() {
        // 1000 shares at nav 1000: nav per share exactly at the mark
        let mut state = state_with(1_000_000_000, WAD);
        let outcome = accrual_checkpoint(&mut state, 2_000, 1_000_000_000, 10).unwrap();
        assert_eq!(outcome.fee_shares, 0);
        assert_eq!({ state.high_water_mark }, WAD);

        // a drawdown leaves the mark where it was
        let outcome = accrual_checkpoint(&mut state, 2_000, 900_000_000, 20).unwrap();
        assert_eq!(outcome.fee_shares, 0);
        assert_eq!({ state.high_water_mark }, WAD);
        assert_eq!({ state.last_checkpoint_timestamp }, 20);
    }

    #[test]
    fn fee_redeems_to_the_charged_value() {
        // 10% gain, 20% fee
        let mut state = state_with(1_000_000_000, WAD);
        let nav = 1_100_000_000;
        let outcome = accrual_checkpoint(&mut state, 2_000, nav, 10).unwrap();

        assert_eq!(outcome.fee_value, 20_000_000); // 20% of the 100 gain
        let claim = mul_div_down(outcome.fee_shares, nav as u128, state.total_shares).unwrap();
        assert!(claim <= outcome.fee_value as u128);
        assert!(claim + 1 >= outcome.fee_value as u128);

        // mark sits at the pre-dilution peak
        assert_eq!({ state.high_water_mark }, WAD + WAD / 10);
    }

    #[test]
    fn same_gain_is_never_charged_twice() {
        let mut state = state_with(1_000_000_000, WAD);
        let nav = 1_100_000_000;
        accrual_checkpoint(&mut state, 2_000, nav, 10).unwrap();
        let shares_after_first = state.total_shares;

        // NAV unchanged: the share price is now below the mark
        let outcome = accrual_checkpoint(&mut state, 2_000, nav, 20).unwrap();
        assert_eq!(outcome.fee_shares, 0);
        assert_eq!({ state.total_shares }, shares_after_first);
    }

    #[test]
    fn mark_rises_on_dust_gains_without_minting() {
        let mut state = state_with(1_000_000_000, WAD);
        // 3 base units of gain, fee rounds to zero value
        let outcome = accrual_checkpoint(&mut state, 1, 1_000_000_003, 10).unwrap();
        assert_eq!(outcome.fee_shares, 0);
        assert!({ state.high_water_mark } > WAD);
    }

    #[test]
    fn underwater_vault_refuses_to_price() {
        let mut market = LendingMarket::zeroed();
        let mut position = MarketPosition::zeroed();
        let mut venue = SwapVenue::zeroed();
        venue.stake_exchange_rate = WAD as u64;
        venue.base_decimals = 6;
        venue.collateral_decimals = 18;

        // 10 base of collateral against 50 of debt
        position.collateral_units = 10 * WAD;
        market.total_borrow_assets = 50_000_000;
        market.total_borrow_shares = 50_000_000_000_000;
        position.borrow_shares = 50_000_000_000_000;

        let err = total_assets(&market, &position, &venue, 0).unwrap_err();
        assert_eq!(err, anchor_lang::error!(ErrorCodes::VaultNavUnderwater));
    }
}
