use anchor_lang::prelude::*;

use library::math::casting::Cast;
use library::math::full_math::{mul_div_down, mul_div_up};
use library::math::safe_math::SafeMath;
use library::math::wad::{mul_wad_down, mul_wad_up};

use crate::constants::{BORROW_STEP_DAMPING, LTV_TOLERANCE, MAX_ITERATIONS, WAD};
use crate::errors::ErrorCodes;
use crate::state::{LendingMarket, MarketPosition, SwapVenue};
use crate::utils::{lend, swap};

/// Net result of a leverage loop. The caller settles exactly these
/// base-token movements after the in-memory loop commits:
/// market -> vault for `borrowed`, vault -> venue for
/// `swapped_to_collateral`, venue -> vault for `unstaked_base`,
/// vault -> market for `repaid`.
#[derive(Default, Debug, Clone, Copy)]
pub struct LeverageOutcome {
    /// Loop ended inside the tolerance band around target LTV
    pub converged: bool,
    pub iterations: u8,
    pub final_ltv: u128,
    pub borrowed: u64,
    pub swapped_to_collateral: u64,
    pub unstaked_base: u64,
    pub repaid: u64,
    /// Base freed for the caller on the withdrawal path
    pub freed: u64,
    /// Rounding remainder left idle in the vault
    pub idle_gain: u64,
}

/// Fraction of a borrowed base unit that survives the forward swap as
/// collateral value, WAD: (1 - sell_fee) / (1 + buy_fee). Rounded down
/// so borrow steps are understated and the loop approaches target from
/// below.
fn swap_retention(venue: &SwapVenue) -> Result<u128> {
    let sell_fee = venue.sell_fee_rate as u128;
    let buy_fee = venue.buy_fee_rate as u128;
    Ok(mul_div_down(
        WAD.safe_sub(sell_fee)?,
        WAD,
        WAD.safe_add(buy_fee)?,
    )?)
}

/// Lever up toward `target_ltv`: deploy fresh base into collateral,
/// then borrow-swap-supply until the LTV gap closes. Each step solves
/// for the borrow that closes the whole gap given the venue's fee
/// retention, damped, so the loop converges geometrically and never
/// crosses the target.
pub fn increase_leverage(
    market: &mut LendingMarket,
    position: &mut MarketPosition,
    venue: &SwapVenue,
    target_ltv: u128,
    deploy_base: u64,
) -> Result<LeverageOutcome> {
    let mut outcome = LeverageOutcome::default();

    if deploy_base > 0 {
        let units = swap::preview_forward_swap(venue, deploy_base)?;
        lend::supply_collateral(position, units)?;
        outcome.swapped_to_collateral = deploy_base;
    }

    let retention = swap_retention(venue)?;
    // 1 - target * retention: each borrowed unit adds a full unit of
    // debt but only `retention` of collateral value
    let step_divisor = WAD.safe_sub(mul_wad_down(target_ltv, retention)?)?;

    let mut ltv = lend::current_ltv(market, position, venue)?;

    while outcome.iterations < MAX_ITERATIONS {
        if ltv.saturating_add(LTV_TOLERANCE) >= target_ltv {
            break;
        }

        let collateral_value = swap::value_in_base(venue, position.collateral_units)?;
        let debt = lend::current_debt(market, position)?;
        // gap in base value terms: target * collateral - debt
        let gap_value = mul_wad_down(collateral_value as u128, target_ltv)?
            .saturating_sub(debt as u128);

        let step_value = mul_div_down(gap_value, WAD, step_divisor)?;
        let mut step: u64 = mul_wad_down(step_value, BORROW_STEP_DAMPING)?.cast()?;
        if step == 0 {
            // gap below one base unit: nothing left to express, commit
            break;
        }

        let liquidity = market.available_liquidity();
        if step > liquidity {
            step = liquidity;
        }
        if step == 0 {
            // the market ran out mid-loop: commit what was levered,
            // a dry market with nothing borrowed is the hard error
            require!(outcome.borrowed > 0, ErrorCodes::VaultInsufficientLiquidity);
            break;
        }
        outcome.iterations += 1;

        lend::borrow(market, position, step)?;
        let units = swap::preview_forward_swap(venue, step)?;
        lend::supply_collateral(position, units)?;

        outcome.borrowed = outcome.borrowed.safe_add(step)?;
        outcome.swapped_to_collateral = outcome.swapped_to_collateral.safe_add(step)?;

        ltv = lend::current_ltv(market, position, venue)?;
        require!(
            ltv <= market.liquidation_threshold as u128,
            ErrorCodes::VaultUnsafeLtv
        );
    }

    outcome.final_ltv = ltv;
    outcome.converged = ltv.saturating_add(LTV_TOLERANCE) >= target_ltv
        && ltv <= target_ltv.saturating_add(LTV_TOLERANCE);
    Ok(outcome)
}

/// Delever and/or free base for a withdrawal. Each iteration solves
/// for the total repay still required to end at `target_ltv` once the
/// caller's base has left, sells as much of that job as the
/// liquidation threshold allows, and allocates proceeds repay-first
/// so freeing capacity grows fastest. Fails hard if the requested
/// base cannot be freed; missing the tolerance band is reported as
/// `converged = false`.
pub fn decrease_leverage(
    market: &mut LendingMarket,
    position: &mut MarketPosition,
    venue: &SwapVenue,
    target_ltv: u128,
    base_out: u64,
) -> Result<LeverageOutcome> {
    let mut outcome = LeverageOutcome::default();
    let mut remaining_out = base_out;

    let mut ltv = lend::current_ltv(market, position, venue)?;

    while outcome.iterations < MAX_ITERATIONS {
        if remaining_out == 0 && ltv <= target_ltv.saturating_add(LTV_TOLERANCE) {
            break;
        }
        outcome.iterations += 1;

        let debt = lend::current_debt(market, position)?;
        let collateral_value = swap::value_in_base(venue, position.collateral_units)? as u128;

        // Repay R that lands the end state at target once the whole
        // remaining_out W has left: (D - R) / (C - R - W) <= t, so
        // R >= (D + t*W - t*C) / (1 - t).
        let repay_needed = if target_ltv == 0 {
            debt as u128
        } else {
            let shortfall = (debt as u128)
                .safe_add(mul_wad_up(remaining_out as u128, target_ltv)?)?
                .saturating_sub(mul_wad_down(collateral_value, target_ltv)?);
            mul_div_up(shortfall, WAD, WAD.safe_sub(target_ltv)?)?.min(debt as u128)
        };

        let job = repay_needed.safe_add(remaining_out as u128)?;
        if job == 0 {
            break;
        }

        // Collateral value that can leave without breaching the
        // liquidation threshold on the still-unpaid debt
        let keep_value = if debt == 0 {
            0
        } else {
            mul_div_up(debt as u128, WAD, market.liquidation_threshold as u128)?
        };
        let freeable = collateral_value.saturating_sub(keep_value);

        let sell_value: u64 = job.min(freeable).cast()?;
        if sell_value == 0 {
            break;
        }

        let sell_units = swap::collateral_in_for_base_out(venue, sell_value)?;
        let proceeds = swap::preview_reverse_swap(venue, sell_units)?;
        lend::withdraw_collateral(market, position, venue, sell_units)?;
        outcome.unstaked_base = outcome.unstaked_base.safe_add(proceeds)?;

        // Repay first: every repaid unit shrinks the collateral that
        // must stay behind, so capacity for later iterations grows.
        let repay_now: u64 = (proceeds as u128).min(repay_needed).min(debt as u128).cast()?;
        if repay_now > 0 {
            lend::repay(market, position, repay_now)?;
            outcome.repaid = outcome.repaid.safe_add(repay_now)?;
        }

        let to_caller = proceeds.safe_sub(repay_now)?.min(remaining_out);
        remaining_out = remaining_out.safe_sub(to_caller)?;

        // Round-up slack from the unit conversion: burn it into the
        // debt, anything beyond that stays idle in the vault
        let mut dust = proceeds.safe_sub(repay_now)?.safe_sub(to_caller)?;
        if dust > 0 {
            let debt_left = lend::current_debt(market, position)?;
            let extra_repay = dust.min(debt_left);
            if extra_repay > 0 {
                lend::repay(market, position, extra_repay)?;
                outcome.repaid = outcome.repaid.safe_add(extra_repay)?;
                dust = dust.safe_sub(extra_repay)?;
            }
            outcome.idle_gain = outcome.idle_gain.safe_add(dust)?;
        }

        ltv = lend::current_ltv(market, position, venue)?;
    }

    require!(remaining_out == 0, ErrorCodes::VaultInsufficientCollateral);

    outcome.freed = base_out;
    outcome.final_ltv = ltv;
    outcome.converged = ltv <= target_ltv.saturating_add(LTV_TOLERANCE);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    const TARGET: u128 = 750_000_000_000_000_000; // 75%

    fn setup(liquidity: u64) -> (LendingMarket, MarketPosition, MarketPosition, SwapVenue) {
        let mut market = LendingMarket::zeroed();
        market.liquidation_threshold = 860_000_000_000_000_000; // 86%

        let mut lender = MarketPosition::zeroed();
        if liquidity > 0 {
            lend::supply(&mut market, &mut lender, liquidity).unwrap();
        }

        let vault_position = MarketPosition::zeroed();

        let mut venue = SwapVenue::zeroed();
        venue.sell_fee_rate = 1_000_000_000_000_000; // 0.1%
        venue.buy_fee_rate = 2_000_000_000_000_000; // 0.2%
        venue.stake_exchange_rate = (WAD + WAD / 20) as u64; // 1.05
        venue.base_decimals = 6;
        venue.collateral_decimals = 18;

        (market, vault_position, lender, venue)
    }

    #[test]
    fn increase_converges_to_target_from_a_fresh_deposit() {
        let (mut market, mut position, _lender, venue) = setup(10_000_000_000);

        let outcome =
            increase_leverage(&mut market, &mut position, &venue, TARGET, 1_000_000_000).unwrap();

        assert!(outcome.converged, "final ltv {}", outcome.final_ltv);
        assert!(outcome.iterations >= 1 && outcome.iterations < MAX_ITERATIONS);
        assert!(outcome.final_ltv <= TARGET);
        assert!(outcome.final_ltv + LTV_TOLERANCE >= TARGET);
        // leverage multiplier on a 75% target is ~4x, minus fee drag
        assert!(outcome.borrowed > 2_000_000_000);
        assert_eq!(
            outcome.swapped_to_collateral,
            1_000_000_000 + outcome.borrowed
        );
        lend::check_position_health(&market, &position, &venue).unwrap();
    }

    #[test]
    fn increase_never_crosses_target_mid_loop() {
        let (mut market, mut position, _lender, venue) = setup(10_000_000_000);
        let units = swap::preview_forward_swap(&venue, 500_000_000).unwrap();
        lend::supply_collateral(&mut position, units).unwrap();

        for _ in 0..4 {
            let outcome =
                increase_leverage(&mut market, &mut position, &venue, TARGET, 0).unwrap();
            assert!(outcome.final_ltv <= TARGET + LTV_TOLERANCE);
        }
    }

    #[test]
    fn increase_with_empty_market_fails_fast() {
        let (mut market, mut position, _lender, venue) = setup(0);
        let err = increase_leverage(&mut market, &mut position, &venue, TARGET, 1_000_000_000)
            .unwrap_err();
        assert_eq!(
            err,
            anchor_lang::error!(ErrorCodes::VaultInsufficientLiquidity)
        );
    }

    #[test]
    fn increase_clamped_by_liquidity_reports_not_converged() {
        // enough liquidity for a partial step but nowhere near target
        let (mut market, mut position, _lender, venue) = setup(200_000_000);
        let outcome =
            increase_leverage(&mut market, &mut position, &venue, TARGET, 1_000_000_000)
                .unwrap();
        assert!(!outcome.converged);
        assert!(outcome.final_ltv < TARGET);
        // the partial leverage commits, draining the market
        assert_eq!(outcome.borrowed, 200_000_000);
        assert_eq!(market.available_liquidity(), 0);
        lend::check_position_health(&market, &position, &venue).unwrap();
    }

    #[test]
    fn dust_deposit_commits_without_borrowing() {
        let (mut market, mut position, _lender, venue) = setup(10_000_000_000);

        // 2 base units: the value gap truncates below one base unit,
        // so the loop has nothing to borrow and must still commit
        let outcome = increase_leverage(&mut market, &mut position, &venue, TARGET, 2).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.borrowed, 0);
        assert_eq!(outcome.swapped_to_collateral, 2);
        assert!(position.collateral_units > 0);
        lend::check_position_health(&market, &position, &venue).unwrap();
    }

    #[test]
    fn decrease_frees_the_requested_base() {
        let (mut market, mut position, _lender, venue) = setup(10_000_000_000);
        increase_leverage(&mut market, &mut position, &venue, TARGET, 1_000_000_000).unwrap();

        let outcome =
            decrease_leverage(&mut market, &mut position, &venue, TARGET, 200_000_000).unwrap();

        assert!(outcome.converged, "final ltv {}", outcome.final_ltv);
        assert_eq!(outcome.freed, 200_000_000);
        // freeing the caller's base required selling collateral and
        // repaying debt to hold the target
        assert!(outcome.repaid > 0);
        assert!(outcome.unstaked_base >= outcome.repaid + outcome.freed);
        assert!(outcome.final_ltv <= TARGET + LTV_TOLERANCE);
        lend::check_position_health(&market, &position, &venue).unwrap();
    }

    #[test]
    fn decrease_to_zero_target_unwinds_the_whole_debt() {
        let (mut market, mut position, _lender, venue) = setup(10_000_000_000);
        increase_leverage(&mut market, &mut position, &venue, TARGET, 1_000_000_000).unwrap();

        let outcome = decrease_leverage(&mut market, &mut position, &venue, 0, 0).unwrap();
        assert!(outcome.converged);
        assert_eq!(lend::current_debt(&market, &position).unwrap(), 0);
        assert_eq!(outcome.final_ltv, 0);
    }

    #[test]
    fn decrease_rejects_an_impossible_withdrawal() {
        let (mut market, mut position, _lender, venue) = setup(10_000_000_000);
        increase_leverage(&mut market, &mut position, &venue, TARGET, 1_000_000_000).unwrap();

        // equity is ~1000 base minus fee drag; asking for 5000 cannot work
        let err = decrease_leverage(&mut market, &mut position, &venue, TARGET, 5_000_000_000)
            .unwrap_err();
        assert_eq!(
            err,
            anchor_lang::error!(ErrorCodes::VaultInsufficientCollateral)
        );
    }

    #[test]
    fn rebalance_recovers_after_a_stake_rate_jump() {
        let (mut market, mut position, _lender, mut venue) = setup(10_000_000_000);
        increase_leverage(&mut market, &mut position, &venue, TARGET, 1_000_000_000).unwrap();

        // staking yield lands: collateral is worth more, LTV drops
        venue.stake_exchange_rate = (WAD + WAD / 8) as u64;
        let ltv = lend::current_ltv(&market, &position, &venue).unwrap();
        assert!(ltv + LTV_TOLERANCE < TARGET);

        let outcome = increase_leverage(&mut market, &mut position, &venue, TARGET, 0).unwrap();
        assert!(outcome.converged);
        assert!(outcome.borrowed > 0);
    }

    #[test]
    fn leverage_then_full_unwind_round_trip() {
        let (mut market, mut position, _lender, venue) = setup(10_000_000_000);
        increase_leverage(&mut market, &mut position, &venue, TARGET, 1_000_000_000).unwrap();

        // total equity in base terms
        let collateral_value =
            swap::value_in_base(&venue, position.collateral_units).unwrap();
        let debt = lend::current_debt(&market, &position).unwrap();
        let equity = collateral_value - debt;

        // exit ~99% of equity; the margin absorbs per-iteration dust
        let take = equity * 99 / 100;
        let outcome = decrease_leverage(&mut market, &mut position, &venue, TARGET, take).unwrap();
        assert_eq!(outcome.freed, take);
        // the residual position re-levers the leftover equity at target
        let ltv = lend::current_ltv(&market, &position, &venue).unwrap();
        assert!(ltv <= TARGET + LTV_TOLERANCE);
        lend::check_position_health(&market, &position, &venue).unwrap();
        // a levered round trip through fees costs a few percent
        assert!(take > 900_000_000);
    }
}
