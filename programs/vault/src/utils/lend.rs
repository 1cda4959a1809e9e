use anchor_lang::prelude::*;

use library::math::full_math::mul_div_up;
use library::math::safe_math::SafeMath;

use crate::constants::WAD;
use crate::errors::ErrorCodes;
use crate::state::{LendingMarket, MarketPosition, SwapVenue};
use crate::utils::swap;

// Position-level market operations. Callers are responsible for
// accruing interest on the market first and for settling the matching
// token transfers; these functions only move the share bookkeeping.

pub fn verify_position(
    position: &MarketPosition,
    market: &LendingMarket,
    owner: &Pubkey,
) -> Result<()> {
    require!(
        position.market_id == market.market_id,
        ErrorCodes::VaultInvalidPosition
    );
    require!(position.owner == *owner, ErrorCodes::VaultInvalidPosition);
    Ok(())
}

pub fn supply(
    market: &mut LendingMarket,
    position: &mut MarketPosition,
    assets: u64,
) -> Result<u128> {
    let shares = market.supply_shares_down(assets)?;
    require!(shares > 0, ErrorCodes::VaultZeroShares);
    market.total_supply_assets = market.total_supply_assets.safe_add(assets)?;
    market.total_supply_shares = market.total_supply_shares.safe_add(shares)?;
    position.supply_shares = position.supply_shares.safe_add(shares)?;
    Ok(shares)
}

pub fn withdraw(
    market: &mut LendingMarket,
    position: &mut MarketPosition,
    assets: u64,
) -> Result<u128> {
    require!(
        assets <= market.available_liquidity(),
        ErrorCodes::VaultInsufficientLiquidity
    );
    let shares = market.supply_shares_up(assets)?;
    require!(
        shares <= position.supply_shares,
        ErrorCodes::VaultInsufficientShares
    );
    market.total_supply_assets = market.total_supply_assets.safe_sub(assets)?;
    market.total_supply_shares = market.total_supply_shares.safe_sub(shares)?;
    position.supply_shares = position.supply_shares.safe_sub(shares)?;
    Ok(shares)
}

/// Supply-side claim of a position, rounded down.
pub fn supplied_assets(market: &LendingMarket, position: &MarketPosition) -> Result<u64> {
    Ok(market.supply_assets_down(position.supply_shares)?)
}

pub fn supply_collateral(position: &mut MarketPosition, units: u128) -> Result<()> {
    position.collateral_units = position.collateral_units.safe_add(units)?;
    Ok(())
}

/// Release collateral, refusing any release that would push the
/// position past the liquidation threshold.
pub fn withdraw_collateral(
    market: &LendingMarket,
    position: &mut MarketPosition,
    venue: &SwapVenue,
    units: u128,
) -> Result<()> {
    require!(
        units <= position.collateral_units,
        ErrorCodes::VaultInsufficientCollateral
    );
    let remaining = position.collateral_units.safe_sub(units)?;

    let debt = current_debt(market, position)?;
    if debt > 0 {
        let remaining_value = swap::value_in_base(venue, remaining)?;
        let ltv = ltv_for(debt, remaining_value)?;
        // not enough collateral stays behind to keep the debt covered
        require!(
            ltv <= market.liquidation_threshold as u128,
            ErrorCodes::VaultInsufficientCollateral
        );
    }

    position.collateral_units = remaining;
    Ok(())
}

pub fn borrow(
    market: &mut LendingMarket,
    position: &mut MarketPosition,
    assets: u64,
) -> Result<u128> {
    require!(
        assets <= market.available_liquidity(),
        ErrorCodes::VaultInsufficientLiquidity
    );
    let shares = market.borrow_shares_up(assets)?;
    market.total_borrow_assets = market.total_borrow_assets.safe_add(assets)?;
    market.total_borrow_shares = market.total_borrow_shares.safe_add(shares)?;
    position.borrow_shares = position.borrow_shares.safe_add(shares)?;
    Ok(shares)
}

pub fn repay(
    market: &mut LendingMarket,
    position: &mut MarketPosition,
    assets: u64,
) -> Result<u128> {
    let debt = current_debt(market, position)?;
    require!(assets <= debt, ErrorCodes::VaultInvalidParams);

    // A full repay burns every share so rounding dust cannot strand a
    // phantom sub-unit debt on the position.
    let shares = if assets == debt {
        position.borrow_shares
    } else {
        market.borrow_shares_down(assets)?
    };

    // The round-up in current_debt can put a position's claim a unit
    // above the pooled total; the pooled side floors at zero.
    market.total_borrow_assets = market.total_borrow_assets.saturating_sub(assets);
    market.total_borrow_shares = market.total_borrow_shares.safe_sub(shares)?;
    position.borrow_shares = position.borrow_shares.safe_sub(shares)?;
    Ok(shares)
}

/// Outstanding debt of a position, rounded up.
pub fn current_debt(market: &LendingMarket, position: &MarketPosition) -> Result<u64> {
    Ok(market.borrow_assets_up(position.borrow_shares)?)
}

/// Debt over collateral value, WAD, rounded up. Zero debt is LTV 0;
/// debt against worthless collateral saturates to u128::MAX.
pub fn ltv_for(debt: u64, collateral_value: u64) -> Result<u128> {
    if debt == 0 {
        return Ok(0);
    }
    if collateral_value == 0 {
        return Ok(u128::MAX);
    }
    Ok(mul_div_up(debt as u128, WAD, collateral_value as u128)?)
}

pub fn current_ltv(
    market: &LendingMarket,
    position: &MarketPosition,
    venue: &SwapVenue,
) -> Result<u128> {
    let debt = current_debt(market, position)?;
    let collateral_value = swap::value_in_base(venue, position.collateral_units)?;
    ltv_for(debt, collateral_value)
}

pub fn check_position_health(
    market: &LendingMarket,
    position: &MarketPosition,
    venue: &SwapVenue,
) -> Result<()> {
    let ltv = current_ltv(market, position, venue)?;
    require!(
        ltv <= market.liquidation_threshold as u128,
        ErrorCodes::VaultUnsafeLtv
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn seeded_market() -> (LendingMarket, MarketPosition) {
        let mut market = LendingMarket::zeroed();
        market.liquidation_threshold = 860_000_000_000_000_000; // 86%
        let mut position = MarketPosition::zeroed();
        position.market_id = market.market_id;
        (market, position)
    }

    fn venue_at_par() -> SwapVenue {
        let mut v = SwapVenue::zeroed();
        v.stake_exchange_rate = WAD as u64;
        v.base_decimals = 6;
        v.collateral_decimals = 18;
        v
    }

    #[test]
    fn supply_then_withdraw_returns_at_most_supplied() {
        let (mut market, mut position) = seeded_market();
        supply(&mut market, &mut position, 1_000_000_000).unwrap();
        assert_eq!(supplied_assets(&market, &position).unwrap(), 1_000_000_000);

        withdraw(&mut market, &mut position, 400_000_000).unwrap();
        assert_eq!(supplied_assets(&market, &position).unwrap(), 600_000_000);
        assert_eq!({ market.total_supply_assets }, 600_000_000);
    }

    #[test]
    fn withdraw_is_bounded_by_liquidity() {
        let (mut market, mut supplier) = seeded_market();
        let mut borrower = MarketPosition::zeroed();
        supply(&mut market, &mut supplier, 1_000_000).unwrap();
        borrow(&mut market, &mut borrower, 900_000).unwrap();

        let err = withdraw(&mut market, &mut supplier, 200_000).unwrap_err();
        assert_eq!(
            err,
            anchor_lang::error!(ErrorCodes::VaultInsufficientLiquidity)
        );
        withdraw(&mut market, &mut supplier, 100_000).unwrap();
    }

    #[test]
    fn full_repay_leaves_no_share_dust() {
        let (mut market, mut position) = seeded_market();
        let mut lender = MarketPosition::zeroed();
        supply(&mut market, &mut lender, 10_000_000).unwrap();

        borrow(&mut market, &mut position, 3_333_333).unwrap();
        // uneven totals so share prices stop being round numbers
        market.total_borrow_assets = market.total_borrow_assets.safe_add(17).unwrap();

        let debt = current_debt(&market, &position).unwrap();
        repay(&mut market, &mut position, debt).unwrap();
        assert_eq!({ position.borrow_shares }, 0);
        assert_eq!(current_debt(&market, &position).unwrap(), 0);
    }

    #[test]
    fn partial_repay_rounds_shares_down() {
        let (mut market, mut position) = seeded_market();
        let mut lender = MarketPosition::zeroed();
        supply(&mut market, &mut lender, 10_000_000).unwrap();
        borrow(&mut market, &mut position, 5_000_000).unwrap();
        market.total_borrow_assets = market.total_borrow_assets.safe_add(13).unwrap();

        let debt_before = current_debt(&market, &position).unwrap();
        repay(&mut market, &mut position, 1_000_000).unwrap();
        let debt_after = current_debt(&market, &position).unwrap();
        // credit for the repay stays within a unit of 1:1
        let delta = debt_before - debt_after;
        assert!(delta <= 1_000_001 && delta >= 999_999, "delta {delta}");
    }

    #[test]
    fn collateral_release_respects_the_threshold() {
        let (mut market, mut position) = seeded_market();
        let mut lender = MarketPosition::zeroed();
        let venue = venue_at_par();

        supply(&mut market, &mut lender, 100_000_000).unwrap();
        // 100 base of collateral, borrow 50: LTV 50%
        supply_collateral(&mut position, 100 * WAD).unwrap();
        borrow(&mut market, &mut position, 50_000_000).unwrap();

        // releasing down to 50 collateral would hit 100% LTV
        let err =
            withdraw_collateral(&market, &mut position, &venue, 50 * WAD).unwrap_err();
        assert_eq!(
            err,
            anchor_lang::error!(ErrorCodes::VaultInsufficientCollateral)
        );

        // releasing down to ~58.2 keeps LTV just under 86%
        withdraw_collateral(&market, &mut position, &venue, 41 * WAD).unwrap();
        check_position_health(&market, &position, &venue).unwrap();
    }

    #[test]
    fn ltv_edge_cases() {
        assert_eq!(ltv_for(0, 0).unwrap(), 0);
        assert_eq!(ltv_for(0, 1_000_000).unwrap(), 0);
        assert_eq!(ltv_for(1, 0).unwrap(), u128::MAX);
        assert_eq!(ltv_for(500_000, 1_000_000).unwrap(), WAD / 2);
        // rounds up
        assert_eq!(ltv_for(1, 3).unwrap(), WAD / 3 + 1);
    }
}
