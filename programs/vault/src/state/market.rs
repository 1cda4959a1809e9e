use anchor_lang::prelude::*;
use solana_program::hash::hashv;

use library::errors::VaultResult;
use library::math::casting::Cast;
use library::math::full_math::{mul_div_down, mul_div_up};
use library::math::safe_math::SafeMath;
use library::math::wad::mul_wad_down;

use crate::constants::{
    MAX_BORROW_RATE_PER_SECOND, MAX_PROTOCOL_FEE_RATE, VIRTUAL_ASSETS, VIRTUAL_SHARES, WAD,
};
use crate::errors::ErrorCodes;

/// Immutable parameters of a lending market. Hashed together with the
/// asset identifiers into the market id, so two markets with the same
/// parameters resolve to the same account address.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug)]
pub struct InitLendingMarketParams {
    /// Linear borrow rate, WAD per second
    pub borrow_rate_per_second: u64,
    /// Fraction of accrued interest diverted to the protocol, WAD
    pub protocol_fee_rate: u64,
    /// Max borrow value per unit of collateral value, WAD
    pub liquidation_threshold: u64,
}

/// Isolated lending market: one base asset lent out against one
/// staked-collateral asset. Interest accrues lazily on first touch of
/// a slot, supply and borrow balances are tracked as shares.
#[account(zero_copy)]
#[derive(InitSpace)]
#[repr(C, packed)]
pub struct LendingMarket {
    pub market_id: [u8; 32],
    pub base_mint: Pubkey,
    /// Swap venue whose quote prices the collateral for LTV checks
    pub collateral_venue: Pubkey,
    pub borrow_rate_per_second: u64,
    pub protocol_fee_rate: u64,
    pub liquidation_threshold: u64,
    pub total_supply_assets: u64,
    pub total_borrow_assets: u64,
    pub total_supply_shares: u128,
    pub total_borrow_shares: u128,
    /// Supply shares minted against the protocol's cut of interest
    pub protocol_fee_shares: u128,
    pub last_accrual_timestamp: u64,
    pub bump: u8,
}

impl LendingMarket {
    pub fn derive_market_id(
        base_mint: &Pubkey,
        collateral_venue: &Pubkey,
        params: &InitLendingMarketParams,
    ) -> [u8; 32] {
        hashv(&[
            base_mint.as_ref(),
            collateral_venue.as_ref(),
            &params.borrow_rate_per_second.to_le_bytes(),
            &params.protocol_fee_rate.to_le_bytes(),
            &params.liquidation_threshold.to_le_bytes(),
        ])
        .to_bytes()
    }

    pub fn init(
        &mut self,
        market_id: [u8; 32],
        base_mint: Pubkey,
        collateral_venue: Pubkey,
        params: &InitLendingMarketParams,
        now: u64,
        bump: u8,
    ) -> Result<()> {
        require!(
            params.borrow_rate_per_second <= MAX_BORROW_RATE_PER_SECOND,
            ErrorCodes::VaultInvalidParams
        );
        require!(
            params.protocol_fee_rate <= MAX_PROTOCOL_FEE_RATE,
            ErrorCodes::VaultInvalidParams
        );
        require!(
            params.liquidation_threshold > 0 && (params.liquidation_threshold as u128) < WAD,
            ErrorCodes::VaultInvalidParams
        );

        self.market_id = market_id;
        self.base_mint = base_mint;
        self.collateral_venue = collateral_venue;
        self.borrow_rate_per_second = params.borrow_rate_per_second;
        self.protocol_fee_rate = params.protocol_fee_rate;
        self.liquidation_threshold = params.liquidation_threshold;
        self.last_accrual_timestamp = now;
        self.bump = bump;

        Ok(())
    }

    /// Lazy interest accrual up to `now`. Linear rate over elapsed
    /// seconds, added to both borrow and supply sides; the protocol's
    /// cut is minted as supply shares so it dilutes suppliers exactly
    /// by the fee fraction.
    pub fn accrue(&mut self, now: u64) -> VaultResult<u64> {
        let last = self.last_accrual_timestamp;
        if now <= last {
            return Ok(0);
        }
        let elapsed = now - last;
        self.last_accrual_timestamp = now;

        let borrow_assets = self.total_borrow_assets as u128;
        if borrow_assets == 0 || self.borrow_rate_per_second == 0 {
            return Ok(0);
        }

        let rate_elapsed = (self.borrow_rate_per_second as u128).safe_mul(elapsed as u128)?;
        let interest: u64 = mul_div_down(borrow_assets, rate_elapsed, WAD)?.cast()?;
        if interest == 0 {
            return Ok(0);
        }

        self.total_borrow_assets = self.total_borrow_assets.safe_add(interest)?;
        self.total_supply_assets = self.total_supply_assets.safe_add(interest)?;

        if self.protocol_fee_rate > 0 {
            let fee_assets = mul_wad_down(interest as u128, self.protocol_fee_rate as u128)?;
            if fee_assets > 0 {
                // Shares are priced against the supply pool net of the
                // fee, so minting them transfers exactly fee_assets of
                // claim to the protocol.
                let pool_ex_fee = (self.total_supply_assets as u128).safe_sub(fee_assets)?;
                let fee_shares =
                    shares_for_assets_down(fee_assets, self.total_supply_shares, pool_ex_fee)?;
                self.total_supply_shares = self.total_supply_shares.safe_add(fee_shares)?;
                self.protocol_fee_shares = self.protocol_fee_shares.safe_add(fee_shares)?;
            }
        }

        Ok(interest)
    }

    /// Base assets sitting in the market and available to borrow or
    /// withdraw.
    pub fn available_liquidity(&self) -> u64 {
        self.total_supply_assets
            .saturating_sub(self.total_borrow_assets)
    }

    pub fn supply_shares_down(&self, assets: u64) -> VaultResult<u128> {
        shares_for_assets_down(
            assets as u128,
            self.total_supply_shares,
            self.total_supply_assets as u128,
        )
    }

    pub fn supply_shares_up(&self, assets: u64) -> VaultResult<u128> {
        shares_for_assets_up(
            assets as u128,
            self.total_supply_shares,
            self.total_supply_assets as u128,
        )
    }

    pub fn supply_assets_down(&self, shares: u128) -> VaultResult<u64> {
        assets_for_shares_down(
            shares,
            self.total_supply_shares,
            self.total_supply_assets as u128,
        )
    }

    pub fn borrow_shares_down(&self, assets: u64) -> VaultResult<u128> {
        shares_for_assets_down(
            assets as u128,
            self.total_borrow_shares,
            self.total_borrow_assets as u128,
        )
    }

    pub fn borrow_shares_up(&self, assets: u64) -> VaultResult<u128> {
        shares_for_assets_up(
            assets as u128,
            self.total_borrow_shares,
            self.total_borrow_assets as u128,
        )
    }

    pub fn borrow_assets_up(&self, shares: u128) -> VaultResult<u64> {
        assets_for_shares_up(
            shares,
            self.total_borrow_shares,
            self.total_borrow_assets as u128,
        )
    }
}

/// Per-owner position in a lending market. The vault holds one with
/// the vault config as owner; external liquidity providers hold their
/// own with only the supply side populated.
#[account(zero_copy)]
#[derive(InitSpace)]
#[repr(C, packed)]
pub struct MarketPosition {
    pub market_id: [u8; 32],
    pub owner: Pubkey,
    pub supply_shares: u128,
    pub borrow_shares: u128,
    /// Staked collateral backing the borrow, collateral native units
    pub collateral_units: u128,
    pub bump: u8,
}

impl MarketPosition {
    pub fn init(&mut self, market_id: [u8; 32], owner: Pubkey, bump: u8) {
        self.market_id = market_id;
        self.owner = owner;
        self.bump = bump;
    }
}

// Share conversions with virtual offsets. The offsets make the empty
// market behave as if it already held VIRTUAL_SHARES shares against
// VIRTUAL_ASSETS assets, so first-depositor share-price manipulation
// gets rounded away.

pub fn shares_for_assets_down(
    assets: u128,
    total_shares: u128,
    total_assets: u128,
) -> VaultResult<u128> {
    mul_div_down(
        assets,
        total_shares.safe_add(VIRTUAL_SHARES)?,
        total_assets.safe_add(VIRTUAL_ASSETS)?,
    )
}

pub fn shares_for_assets_up(
    assets: u128,
    total_shares: u128,
    total_assets: u128,
) -> VaultResult<u128> {
    mul_div_up(
        assets,
        total_shares.safe_add(VIRTUAL_SHARES)?,
        total_assets.safe_add(VIRTUAL_ASSETS)?,
    )
}

pub fn assets_for_shares_down(
    shares: u128,
    total_shares: u128,
    total_assets: u128,
) -> VaultResult<u64> {
    mul_div_down(
        shares,
        total_assets.safe_add(VIRTUAL_ASSETS)?,
        total_shares.safe_add(VIRTUAL_SHARES)?,
    )?
    .cast()
}

pub fn assets_for_shares_up(
    shares: u128,
    total_shares: u128,
    total_assets: u128,
) -> VaultResult<u64> {
    mul_div_up(
        shares,
        total_assets.safe_add(VIRTUAL_ASSETS)?,
        total_shares.safe_add(VIRTUAL_SHARES)?,
    )?
    .cast()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn test_market() -> LendingMarket {
        let mut market = LendingMarket::zeroed();
        market.borrow_rate_per_second = 1_585_489_599; // ~5% APR
        market.protocol_fee_rate = 100_000_000_000_000_000; // 10%
        market.liquidation_threshold = 860_000_000_000_000_000; // 86%
        market.last_accrual_timestamp = 1_000;
        market
    }

    #[test]
    fn accrue_is_idempotent_within_a_second() {
        let mut market = test_market();
        market.total_supply_assets = 1_000_000_000;
        market.total_supply_shares = 1_000_000_000_000_000;
        market.total_borrow_assets = 500_000_000;
        market.total_borrow_shares = 500_000_000_000_000;

        let first = market.accrue(1_000 + 3_600).unwrap();
        assert!(first > 0);
        let second = market.accrue(1_000 + 3_600).unwrap();
        assert_eq!(second, 0);
    }

    #[test]
    fn accrue_splits_interest_between_suppliers_and_protocol() {
        let mut market = test_market();
        market.total_supply_assets = 1_000_000_000;
        market.total_supply_shares = 1_000_000_000_000_000;
        market.total_borrow_assets = 800_000_000;
        market.total_borrow_shares = 800_000_000_000_000;

        let supply_before = market.total_supply_assets;
        let interest = market.accrue(1_000 + 86_400).unwrap();

        // ~5% APR on 800 USDC-days worth of borrow, one day elapsed
        assert!(interest > 0);
        assert_eq!({ market.total_supply_assets }, supply_before + interest);
        assert_eq!({ market.total_borrow_assets }, 800_000_000 + interest);

        // Protocol claim redeems to ~10% of the interest
        let fee_claim = market.supply_assets_down(market.protocol_fee_shares).unwrap();
        let expected_fee = interest / 10;
        assert!(fee_claim <= expected_fee);
        assert!(fee_claim + 2 >= expected_fee);
    }

    #[test]
    fn accrue_with_no_borrows_only_moves_the_clock() {
        let mut market = test_market();
        market.total_supply_assets = 1_000_000_000;
        market.total_supply_shares = 1_000_000_000_000_000;

        let interest = market.accrue(1_000 + 86_400).unwrap();
        assert_eq!(interest, 0);
        assert_eq!({ market.last_accrual_timestamp }, 1_000 + 86_400);
        assert_eq!({ market.total_supply_assets }, 1_000_000_000);
    }

    #[test]
    fn empty_market_issues_shares_at_virtual_price() {
        let market = LendingMarket::zeroed();
        let shares = market.supply_shares_down(1_000_000).unwrap();
        assert_eq!(shares, 1_000_000 * VIRTUAL_SHARES);
    }

    #[test]
    fn borrow_rounding_always_favors_the_market() {
        let mut market = test_market();
        market.total_borrow_assets = 1_000_000_007;
        market.total_borrow_shares = 3_000_000_000_000_011;

        for assets in [1u64, 999, 1_000_000, 987_654_321] {
            let shares = market.borrow_shares_up(assets).unwrap();
            let back = market.borrow_assets_up(shares).unwrap();
            assert!(back >= assets);
        }
    }

    #[test]
    fn supply_round_trip_never_redeems_more_than_supplied() {
        let mut market = test_market();
        market.total_supply_assets = 5_000_000_003;
        market.total_supply_shares = 4_999_999_999_999_999;

        for assets in [1u64, 17, 1_000_000, 4_000_000_000] {
            let shares = market.supply_shares_down(assets).unwrap();
            let back = market.supply_assets_down(shares).unwrap();
            assert!(back <= assets);
        }
    }

    #[test]
    fn market_id_changes_with_every_parameter() {
        let base = Pubkey::new_unique();
        let venue = Pubkey::new_unique();
        let params = InitLendingMarketParams {
            borrow_rate_per_second: 1_585_489_599,
            protocol_fee_rate: 0,
            liquidation_threshold: 860_000_000_000_000_000,
        };

        let id = LendingMarket::derive_market_id(&base, &venue, &params);
        let mut bumped = params;
        bumped.liquidation_threshold += 1;
        assert_ne!(id, LendingMarket::derive_market_id(&base, &venue, &bumped));
        assert_ne!(
            id,
            LendingMarket::derive_market_id(&Pubkey::new_unique(), &venue, &params)
        );
        assert_eq!(id, LendingMarket::derive_market_id(&base, &venue, &params));
    }
}
