use anchor_lang::prelude::*;

use library::math::wad::MAX_DECIMALS;

use crate::constants::{MAX_SWAP_FEE_RATE, WAD};
use crate::errors::ErrorCodes;

/// Peg-stability swap venue between the base asset and the staked
/// collateral asset. Quotes are deterministic: a flat WAD fee on each
/// leg around a floating intermediate-per-collateral exchange rate.
#[account(zero_copy)]
#[derive(InitSpace)]
#[repr(C, packed)]
pub struct SwapVenue {
    pub authority: Pubkey,
    pub base_mint: Pubkey,
    /// Fee taken when selling base for collateral (tin), WAD fraction
    pub sell_fee_rate: u64,
    /// Fee taken when buying base with collateral (tout), WAD fraction
    pub buy_fee_rate: u64,
    /// Intermediate units per collateral unit, WAD. Only climbs as
    /// staking yield accrues.
    pub stake_exchange_rate: u64,
    pub base_decimals: u8,
    pub collateral_decimals: u8,
    pub bump: u8,
}

impl SwapVenue {
    pub fn init(
        &mut self,
        authority: Pubkey,
        base_mint: Pubkey,
        sell_fee_rate: u64,
        buy_fee_rate: u64,
        stake_exchange_rate: u64,
        base_decimals: u8,
        collateral_decimals: u8,
        bump: u8,
    ) -> Result<()> {
        require!(
            sell_fee_rate <= MAX_SWAP_FEE_RATE && buy_fee_rate <= MAX_SWAP_FEE_RATE,
            ErrorCodes::VaultInvalidParams
        );
        require!(
            (stake_exchange_rate as u128) >= WAD,
            ErrorCodes::VaultInvalidParams
        );
        require!(
            base_decimals <= MAX_DECIMALS && collateral_decimals <= MAX_DECIMALS,
            ErrorCodes::VaultInvalidParams
        );

        self.authority = authority;
        self.base_mint = base_mint;
        self.sell_fee_rate = sell_fee_rate;
        self.buy_fee_rate = buy_fee_rate;
        self.stake_exchange_rate = stake_exchange_rate;
        self.base_decimals = base_decimals;
        self.collateral_decimals = collateral_decimals;
        self.bump = bump;

        Ok(())
    }

    pub fn set_fees(&mut self, sell_fee_rate: u64, buy_fee_rate: u64) -> Result<()> {
        require!(
            sell_fee_rate <= MAX_SWAP_FEE_RATE && buy_fee_rate <= MAX_SWAP_FEE_RATE,
            ErrorCodes::VaultInvalidParams
        );
        self.sell_fee_rate = sell_fee_rate;
        self.buy_fee_rate = buy_fee_rate;
        Ok(())
    }

    /// The staked rate is monotone: yield accrues, it never unwinds.
    pub fn set_stake_exchange_rate(&mut self, new_rate: u64) -> Result<u64> {
        let old_rate = self.stake_exchange_rate;
        require!(new_rate >= old_rate, ErrorCodes::VaultInvalidParams);
        self.stake_exchange_rate = new_rate;
        Ok(old_rate)
    }
}
