use anchor_lang::prelude::*;

use crate::constants::{MAX_PERFORMANCE_FEE_BPS, TARGET_LTV_SAFETY_GAP, WAD};
use crate::errors::ErrorCodes;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug)]
pub struct InitVaultParams {
    /// Borrow value over collateral value the loop steers toward, WAD
    pub target_ltv: u64,
    pub performance_fee_bps: u16,
    /// Deposit cap in base units; 0 means closed for deposits
    pub max_total_assets: u64,
    pub fee_recipient: Pubkey,
}

/// Governance-owned wiring and policy of the vault. Balances live in
/// [`crate::state::VaultState`] and the vault's market position.
#[account(zero_copy)]
#[derive(InitSpace)]
#[repr(C, packed)]
pub struct VaultConfig {
    pub authority: Pubkey,
    pub base_mint: Pubkey,
    pub market: Pubkey,
    pub swap_venue: Pubkey,
    pub fee_recipient: Pubkey,
    pub target_ltv: u64,
    pub max_total_assets: u64,
    pub performance_fee_bps: u16,
    pub base_decimals: u8,
    pub bump: u8,
}

impl VaultConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        &mut self,
        authority: Pubkey,
        base_mint: Pubkey,
        market: Pubkey,
        swap_venue: Pubkey,
        params: &InitVaultParams,
        liquidation_threshold: u64,
        base_decimals: u8,
        bump: u8,
    ) -> Result<()> {
        Self::validate_target_ltv(params.target_ltv, liquidation_threshold)?;
        require!(
            params.performance_fee_bps <= MAX_PERFORMANCE_FEE_BPS,
            ErrorCodes::VaultInvalidParams
        );

        self.authority = authority;
        self.base_mint = base_mint;
        self.market = market;
        self.swap_venue = swap_venue;
        self.fee_recipient = params.fee_recipient;
        self.target_ltv = params.target_ltv;
        self.max_total_assets = params.max_total_assets;
        self.performance_fee_bps = params.performance_fee_bps;
        self.base_decimals = base_decimals;
        self.bump = bump;

        Ok(())
    }

    pub fn validate_target_ltv(target_ltv: u64, liquidation_threshold: u64) -> Result<()> {
        require!(
            target_ltv > 0 && (target_ltv as u128) < WAD,
            ErrorCodes::VaultInvalidParams
        );
        require!(
            (target_ltv as u128).saturating_add(TARGET_LTV_SAFETY_GAP)
                <= liquidation_threshold as u128,
            ErrorCodes::VaultInvalidParams
        );
        Ok(())
    }

    pub fn verify_authority(&self, signer: &Pubkey) -> Result<()> {
        let authority = self.authority;
        require_keys_eq!(authority, *signer, ErrorCodes::VaultOnlyAuthority);
        Ok(())
    }

    pub fn verify_wiring(&self, market: &Pubkey, swap_venue: &Pubkey) -> Result<()> {
        let (expected_market, expected_venue) = (self.market, self.swap_venue);
        require_keys_eq!(expected_market, *market, ErrorCodes::VaultInvalidMarket);
        require_keys_eq!(expected_venue, *swap_venue, ErrorCodes::VaultInvalidVenue);
        Ok(())
    }
}
