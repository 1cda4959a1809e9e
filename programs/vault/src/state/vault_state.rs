use anchor_lang::prelude::*;

use library::errors::VaultResult;
use library::math::full_math::{mul_div_down, mul_div_up};
use library::math::safe_math::SafeMath;

use crate::constants::WAD;
use crate::errors::ErrorCodes;

/// Mutable vault-level accounting: the share ledger, the performance
/// fee high-water mark, and the reentrancy lock.
#[account(zero_copy)]
#[derive(InitSpace)]
#[repr(C, packed)]
pub struct VaultState {
    /// All shares outstanding, fee shares included
    pub total_shares: u128,
    /// Unclaimed performance fee shares held for the fee recipient
    pub fee_shares: u128,
    /// Highest NAV per share ever checkpointed, WAD
    pub high_water_mark: u128,
    pub last_checkpoint_timestamp: u64,
    pub locked: u8,
    pub bump: u8,
}

impl VaultState {
    pub fn init(&mut self, now: u64, bump: u8) {
        self.high_water_mark = WAD;
        self.last_checkpoint_timestamp = now;
        self.bump = bump;
    }

    pub fn acquire_lock(&mut self) -> Result<()> {
        require!(self.locked == 0, ErrorCodes::VaultReentrancy);
        self.locked = 1;
        Ok(())
    }

    pub fn release_lock(&mut self) {
        self.locked = 0;
    }

    /// Shares owed for a deposit of `base_in` against the pre-deposit
    /// `nav`. Rounds down so depositors never capture value from the
    /// existing holders.
    pub fn shares_for_deposit(&self, nav: u64, base_in: u64) -> VaultResult<u128> {
        let total_shares = self.total_shares;
        if total_shares == 0 {
            return Ok(base_in as u128);
        }
        if nav == 0 {
            // Shares outstanding against nothing: the vault is wiped
            // out and must not mint against a zero denominator.
            return Err(library::errors::ErrorCodes::LibraryDivisionByZero);
        }
        mul_div_down(base_in as u128, total_shares, nav as u128)
    }

    /// Shares burned to release `base_out`, rounded up against the
    /// withdrawer.
    pub fn shares_for_withdraw(&self, nav: u64, base_out: u64) -> VaultResult<u128> {
        if nav == 0 {
            return Err(library::errors::ErrorCodes::LibraryDivisionByZero);
        }
        mul_div_up(base_out as u128, self.total_shares, nav as u128)
    }

    pub fn nav_per_share(&self, nav: u64) -> VaultResult<u128> {
        let total_shares = self.total_shares;
        if total_shares == 0 {
            return Ok(WAD);
        }
        mul_div_down(nav as u128, WAD, total_shares)
    }

    pub fn mint_shares(&mut self, shares: u128) -> VaultResult<()> {
        self.total_shares = self.total_shares.safe_add(shares)?;
        Ok(())
    }

    pub fn burn_shares(&mut self, shares: u128) -> VaultResult<()> {
        self.total_shares = self.total_shares.safe_sub(shares)?;
        Ok(())
    }
}

/// Per-owner vault share balance.
#[account(zero_copy)]
#[derive(InitSpace)]
#[repr(C, packed)]
pub struct ShareAccount {
    pub owner: Pubkey,
    pub shares: u128,
    pub bump: u8,
}

impl ShareAccount {
    pub fn credit(&mut self, shares: u128) -> VaultResult<()> {
        self.shares = self.shares.safe_add(shares)?;
        Ok(())
    }

    pub fn debit(&mut self, shares: u128) -> Result<()> {
        require!(shares <= self.shares, ErrorCodes::VaultInsufficientShares);
        self.shares = self.shares.safe_sub(shares)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[test]
    fn first_deposit_mints_one_share_per_base_unit() {
        let state = VaultState::zeroed();
        assert_eq!(state.shares_for_deposit(0, 1_000_000).unwrap(), 1_000_000);
        // Donated base before the first deposit changes nothing
        assert_eq!(
            state.shares_for_deposit(500_000, 1_000_000).unwrap(),
            1_000_000
        );
    }

    #[test]
    fn deposit_rounds_down_withdraw_rounds_up() {
        let mut state = VaultState::zeroed();
        state.total_shares = 3_000_000;

        // 3 shares per base unit, nav 1_000_000
        let minted = state.shares_for_deposit(1_000_000, 7).unwrap();
        assert_eq!(minted, 21);

        let burned = state.shares_for_withdraw(1_000_000, 7).unwrap();
        assert_eq!(burned, 21);

        // Non-exact ratio: mint floors, burn ceils
        state.total_shares = 3_000_001;
        assert_eq!(state.shares_for_deposit(1_000_000, 7).unwrap(), 21);
        assert_eq!(state.shares_for_withdraw(1_000_000, 7).unwrap(), 22);
    }

    #[test]
    fn zero_nav_with_outstanding_shares_is_rejected() {
        let mut state = VaultState::zeroed();
        state.total_shares = 1_000;
        assert!(state.shares_for_deposit(0, 1).is_err());
        assert!(state.shares_for_withdraw(0, 1).is_err());
    }

    #[test]
    fn lock_blocks_second_acquire() {
        let mut state = VaultState::zeroed();
        state.acquire_lock().unwrap();
        assert!(state.acquire_lock().is_err());
        state.release_lock();
        state.acquire_lock().unwrap();
    }
}
