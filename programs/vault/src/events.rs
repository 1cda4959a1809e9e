use anchor_lang::prelude::*;

#[event]
pub struct LogInitVault {
    pub authority: Pubkey,
    pub base_mint: Pubkey,
    pub market: Pubkey,
    pub swap_venue: Pubkey,
    pub target_ltv: u64,
    pub performance_fee_bps: u16,
    pub max_total_assets: u64,
}

#[event]
pub struct LogInitLendingMarket {
    pub market_id: [u8; 32],
    pub base_mint: Pubkey,
    pub collateral_venue: Pubkey,
    pub borrow_rate_per_second: u64,
    pub protocol_fee_rate: u64,
    pub liquidation_threshold: u64,
}

#[event]
pub struct LogInitSwapVenue {
    pub base_mint: Pubkey,
    pub sell_fee_rate: u64,
    pub buy_fee_rate: u64,
    pub stake_exchange_rate: u64,
    pub collateral_decimals: u8,
}

#[event]
pub struct LogUpdateSwapFees {
    pub swap_venue: Pubkey,
    pub sell_fee_rate: u64,
    pub buy_fee_rate: u64,
}

#[event]
pub struct LogUpdateStakeExchangeRate {
    pub swap_venue: Pubkey,
    pub old_rate: u64,
    pub new_rate: u64,
}

#[event]
pub struct LogUpdateTargetLtv {
    pub old_target_ltv: u64,
    pub new_target_ltv: u64,
}

#[event]
pub struct LogUpdatePerformanceFee {
    pub old_fee_bps: u16,
    pub new_fee_bps: u16,
}

#[event]
pub struct LogUpdateMaxTotalAssets {
    pub old_max: u64,
    pub new_max: u64,
}

#[event]
pub struct LogUpdateFeeRecipient {
    pub old_recipient: Pubkey,
    pub new_recipient: Pubkey,
}

#[event]
pub struct LogDeposit {
    pub depositor: Pubkey,
    pub base_in: u64,
    pub shares_minted: u128,
    pub nav_after: u64,
    pub ltv_after: u128,
    pub leverage_converged: bool,
    pub leverage_iterations: u8,
}

#[event]
pub struct LogWithdraw {
    pub withdrawer: Pubkey,
    pub base_out: u64,
    pub shares_burned: u128,
    pub nav_after: u64,
    pub ltv_after: u128,
    pub leverage_converged: bool,
    pub leverage_iterations: u8,
}

#[event]
pub struct LogRebalance {
    pub caller: Pubkey,
    pub nav_after: u64,
    pub ltv_before: u128,
    pub ltv_after: u128,
    pub leverage_converged: bool,
    pub leverage_iterations: u8,
}

#[event]
pub struct LogCheckpoint {
    pub nav: u64,
    pub nav_per_share: u128,
    pub high_water_mark: u128,
    pub fee_value: u64,
    pub fee_shares_minted: u128,
}

#[event]
pub struct LogSupplyLiquidity {
    pub supplier: Pubkey,
    pub market_id: [u8; 32],
    pub assets: u64,
    pub shares_minted: u128,
}

#[event]
pub struct LogWithdrawLiquidity {
    pub supplier: Pubkey,
    pub market_id: [u8; 32],
    pub assets: u64,
    pub shares_burned: u128,
}

#[event]
pub struct LogClaimFeeShares {
    pub recipient: Pubkey,
    pub fee_shares: u128,
    pub base_out: u64,
}

#[event]
pub struct LogAccrueInterest {
    pub market_id: [u8; 32],
    pub interest: u64,
    pub protocol_fee_shares_minted: u128,
    pub total_borrow_assets: u64,
    pub total_supply_assets: u64,
}
