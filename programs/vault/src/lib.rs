use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod module;
pub mod state;
pub mod utils;

use crate::module::*;
use crate::state::context::*;
use crate::state::market::InitLendingMarketParams;
use crate::state::vault_config::InitVaultParams;

declare_id!("Fg6PaFpoGXkYsidMhWWTSWJ3AYkmLV1Tk8T8DSCx4Yzy");

#[program]
pub mod vault {
    use super::*;

    /***********************************|
    |           Admin Module             |
    |__________________________________*/

    pub fn init_swap_venue(
        ctx: Context<InitSwapVenue>,
        sell_fee_rate: u64,
        buy_fee_rate: u64,
        stake_exchange_rate: u64,
        collateral_decimals: u8,
    ) -> Result<()> {
        admin::init_swap_venue(
            ctx,
            sell_fee_rate,
            buy_fee_rate,
            stake_exchange_rate,
            collateral_decimals,
        )
    }

    pub fn init_lending_market(
        ctx: Context<InitLendingMarket>,
        market_id: [u8; 32],
        params: InitLendingMarketParams,
    ) -> Result<()> {
        admin::init_lending_market(ctx, market_id, params)
    }

    pub fn init_vault(ctx: Context<InitVault>, params: InitVaultParams) -> Result<()> {
        admin::init_vault(ctx, params)
    }

    pub fn update_target_ltv(ctx: Context<UpdateVaultPolicy>, new_target_ltv: u64) -> Result<()> {
        admin::update_target_ltv(ctx, new_target_ltv)
    }

    pub fn update_performance_fee(ctx: Context<UpdateVaultPolicy>, new_fee_bps: u16) -> Result<()> {
        admin::update_performance_fee(ctx, new_fee_bps)
    }

    pub fn update_max_total_assets(ctx: Context<UpdateVaultPolicy>, new_max: u64) -> Result<()> {
        admin::update_max_total_assets(ctx, new_max)
    }

    pub fn update_fee_recipient(
        ctx: Context<UpdateVaultPolicy>,
        new_recipient: Pubkey,
    ) -> Result<()> {
        admin::update_fee_recipient(ctx, new_recipient)
    }

    pub fn update_swap_fees(
        ctx: Context<UpdateSwapVenue>,
        sell_fee_rate: u64,
        buy_fee_rate: u64,
    ) -> Result<()> {
        admin::update_swap_fees(ctx, sell_fee_rate, buy_fee_rate)
    }

    pub fn update_stake_exchange_rate(ctx: Context<UpdateSwapVenue>, new_rate: u64) -> Result<()> {
        admin::update_stake_exchange_rate(ctx, new_rate)
    }

    /***********************************|
    |           User Module             |
    |__________________________________*/

    pub fn deposit(ctx: Context<Operate>, base_in: u64, min_shares_out: u128) -> Result<u128> {
        user::deposit(ctx, base_in, min_shares_out)
    }

    pub fn withdraw(ctx: Context<Operate>, base_out: u64, max_shares_in: u128) -> Result<u128> {
        user::withdraw(ctx, base_out, max_shares_in)
    }

    pub fn checkpoint(ctx: Context<Checkpoint>) -> Result<()> {
        user::checkpoint(ctx)
    }

    pub fn rebalance(ctx: Context<Rebalance>) -> Result<()> {
        user::rebalance(ctx)
    }

    pub fn claim_fee_shares(ctx: Context<Rebalance>) -> Result<u64> {
        user::claim_fee_shares(ctx)
    }

    pub fn supply_liquidity(ctx: Context<SupplyLiquidity>, amount: u64) -> Result<u128> {
        user::supply_liquidity(ctx, amount)
    }

    pub fn withdraw_liquidity(ctx: Context<WithdrawLiquidity>, amount: u64) -> Result<u128> {
        user::withdraw_liquidity(ctx, amount)
    }

    /***********************************|
    |           View Module             |
    |__________________________________*/

    pub fn get_total_assets(ctx: Context<ViewVault>) -> Result<u64> {
        view::get_total_assets(ctx)
    }

    pub fn get_current_ltv(ctx: Context<ViewVault>) -> Result<u128> {
        view::get_current_ltv(ctx)
    }

    pub fn get_preview_forward_swap(ctx: Context<ViewVault>, base_in: u64) -> Result<u128> {
        view::get_preview_forward_swap(ctx, base_in)
    }

    pub fn get_preview_reverse_swap(ctx: Context<ViewVault>, collateral_in: u128) -> Result<u64> {
        view::get_preview_reverse_swap(ctx, collateral_in)
    }
}
