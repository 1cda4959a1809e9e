use anchor_lang::prelude::*;

use library::math::casting::Cast;

use crate::state::*;
use crate::utils::{lend, nav, swap};

// View instructions return through `set_return_data`; callers simulate
// them. Interest is accrued on a stack copy of the market so the
// quotes are current without mutating any account.

pub fn get_total_assets(ctx: Context<ViewVault>) -> Result<u64> {
    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let config = ctx.accounts.vault_config.load()?;
    config.verify_wiring(&ctx.accounts.market.key(), &ctx.accounts.swap_venue.key())?;
    let venue = ctx.accounts.swap_venue.load()?;
    let position = ctx.accounts.vault_position.load()?;

    let mut market = *ctx.accounts.market.load()?;
    market.accrue(now)?;

    let idle = ctx.accounts.vault_base_ata.amount;
    nav::total_assets(&market, &position, &venue, idle)
}

/// Current borrow value over collateral value, WAD.
pub fn get_current_ltv(ctx: Context<ViewVault>) -> Result<u128> {
    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let config = ctx.accounts.vault_config.load()?;
    config.verify_wiring(&ctx.accounts.market.key(), &ctx.accounts.swap_venue.key())?;
    let venue = ctx.accounts.swap_venue.load()?;
    let position = ctx.accounts.vault_position.load()?;

    let mut market = *ctx.accounts.market.load()?;
    market.accrue(now)?;

    lend::current_ltv(&market, &position, &venue)
}

pub fn get_preview_forward_swap(ctx: Context<ViewVault>, base_in: u64) -> Result<u128> {
    let venue = ctx.accounts.swap_venue.load()?;
    Ok(swap::preview_forward_swap(&venue, base_in)?)
}

pub fn get_preview_reverse_swap(ctx: Context<ViewVault>, collateral_in: u128) -> Result<u64> {
    let venue = ctx.accounts.swap_venue.load()?;
    Ok(swap::preview_reverse_swap(&venue, collateral_in)?)
}
