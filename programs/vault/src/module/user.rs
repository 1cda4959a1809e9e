use anchor_lang::prelude::*;
use anchor_spl::token_interface::Mint;

use library::math::casting::Cast;
use library::math::full_math::mul_div_down;
use library::math::safe_math::SafeMath;
use library::structs::TokenTransferParams;
use library::token::transfer_spl_tokens;

use crate::constants::LTV_TOLERANCE;
use crate::errors::ErrorCodes;
use crate::events::*;
use crate::state::*;
use crate::utils::leverage::LeverageOutcome;
use crate::utils::{lend, leverage, nav};

/// Deposit base assets, mint shares against pre-deposit NAV, then
/// lever the fresh capital toward the target LTV. The loop runs
/// entirely in memory; base tokens settle once at the end.
pub fn deposit(ctx: Context<Operate>, base_in: u64, min_shares_out: u128) -> Result<u128> {
    require!(base_in > 0, ErrorCodes::VaultZeroAmount);
    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let config_key = ctx.accounts.vault_config.key();
    let market_key = ctx.accounts.market.key();
    let venue_key = ctx.accounts.swap_venue.key();
    let base_mint_key = ctx.accounts.base_mint.key();

    let (shares, outcome, checkpoint, nav_after, market_id, market_bump, config_bump) = {
        let config = ctx.accounts.vault_config.load()?;
        config.verify_wiring(&market_key, &venue_key)?;
        let config_mint = config.base_mint;
        require_keys_eq!(config_mint, base_mint_key, ErrorCodes::VaultInvalidParams);
        let venue = ctx.accounts.swap_venue.load()?;
        let mut state = ctx.accounts.vault_state.load_mut()?;
        let mut market = ctx.accounts.market.load_mut()?;
        let mut position = ctx.accounts.vault_position.load_mut()?;
        lend::verify_position(&position, &market, &config_key)?;

        state.acquire_lock()?;
        market.accrue(now)?;

        let idle = ctx.accounts.vault_base_ata.amount;
        let nav = nav::total_assets(&market, &position, &venue, idle)?;
        let checkpoint =
            nav::accrual_checkpoint(&mut state, config.performance_fee_bps, nav, now)?;

        require!(
            (nav as u128).safe_add(base_in as u128)? <= config.max_total_assets as u128,
            ErrorCodes::VaultMaxTotalAssetsExceeded
        );

        let shares = state.shares_for_deposit(nav, base_in)?;
        require!(shares > 0, ErrorCodes::VaultZeroShares);
        require!(shares >= min_shares_out, ErrorCodes::VaultSlippageExceeded);
        state.mint_shares(shares)?;

        let mut share_account = match ctx.accounts.share_account.load_init() {
            Ok(fresh) => fresh,
            Err(_) => ctx.accounts.share_account.load_mut()?,
        };
        if share_account.owner == Pubkey::default() {
            share_account.owner = ctx.accounts.signer.key();
            share_account.bump = ctx.bumps.share_account;
        }
        share_account.credit(shares)?;

        let outcome = leverage::increase_leverage(
            &mut market,
            &mut position,
            &venue,
            config.target_ltv as u128,
            base_in,
        )?;
        lend::check_position_health(&market, &position, &venue)?;

        // settlement nets to zero on the vault's idle balance:
        // base_in + borrowed all leave as collateral purchases
        let nav_after = nav::total_assets(&market, &position, &venue, idle)?;
        state.release_lock();

        (
            shares,
            outcome,
            checkpoint,
            nav_after,
            market.market_id,
            market.bump,
            config.bump,
        )
    };

    if checkpoint.fee_shares > 0 {
        emit_checkpoint(&checkpoint, ctx.accounts.vault_state.load()?.high_water_mark);
    }

    transfer_spl_tokens(TokenTransferParams {
        source: ctx.accounts.signer_base_ata.to_account_info(),
        destination: ctx.accounts.vault_base_ata.to_account_info(),
        authority: ctx.accounts.signer.to_account_info(),
        amount: base_in,
        token_program: ctx.accounts.token_program.to_account_info(),
        signer_seeds: None,
        mint: (*ctx.accounts.base_mint).clone(),
    })?;

    settle_increase_legs(
        &outcome,
        ctx.accounts.market_base_ata.to_account_info(),
        ctx.accounts.vault_base_ata.to_account_info(),
        ctx.accounts.venue_base_ata.to_account_info(),
        ctx.accounts.market.to_account_info(),
        ctx.accounts.vault_config.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        (*ctx.accounts.base_mint).clone(),
        market_id,
        market_bump,
        config_bump,
    )?;

    emit!(LogDeposit {
        depositor: ctx.accounts.signer.key(),
        base_in,
        shares_minted: shares,
        nav_after,
        ltv_after: outcome.final_ltv,
        leverage_converged: outcome.converged,
        leverage_iterations: outcome.iterations,
    });
    Ok(shares)
}

/// Burn shares against current NAV and free exactly `base_out` for
/// the signer, deleveraging as needed. Idle base is used before any
/// collateral is sold.
pub fn withdraw(ctx: Context<Operate>, base_out: u64, max_shares_in: u128) -> Result<u128> {
    require!(base_out > 0, ErrorCodes::VaultZeroAmount);
    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let config_key = ctx.accounts.vault_config.key();
    let market_key = ctx.accounts.market.key();
    let venue_key = ctx.accounts.swap_venue.key();
    let base_mint_key = ctx.accounts.base_mint.key();

    let (shares, outcome, checkpoint, nav_after, config_bump, venue_bump) = {
        let config = ctx.accounts.vault_config.load()?;
        config.verify_wiring(&market_key, &venue_key)?;
        let config_mint = config.base_mint;
        require_keys_eq!(config_mint, base_mint_key, ErrorCodes::VaultInvalidParams);
        let venue = ctx.accounts.swap_venue.load()?;
        let mut state = ctx.accounts.vault_state.load_mut()?;
        let mut market = ctx.accounts.market.load_mut()?;
        let mut position = ctx.accounts.vault_position.load_mut()?;
        lend::verify_position(&position, &market, &config_key)?;

        state.acquire_lock()?;
        market.accrue(now)?;

        let idle = ctx.accounts.vault_base_ata.amount;
        let nav = nav::total_assets(&market, &position, &venue, idle)?;
        let checkpoint =
            nav::accrual_checkpoint(&mut state, config.performance_fee_bps, nav, now)?;

        let shares = state.shares_for_withdraw(nav, base_out)?;
        require!(shares > 0, ErrorCodes::VaultZeroShares);
        require!(shares <= max_shares_in, ErrorCodes::VaultSlippageExceeded);

        let mut share_account = ctx.accounts.share_account.load_mut()?;
        let owner = share_account.owner;
        require_keys_eq!(
            owner,
            ctx.accounts.signer.key(),
            ErrorCodes::VaultInvalidPosition
        );
        share_account.debit(shares)?;
        state.burn_shares(shares)?;

        let from_idle = idle.min(base_out);
        let from_position = base_out.safe_sub(from_idle)?;
        let outcome = leverage::decrease_leverage(
            &mut market,
            &mut position,
            &venue,
            config.target_ltv as u128,
            from_position,
        )?;
        lend::check_position_health(&market, &position, &venue)?;

        let idle_after = idle
            .safe_sub(from_idle)?
            .safe_add(outcome.idle_gain)?;
        let nav_after = nav::total_assets(&market, &position, &venue, idle_after)?;
        state.release_lock();

        (
            shares,
            outcome,
            checkpoint,
            nav_after,
            config.bump,
            venue.bump,
        )
    };

    if checkpoint.fee_shares > 0 {
        emit_checkpoint(&checkpoint, ctx.accounts.vault_state.load()?.high_water_mark);
    }

    settle_decrease_legs(
        &outcome,
        ctx.accounts.venue_base_ata.to_account_info(),
        ctx.accounts.vault_base_ata.to_account_info(),
        ctx.accounts.market_base_ata.to_account_info(),
        ctx.accounts.swap_venue.to_account_info(),
        ctx.accounts.vault_config.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        (*ctx.accounts.base_mint).clone(),
        base_mint_key,
        venue_bump,
        config_bump,
    )?;

    // caller's payout leaves last
    let config_signer: &[&[u8]] = &[VAULT_CONFIG_SEED, &[config_bump]];
    transfer_spl_tokens(TokenTransferParams {
        source: ctx.accounts.vault_base_ata.to_account_info(),
        destination: ctx.accounts.signer_base_ata.to_account_info(),
        authority: ctx.accounts.vault_config.to_account_info(),
        amount: base_out,
        token_program: ctx.accounts.token_program.to_account_info(),
        signer_seeds: Some(&[config_signer]),
        mint: (*ctx.accounts.base_mint).clone(),
    })?;

    emit!(LogWithdraw {
        withdrawer: ctx.accounts.signer.key(),
        base_out,
        shares_burned: shares,
        nav_after,
        ltv_after: outcome.final_ltv,
        leverage_converged: outcome.converged,
        leverage_iterations: outcome.iterations,
    });
    Ok(shares)
}

/// Permissionless interest accrual + performance fee crystallization.
pub fn checkpoint(ctx: Context<Checkpoint>) -> Result<()> {
    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let config = ctx.accounts.vault_config.load()?;
    config.verify_wiring(&ctx.accounts.market.key(), &ctx.accounts.swap_venue.key())?;
    let venue = ctx.accounts.swap_venue.load()?;
    let mut state = ctx.accounts.vault_state.load_mut()?;
    let mut market = ctx.accounts.market.load_mut()?;
    let position = ctx.accounts.vault_position.load()?;
    lend::verify_position(&position, &market, &ctx.accounts.vault_config.key())?;

    let fee_shares_before = market.protocol_fee_shares;
    let interest = market.accrue(now)?;
    let idle = ctx.accounts.vault_base_ata.amount;
    let nav = nav::total_assets(&market, &position, &venue, idle)?;
    let outcome = nav::accrual_checkpoint(&mut state, config.performance_fee_bps, nav, now)?;

    if interest > 0 {
        emit!(LogAccrueInterest {
            market_id: market.market_id,
            interest,
            protocol_fee_shares_minted: market.protocol_fee_shares.safe_sub(fee_shares_before)?,
            total_borrow_assets: market.total_borrow_assets,
            total_supply_assets: market.total_supply_assets,
        });
    }

    let high_water_mark = state.high_water_mark;
    drop(state);
    emit_checkpoint(&outcome, high_water_mark);
    Ok(())
}

/// Steer the position back to target LTV after staking yield or
/// interest drift. Permissionless: the direction is derived from the
/// current position, the caller only pays for the compute.
pub fn rebalance(ctx: Context<Rebalance>) -> Result<()> {
    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let config_key = ctx.accounts.vault_config.key();
    let market_key = ctx.accounts.market.key();
    let venue_key = ctx.accounts.swap_venue.key();
    let base_mint_key = ctx.accounts.base_mint.key();

    let (outcome, ltv_before, nav_after, market_id, market_bump, config_bump, venue_bump) = {
        let config = ctx.accounts.vault_config.load()?;
        config.verify_wiring(&market_key, &venue_key)?;
        let config_mint = config.base_mint;
        require_keys_eq!(config_mint, base_mint_key, ErrorCodes::VaultInvalidParams);
        let venue = ctx.accounts.swap_venue.load()?;
        let mut state = ctx.accounts.vault_state.load_mut()?;
        let mut market = ctx.accounts.market.load_mut()?;
        let mut position = ctx.accounts.vault_position.load_mut()?;
        lend::verify_position(&position, &market, &config_key)?;

        state.acquire_lock()?;
        market.accrue(now)?;

        let idle = ctx.accounts.vault_base_ata.amount;
        let nav = nav::total_assets(&market, &position, &venue, idle)?;
        nav::accrual_checkpoint(&mut state, config.performance_fee_bps, nav, now)?;

        let target = config.target_ltv as u128;
        let ltv_before = lend::current_ltv(&market, &position, &venue)?;

        let outcome = if ltv_before.saturating_add(LTV_TOLERANCE) < target {
            leverage::increase_leverage(&mut market, &mut position, &venue, target, 0)?
        } else if ltv_before > target.saturating_add(LTV_TOLERANCE) {
            leverage::decrease_leverage(&mut market, &mut position, &venue, target, 0)?
        } else {
            LeverageOutcome {
                converged: true,
                final_ltv: ltv_before,
                ..Default::default()
            }
        };
        lend::check_position_health(&market, &position, &venue)?;

        let idle_after = idle.safe_add(outcome.idle_gain)?;
        let nav_after = nav::total_assets(&market, &position, &venue, idle_after)?;
        state.release_lock();

        (
            outcome,
            ltv_before,
            nav_after,
            market.market_id,
            market.bump,
            config.bump,
            venue.bump,
        )
    };

    settle_increase_legs(
        &outcome,
        ctx.accounts.market_base_ata.to_account_info(),
        ctx.accounts.vault_base_ata.to_account_info(),
        ctx.accounts.venue_base_ata.to_account_info(),
        ctx.accounts.market.to_account_info(),
        ctx.accounts.vault_config.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        (*ctx.accounts.base_mint).clone(),
        market_id,
        market_bump,
        config_bump,
    )?;
    settle_decrease_legs(
        &outcome,
        ctx.accounts.venue_base_ata.to_account_info(),
        ctx.accounts.vault_base_ata.to_account_info(),
        ctx.accounts.market_base_ata.to_account_info(),
        ctx.accounts.swap_venue.to_account_info(),
        ctx.accounts.vault_config.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        (*ctx.accounts.base_mint).clone(),
        base_mint_key,
        venue_bump,
        config_bump,
    )?;

    emit!(LogRebalance {
        caller: ctx.accounts.signer.key(),
        nav_after,
        ltv_before,
        ltv_after: outcome.final_ltv,
        leverage_converged: outcome.converged,
        leverage_iterations: outcome.iterations,
    });
    Ok(())
}

/// The fee recipient redeems accrued performance fee shares for base,
/// freed through the same deleverage path as a withdrawal.
pub fn claim_fee_shares(ctx: Context<Rebalance>) -> Result<u64> {
    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let config_key = ctx.accounts.vault_config.key();
    let market_key = ctx.accounts.market.key();
    let venue_key = ctx.accounts.swap_venue.key();
    let base_mint_key = ctx.accounts.base_mint.key();

    let (base_value, fee_shares, outcome, config_bump, venue_bump) = {
        let config = ctx.accounts.vault_config.load()?;
        config.verify_wiring(&market_key, &venue_key)?;
        let config_mint = config.base_mint;
        require_keys_eq!(config_mint, base_mint_key, ErrorCodes::VaultInvalidParams);
        let fee_recipient = config.fee_recipient;
        require_keys_eq!(
            fee_recipient,
            ctx.accounts.signer.key(),
            ErrorCodes::VaultOnlyAuthority
        );
        let venue = ctx.accounts.swap_venue.load()?;
        let mut state = ctx.accounts.vault_state.load_mut()?;
        let mut market = ctx.accounts.market.load_mut()?;
        let mut position = ctx.accounts.vault_position.load_mut()?;
        lend::verify_position(&position, &market, &config_key)?;

        state.acquire_lock()?;
        market.accrue(now)?;

        let idle = ctx.accounts.vault_base_ata.amount;
        let nav = nav::total_assets(&market, &position, &venue, idle)?;
        nav::accrual_checkpoint(&mut state, config.performance_fee_bps, nav, now)?;

        let fee_shares = state.fee_shares;
        require!(fee_shares > 0, ErrorCodes::VaultNoFeeShares);

        let base_value: u64 =
            mul_div_down(fee_shares, nav as u128, state.total_shares)?.cast()?;
        require!(base_value > 0, ErrorCodes::VaultZeroAmount);

        state.fee_shares = 0;
        state.burn_shares(fee_shares)?;

        let from_idle = idle.min(base_value);
        let from_position = base_value.safe_sub(from_idle)?;
        let outcome = leverage::decrease_leverage(
            &mut market,
            &mut position,
            &venue,
            config.target_ltv as u128,
            from_position,
        )?;
        lend::check_position_health(&market, &position, &venue)?;
        state.release_lock();

        (base_value, fee_shares, outcome, config.bump, venue.bump)
    };

    settle_decrease_legs(
        &outcome,
        ctx.accounts.venue_base_ata.to_account_info(),
        ctx.accounts.vault_base_ata.to_account_info(),
        ctx.accounts.market_base_ata.to_account_info(),
        ctx.accounts.swap_venue.to_account_info(),
        ctx.accounts.vault_config.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        (*ctx.accounts.base_mint).clone(),
        base_mint_key,
        venue_bump,
        config_bump,
    )?;

    let config_signer: &[&[u8]] = &[VAULT_CONFIG_SEED, &[config_bump]];
    transfer_spl_tokens(TokenTransferParams {
        source: ctx.accounts.vault_base_ata.to_account_info(),
        destination: ctx.accounts.signer_base_ata.to_account_info(),
        authority: ctx.accounts.vault_config.to_account_info(),
        amount: base_value,
        token_program: ctx.accounts.token_program.to_account_info(),
        signer_seeds: Some(&[config_signer]),
        mint: (*ctx.accounts.base_mint).clone(),
    })?;

    emit!(LogClaimFeeShares {
        recipient: ctx.accounts.signer.key(),
        fee_shares,
        base_out: base_value,
    });
    Ok(base_value)
}

/// Third-party liquidity: supply base to the lending market the vault
/// borrows from, earning the accrued interest pro rata.
pub fn supply_liquidity(ctx: Context<SupplyLiquidity>, amount: u64) -> Result<u128> {
    require!(amount > 0, ErrorCodes::VaultZeroAmount);
    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let (shares, market_id) = {
        let mut market = ctx.accounts.market.load_mut()?;
        let market_base_mint = market.base_mint;
        require_keys_eq!(
            market_base_mint,
            ctx.accounts.base_mint.key(),
            ErrorCodes::VaultInvalidMarket
        );
        market.accrue(now)?;

        let mut position = match ctx.accounts.position.load_init() {
            Ok(fresh) => fresh,
            Err(_) => ctx.accounts.position.load_mut()?,
        };
        if position.owner == Pubkey::default() {
            position.init(
                market.market_id,
                ctx.accounts.supplier.key(),
                ctx.bumps.position,
            );
        }
        lend::verify_position(&position, &market, &ctx.accounts.supplier.key())?;

        let shares = lend::supply(&mut market, &mut position, amount)?;
        (shares, market.market_id)
    };

    transfer_spl_tokens(TokenTransferParams {
        source: ctx.accounts.supplier_base_ata.to_account_info(),
        destination: ctx.accounts.market_base_ata.to_account_info(),
        authority: ctx.accounts.supplier.to_account_info(),
        amount,
        token_program: ctx.accounts.token_program.to_account_info(),
        signer_seeds: None,
        mint: (*ctx.accounts.base_mint).clone(),
    })?;

    emit!(LogSupplyLiquidity {
        supplier: ctx.accounts.supplier.key(),
        market_id,
        assets: amount,
        shares_minted: shares,
    });
    Ok(shares)
}

/// Withdraw supplied base from the market. `u64::MAX` withdraws the
/// position's full redeemable balance.
pub fn withdraw_liquidity(ctx: Context<WithdrawLiquidity>, amount: u64) -> Result<u128> {
    require!(amount > 0, ErrorCodes::VaultZeroAmount);
    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let (shares, withdrawn, market_id, market_bump) = {
        let mut market = ctx.accounts.market.load_mut()?;
        market.accrue(now)?;
        let mut position = ctx.accounts.position.load_mut()?;
        lend::verify_position(&position, &market, &ctx.accounts.supplier.key())?;

        let withdrawn = if amount == u64::MAX {
            lend::supplied_assets(&market, &position)?.min(market.available_liquidity())
        } else {
            amount
        };
        let shares = lend::withdraw(&mut market, &mut position, withdrawn)?;
        (shares, withdrawn, market.market_id, market.bump)
    };

    let market_signer: &[&[u8]] = &[LENDING_MARKET_SEED, market_id.as_ref(), &[market_bump]];
    transfer_spl_tokens(TokenTransferParams {
        source: ctx.accounts.market_base_ata.to_account_info(),
        destination: ctx.accounts.supplier_base_ata.to_account_info(),
        authority: ctx.accounts.market.to_account_info(),
        amount: withdrawn,
        token_program: ctx.accounts.token_program.to_account_info(),
        signer_seeds: Some(&[market_signer]),
        mint: (*ctx.accounts.base_mint).clone(),
    })?;

    emit!(LogWithdrawLiquidity {
        supplier: ctx.accounts.supplier.key(),
        market_id,
        assets: withdrawn,
        shares_burned: shares,
    });
    Ok(shares)
}

fn emit_checkpoint(outcome: &nav::CheckpointOutcome, high_water_mark: u128) {
    emit!(LogCheckpoint {
        nav: outcome.nav,
        nav_per_share: outcome.nav_per_share,
        high_water_mark,
        fee_value: outcome.fee_value,
        fee_shares_minted: outcome.fee_shares,
    });
}

/// Settle the borrow/swap legs of an increase outcome:
/// market -> vault, then vault -> venue.
#[allow(clippy::too_many_arguments)]
fn settle_increase_legs<'info>(
    outcome: &LeverageOutcome,
    market_base_ata: AccountInfo<'info>,
    vault_base_ata: AccountInfo<'info>,
    venue_base_ata: AccountInfo<'info>,
    market: AccountInfo<'info>,
    vault_config: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
    mint: InterfaceAccount<'info, Mint>,
    market_id: [u8; 32],
    market_bump: u8,
    config_bump: u8,
) -> Result<()> {
    let market_signer: &[&[u8]] = &[LENDING_MARKET_SEED, market_id.as_ref(), &[market_bump]];
    if outcome.borrowed > 0 {
        transfer_spl_tokens(TokenTransferParams {
            source: market_base_ata,
            destination: vault_base_ata.clone(),
            authority: market,
            amount: outcome.borrowed,
            token_program: token_program.clone(),
            signer_seeds: Some(&[market_signer]),
            mint: mint.clone(),
        })?;
    }

    let config_signer: &[&[u8]] = &[VAULT_CONFIG_SEED, &[config_bump]];
    if outcome.swapped_to_collateral > 0 {
        transfer_spl_tokens(TokenTransferParams {
            source: vault_base_ata,
            destination: venue_base_ata,
            authority: vault_config,
            amount: outcome.swapped_to_collateral,
            token_program,
            signer_seeds: Some(&[config_signer]),
            mint,
        })?;
    }
    Ok(())
}

/// Settle the unstake/repay legs of a decrease outcome:
/// venue -> vault, then vault -> market.
#[allow(clippy::too_many_arguments)]
fn settle_decrease_legs<'info>(
    outcome: &LeverageOutcome,
    venue_base_ata: AccountInfo<'info>,
    vault_base_ata: AccountInfo<'info>,
    market_base_ata: AccountInfo<'info>,
    swap_venue: AccountInfo<'info>,
    vault_config: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
    mint: InterfaceAccount<'info, Mint>,
    base_mint_key: Pubkey,
    venue_bump: u8,
    config_bump: u8,
) -> Result<()> {
    let venue_signer: &[&[u8]] = &[SWAP_VENUE_SEED, base_mint_key.as_ref(), &[venue_bump]];
    if outcome.unstaked_base > 0 {
        transfer_spl_tokens(TokenTransferParams {
            source: venue_base_ata,
            destination: vault_base_ata.clone(),
            authority: swap_venue,
            amount: outcome.unstaked_base,
            token_program: token_program.clone(),
            signer_seeds: Some(&[venue_signer]),
            mint: mint.clone(),
        })?;
    }

    let config_signer: &[&[u8]] = &[VAULT_CONFIG_SEED, &[config_bump]];
    if outcome.repaid > 0 {
        transfer_spl_tokens(TokenTransferParams {
            source: vault_base_ata,
            destination: market_base_ata,
            authority: vault_config,
            amount: outcome.repaid,
            token_program,
            signer_seeds: Some(&[config_signer]),
            mint,
        })?;
    }
    Ok(())
}
