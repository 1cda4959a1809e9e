use anchor_lang::prelude::*;

use library::math::casting::Cast;

use crate::constants::MAX_PERFORMANCE_FEE_BPS;
use crate::errors::ErrorCodes;
use crate::events::*;
use crate::state::*;

pub fn init_swap_venue(
    ctx: Context<InitSwapVenue>,
    sell_fee_rate: u64,
    buy_fee_rate: u64,
    stake_exchange_rate: u64,
    collateral_decimals: u8,
) -> Result<()> {
    let mut venue = ctx.accounts.swap_venue.load_init()?;
    venue.init(
        ctx.accounts.authority.key(),
        ctx.accounts.base_mint.key(),
        sell_fee_rate,
        buy_fee_rate,
        stake_exchange_rate,
        ctx.accounts.base_mint.decimals,
        collateral_decimals,
        ctx.bumps.swap_venue,
    )?;

    emit!(LogInitSwapVenue {
        base_mint: ctx.accounts.base_mint.key(),
        sell_fee_rate,
        buy_fee_rate,
        stake_exchange_rate,
        collateral_decimals,
    });
    Ok(())
}

pub fn init_lending_market(
    ctx: Context<InitLendingMarket>,
    market_id: [u8; 32],
    params: InitLendingMarketParams,
) -> Result<()> {
    let base_mint = ctx.accounts.base_mint.key();
    let collateral_venue = ctx.accounts.swap_venue.key();

    {
        let venue = ctx.accounts.swap_venue.load()?;
        let venue_base_mint = venue.base_mint;
        require_keys_eq!(venue_base_mint, base_mint, ErrorCodes::VaultInvalidVenue);
    }

    let derived = LendingMarket::derive_market_id(&base_mint, &collateral_venue, &params);
    require!(derived == market_id, ErrorCodes::VaultInvalidMarket);

    let now: u64 = Clock::get()?.unix_timestamp.cast()?;
    let mut market = ctx.accounts.market.load_init()?;
    market.init(
        market_id,
        base_mint,
        collateral_venue,
        &params,
        now,
        ctx.bumps.market,
    )?;

    emit!(LogInitLendingMarket {
        market_id,
        base_mint,
        collateral_venue,
        borrow_rate_per_second: params.borrow_rate_per_second,
        protocol_fee_rate: params.protocol_fee_rate,
        liquidation_threshold: params.liquidation_threshold,
    });
    Ok(())
}

pub fn init_vault(ctx: Context<InitVault>, params: InitVaultParams) -> Result<()> {
    let base_mint = ctx.accounts.base_mint.key();
    let market_key = ctx.accounts.market.key();
    let venue_key = ctx.accounts.swap_venue.key();

    let (market_id, liquidation_threshold) = {
        let market = ctx.accounts.market.load()?;
        let market_base_mint = market.base_mint;
        let market_venue = market.collateral_venue;
        require_keys_eq!(market_base_mint, base_mint, ErrorCodes::VaultInvalidMarket);
        require_keys_eq!(market_venue, venue_key, ErrorCodes::VaultInvalidMarket);
        (market.market_id, market.liquidation_threshold)
    };

    let now: u64 = Clock::get()?.unix_timestamp.cast()?;

    let mut config = ctx.accounts.vault_config.load_init()?;
    config.init(
        ctx.accounts.authority.key(),
        base_mint,
        market_key,
        venue_key,
        &params,
        liquidation_threshold,
        ctx.accounts.base_mint.decimals,
        ctx.bumps.vault_config,
    )?;

    let mut state = ctx.accounts.vault_state.load_init()?;
    state.init(now, ctx.bumps.vault_state);

    let mut position = ctx.accounts.vault_position.load_init()?;
    position.init(
        market_id,
        ctx.accounts.vault_config.key(),
        ctx.bumps.vault_position,
    );

    emit!(LogInitVault {
        authority: ctx.accounts.authority.key(),
        base_mint,
        market: market_key,
        swap_venue: venue_key,
        target_ltv: params.target_ltv,
        performance_fee_bps: params.performance_fee_bps,
        max_total_assets: params.max_total_assets,
    });
    Ok(())
}

pub fn update_target_ltv(ctx: Context<UpdateVaultPolicy>, new_target_ltv: u64) -> Result<()> {
    let mut config = ctx.accounts.vault_config.load_mut()?;
    config.verify_authority(&ctx.accounts.authority.key())?;
    let expected_market = config.market;
    require_keys_eq!(
        expected_market,
        ctx.accounts.market.key(),
        ErrorCodes::VaultInvalidMarket
    );

    let liquidation_threshold = ctx.accounts.market.load()?.liquidation_threshold;
    VaultConfig::validate_target_ltv(new_target_ltv, liquidation_threshold)?;

    let old_target_ltv = config.target_ltv;
    config.target_ltv = new_target_ltv;

    emit!(LogUpdateTargetLtv {
        old_target_ltv,
        new_target_ltv,
    });
    Ok(())
}

pub fn update_performance_fee(ctx: Context<UpdateVaultPolicy>, new_fee_bps: u16) -> Result<()> {
    let mut config = ctx.accounts.vault_config.load_mut()?;
    config.verify_authority(&ctx.accounts.authority.key())?;
    require!(
        new_fee_bps <= MAX_PERFORMANCE_FEE_BPS,
        ErrorCodes::VaultInvalidParams
    );

    let old_fee_bps = config.performance_fee_bps;
    config.performance_fee_bps = new_fee_bps;

    emit!(LogUpdatePerformanceFee {
        old_fee_bps,
        new_fee_bps,
    });
    Ok(())
}

pub fn update_max_total_assets(ctx: Context<UpdateVaultPolicy>, new_max: u64) -> Result<()> {
    let mut config = ctx.accounts.vault_config.load_mut()?;
    config.verify_authority(&ctx.accounts.authority.key())?;

    let old_max = config.max_total_assets;
    config.max_total_assets = new_max;

    emit!(LogUpdateMaxTotalAssets { old_max, new_max });
    Ok(())
}

pub fn update_fee_recipient(ctx: Context<UpdateVaultPolicy>, new_recipient: Pubkey) -> Result<()> {
    let mut config = ctx.accounts.vault_config.load_mut()?;
    config.verify_authority(&ctx.accounts.authority.key())?;
    require!(new_recipient != Pubkey::default(), ErrorCodes::VaultInvalidParams);

    let old_recipient = config.fee_recipient;
    config.fee_recipient = new_recipient;

    emit!(LogUpdateFeeRecipient {
        old_recipient,
        new_recipient,
    });
    Ok(())
}

pub fn update_swap_fees(
    ctx: Context<UpdateSwapVenue>,
    sell_fee_rate: u64,
    buy_fee_rate: u64,
) -> Result<()> {
    let mut venue = ctx.accounts.swap_venue.load_mut()?;
    let authority = venue.authority;
    require_keys_eq!(
        authority,
        ctx.accounts.authority.key(),
        ErrorCodes::VaultOnlyAuthority
    );
    venue.set_fees(sell_fee_rate, buy_fee_rate)?;

    emit!(LogUpdateSwapFees {
        swap_venue: ctx.accounts.swap_venue.key(),
        sell_fee_rate,
        buy_fee_rate,
    });
    Ok(())
}

pub fn update_stake_exchange_rate(ctx: Context<UpdateSwapVenue>, new_rate: u64) -> Result<()> {
    let mut venue = ctx.accounts.swap_venue.load_mut()?;
    let authority = venue.authority;
    require_keys_eq!(
        authority,
        ctx.accounts.authority.key(),
        ErrorCodes::VaultOnlyAuthority
    );
    let old_rate = venue.set_stake_exchange_rate(new_rate)?;

    emit!(LogUpdateStakeExchangeRate {
        swap_venue: ctx.accounts.swap_venue.key(),
        old_rate,
        new_rate,
    });
    Ok(())
}
