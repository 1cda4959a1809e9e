use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::state::market::{LendingMarket, MarketPosition};
use crate::state::seeds::*;
use crate::state::vault_config::VaultConfig;
use crate::state::vault_state::{ShareAccount, VaultState};
use crate::state::venue::SwapVenue;

#[derive(Accounts)]
pub struct InitSwapVenue<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + SwapVenue::INIT_SPACE,
        seeds = [SWAP_VENUE_SEED, base_mint.key().as_ref()],
        bump,
    )]
    pub swap_venue: AccountLoader<'info, SwapVenue>,

    pub base_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Holds the base leg of every swap the venue fills
    #[account(
        init,
        payer = authority,
        associated_token::mint = base_mint,
        associated_token::authority = swap_venue,
        associated_token::token_program = token_program,
    )]
    pub venue_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(market_id: [u8; 32])]
pub struct InitLendingMarket<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + LendingMarket::INIT_SPACE,
        seeds = [LENDING_MARKET_SEED, market_id.as_ref()],
        bump,
    )]
    pub market: AccountLoader<'info, LendingMarket>,

    pub swap_venue: AccountLoader<'info, SwapVenue>,

    pub base_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = authority,
        associated_token::mint = base_mint,
        associated_token::authority = market,
        associated_token::token_program = token_program,
    )]
    pub market_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct InitVault<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + VaultConfig::INIT_SPACE,
        seeds = [VAULT_CONFIG_SEED],
        bump,
    )]
    pub vault_config: AccountLoader<'info, VaultConfig>,

    #[account(
        init,
        payer = authority,
        space = 8 + VaultState::INIT_SPACE,
        seeds = [VAULT_STATE_SEED],
        bump,
    )]
    pub vault_state: AccountLoader<'info, VaultState>,

    pub market: AccountLoader<'info, LendingMarket>,

    pub swap_venue: AccountLoader<'info, SwapVenue>,

    /// The vault's borrow/collateral position in the market
    #[account(
        init,
        payer = authority,
        space = 8 + MarketPosition::INIT_SPACE,
        seeds = [
            MARKET_POSITION_SEED,
            market.key().as_ref(),
            vault_config.key().as_ref(),
        ],
        bump,
    )]
    pub vault_position: AccountLoader<'info, MarketPosition>,

    pub base_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Idle base buffer owned by the vault
    #[account(
        init,
        payer = authority,
        associated_token::mint = base_mint,
        associated_token::authority = vault_config,
        associated_token::token_program = token_program,
    )]
    pub vault_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// Governance knobs on the vault config. The market rides along so
/// target-LTV updates can be revalidated against its liquidation
/// threshold.
#[derive(Accounts)]
pub struct UpdateVaultPolicy<'info> {
    pub authority: Signer<'info>,

    #[account(mut)]
    pub vault_config: AccountLoader<'info, VaultConfig>,

    pub market: AccountLoader<'info, LendingMarket>,
}

#[derive(Accounts)]
pub struct UpdateSwapVenue<'info> {
    pub authority: Signer<'info>,

    #[account(mut)]
    pub swap_venue: AccountLoader<'info, SwapVenue>,
}

/// Account set for deposit and withdraw: the full token plumbing plus
/// the signer's share balance.
#[derive(Accounts)]
pub struct Operate<'info> {
    #[account(mut)]
    pub signer: Signer<'info>,

    pub vault_config: AccountLoader<'info, VaultConfig>,

    #[account(mut)]
    pub vault_state: AccountLoader<'info, VaultState>,

    #[account(mut)]
    pub market: AccountLoader<'info, LendingMarket>,

    #[account(mut)]
    pub vault_position: AccountLoader<'info, MarketPosition>,

    pub swap_venue: AccountLoader<'info, SwapVenue>,

    #[account(
        init_if_needed,
        payer = signer,
        space = 8 + ShareAccount::INIT_SPACE,
        seeds = [SHARE_ACCOUNT_SEED, signer.key().as_ref()],
        bump,
    )]
    pub share_account: AccountLoader<'info, ShareAccount>,

    pub base_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub signer_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = base_mint,
        associated_token::authority = vault_config,
        associated_token::token_program = token_program,
    )]
    pub vault_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = base_mint,
        associated_token::authority = market,
        associated_token::token_program = token_program,
    )]
    pub market_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = base_mint,
        associated_token::authority = swap_venue,
        associated_token::token_program = token_program,
    )]
    pub venue_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

/// Token plumbing without a share balance: rebalance and the fee
/// recipient's claim.
#[derive(Accounts)]
pub struct Rebalance<'info> {
    #[account(mut)]
    pub signer: Signer<'info>,

    pub vault_config: AccountLoader<'info, VaultConfig>,

    #[account(mut)]
    pub vault_state: AccountLoader<'info, VaultState>,

    #[account(mut)]
    pub market: AccountLoader<'info, LendingMarket>,

    #[account(mut)]
    pub vault_position: AccountLoader<'info, MarketPosition>,

    pub swap_venue: AccountLoader<'info, SwapVenue>,

    pub base_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub signer_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = base_mint,
        associated_token::authority = vault_config,
        associated_token::token_program = token_program,
    )]
    pub vault_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = base_mint,
        associated_token::authority = market,
        associated_token::token_program = token_program,
    )]
    pub market_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = base_mint,
        associated_token::authority = swap_venue,
        associated_token::token_program = token_program,
    )]
    pub venue_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}

/// Checkpoint moves no tokens; it only needs the balances in view.
#[derive(Accounts)]
pub struct Checkpoint<'info> {
    pub signer: Signer<'info>,

    pub vault_config: AccountLoader<'info, VaultConfig>,

    #[account(mut)]
    pub vault_state: AccountLoader<'info, VaultState>,

    #[account(mut)]
    pub market: AccountLoader<'info, LendingMarket>,

    pub vault_position: AccountLoader<'info, MarketPosition>,

    pub swap_venue: AccountLoader<'info, SwapVenue>,

    pub base_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        associated_token::mint = base_mint,
        associated_token::authority = vault_config,
        associated_token::token_program = token_program,
    )]
    pub vault_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}

#[derive(Accounts)]
pub struct SupplyLiquidity<'info> {
    #[account(mut)]
    pub supplier: Signer<'info>,

    #[account(mut)]
    pub market: AccountLoader<'info, LendingMarket>,

    #[account(
        init_if_needed,
        payer = supplier,
        space = 8 + MarketPosition::INIT_SPACE,
        seeds = [
            MARKET_POSITION_SEED,
            market.key().as_ref(),
            supplier.key().as_ref(),
        ],
        bump,
    )]
    pub position: AccountLoader<'info, MarketPosition>,

    pub base_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub supplier_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = base_mint,
        associated_token::authority = market,
        associated_token::token_program = token_program,
    )]
    pub market_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct WithdrawLiquidity<'info> {
    #[account(mut)]
    pub supplier: Signer<'info>,

    #[account(mut)]
    pub market: AccountLoader<'info, LendingMarket>,

    #[account(mut)]
    pub position: AccountLoader<'info, MarketPosition>,

    pub base_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub supplier_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = base_mint,
        associated_token::authority = market,
        associated_token::token_program = token_program,
    )]
    pub market_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}

/// Read-only account set for the view instructions.
#[derive(Accounts)]
pub struct ViewVault<'info> {
    pub vault_config: AccountLoader<'info, VaultConfig>,
    pub vault_state: AccountLoader<'info, VaultState>,
    pub market: AccountLoader<'info, LendingMarket>,
    pub vault_position: AccountLoader<'info, MarketPosition>,
    pub swap_venue: AccountLoader<'info, SwapVenue>,

    pub base_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        associated_token::mint = base_mint,
        associated_token::authority = vault_config,
        associated_token::token_program = token_program,
    )]
    pub vault_base_ata: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}
