use anchor_lang::prelude::*;

use crate::structs::TokenTransferParams;
use anchor_spl::token::{self};
use anchor_spl::token_interface::{self, Mint, TransferChecked};

pub fn balance_of(token_account: &AccountInfo) -> Result<u64> {
    let amount = token::accessor::amount(token_account)?;
    Ok(amount)
}

pub fn decimals(token_account: &Mint) -> Result<u8> {
    let decimals = token_account.decimals;
    Ok(decimals)
}

pub fn transfer_spl_tokens(params: TokenTransferParams) -> Result<()> {
    let TokenTransferParams {
        source,
        destination,
        authority,
        amount,
        token_program,
        signer_seeds,
        mint,
    } = params;

    let decimals = decimals(&mint)?;

    let transfer_accounts = TransferChecked {
        from: source.clone(),
        to: destination.clone(),
        authority: authority.clone(),
        mint: mint.to_account_info(),
    };

    if let Some(seeds) = signer_seeds {
        token_interface::transfer_checked(
            CpiContext::new_with_signer(token_program.clone(), transfer_accounts, seeds),
            amount,
            decimals,
        )?
    } else {
        token_interface::transfer_checked(
            CpiContext::new(token_program.clone(), transfer_accounts),
            amount,
            decimals,
        )?
    }

    Ok(())
}
