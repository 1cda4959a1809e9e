use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCodes {
    #[msg("VAULT_ONLY_AUTHORITY")]
    VaultOnlyAuthority = 0,
    #[msg("VAULT_INVALID_PARAMS")]
    VaultInvalidParams,
    #[msg("VAULT_INVALID_MARKET")]
    VaultInvalidMarket,
    #[msg("VAULT_INVALID_VENUE")]
    VaultInvalidVenue,
    #[msg("VAULT_INVALID_POSITION")]
    VaultInvalidPosition,
    #[msg("VAULT_REENTRANCY")]
    VaultReentrancy,
    #[msg("VAULT_ZERO_AMOUNT")]
    VaultZeroAmount,
    #[msg("VAULT_ZERO_SHARES")]
    VaultZeroShares,
    #[msg("VAULT_INSUFFICIENT_SHARES")]
    VaultInsufficientShares,
    #[msg("VAULT_INSUFFICIENT_LIQUIDITY")]
    VaultInsufficientLiquidity,
    #[msg("VAULT_INSUFFICIENT_COLLATERAL")]
    VaultInsufficientCollateral,
    #[msg("VAULT_SLIPPAGE_EXCEEDED")]
    VaultSlippageExceeded,
    #[msg("VAULT_UNSAFE_LTV")]
    VaultUnsafeLtv,
    #[msg("VAULT_NAV_UNDERWATER")]
    VaultNavUnderwater,
    #[msg("VAULT_MAX_TOTAL_ASSETS_EXCEEDED")]
    VaultMaxTotalAssetsExceeded,
    #[msg("VAULT_NO_FEE_SHARES")]
    VaultNoFeeShares,
}
