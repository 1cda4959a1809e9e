pub const VAULT_CONFIG_SEED: &[u8] = b"vault_config";
pub const VAULT_STATE_SEED: &[u8] = b"vault_state";
pub const LENDING_MARKET_SEED: &[u8] = b"lending_market";
pub const MARKET_POSITION_SEED: &[u8] = b"market_position";
pub const SWAP_VENUE_SEED: &[u8] = b"swap_venue";
pub const SHARE_ACCOUNT_SEED: &[u8] = b"share_account";
