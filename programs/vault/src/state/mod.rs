pub mod context;
pub mod market;
pub mod seeds;
pub mod vault_config;
pub mod vault_state;
pub mod venue;

pub use context::*;
pub use market::*;
pub use seeds::*;
pub use vault_config::*;
pub use vault_state::*;
pub use venue::*;
