/// 18-decimal fixed point scale shared with the library
pub const WAD: u128 = library::math::wad::WAD;

pub const SECONDS_PER_YEAR: u128 = 31_536_000; // 365 * 24 * 60 * 60

/// Basis points denominator
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Hard cap on the leverage/deleverage loop
pub const MAX_ITERATIONS: u8 = 12;

/// Convergence tolerance on LTV: 0.1% in WAD
pub const LTV_TOLERANCE: u128 = 1_000_000_000_000_000;

/// Per-iteration damping on the borrow step: 95% in WAD.
/// Keeps fee drag and rounding from oscillating the loop past target.
pub const BORROW_STEP_DAMPING: u128 = 950_000_000_000_000_000;

/// Virtual shares/assets folded into every share conversion so an empty
/// market issues shares ~1:1 and donation attacks cannot skew the ratio.
pub const VIRTUAL_SHARES: u128 = 1_000_000;
pub const VIRTUAL_ASSETS: u128 = 1;

/// Max performance fee: 50%
pub const MAX_PERFORMANCE_FEE_BPS: u16 = 5_000;

/// Max peg-stability swap fee on either leg: 10% in WAD
pub const MAX_SWAP_FEE_RATE: u64 = 100_000_000_000_000_000;

/// Max market borrow rate per second (~1000% APR)
pub const MAX_BORROW_RATE_PER_SECOND: u64 = (10 * WAD / SECONDS_PER_YEAR) as u64;

/// Max protocol fee on accrued interest: 25% in WAD
pub const MAX_PROTOCOL_FEE_RATE: u64 = 250_000_000_000_000_000;

/// Target LTV must sit at least this far below the liquidation threshold
/// (2% in WAD) so the loop's tolerance band cannot touch the threshold.
pub const TARGET_LTV_SAFETY_GAP: u128 = 20_000_000_000_000_000;
