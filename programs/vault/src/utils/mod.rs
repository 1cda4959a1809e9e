pub mod lend;
pub mod leverage;
pub mod nav;
pub mod swap;
