
pub mod prelude;

pub use constants::*;
pub use ledger_helpers::*;
pub use world_helpers::*;
