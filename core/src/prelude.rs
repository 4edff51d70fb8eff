pub use crate::collector::{PendingVote, VoteCollector, VoteKind};
pub use crate::engine::{Engine, VoteOutcome};
pub use crate::error::{Error, Result};
pub use crate::escrow::{BuyIn, BuyInProposal, PendingBuyOut};
pub use crate::ledger::Ledger;
pub use crate::params::{substitution_quota, CardroomParams, Percent, FULL_PERCENT};
pub use crate::room::{Player, ProtocolVersion, Room, Witness};
pub use crate::store::Store;
pub use crate::table::Table;

pub use cardroom_api::prelude::*;
