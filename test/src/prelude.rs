pub use crate::constants::*;
pub use crate::ledger_helpers::*;
pub use crate::world_helpers::*;

pub use cardroom_api::event::GameEvent;
pub use cardroom_api::ops::{GameReset, ResultCheck, StartPlayingCheck, TablesAlive};
pub use cardroom_api::types::{AccountId, Amount, PlayerId, TableId, TIME_MAX, TIME_MIN};
pub use cardroom_api::vote::{GameInitial, GameResult, GamerResult, VoteData};
pub use cardroom_core::engine::VoteOutcome;
pub use cardroom_core::error::Error;
