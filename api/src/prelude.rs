pub use crate::event::GameEvent;
pub use crate::ops::{GameReset, ResultCheck, StartPlayingCheck, TablesAlive, VoteCheck};
pub use crate::types::{
    AccountId, AliveId, Amount, PlayerId, RoomId, TableId, Timestamp, WitnessId, TIME_MAX,
    TIME_MIN,
};
pub use crate::vote::{GameInitial, GameResult, GamerResult, VoteData, VoteDigest};
