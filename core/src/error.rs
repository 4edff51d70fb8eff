use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cardroom_api::types::{AccountId, Amount, PlayerId, RoomId, TableId};

#[derive(Error, Debug, BorshDeserialize, BorshSerialize, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Error {
    #[error("Table does not exist: {0}")]
    TableNotFound(TableId),

    #[error("Room does not exist: {0}")]
    RoomNotFound(RoomId),

    #[error("Account is not a player: {0}")]
    PlayerNotFound(AccountId),

    #[error("Player already exists for account: {0}")]
    PlayerAlreadyExists(AccountId),

    #[error("Wrong table owner")]
    WrongTableOwner,

    #[error("Wrong type of voting, there is a game on the table")]
    TableNotFree,

    #[error("Wrong type of voting, there is no game on the table")]
    TableNotPlaying,

    #[error("Voter has already voted")]
    DuplicatedVote,

    #[error("Invalid voter: {0}")]
    InvalidVoter(AccountId),

    #[error("At least two players required to vote for a start")]
    NotEnoughPlayers,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Player is not seated at the table: {0}")]
    PlayerNotSeated(AccountId),

    #[error("Not enough cash on the table for player: {0}")]
    NotEnoughCash(PlayerId),

    #[error("Not enough in-hand cash for player: {0}")]
    NotEnoughPlayingCash(PlayerId),

    #[error("Vote lineup does not match the owner's proposal")]
    LineupMismatch,

    #[error("Result payouts do not balance the in-hand cash")]
    ResultNotBalanced,

    #[error("Vote is stale")]
    StaleVote,

    #[error("Buy-in proposal already exists")]
    DuplicatedProposal,

    #[error("Buy-in proposal not found")]
    ProposalNotFound,

    #[error("Buy-in proposal below the table minimum: {0}")]
    ProposalTooSmall(Amount),

    #[error("Malformed protocol version: {0}")]
    MalformedProtocolVersion(String),

    #[error("Math overflow")]
    MathOverflow,

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
