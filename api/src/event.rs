use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Amount};
use crate::vote::{GameInitial, GameResult};

/// An entry of the append-only per-account audit log.  Every
/// non-trivial state transition of a table appends exactly one of
/// these; content and order are deterministic across replicas.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum GameEvent {
    /// Start-vote consensus reached; the hand begins with this lineup.
    StartPlayingValidated { initial: GameInitial },

    /// Result-vote consensus reached; payouts already applied.  The
    /// carried result reflects pending buy-out deductions.
    ResultValidated { result: GameResult },

    /// The table's in-hand state was reversed.
    Rollback,

    /// Start-vote tally completed without consensus.
    FailConsensusStart,

    /// Result-vote tally completed without consensus.
    FailConsensusResult,

    /// Start-vote collector expired before tally.
    FailExpireStart,

    /// Result-vote collector expired and salvage was not possible.
    FailExpireResult,

    /// The hand outlived its lifetime limit.
    FailExpireLifetime,

    /// A voter lost a successful start-vote tally.
    FraudStartCheck {
        account: AccountId,
        fail_info: String,
        valid_info: String,
    },

    /// A voter lost a successful result-vote tally.
    FraudResultCheck {
        account: AccountId,
        fail_log: String,
        valid_log: String,
    },

    /// A buy-out was paid, fully or partially.
    BuyOutAllowed { account: AccountId, amount: Amount },

    /// Seated chips returned to the player's account.
    BuyInReturn { account: AccountId, amount: Amount },

    /// In-hand chips returned to the player's seat.
    GameCashReturn { account: AccountId, amount: Amount },

    /// A buy-out could not be fully satisfied from the player's funds.
    FraudBuyOut {
        account: AccountId,
        rest: Amount,
        allowed: Amount,
    },

    /// A pending vote was discarded as invalid during drain.
    FailVote { voter: AccountId },
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameEvent::StartPlayingValidated { initial } => {
                write!(f, "StartPlayingValidated, {} players", initial.cash.len())
            }
            GameEvent::ResultValidated { result } => {
                write!(f, "ResultValidated, {} players", result.cash.len())
            }
            GameEvent::Rollback => write!(f, "Rollback"),
            GameEvent::FailConsensusStart => write!(f, "FailConsensusStart"),
            GameEvent::FailConsensusResult => write!(f, "FailConsensusResult"),
            GameEvent::FailExpireStart => write!(f, "FailExpireStart"),
            GameEvent::FailExpireResult => write!(f, "FailExpireResult"),
            GameEvent::FailExpireLifetime => write!(f, "FailExpireLifetime"),
            GameEvent::FraudStartCheck { account, .. } => {
                write!(f, "FraudStartCheck for {}", account)
            }
            GameEvent::FraudResultCheck { account, .. } => {
                write!(f, "FraudResultCheck for {}", account)
            }
            GameEvent::BuyOutAllowed { account, amount } => {
                write!(f, "BuyOutAllowed for {}: {}", account, amount)
            }
            GameEvent::BuyInReturn { account, amount } => {
                write!(f, "BuyInReturn for {}: {}", account, amount)
            }
            GameEvent::GameCashReturn { account, amount } => {
                write!(f, "GameCashReturn for {}: {}", account, amount)
            }
            GameEvent::FraudBuyOut {
                account,
                rest,
                allowed,
            } => write!(
                f,
                "FraudBuyOut for {}: {} unpaid, {} paid",
                account, rest, allowed
            ),
            GameEvent::FailVote { voter } => write!(f, "FailVote from {}", voter),
        }
    }
}
