//! Operations accepted by the arbitration engine.
//!
//! Each record is signed by its originator; signature checks belong to
//! the host and happen before the engine sees the operation.

use std::collections::BTreeSet;

use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, TableId};
use crate::vote::{GameInitial, GameResult, VoteData};

/// A participant's vote on the initial state of a hand.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StartPlayingCheck {
    pub voter: AccountId,
    pub table_owner: AccountId,
    pub table: TableId,
    pub initial_data: GameInitial,
}

/// A participant's vote on the outcome of a hand.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ResultCheck {
    pub voter: AccountId,
    pub table_owner: AccountId,
    pub table: TableId,
    pub result: GameResult,
}

/// Privileged owner operation: abandon the current hand, optionally
/// clearing the whole table.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct GameReset {
    pub table_owner: AccountId,
    pub table: TableId,
    pub rollback_table: bool,
}

/// Owner liveness report for a set of tables.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TablesAlive {
    pub owner: AccountId,
    pub tables: BTreeSet<TableId>,
}

/// Either vote operation.  The pending-vote queue stores these whole,
/// so a drained entry can be revalidated against current table state.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VoteCheck {
    Start(StartPlayingCheck),
    Result(ResultCheck),
}

impl VoteCheck {
    pub fn voter(&self) -> AccountId {
        match self {
            VoteCheck::Start(op) => op.voter,
            VoteCheck::Result(op) => op.voter,
        }
    }

    pub fn table(&self) -> TableId {
        match self {
            VoteCheck::Start(op) => op.table,
            VoteCheck::Result(op) => op.table,
        }
    }

    pub fn data(&self) -> VoteData {
        match self {
            VoteCheck::Start(op) => op.initial_data.clone().into(),
            VoteCheck::Result(op) => op.result.clone().into(),
        }
    }
}
