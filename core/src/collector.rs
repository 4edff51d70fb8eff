//! Per-table accumulation of unresolved votes.
//!
//! A collector is transient: it is created by the first admitted vote,
//! and destroyed by tally, expiration or an explicit table reset.  The
//! two vote kinds share the structure; the seeding, recording and
//! readiness rules differ per kind and are written as match arms here.

use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use cardroom_api::ops::VoteCheck;
use cardroom_api::types::{AccountId, TableId, Timestamp, WitnessId, TIME_MAX};
use cardroom_api::vote::{GameInitial, VoteData};

use crate::params::{substitution_quota, Percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VoteKind {
    Start,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoteCollector {
    pub table: TableId,
    pub kind: VoteKind,
    pub created: Timestamp,
    pub expiration: Timestamp,
    /// Time at which the tally will run; `TIME_MAX` until enough
    /// voters have been collected.
    pub scheduled_voting: Timestamp,
    /// At most one vote per account.
    pub votes: BTreeMap<AccountId, VoteData>,
    /// Players from whom a vote is still expected.
    pub required_player_voters: BTreeSet<AccountId>,
    /// Witnesses still owed a vote.  Only gates result voting.
    pub required_witness_voters: BTreeSet<WitnessId>,
    pub voted_witnesses: BTreeSet<WitnessId>,
    pub witnesses_allowed_for_substitution: u32,
    /// The owner's start-vote, pinning the lineup for later votes.
    pub owner_proposal: Option<GameInitial>,
}

impl VoteCollector {
    pub fn new(
        table: TableId,
        kind: VoteKind,
        created: Timestamp,
        expiration: Timestamp,
        required_witness_voters: BTreeSet<WitnessId>,
    ) -> Self {
        Self {
            table,
            kind,
            created,
            expiration,
            scheduled_voting: TIME_MAX,
            votes: BTreeMap::new(),
            required_player_voters: BTreeSet::new(),
            required_witness_voters,
            voted_witnesses: BTreeSet::new(),
            witnesses_allowed_for_substitution: 0,
            owner_proposal: None,
        }
    }

    /// Seed the required voter set and the derived substitution quota.
    pub fn seed_required_voters(
        &mut self,
        required: BTreeSet<AccountId>,
        substitution_percent: Percent,
    ) {
        self.witnesses_allowed_for_substitution =
            substitution_quota(required.len(), substitution_percent);
        self.required_player_voters = required;
    }

    /// Record a vote.  `witness` carries the voter's witness identity
    /// when the voter is a witness other than the table owner.
    pub fn record_vote(&mut self, voter: AccountId, witness: Option<WitnessId>, data: VoteData) {
        if !self.required_player_voters.remove(&voter) {
            if let Some(witness) = witness {
                self.voted_witnesses.insert(witness);
                match self.kind {
                    VoteKind::Start => {
                        self.required_witness_voters.insert(witness);
                    }
                    VoteKind::Result => {
                        self.required_witness_voters.remove(&witness);
                    }
                }
            }
        }
        self.votes.insert(voter, data);
    }

    pub fn has_vote(&self, voter: AccountId) -> bool {
        self.votes.contains_key(&voter)
    }

    /// Whether the tally may be scheduled.
    ///
    /// Start-votes need the table's witness quorum and either every
    /// required player or sufficient witness substitution.  Result
    /// votes need every witness carried from the start-vote and the
    /// same player condition.
    pub fn is_tally_ready(&self, required_witnesses: u16) -> bool {
        match self.kind {
            VoteKind::Start => {
                if self.voted_witnesses.len() < required_witnesses as usize {
                    return false;
                }
            }
            VoteKind::Result => {
                if !self.required_witness_voters.is_empty() {
                    return false;
                }
            }
        }
        self.required_player_voters.is_empty() || self.substitution_suffices()
    }

    fn substitution_suffices(&self) -> bool {
        !self.voted_witnesses.is_empty()
            && self.voted_witnesses.len() as u32 >= self.witnesses_allowed_for_substitution
            && self.required_player_voters.len() as u32 <= self.witnesses_allowed_for_substitution
    }
}

/// A vote parked because no collector exists yet and the voter is
/// neither the table owner nor a witness.  At most one per
/// `(table, voter)`.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PendingVote {
    pub table: TableId,
    pub voter: AccountId,
    pub op: VoteCheck,
}
