//! Committee-tunable parameters.
//!
//! The committee mutates these through chain governance; the engine
//! reads whatever values are current at operation-application time.

use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Percentages are carried in basis points.
pub type Percent = u32;

pub const FULL_PERCENT: Percent = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CardroomParams {
    /// Collector TTL for start-votes.
    pub voting_for_playing_expiration_seconds: u32,
    /// Collector TTL for result-votes.
    pub voting_for_results_expiration_seconds: u32,
    pub voting_for_playing_required_percent: Percent,
    pub voting_for_results_required_percent: Percent,
    pub percentage_of_voter_witness_substitution_while_voting_for_playing: Percent,
    pub percentage_of_voter_witness_substitution_while_voting_for_results: Percent,
    /// Minimum effective votes for a salvage tally on result-vote expiry.
    pub min_votes_for_results: u32,
    /// Hand TTL.
    pub game_lifetime_limit_in_seconds: u32,
    /// Seat TTL for players not in a hand.
    pub buy_in_expiration_seconds: u32,
    pub pending_buyin_proposal_lifetime_limit_in_seconds: u32,
    /// Capacity hint, reused as the safety cap of the pending-vote
    /// drain loop.
    pub maximum_desired_number_of_players_for_tables_allocation: u16,
}

impl Default for CardroomParams {
    fn default() -> Self {
        Self {
            voting_for_playing_expiration_seconds: 60,
            voting_for_results_expiration_seconds: 60,
            voting_for_playing_required_percent: 6_000,
            voting_for_results_required_percent: 6_000,
            percentage_of_voter_witness_substitution_while_voting_for_playing: 5_000,
            percentage_of_voter_witness_substitution_while_voting_for_results: 5_000,
            min_votes_for_results: 2,
            game_lifetime_limit_in_seconds: 3_600,
            buy_in_expiration_seconds: 600,
            pending_buyin_proposal_lifetime_limit_in_seconds: 60,
            maximum_desired_number_of_players_for_tables_allocation: 10,
        }
    }
}

/// How many silent players witnesses may stand in for, given the size
/// of the required voter set.
pub fn substitution_quota(required_voters: usize, percent: Percent) -> u32 {
    (required_voters as u64 * percent as u64 / FULL_PERCENT as u64) as u32
}
