use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use cardroom_api::types::{
    Amount, PlayerId, RoomId, TableId, Timestamp, WitnessId, TIME_MAX, TIME_MIN,
};

use crate::error::{Error, Result};

/// The arena where one hand at a time is arbitrated.
///
/// A player appears in at most one of `cash` and `playing_cash`,
/// except transiently inside a single tally.  A table with empty
/// `playing_cash` is *free*; otherwise it is *playing*.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Table {
    pub id: TableId,
    pub room: RoomId,
    pub required_witnesses: u16,
    pub metadata: String,
    pub min_accepted_proposal: Amount,
    /// Seated chips, not committed to a hand.
    pub cash: BTreeMap<PlayerId, Amount>,
    /// Chips committed to the current hand.
    pub playing_cash: BTreeMap<PlayerId, Amount>,
    /// Witnesses carried from the start-vote into the result-vote.
    pub voted_witnesses: BTreeSet<WitnessId>,
    pub game_created: Timestamp,
    pub game_expiration: Timestamp,
    pub last_alive: Timestamp,
}

impl Table {
    pub fn new(
        id: TableId,
        room: RoomId,
        required_witnesses: u16,
        metadata: impl Into<String>,
        min_accepted_proposal: Amount,
    ) -> Self {
        Self {
            id,
            room,
            required_witnesses,
            metadata: metadata.into(),
            min_accepted_proposal,
            cash: BTreeMap::new(),
            playing_cash: BTreeMap::new(),
            voted_witnesses: BTreeSet::new(),
            game_created: TIME_MIN,
            game_expiration: TIME_MAX,
            last_alive: TIME_MIN,
        }
    }

    pub fn is_free(&self) -> bool {
        self.playing_cash.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        !self.playing_cash.is_empty()
    }

    pub fn is_waiting_at_table(&self, player: PlayerId) -> bool {
        self.cash.contains_key(&player)
    }

    pub fn is_playing_at_table(&self, player: PlayerId) -> bool {
        self.playing_cash.contains_key(&player)
    }

    /// Add chips to a player's seat, creating the seat if missing.
    pub fn seat(&mut self, player: PlayerId, amount: Amount) -> Result<()> {
        let entry = self.cash.entry(player).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(Error::MathOverflow)?;
        Ok(())
    }

    /// Remove chips from a player's seat.  A seat drained to zero is
    /// removed.
    pub fn unseat(&mut self, player: PlayerId, amount: Amount) -> Result<()> {
        let have = self.cash.get(&player).copied().unwrap_or(0);
        let rest = have.checked_sub(amount).ok_or(Error::NotEnoughCash(player))?;
        if rest == 0 {
            self.cash.remove(&player);
        } else {
            self.cash.insert(player, rest);
        }
        Ok(())
    }

    /// Commit seated chips to the current hand.
    pub fn move_to_play(&mut self, player: PlayerId, amount: Amount) -> Result<()> {
        self.unseat(player, amount)?;
        let entry = self.playing_cash.entry(player).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(Error::MathOverflow)?;
        Ok(())
    }

    /// Return in-hand chips to the player's seat.
    pub fn move_from_play(&mut self, player: PlayerId, amount: Amount) -> Result<()> {
        self.deduct_play(player, amount)?;
        self.seat(player, amount)
    }

    /// Remove chips from the hand without touching the seat.
    pub fn deduct_play(&mut self, player: PlayerId, amount: Amount) -> Result<()> {
        let have = self.playing_cash.get(&player).copied().unwrap_or(0);
        let rest = have
            .checked_sub(amount)
            .ok_or(Error::NotEnoughPlayingCash(player))?;
        if rest == 0 {
            self.playing_cash.remove(&player);
        } else {
            self.playing_cash.insert(player, rest);
        }
        Ok(())
    }

    pub fn clear_play(&mut self) {
        self.playing_cash.clear();
    }

    /// Sum of every chip on the table, seated or in hand.
    pub fn chips_total(&self) -> Amount {
        self.cash
            .values()
            .chain(self.playing_cash.values())
            .sum()
    }
}
