//! The object store of the arbitration core.
//!
//! Rooms own tables by id; tables point back at their room by id.
//! Indices are ordered maps so that every iteration the engine does is
//! deterministic across replicas.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use cardroom_api::types::{AccountId, AliveId, Amount, PlayerId, RoomId, TableId, WitnessId};

use crate::collector::{PendingVote, VoteCollector};
use crate::error::{Error, Result};
use crate::escrow::{BuyIn, BuyInProposal, PendingBuyOut};
use crate::room::{Player, ProtocolVersion, Room, Witness};
use crate::table::Table;

#[derive(Debug, Default, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Store {
    pub rooms: BTreeMap<RoomId, Room>,
    pub tables: BTreeMap<TableId, Table>,
    pub players: BTreeMap<PlayerId, Player>,
    pub witnesses: BTreeMap<WitnessId, Witness>,
    pub player_by_account: BTreeMap<AccountId, PlayerId>,
    pub witness_by_account: BTreeMap<AccountId, WitnessId>,
    pub collectors: BTreeMap<TableId, VoteCollector>,
    pub pending_votes: BTreeMap<(TableId, AccountId), PendingVote>,
    pub buy_ins: BTreeMap<(TableId, PlayerId), BuyIn>,
    pub pending_buy_outs: BTreeMap<(TableId, PlayerId), PendingBuyOut>,
    pub proposals: BTreeMap<(TableId, PlayerId), BuyInProposal>,
    pub(crate) next_player: u64,
    pub(crate) next_witness: u64,
    pub(crate) next_room: u64,
    pub(crate) next_table: u64,
    pub(crate) next_alive: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_player(&mut self, account: AccountId) -> Result<PlayerId> {
        if self.player_by_account.contains_key(&account) {
            return Err(Error::PlayerAlreadyExists(account));
        }
        self.next_player += 1;
        let id = PlayerId(self.next_player);
        self.players.insert(id, Player::new(id, account));
        self.player_by_account.insert(account, id);
        Ok(id)
    }

    /// Create a room.  The first room of an account also creates the
    /// account's witness principal.
    pub fn create_room(
        &mut self,
        owner: AccountId,
        metadata: impl Into<String>,
        protocol_version: &str,
    ) -> Result<RoomId> {
        let protocol_version: ProtocolVersion = protocol_version.parse()?;
        self.next_room += 1;
        let id = RoomId(self.next_room);
        self.rooms
            .insert(id, Room::new(id, owner, metadata, protocol_version));
        if !self.witness_by_account.contains_key(&owner) {
            self.next_witness += 1;
            let witness = WitnessId(self.next_witness);
            self.witnesses.insert(witness, Witness { id: witness, account: owner });
            self.witness_by_account.insert(owner, witness);
        }
        Ok(id)
    }

    pub fn create_table(
        &mut self,
        room: RoomId,
        required_witnesses: u16,
        metadata: impl Into<String>,
        min_accepted_proposal: Amount,
    ) -> Result<TableId> {
        if !self.rooms.contains_key(&room) {
            return Err(Error::RoomNotFound(room));
        }
        self.next_table += 1;
        let id = TableId(self.next_table);
        self.tables.insert(
            id,
            Table::new(id, room, required_witnesses, metadata, min_accepted_proposal),
        );
        self.rooms
            .get_mut(&room)
            .ok_or(Error::RoomNotFound(room))?
            .tables
            .push(id);
        Ok(id)
    }

    pub fn table(&self, id: TableId) -> Result<&Table> {
        self.tables.get(&id).ok_or(Error::TableNotFound(id))
    }

    pub fn table_mut(&mut self, id: TableId) -> Result<&mut Table> {
        self.tables.get_mut(&id).ok_or(Error::TableNotFound(id))
    }

    pub fn room(&self, id: RoomId) -> Result<&Room> {
        self.rooms.get(&id).ok_or(Error::RoomNotFound(id))
    }

    pub fn table_owner(&self, table: TableId) -> Result<AccountId> {
        let table = self.table(table)?;
        Ok(self.room(table.room)?.owner)
    }

    pub fn player_id(&self, account: AccountId) -> Result<PlayerId> {
        self.player_by_account
            .get(&account)
            .copied()
            .ok_or(Error::PlayerNotFound(account))
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .get(&id)
            .ok_or_else(|| Error::InternalError(format!("dangling player id {}", id)))
    }

    pub fn player_account(&self, id: PlayerId) -> Result<AccountId> {
        Ok(self.player(id)?.account)
    }

    /// The voter's witness identity at this table, if any.  A table
    /// owner is never a witness at its own table.
    pub fn witness_for_voter(&self, table: &Table, voter: AccountId) -> Option<WitnessId> {
        let owner = self.rooms.get(&table.room)?.owner;
        if owner == voter {
            return None;
        }
        self.witness_by_account.get(&voter).copied()
    }

    pub fn collector(&self, table: TableId) -> Option<&VoteCollector> {
        self.collectors.get(&table)
    }

    pub fn has_pending_vote(&self, table: TableId, voter: AccountId) -> bool {
        self.pending_votes.contains_key(&(table, voter))
    }

    /// Keys of this table's pending votes, in voter order, up to `cap`.
    pub fn pending_vote_keys(&self, table: TableId, cap: usize) -> Vec<(TableId, AccountId)> {
        self.pending_votes
            .range((table, AccountId(0))..=(table, AccountId(u64::MAX)))
            .take(cap)
            .map(|(key, _)| *key)
            .collect()
    }

    pub(crate) fn next_alive_id(&mut self) -> AliveId {
        self.next_alive += 1;
        self.next_alive
    }
}
