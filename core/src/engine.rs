//! Vote admission, tallying and application.
//!
//! All entry points run inside the host's block transaction.  An `Err`
//! from an operation means the operation is rejected with no state
//! change; an `Err` from `on_block` is fatal to the block, the same
//! way a failed ledger write is.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use cardroom_api::event::GameEvent;
use cardroom_api::ops::{GameReset, ResultCheck, StartPlayingCheck, TablesAlive, VoteCheck};
use cardroom_api::types::{
    AccountId, AliveId, Amount, PlayerId, TableId, WitnessId, TIME_MAX, TIME_MIN,
};
use cardroom_api::vote::{GameResult, VoteData, VoteDigest};

use crate::collector::{PendingVote, VoteCollector, VoteKind};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::params::{CardroomParams, Percent, FULL_PERCENT};
use crate::room::PendingFee;
use crate::store::Store;
use crate::table::Table;

/// Where an admitted vote landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Recorded in the table's collector.
    Collected,
    /// Parked in the pending queue until a collector opens.
    Pending,
}

/// The outcome of a successful tally.
struct Tally {
    valid_vote: VoteData,
    carried_witnesses: BTreeSet<WitnessId>,
    invalid: BTreeMap<AccountId, VoteData>,
}

pub struct Engine<'a, L: Ledger> {
    pub store: &'a mut Store,
    pub ledger: &'a mut L,
    pub params: &'a CardroomParams,
}

impl<'a, L: Ledger> Engine<'a, L> {
    pub fn new(store: &'a mut Store, ledger: &'a mut L, params: &'a CardroomParams) -> Self {
        Self { store, ledger, params }
    }

    /// Admit a vote on the initial state of a hand.
    pub fn start_playing_check(&mut self, op: StartPlayingCheck) -> Result<VoteOutcome> {
        let table = self.store.table(op.table)?;
        if self.store.room(table.room)?.owner != op.table_owner {
            return Err(Error::WrongTableOwner);
        }
        if op.initial_data.cash.len() < 2 {
            return Err(Error::NotEnoughPlayers);
        }
        if !table.is_free() {
            return Err(Error::TableNotFree);
        }
        let data = VoteData::Initial(op.initial_data.clone());
        self.check_incoming_vote(op.table, op.voter, &data)?;
        self.admit_vote(VoteCheck::Start(op))
    }

    /// Admit a vote on the outcome of a hand.
    pub fn result_check(&mut self, op: ResultCheck) -> Result<VoteOutcome> {
        let table = self.store.table(op.table)?;
        if self.store.room(table.room)?.owner != op.table_owner {
            return Err(Error::WrongTableOwner);
        }
        if !table.is_playing() {
            return Err(Error::TableNotPlaying);
        }
        let data = VoteData::Result(op.result.clone());
        self.check_incoming_vote(op.table, op.voter, &data)?;
        self.admit_vote(VoteCheck::Result(op))
    }

    /// Owner abandons the current hand; with `rollback_table` the
    /// whole table is cleared and every buy-in refunded.
    pub fn game_reset(&mut self, op: GameReset) -> Result<AliveId> {
        let table = self.store.table(op.table)?;
        if self.store.room(table.room)?.owner != op.table_owner {
            return Err(Error::WrongTableOwner);
        }
        info!(
            "Table {} reset by owner, rollback_table: {}",
            op.table, op.rollback_table
        );
        self.rollback(op.table, op.rollback_table)?;
        self.store.collectors.remove(&op.table);
        Ok(self.alive_for_table(op.table))
    }

    /// Owner liveness report.  Returns one fresh alive-record id per
    /// table.
    pub fn tables_alive(&mut self, op: TablesAlive) -> Result<Vec<AliveId>> {
        for &table_id in &op.tables {
            let table = self.store.table(table_id)?;
            if self.store.room(table.room)?.owner != op.owner {
                return Err(Error::WrongTableOwner);
            }
        }
        let mut ids = Vec::with_capacity(op.tables.len());
        for &table_id in &op.tables {
            ids.push(self.alive_for_table(table_id));
        }
        Ok(ids)
    }

    /// Block-boundary maintenance: run due tallies, expire collectors,
    /// hands, seats and reservations.  Runs before any operation of
    /// the new block, so a stale collector can never receive votes.
    pub fn on_block(&mut self) -> Result<()> {
        let now = self.ledger.head_time();

        let due: Vec<TableId> = self
            .store
            .collectors
            .iter()
            .filter(|(_, collector)| collector.scheduled_voting <= now)
            .map(|(&id, _)| id)
            .collect();
        for table_id in due {
            self.run_scheduled_tally(table_id)?;
        }

        let lapsed: Vec<TableId> = self
            .store
            .collectors
            .iter()
            .filter(|(_, collector)| collector.expiration <= now)
            .map(|(&id, _)| id)
            .collect();
        for table_id in lapsed {
            self.expire_collector(table_id)?;
        }

        let overdue: Vec<TableId> = self
            .store
            .tables
            .values()
            .filter(|table| table.is_playing() && table.game_expiration <= now)
            .map(|table| table.id)
            .filter(|id| !self.store.collectors.contains_key(id))
            .collect();
        for table_id in overdue {
            let owner = self.store.table_owner(table_id)?;
            warn!("Table {} hand outlived its lifetime limit", table_id);
            self.ledger
                .append_event(table_id, owner, GameEvent::FailExpireLifetime);
            self.rollback(table_id, false)?;
        }

        self.expire_buy_ins(now)?;
        self.expire_proposals(now)?;
        Ok(())
    }

    // ---- admission ----

    fn check_incoming_vote(
        &self,
        table_id: TableId,
        voter: AccountId,
        data: &VoteData,
    ) -> Result<()> {
        if let Some(collector) = self.store.collector(table_id) {
            if collector.has_vote(voter) {
                return Err(Error::DuplicatedVote);
            }
        } else if self.store.has_pending_vote(table_id, voter) {
            return Err(Error::DuplicatedVote);
        }
        let table = self.store.table(table_id)?;
        let owner = self.store.room(table.room)?.owner;
        let eligible = voter == owner
            || self.store.witness_for_voter(table, voter).is_some()
            || self.is_valid_voter(table, voter, data);
        if !eligible {
            return Err(Error::InvalidVoter(voter));
        }
        self.validate_invariants(table_id, data)
    }

    fn is_valid_voter(&self, table: &Table, voter: AccountId, data: &VoteData) -> bool {
        let Ok(player) = self.store.player_id(voter) else {
            return false;
        };
        match data {
            VoteData::Initial(_) => table.is_waiting_at_table(player),
            VoteData::Result(_) => table.is_playing_at_table(player),
        }
    }

    fn validate_invariants(&self, table_id: TableId, data: &VoteData) -> Result<()> {
        let table = self.store.table(table_id)?;
        match data {
            VoteData::Initial(initial) => {
                if initial.cash.is_empty() {
                    return Err(Error::NotEnoughPlayers);
                }
                let mut lineup = BTreeSet::new();
                for (&account, &amount) in &initial.cash {
                    if amount == 0 {
                        return Err(Error::InvalidAmount);
                    }
                    let player = self.store.player_id(account)?;
                    let seated = table
                        .cash
                        .get(&player)
                        .copied()
                        .ok_or(Error::PlayerNotSeated(account))?;
                    if seated < amount {
                        return Err(Error::NotEnoughCash(player));
                    }
                    lineup.insert(player);
                }
                if let Some(collector) = self.store.collector(table_id) {
                    if let Some(proposal) = &collector.owner_proposal {
                        let proposed = proposal
                            .cash
                            .keys()
                            .map(|&account| self.store.player_id(account))
                            .collect::<Result<BTreeSet<_>>>()?;
                        if proposed != lineup {
                            return Err(Error::LineupMismatch);
                        }
                    }
                }
                Ok(())
            }
            VoteData::Result(result) => {
                if result.cash.is_empty() {
                    // cancellation vote
                    return Ok(());
                }
                let mut lineup = BTreeSet::new();
                let mut out_balance: Amount = 0;
                for (&account, share) in &result.cash {
                    lineup.insert(self.store.player_id(account)?);
                    out_balance = out_balance
                        .checked_add(share.cash)
                        .and_then(|b| b.checked_add(share.rake))
                        .ok_or(Error::MathOverflow)?;
                }
                let playing: BTreeSet<PlayerId> = table.playing_cash.keys().copied().collect();
                if lineup != playing {
                    return Err(Error::LineupMismatch);
                }
                let mut in_balance: Amount = 0;
                for &amount in table.playing_cash.values() {
                    in_balance = in_balance.checked_add(amount).ok_or(Error::MathOverflow)?;
                }
                if in_balance != out_balance {
                    return Err(Error::ResultNotBalanced);
                }
                Ok(())
            }
        }
    }

    fn admit_vote(&mut self, op: VoteCheck) -> Result<VoteOutcome> {
        let table_id = op.table();
        let voter = op.voter();
        let table = self.store.table(table_id)?;
        let owner = self.store.room(table.room)?.owner;
        let is_witness = self.store.witness_for_voter(table, voter).is_some();
        if self.store.collector(table_id).is_none() && voter != owner && !is_witness {
            debug!("Table {} parked a pending vote from {}", table_id, voter);
            self.store
                .pending_votes
                .insert((table_id, voter), PendingVote { table: table_id, voter, op });
            return Ok(VoteOutcome::Pending);
        }
        let kind = match &op {
            VoteCheck::Start(_) => VoteKind::Start,
            VoteCheck::Result(_) => VoteKind::Result,
        };
        self.collect_vote(table_id, voter, op.data(), kind)?;
        self.drain_pending(table_id, kind)?;
        self.schedule_if_ready(table_id)?;
        Ok(VoteOutcome::Collected)
    }

    fn collect_vote(
        &mut self,
        table_id: TableId,
        voter: AccountId,
        data: VoteData,
        kind: VoteKind,
    ) -> Result<()> {
        if self.store.collector(table_id).is_none() {
            let now = self.ledger.head_time();
            let table = self.store.table(table_id)?;
            let owner = self.store.room(table.room)?.owner;
            let (ttl, substitution_percent) = match kind {
                VoteKind::Start => (
                    self.params.voting_for_playing_expiration_seconds,
                    self.params
                        .percentage_of_voter_witness_substitution_while_voting_for_playing,
                ),
                VoteKind::Result => (
                    self.params.voting_for_results_expiration_seconds,
                    self.params
                        .percentage_of_voter_witness_substitution_while_voting_for_results,
                ),
            };
            let seeded_witnesses = match kind {
                VoteKind::Start => BTreeSet::new(),
                VoteKind::Result => table.voted_witnesses.clone(),
            };
            let mut collector =
                VoteCollector::new(table_id, kind, now, now + ttl as u64, seeded_witnesses);
            match (&data, kind) {
                (VoteData::Initial(initial), VoteKind::Start) if voter == owner => {
                    collector.seed_required_voters(
                        initial.cash.keys().copied().collect(),
                        substitution_percent,
                    );
                    collector.owner_proposal = Some(initial.clone());
                }
                _ => {
                    let required = table
                        .playing_cash
                        .keys()
                        .map(|&player| self.store.player_account(player))
                        .collect::<Result<BTreeSet<_>>>()?;
                    collector.seed_required_voters(required, substitution_percent);
                }
            }
            debug!("Table {} opened a collector, kind {:?}", table_id, kind);
            self.store.collectors.insert(table_id, collector);
        }
        let table = self.store.table(table_id)?;
        let witness = self.store.witness_for_voter(table, voter);
        let collector = self
            .store
            .collectors
            .get_mut(&table_id)
            .ok_or_else(|| Error::InternalError("collector vanished mid-collection".into()))?;
        collector.record_vote(voter, witness, data);
        Ok(())
    }

    /// Re-apply admission to every pending vote of the table against
    /// the now-open collector; invalid entries are dropped with a
    /// `fail_vote` event, never re-queued.
    fn drain_pending(&mut self, table_id: TableId, kind: VoteKind) -> Result<()> {
        let cap =
            self.params.maximum_desired_number_of_players_for_tables_allocation as usize * 2;
        let keys = self.store.pending_vote_keys(table_id, cap);
        for key in keys {
            let Some(pending) = self.store.pending_votes.remove(&key) else {
                continue;
            };
            let voter = pending.voter;
            let admitted = self
                .check_pending_vote(table_id, &pending.op, kind)
                .and_then(|data| self.collect_vote(table_id, voter, data, kind));
            if admitted.is_err() {
                let owner = self.store.table_owner(table_id)?;
                warn!("Table {} dropped an invalid pending vote from {}", table_id, voter);
                self.ledger
                    .append_event(table_id, owner, GameEvent::FailVote { voter });
            }
        }
        Ok(())
    }

    fn check_pending_vote(
        &self,
        table_id: TableId,
        op: &VoteCheck,
        kind: VoteKind,
    ) -> Result<VoteData> {
        let kind_matches = matches!(
            (op, kind),
            (VoteCheck::Start(_), VoteKind::Start) | (VoteCheck::Result(_), VoteKind::Result)
        );
        if !kind_matches {
            return Err(Error::StaleVote);
        }
        let voter = op.voter();
        let table = self.store.table(table_id)?;
        let owner = self.store.room(table.room)?.owner;
        let collector = self
            .store
            .collector(table_id)
            .ok_or_else(|| Error::InternalError("pending drain without a collector".into()))?;
        let eligible = collector.required_player_voters.contains(&voter)
            || voter == owner
            || self.store.witness_for_voter(table, voter).is_some();
        if !eligible {
            return Err(Error::InvalidVoter(voter));
        }
        let data = op.data();
        self.validate_invariants(table_id, &data)?;
        Ok(data)
    }

    /// Once the collector first has enough voters, defer the tally by
    /// one block so stragglers in the same block still count.
    fn schedule_if_ready(&mut self, table_id: TableId) -> Result<()> {
        let required_witnesses = self.store.table(table_id)?.required_witnesses;
        let Some(collector) = self.store.collector(table_id) else {
            return Ok(());
        };
        if collector.scheduled_voting != TIME_MAX
            || !collector.is_tally_ready(required_witnesses)
        {
            return Ok(());
        }
        let interval = self.ledger.block_interval();
        let scheduled = self.ledger.head_time() + interval;
        let collector = self
            .store
            .collectors
            .get_mut(&table_id)
            .ok_or_else(|| Error::InternalError("collector vanished while scheduling".into()))?;
        collector.scheduled_voting = scheduled;
        if collector.expiration <= scheduled {
            // the scheduled tally must not find itself expired
            collector.expiration = scheduled + interval;
        }
        debug!("Table {} tally scheduled at {}", table_id, scheduled);
        Ok(())
    }

    // ---- tally ----

    fn run_scheduled_tally(&mut self, table_id: TableId) -> Result<()> {
        let Some(collector) = self.store.collectors.remove(&table_id) else {
            return Ok(());
        };
        let owner = self.store.table_owner(table_id)?;
        match collector.kind {
            VoteKind::Start => {
                let tally =
                    self.tally(table_id, &collector, self.params.voting_for_playing_required_percent)?;
                match tally {
                    Some(tally) => self.apply_start_consensus(table_id, owner, tally)?,
                    None => {
                        warn!("Table {} start-vote tally reached no consensus", table_id);
                        self.ledger
                            .append_event(table_id, owner, GameEvent::FailConsensusStart);
                        self.cleanup_pending_votes(table_id)?;
                    }
                }
            }
            VoteKind::Result => {
                let tally =
                    self.tally(table_id, &collector, self.params.voting_for_results_required_percent)?;
                match tally {
                    Some(tally) => self.apply_result_consensus(table_id, owner, tally)?,
                    None => {
                        warn!("Table {} result-vote tally reached no consensus", table_id);
                        self.ledger
                            .append_event(table_id, owner, GameEvent::FailConsensusResult);
                        self.rollback(table_id, false)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn expire_collector(&mut self, table_id: TableId) -> Result<()> {
        let Some(collector) = self.store.collectors.remove(&table_id) else {
            return Ok(());
        };
        let owner = self.store.table_owner(table_id)?;
        match collector.kind {
            VoteKind::Start => {
                warn!("Table {} start-vote collector expired", table_id);
                self.ledger
                    .append_event(table_id, owner, GameEvent::FailExpireStart);
                self.rollback(table_id, false)?;
            }
            VoteKind::Result => {
                let table = self.store.table(table_id)?;
                let playing = table.playing_cash.len();
                let required = collector.required_player_voters.len();
                let salvage = playing >= required
                    && (playing - required) as u32 >= self.params.min_votes_for_results;
                if salvage {
                    if let Some(tally) = self.tally(
                        table_id,
                        &collector,
                        self.params.voting_for_results_required_percent,
                    )? {
                        info!("Table {} salvage tally accepted on expiry", table_id);
                        self.apply_result_consensus(table_id, owner, tally)?;
                        self.cleanup_pending_votes(table_id)?;
                        return Ok(());
                    }
                }
                warn!("Table {} result-vote collector expired", table_id);
                self.ledger
                    .append_event(table_id, owner, GameEvent::FailExpireResult);
                self.rollback(table_id, false)?;
            }
        }
        Ok(())
    }

    /// Deterministic fold of a collector: group votes by digest, check
    /// the dissent threshold, elect the canonical vote of the largest
    /// bucket.  `None` means no consensus.
    fn tally(
        &self,
        table_id: TableId,
        collector: &VoteCollector,
        required_percent: Percent,
    ) -> Result<Option<Tally>> {
        let total = collector.votes.len() as u64;
        if total == 0 {
            return Ok(None);
        }
        let mut buckets: BTreeMap<VoteDigest, Vec<(AccountId, VoteData)>> = BTreeMap::new();
        for (&account, vote) in &collector.votes {
            buckets
                .entry(vote.digest())
                .or_default()
                .push((account, vote.clone()));
        }
        let miss_percent = (buckets.len() as u64 - 1) * FULL_PERCENT as u64 / total;
        if miss_percent > (FULL_PERCENT - required_percent) as u64 {
            return Ok(None);
        }
        // ascending digest order: a size tie keeps the smaller digest
        let mut winner: Option<(VoteDigest, &Vec<(AccountId, VoteData)>)> = None;
        for (&digest, votes) in &buckets {
            if winner.as_ref().map_or(true, |(_, best)| votes.len() > best.len()) {
                winner = Some((digest, votes));
            }
        }
        let (digest, votes) = winner
            .ok_or_else(|| Error::InternalError("tally over an empty bucket map".into()))?;
        if digest.is_zero() {
            return Ok(None);
        }
        // first entry of the bucket has the smallest account id
        let valid_vote = votes[0].1.clone();
        let mut invalid = BTreeMap::new();
        for (bucket_digest, bucket) in &buckets {
            if *bucket_digest == digest {
                continue;
            }
            for (account, vote) in bucket {
                invalid.insert(*account, vote.clone());
            }
        }
        let table = self.store.table(table_id)?;
        let mut carried_witnesses = collector.voted_witnesses.clone();
        for &account in invalid.keys() {
            if let Some(witness) = self.store.witness_for_voter(table, account) {
                carried_witnesses.remove(&witness);
            }
        }
        Ok(Some(Tally { valid_vote, carried_witnesses, invalid }))
    }

    fn apply_start_consensus(
        &mut self,
        table_id: TableId,
        owner: AccountId,
        tally: Tally,
    ) -> Result<()> {
        let VoteData::Initial(initial) = tally.valid_vote else {
            return Err(Error::InternalError("start tally elected a result vote".into()));
        };
        let moves = initial
            .cash
            .iter()
            .map(|(&account, &amount)| Ok((self.store.player_id(account)?, amount)))
            .collect::<Result<Vec<_>>>()?;
        let now = self.ledger.head_time();
        let lifetime = self.params.game_lifetime_limit_in_seconds as u64;
        let table = self.store.table_mut(table_id)?;
        for &(player, amount) in &moves {
            table.move_to_play(player, amount)?;
        }
        table.voted_witnesses = tally.carried_witnesses;
        table.game_created = now;
        table.game_expiration = now + lifetime;
        info!(
            "Table {} start-playing consensus applied, {} players in hand",
            table_id,
            moves.len()
        );
        self.ledger.append_event(
            table_id,
            owner,
            GameEvent::StartPlayingValidated { initial: initial.clone() },
        );
        for (&account, vote) in &tally.invalid {
            let fail_info = match vote {
                VoteData::Initial(data) => data.info.clone(),
                VoteData::Result(_) => String::new(),
            };
            warn!("Table {} start-vote fraud from {}", table_id, account);
            self.ledger.append_event(
                table_id,
                owner,
                GameEvent::FraudStartCheck {
                    account,
                    fail_info,
                    valid_info: initial.info.clone(),
                },
            );
        }
        Ok(())
    }

    fn apply_result_consensus(
        &mut self,
        table_id: TableId,
        owner: AccountId,
        tally: Tally,
    ) -> Result<()> {
        let VoteData::Result(mut result) = tally.valid_vote else {
            return Err(Error::InternalError("result tally elected a start vote".into()));
        };
        let valid_log = result.log.clone();
        if result.is_cancellation() {
            info!("Table {} hand cancelled by consensus", table_id);
            self.rollback(table_id, false)?;
        } else {
            self.pending_buyouts_resolve(table_id, owner, &mut result)?;
            let (room_id, table_metadata) = {
                let table = self.store.table(table_id)?;
                (table.room, table.metadata.clone())
            };
            let mut room_rake: Amount = 0;
            let mut payouts: Vec<(PlayerId, Amount)> = Vec::with_capacity(result.cash.len());
            for (&account, share) in &result.cash {
                let player = self.store.player_id(account)?;
                if share.rake > 0 {
                    room_rake = room_rake.checked_add(share.rake).ok_or(Error::MathOverflow)?;
                    let fee = PendingFee {
                        account,
                        table_metadata: table_metadata.clone(),
                        rake: share.rake,
                        room: room_id,
                        witnesses: tally.carried_witnesses.clone(),
                    };
                    self.store
                        .players
                        .get_mut(&player)
                        .ok_or_else(|| {
                            Error::InternalError(format!("dangling player id {}", player))
                        })?
                        .pending_fees
                        .push(fee);
                }
                payouts.push((player, share.cash));
            }
            {
                let room = self
                    .store
                    .rooms
                    .get_mut(&room_id)
                    .ok_or(Error::RoomNotFound(room_id))?;
                room.pending_rake = room
                    .pending_rake
                    .checked_add(room_rake)
                    .ok_or(Error::MathOverflow)?;
            }
            let table = self.store.table_mut(table_id)?;
            for (player, payout) in payouts {
                table.playing_cash.remove(&player);
                if payout > 0 {
                    table.seat(player, payout)?;
                }
            }
            // anything the result left in the hand goes back to seats
            let rest: Vec<(PlayerId, Amount)> =
                table.playing_cash.iter().map(|(&p, &a)| (p, a)).collect();
            for (player, amount) in rest {
                table.move_from_play(player, amount)?;
            }
            table.game_created = TIME_MIN;
            table.game_expiration = TIME_MAX;
            table.voted_witnesses.clear();
            self.buyins_resolve(table_id, false)?;
            info!("Table {} result consensus applied", table_id);
            self.ledger
                .append_event(table_id, owner, GameEvent::ResultValidated { result });
        }
        for (&account, vote) in &tally.invalid {
            let fail_log = match vote {
                VoteData::Result(data) => data.log.clone(),
                VoteData::Initial(_) => String::new(),
            };
            warn!("Table {} result-vote fraud from {}", table_id, account);
            self.ledger.append_event(
                table_id,
                owner,
                GameEvent::FraudResultCheck { account, fail_log, valid_log: valid_log.clone() },
            );
        }
        Ok(())
    }

    // ---- rollback & expiry ----

    /// Reverse the table: `full` refunds every chip to the accounts,
    /// otherwise in-hand chips return to their seats.  Pending
    /// buy-outs are flushed first against an empty result.
    pub(crate) fn rollback(&mut self, table_id: TableId, full: bool) -> Result<()> {
        let owner = self.store.table_owner(table_id)?;
        self.ledger.append_event(table_id, owner, GameEvent::Rollback);
        let mut consumed = GameResult::default();
        self.pending_buyouts_resolve(table_id, owner, &mut consumed)?;
        self.store.collectors.remove(&table_id);
        if full {
            let table = self.store.table(table_id)?;
            let mut totals: BTreeMap<PlayerId, Amount> = table.playing_cash.clone();
            for (&player, &amount) in &table.cash {
                let entry = totals.entry(player).or_insert(0);
                *entry = entry.checked_add(amount).ok_or(Error::MathOverflow)?;
            }
            for (&player, &total) in &totals {
                let account = self.store.player_account(player)?;
                self.ledger.append_event(
                    table_id,
                    owner,
                    GameEvent::BuyInReturn { account, amount: total },
                );
                self.ledger.adjust_balance(account, total as i128);
            }
            let table = self.store.table_mut(table_id)?;
            table.clear_play();
            table.cash.clear();
            table.game_created = TIME_MIN;
            table.game_expiration = TIME_MAX;
        } else {
            let entries: Vec<(PlayerId, Amount)> = self
                .store
                .table(table_id)?
                .playing_cash
                .iter()
                .map(|(&p, &a)| (p, a))
                .collect();
            for &(player, amount) in &entries {
                let account = self.store.player_account(player)?;
                self.ledger.append_event(
                    table_id,
                    owner,
                    GameEvent::GameCashReturn { account, amount },
                );
            }
            let table = self.store.table_mut(table_id)?;
            table.clear_play();
            for (player, amount) in entries {
                table.seat(player, amount)?;
            }
            table.game_created = TIME_MIN;
            table.game_expiration = TIME_MAX;
        }
        self.cleanup_pending_votes(table_id)?;
        self.buyins_resolve(table_id, full)
    }

    fn cleanup_pending_votes(&mut self, table_id: TableId) -> Result<()> {
        let keys = self.store.pending_vote_keys(table_id, usize::MAX);
        if keys.is_empty() {
            return Ok(());
        }
        let owner = self.store.table_owner(table_id)?;
        for key in keys {
            if let Some(pending) = self.store.pending_votes.remove(&key) {
                self.ledger
                    .append_event(table_id, owner, GameEvent::FailVote { voter: pending.voter });
            }
        }
        Ok(())
    }

    fn alive_for_table(&mut self, table_id: TableId) -> AliveId {
        let now = self.ledger.head_time();
        if let Ok(table) = self.store.table_mut(table_id) {
            table.last_alive = now;
        }
        self.store.next_alive_id()
    }
}
