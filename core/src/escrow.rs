//! Buy-in / buy-out escrow.
//!
//! Chips move account → seat on buy-in, seat → account on buy-out.
//! While a hand is open a buy-out cannot touch committed chips, so it
//! parks as a pending buy-out and is consumed when the hand resolves:
//! from the player's share of the winning result first, then from the
//! seat, then from in-hand chips the result did not cover.

use std::cmp::min;

use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use cardroom_api::event::GameEvent;
use cardroom_api::types::{AccountId, Amount, PlayerId, TableId, Timestamp};
use cardroom_api::vote::GameResult;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::ledger::Ledger;

/// A seat reservation record.  Restarted on every direct buy-in; an
/// expired record returns the seat to the player's account at the next
/// maintenance, unless the player is in a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuyIn {
    pub created: Timestamp,
    pub expiration: Timestamp,
}

/// A buy-out waiting for the current hand to resolve.
#[derive(Debug, Default, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PendingBuyOut {
    pub amount: Amount,
    pub reason: String,
}

/// Funds reserved from a player's account against a table, waiting for
/// the owner to accept or the reservation to lapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuyInProposal {
    pub amount: Amount,
    pub created: Timestamp,
    pub expiration: Timestamp,
}

impl<'a, L: Ledger> Engine<'a, L> {
    /// Move chips from the player's account straight onto a seat.
    pub fn direct_buy_in(
        &mut self,
        player_account: AccountId,
        table_owner: AccountId,
        table_id: TableId,
        amount: Amount,
    ) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let player = self.store.player_id(player_account)?;
        if self.store.table_owner(table_id)? != table_owner {
            return Err(Error::WrongTableOwner);
        }
        let now = self.ledger.head_time();
        let expiration = now + self.params.buy_in_expiration_seconds as u64;
        self.ledger.adjust_balance(player_account, -(amount as i128));
        self.store.table_mut(table_id)?.seat(player, amount)?;
        self.store
            .buy_ins
            .insert((table_id, player), BuyIn { created: now, expiration });
        Ok(())
    }

    /// Take chips off the table.  Paid immediately when no hand and no
    /// vote is open; parked as a pending buy-out otherwise.
    pub fn buy_out(
        &mut self,
        player_account: AccountId,
        table_id: TableId,
        amount: Amount,
        reason: &str,
    ) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let player = self.store.player_id(player_account)?;
        let owner = self.store.table_owner(table_id)?;
        let table = self.store.table(table_id)?;
        if !table.is_waiting_at_table(player) && !table.is_playing_at_table(player) {
            return Err(Error::PlayerNotSeated(player_account));
        }
        let immediate = table.is_free() && self.store.collector(table_id).is_none();
        if immediate {
            let table = self.store.table_mut(table_id)?;
            table.unseat(player, amount)?;
            let seat_gone = !table.is_waiting_at_table(player);
            self.ledger.adjust_balance(player_account, amount as i128);
            self.ledger.append_event(
                table_id,
                owner,
                GameEvent::BuyOutAllowed { account: player_account, amount },
            );
            if seat_gone {
                self.store.buy_ins.remove(&(table_id, player));
            }
        } else {
            let pending = self
                .store
                .pending_buy_outs
                .entry((table_id, player))
                .or_default();
            pending.amount = pending.amount.checked_add(amount).ok_or(Error::MathOverflow)?;
            pending.reason = reason.to_string();
            debug!("Buy-out of {} for {} parked as pending", amount, player_account);
        }
        Ok(())
    }

    /// Reserve funds from the player's account against a table.
    pub fn reserve_buy_in(
        &mut self,
        player_account: AccountId,
        table_id: TableId,
        amount: Amount,
    ) -> Result<()> {
        let player = self.store.player_id(player_account)?;
        let table = self.store.table(table_id)?;
        if amount < table.min_accepted_proposal || amount == 0 {
            return Err(Error::ProposalTooSmall(table.min_accepted_proposal));
        }
        if self.store.proposals.contains_key(&(table_id, player)) {
            return Err(Error::DuplicatedProposal);
        }
        let now = self.ledger.head_time();
        let expiration =
            now + self.params.pending_buyin_proposal_lifetime_limit_in_seconds as u64;
        self.ledger.adjust_balance(player_account, -(amount as i128));
        self.store
            .proposals
            .insert((table_id, player), BuyInProposal { amount, created: now, expiration });
        Ok(())
    }

    /// Owner accepts a reservation: the reserved funds become a seat.
    pub fn resolve_buy_in(
        &mut self,
        table_owner: AccountId,
        table_id: TableId,
        player_account: AccountId,
    ) -> Result<()> {
        if self.store.table_owner(table_id)? != table_owner {
            return Err(Error::WrongTableOwner);
        }
        let player = self.store.player_id(player_account)?;
        let proposal = self
            .store
            .proposals
            .remove(&(table_id, player))
            .ok_or(Error::ProposalNotFound)?;
        let now = self.ledger.head_time();
        let expiration = now + self.params.buy_in_expiration_seconds as u64;
        self.store.table_mut(table_id)?.seat(player, proposal.amount)?;
        self.store
            .buy_ins
            .insert((table_id, player), BuyIn { created: now, expiration });
        Ok(())
    }

    /// Player withdraws a reservation; funds go back to the account.
    pub fn cancel_buy_in(
        &mut self,
        player_account: AccountId,
        table_id: TableId,
    ) -> Result<()> {
        let player = self.store.player_id(player_account)?;
        let proposal = self
            .store
            .proposals
            .remove(&(table_id, player))
            .ok_or(Error::ProposalNotFound)?;
        self.ledger.adjust_balance(player_account, proposal.amount as i128);
        Ok(())
    }

    /// Consume every pending buy-out of the table against `result`, in
    /// the order result-share, seat, in-hand chips.  Emits
    /// `buy_out_allowed` for the satisfied portion and `fraud_buy_out`
    /// for any remainder.
    pub(crate) fn pending_buyouts_resolve(
        &mut self,
        table_id: TableId,
        owner: AccountId,
        result: &mut GameResult,
    ) -> Result<()> {
        let keys: Vec<_> = self
            .store
            .pending_buy_outs
            .range((table_id, PlayerId(0))..)
            .take_while(|((table, _), _)| *table == table_id)
            .map(|(key, _)| *key)
            .collect();
        for key in keys {
            let (_, player) = key;
            let buyout = match self.store.pending_buy_outs.remove(&key) {
                Some(buyout) => buyout,
                None => continue,
            };
            let account = self.store.player_account(player)?;
            let mut rest = buyout.amount;

            if !result.cash.is_empty() {
                if let Some(share) = result.cash.get_mut(&account) {
                    let take = min(share.cash, rest);
                    share.cash -= take;
                    rest -= take;
                }
            }
            if rest > 0 {
                let table = self.store.table_mut(table_id)?;
                if let Some(&have) = table.cash.get(&player) {
                    let take = min(have, rest);
                    table.unseat(player, take)?;
                    rest -= take;
                }
            }
            if rest > 0 && !result.cash.contains_key(&account) {
                let table = self.store.table_mut(table_id)?;
                if let Some(&have) = table.playing_cash.get(&player) {
                    let take = min(have, rest);
                    table.deduct_play(player, take)?;
                    rest -= take;
                }
            }

            let allowed = buyout.amount - rest;
            if allowed > 0 {
                self.ledger.adjust_balance(account, allowed as i128);
                self.ledger.append_event(
                    table_id,
                    owner,
                    GameEvent::BuyOutAllowed { account, amount: allowed },
                );
            }
            if rest > 0 {
                self.ledger.append_event(
                    table_id,
                    owner,
                    GameEvent::FraudBuyOut { account, rest, allowed },
                );
            }
        }
        Ok(())
    }

    /// Drop buy-in records that no longer back a seat.  With `clear`
    /// every record of the table goes.
    pub(crate) fn buyins_resolve(&mut self, table_id: TableId, clear: bool) -> Result<()> {
        let keys: Vec<_> = self
            .store
            .buy_ins
            .range((table_id, PlayerId(0))..)
            .take_while(|((table, _), _)| *table == table_id)
            .map(|(key, _)| *key)
            .collect();
        for key in keys {
            let (_, player) = key;
            let seated = self.store.table(table_id)?.is_waiting_at_table(player);
            if clear || !seated {
                self.store.buy_ins.remove(&key);
            }
        }
        Ok(())
    }

    /// Return expired seats to their accounts.  Seats in a hand, and
    /// tables with an open vote, are left for the hand to resolve.
    pub(crate) fn expire_buy_ins(&mut self, now: Timestamp) -> Result<()> {
        let expired: Vec<_> = self
            .store
            .buy_ins
            .iter()
            .filter(|(_, buy_in)| buy_in.expiration <= now)
            .map(|(key, _)| *key)
            .collect();
        for (table_id, player) in expired {
            if self.store.collector(table_id).is_some() {
                continue;
            }
            let table = self.store.table(table_id)?;
            if table.is_playing_at_table(player) {
                continue;
            }
            let amount = table.cash.get(&player).copied().unwrap_or(0);
            if amount > 0 {
                let owner = self.store.table_owner(table_id)?;
                let account = self.store.player_account(player)?;
                self.store.table_mut(table_id)?.unseat(player, amount)?;
                self.ledger.adjust_balance(account, amount as i128);
                self.ledger
                    .append_event(table_id, owner, GameEvent::BuyInReturn { account, amount });
            }
            self.store.buy_ins.remove(&(table_id, player));
        }
        Ok(())
    }

    /// Refund reservations that lapsed without the owner accepting.
    pub(crate) fn expire_proposals(&mut self, now: Timestamp) -> Result<()> {
        let expired: Vec<_> = self
            .store
            .proposals
            .iter()
            .filter(|(_, proposal)| proposal.expiration <= now)
            .map(|(key, _)| *key)
            .collect();
        for (table_id, player) in expired {
            if let Some(proposal) = self.store.proposals.remove(&(table_id, player)) {
                let account = self.store.player_account(player)?;
                self.ledger.adjust_balance(account, proposal.amount as i128);
            }
        }
        Ok(())
    }
}
