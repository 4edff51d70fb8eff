use std::collections::BTreeSet;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use cardroom_api::types::{AccountId, Amount, PlayerId, RoomId, TableId, WitnessId};

use crate::error::{Error, Result};

/// Semver with an optional build tag, e.g. `1.4.0` or `1.4.0+poker.2`.
#[derive(Debug, Default, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: Option<String>,
}

impl FromStr for ProtocolVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedProtocolVersion(s.to_string());
        let (version, build) = match s.split_once('+') {
            Some((v, b)) if !b.is_empty() => (v, Some(b.to_string())),
            Some(_) => return Err(malformed()),
            None => (s, None),
        };
        let mut parts = version.split('.');
        let mut next = || -> Result<u32> {
            parts
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(malformed)
        };
        let parsed = Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
            build,
        };
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(parsed)
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

/// Rake owed to the platform for one validated hand, waiting for the
/// maintenance-time distribution pass.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PendingFee {
    pub account: AccountId,
    pub table_metadata: String,
    pub rake: Amount,
    pub room: RoomId,
    pub witnesses: BTreeSet<WitnessId>,
}

/// A hosting container for tables, owned by one account.  The owner's
/// account doubles as the game-witness principal for other rooms.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Room {
    pub id: RoomId,
    pub owner: AccountId,
    pub metadata: String,
    pub protocol_version: ProtocolVersion,
    /// Updated by the rating subsystem at maintenance.
    pub rating: i64,
    pub pending_rake: Amount,
    pub tables: Vec<TableId>,
}

impl Room {
    pub fn new(
        id: RoomId,
        owner: AccountId,
        metadata: impl Into<String>,
        protocol_version: ProtocolVersion,
    ) -> Self {
        Self {
            id,
            owner,
            metadata: metadata.into(),
            protocol_version,
            rating: 0,
            pending_rake: 0,
            tables: Vec::new(),
        }
    }
}

/// A player principal.  The link to its account is immutable.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Player {
    pub id: PlayerId,
    pub account: AccountId,
    pub pending_fees: Vec<PendingFee>,
}

impl Player {
    pub fn new(id: PlayerId, account: AccountId) -> Self {
        Self {
            id,
            account,
            pending_fees: Vec::new(),
        }
    }
}

/// A game-witness principal, created implicitly when an account first
/// owns a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Witness {
    pub id: WitnessId,
    pub account: AccountId,
}
