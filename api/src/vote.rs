//! Vote payloads and the content digest used to compare them.
//!
//! Two votes agree iff their digests agree.  The digest is computed
//! over the borsh encoding of the payload: length-prefixed strings,
//! little-endian integers, map entries in key order.  Any client that
//! reproduces this encoding byte-for-byte reaches the same buckets at
//! tally time.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{AccountId, Amount};

pub const DIGEST_LEN: usize = 20;

/// 160-bit content digest of a vote payload.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    BorshSerialize, BorshDeserialize,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoteDigest(pub [u8; DIGEST_LEN]);

impl VoteDigest {
    pub const ZERO: VoteDigest = VoteDigest([0u8; DIGEST_LEN]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    fn of_bytes(bytes: &[u8]) -> Self {
        let output = Sha256::digest(bytes);
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&output[..DIGEST_LEN]);
        VoteDigest(digest)
    }
}

impl std::fmt::Display for VoteDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// The payload of a start-vote: the intended lineup with the stake
/// each player commits, plus free-form dealing info.
#[derive(Debug, Default, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameInitial {
    pub cash: BTreeMap<AccountId, Amount>,
    pub info: String,
}

impl GameInitial {
    pub fn new(cash: BTreeMap<AccountId, Amount>, info: impl Into<String>) -> Self {
        Self {
            cash,
            info: info.into(),
        }
    }

    pub fn digest(&self) -> VoteDigest {
        VoteDigest::of_bytes(&borsh::to_vec(self).unwrap())
    }
}

/// Per-player outcome inside a result-vote.  `cash` returns to the
/// player's seat, `rake` goes to the room.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GamerResult {
    pub cash: Amount,
    pub rake: Amount,
}

impl GamerResult {
    pub fn new(cash: Amount, rake: Amount) -> Self {
        Self { cash, rake }
    }
}

/// The payload of a result-vote.  An empty `cash` map means "cancel
/// this hand": chips are returned to seats instead of being paid out.
#[derive(Debug, Default, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameResult {
    pub cash: BTreeMap<AccountId, GamerResult>,
    pub log: String,
}

impl GameResult {
    pub fn new(cash: BTreeMap<AccountId, GamerResult>, log: impl Into<String>) -> Self {
        Self {
            cash,
            log: log.into(),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.cash.is_empty()
    }

    pub fn digest(&self) -> VoteDigest {
        VoteDigest::of_bytes(&borsh::to_vec(self).unwrap())
    }
}

/// A vote as stored in a collector: either kind, compared by digest.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VoteData {
    Initial(GameInitial),
    Result(GameResult),
}

impl VoteData {
    pub fn digest(&self) -> VoteDigest {
        match self {
            VoteData::Initial(data) => data.digest(),
            VoteData::Result(data) => data.digest(),
        }
    }
}

impl From<GameInitial> for VoteData {
    fn from(data: GameInitial) -> Self {
        VoteData::Initial(data)
    }
}

impl From<GameResult> for VoteData {
    fn from(data: GameResult) -> Self {
        VoteData::Result(data)
    }
}
