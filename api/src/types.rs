use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Amounts are expressed in the smallest unit of the native asset.
pub type Amount = u64;

/// Seconds since the chain's genesis epoch, taken from block headers.
pub type Timestamp = u64;

pub type AliveId = u64;

/// Timestamp of a table with no running hand.
pub const TIME_MIN: Timestamp = 0;

/// Expiration of a table with no running hand.
pub const TIME_MAX: Timestamp = Timestamp::MAX;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            BorshSerialize, BorshDeserialize,
        )]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type! {
    /// A ledger account.  Accounts are created by the host chain; the
    /// arbitration core only references them.
    AccountId
}

id_type! {
    /// A player principal, wrapping exactly one account.
    PlayerId
}

id_type! {
    /// A game-witness principal.  Every account owning a room has one.
    WitnessId
}

id_type! {
    RoomId
}

id_type! {
    TableId
}
