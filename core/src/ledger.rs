use cardroom_api::event::GameEvent;
use cardroom_api::types::{AccountId, TableId, Timestamp};

/// The boundary between the engine and the host ledger.
///
/// Every method is synchronous and deterministic: the engine runs
/// inside the host's block-application transaction and a failure to
/// persist is fatal to the whole block, so there is nothing for the
/// engine to retry or await.
pub trait Ledger {
    /// Timestamp of the block currently being applied.  Monotonic
    /// across blocks.
    fn head_time(&self) -> Timestamp;

    /// The host chain's block interval in seconds.  Used to defer a
    /// scheduled tally by exactly one block.
    fn block_interval(&self) -> u64;

    /// Per-block deterministic seed.  Consumed by the external table
    /// allocator; the voting engine itself never reads it.
    fn entropy(&self) -> u64;

    /// Move native asset into or out of an account.  Must be total:
    /// the host guarantees the account exists and absorbs any delta
    /// the engine has already validated.
    fn adjust_balance(&mut self, account: AccountId, delta: i128);

    /// Append one entry to the per-account audit log.  Entries get
    /// strictly increasing ids in append order.
    fn append_event(&mut self, table: TableId, owner: AccountId, event: GameEvent);
}
