use crate::consensus::{Entry, HardState};
use std::io;

/// LogStore is the durable append-only store backing the replicated log.
///
/// Calls are synchronous and must not return until the data is durable by
/// the store's own definition; the ready flusher acknowledges nothing to
/// clients before these calls have returned success. Implementations must
/// be safe to share across threads.
pub trait LogStore: Send + Sync {
    /// Append newly produced entries, in index order.
    fn append_entries(&self, entries: &[Entry]) -> Result<(), io::Error>;

    /// Persist a hard-state change.
    fn save_hard_state(&self, hard_state: &HardState) -> Result<(), io::Error>;
}
