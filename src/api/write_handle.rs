use crate::consensus::{CoreError, NodeId};
use crate::observer::{CommitObserver, WaiterToken};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time;
use tokio::time::Duration;

pub type WriteResult = Result<WriteOutcome, WriteError>;

/// Identity of a successfully committed write.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WriteOutcome {
    pub term: u64,
    pub index: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Retry against the indicated leader. The local core was not touched.
    #[error("writing to a non-leader node, leader is {leader_id:?}")]
    NotLeader { leader_id: Option<NodeId> },

    /// Core-level refusal, e.g. mid-configuration-change. Retryable.
    #[error("proposal rejected by consensus core")]
    ProposeRejected(#[source] CoreError),

    /// The pipeline is shutting down, or persistence failed fatally.
    #[error("replicated log is stopped")]
    Stopped,

    /// The entry did not commit within the configured write timeout. The
    /// write may still commit later; the outcome is unknown.
    #[error("write timed out before commit")]
    Timeout,
}

/// Handle for one in-flight write. Resolves exactly once: commit success,
/// a terminal error, or timeout.
pub struct WriteHandle {
    receiver: oneshot::Receiver<WriteResult>,
    token: WaiterToken,
    observer: Arc<CommitObserver>,
    timeout: Duration,
}

impl WriteHandle {
    pub(crate) fn new(
        receiver: oneshot::Receiver<WriteResult>,
        token: WaiterToken,
        observer: Arc<CommitObserver>,
        timeout: Duration,
    ) -> Self {
        WriteHandle {
            receiver,
            token,
            observer,
            timeout,
        }
    }

    /// Wait for the write to resolve.
    ///
    /// The timeout bounds the window in which a lost leadership change
    /// could otherwise leave the waiter pending forever: on expiry the
    /// waiter is deregistered and `Timeout` is returned. A commit that
    /// races the expiry may still land; `Timeout` means unknown outcome,
    /// not failure.
    pub async fn wait(mut self) -> WriteResult {
        match time::timeout(self.timeout, &mut self.receiver).await {
            Ok(Ok(result)) => result,
            // Completion sender dropped without resolving; only happens
            // when the pipeline is torn down.
            Ok(Err(_)) => Err(WriteError::Stopped),
            Err(_elapsed) => {
                self.observer.deregister(self.token);
                // A concurrent notify may have claimed the waiter just
                // before deregistration; prefer its result if present.
                match self.receiver.try_recv() {
                    Ok(result) => result,
                    Err(_) => Err(WriteError::Timeout),
                }
            }
        }
    }
}
