use crate::api::write_handle::{WriteHandle, WriteResult};
use crate::consensus::{Message, NodeInfo};
use crate::executor::{Command, CommandError, ExecutorClient};
use crate::observer::CommitObserver;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Duration;

/// ReplicatedLog is the client-facing entry point of the apply pipeline.
///
/// A write is submitted as a task to the executor, which serializes it
/// against the consensus core; the returned handle resolves once the entry
/// is committed and durably persisted, or with a terminal error.
pub struct ReplicatedLog {
    client: ExecutorClient,
    observer: Arc<CommitObserver>,
    write_timeout: Duration,
}

impl ReplicatedLog {
    pub(crate) fn new(
        client: ExecutorClient,
        observer: Arc<CommitObserver>,
        write_timeout: Duration,
    ) -> Self {
        ReplicatedLog {
            client,
            observer,
            write_timeout,
        }
    }

    /// Submit an opaque payload for replication. Returns immediately; the
    /// caller suspends only when consuming the handle.
    pub fn async_write(&self, payload: Bytes) -> WriteHandle {
        let (completion, receiver) = oneshot::channel();
        let token = self.observer.allocate_token();

        self.client.submit(Command::Propose {
            payload,
            token,
            completion,
        });

        WriteHandle::new(receiver, token, self.observer.clone(), self.write_timeout)
    }

    /// Convenience: submit and wait in one call.
    pub async fn write(&self, payload: Bytes) -> WriteResult {
        self.async_write(payload).wait().await
    }

    /// Deliver a protocol message received from a peer. Called by the
    /// transport collaborator.
    pub async fn step(&self, message: Message) -> Result<(), CommandError> {
        let (completion, receiver) = oneshot::channel();
        self.client.submit(Command::Step {
            message,
            completion,
        });

        receiver.await.unwrap_or(Err(CommandError::Stopped))
    }

    /// Ask the core to start an election. Fire-and-forget.
    pub fn campaign(&self) {
        self.client.submit(Command::Campaign);
    }

    /// Identity snapshot of the local node, routed through the executor so
    /// only its worker ever touches the core.
    pub async fn info(&self) -> Result<NodeInfo, CommandError> {
        let (tx, rx) = oneshot::channel();
        self.client.submit(Command::Inspect(Box::new(move |core| {
            let _ = tx.send(core.info());
        })));

        rx.await.map_err(|_| CommandError::Stopped)
    }
}
