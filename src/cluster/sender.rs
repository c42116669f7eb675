use crate::consensus::{Message, NodeId};
use async_trait::async_trait;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no route to peer {0}")]
    NoRoute(NodeId),

    #[error("send to peer {0} failed")]
    SendFailed(NodeId, #[source] io::Error),
}

/// ClusterSender delivers protocol messages to peers, fire-and-forget.
///
/// A send failure is non-fatal to the caller: the consensus protocol's own
/// retry and heartbeat traffic makes every message redeliverable, so the
/// flusher logs failures and moves on.
#[async_trait]
pub trait ClusterSender: Send + Sync {
    async fn async_send(&self, to: NodeId, message: Message) -> Result<(), TransportError>;
}

/// Transport for a cluster of one: there is no peer to talk to, so every
/// message is dropped on the floor.
pub struct NoopCluster;

#[async_trait]
impl ClusterSender for NoopCluster {
    async fn async_send(&self, _to: NodeId, _message: Message) -> Result<(), TransportError> {
        Ok(())
    }
}
