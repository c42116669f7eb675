use crate::consensus::types::{Message, NodeId, NodeInfo, Ready};
use bytes::Bytes;

/// Configuration handed to whichever [`RaftCore`] implementation the
/// application wires in. Mirrors the conventional raft knobs: election
/// timeout and heartbeat interval are expressed in ticks.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub id: NodeId,
    pub peers: Vec<NodeId>,
    pub election_tick: u32,
    pub heartbeat_tick: u32,
}

/// Core-level rejection of a single operation. Local to the command that
/// triggered it; never escalates past the caller's completion handle.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("proposal dropped: {0}")]
    ProposalDropped(String),

    #[error("message from unknown peer {0}")]
    UnknownPeer(NodeId),

    #[error("cannot step a locally-generated message")]
    StepLocalMessage,
}

/// RaftCore is the opaque consensus decision engine this crate drives.
///
/// All methods take `&mut self`: the task executor's worker is the single
/// owner and the only caller of any of them. Implementations do not need
/// internal synchronization.
pub trait RaftCore: Send {
    /// Propose appending an opaque payload to the replicated log.
    fn propose(&mut self, payload: Bytes) -> Result<(), CoreError>;

    /// Advance the state machine with a protocol message from a peer.
    fn step(&mut self, message: Message) -> Result<(), CoreError>;

    /// Advance logical time by one tick.
    fn tick(&mut self);

    /// Start an election for the local node.
    fn campaign(&mut self);

    /// Drain the side effects produced since the last call, if any.
    fn take_ready(&mut self) -> Option<Ready>;

    /// Snapshot of the local node's identity and log position.
    fn info(&self) -> NodeInfo;
}
