use bytes::Bytes;
use std::fmt;

/// NodeId identifies a member of the consensus group.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A log entry produced by the consensus core. The payload is opaque to the
/// pipeline; only the index matters for commit tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub term: u64,
    pub index: u64,
    pub payload: Bytes,
}

/// Durable per-node consensus state. Must be persisted before any message
/// that depends on it is acknowledged.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HardState {
    pub term: u64,
    pub vote: Option<NodeId>,
    pub commit: u64,
}

/// An outbound protocol message addressed to a single peer. The body is
/// opaque; the transport collaborator owns its encoding.
#[derive(Debug, Clone)]
pub struct Message {
    pub to: NodeId,
    pub from: NodeId,
    pub term: u64,
    pub body: Bytes,
}

/// Ready is the batch of side effects produced by one state transition of
/// the consensus core. Consumed exactly once by the ready flusher.
#[derive(Debug, Default)]
pub struct Ready {
    /// Newly appended entries, in index order. Must be persisted before
    /// `commit_index` is acted upon.
    pub entries: Vec<Entry>,
    /// Hard-state change, if any occurred during this transition.
    pub hard_state: Option<HardState>,
    /// Outbound messages to broadcast. Best-effort.
    pub messages: Vec<Message>,
    /// New commit index, present only when it advanced.
    pub commit_index: Option<u64>,
}

impl Ready {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.hard_state.is_none()
            && self.messages.is_empty()
            && self.commit_index.is_none()
    }
}

/// Read-only identity snapshot of the local node.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct NodeInfo {
    pub local_id: NodeId,
    pub leader_id: Option<NodeId>,
    pub last_log_index: u64,
    pub term: u64,
}

impl NodeInfo {
    pub fn is_leader(&self) -> bool {
        self.leader_id == Some(self.local_id)
    }
}
