//! Boundary types for the external consensus decision engine. The algorithm
//! itself (elections, log matching, term bookkeeping) lives behind the
//! [`RaftCore`] trait; this crate only drives it and flushes what it emits.
mod raft_core;
mod single_node;
mod types;

pub use raft_core::CoreConfig;
pub use raft_core::CoreError;
pub use raft_core::RaftCore;
pub use single_node::SingleNodeCore;
pub use types::Entry;
pub use types::HardState;
pub use types::Message;
pub use types::NodeId;
pub use types::NodeInfo;
pub use types::Ready;
