mod api;
mod cluster;
mod consensus;
mod executor;
mod flusher;
mod lifecycle;
mod observer;
mod store;
mod timer;

#[cfg(test)]
mod testutil;

pub use api::start_replicated_log;
pub use api::ReplicatedLog;
pub use api::ReplicatedLogClient;
pub use api::ReplicatedLogConfig;
pub use api::ReplicatedLogOptions;
pub use api::StartupError;
pub use api::WriteError;
pub use api::WriteHandle;
pub use api::WriteOutcome;
pub use api::WriteResult;
pub use cluster::ClusterSender;
pub use cluster::MemberInfo;
pub use cluster::NoopCluster;
pub use cluster::PeerMap;
pub use cluster::TransportError;
pub use consensus::CoreConfig;
pub use consensus::CoreError;
pub use consensus::Entry;
pub use consensus::HardState;
pub use consensus::Message;
pub use consensus::NodeId;
pub use consensus::NodeInfo;
pub use consensus::RaftCore;
pub use consensus::Ready;
pub use consensus::SingleNodeCore;
pub use executor::CommandError;
pub use flusher::FatalSignal;
pub use flusher::FlushFatal;
pub use store::InMemoryLogStore;
pub use store::LogStore;

// The crate root holds no code: only `mod` statements and individual
// `pub use` exports, so each module is free to organize its internals.
