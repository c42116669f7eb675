mod peers;
mod sender;

pub use peers::MemberInfo;
pub use peers::PeerMap;
pub use sender::ClusterSender;
pub use sender::NoopCluster;
pub use sender::TransportError;
