use crate::consensus::NodeId;
use std::collections::HashMap;
use std::net::SocketAddr;

/// Static description of one cluster member.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub id: NodeId,
    pub address: SocketAddr,
}

/// PeerMap is the id -> address book a transport implementation resolves
/// against. Owned by the transport collaborator; the pipeline itself only
/// ever addresses peers by id.
#[derive(Debug, Clone, Default)]
pub struct PeerMap {
    addresses: HashMap<NodeId, SocketAddr>,
}

impl PeerMap {
    pub fn new(members: impl IntoIterator<Item = MemberInfo>) -> Self {
        let addresses = members.into_iter().map(|m| (m.id, m.address)).collect();
        PeerMap { addresses }
    }

    pub fn address_of(&self, id: NodeId) -> Option<SocketAddr> {
        self.addresses.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.addresses.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
