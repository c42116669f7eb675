use crate::consensus::raft_core::{CoreConfig, CoreError, RaftCore};
use crate::consensus::types::{Entry, HardState, Message, NodeId, NodeInfo, Ready};
use bytes::Bytes;

/// A deterministic [`RaftCore`] for single-member groups. A quorum of one
/// means every appended entry is committed as soon as it exists, which makes
/// this core useful for local demos and for exercising the apply pipeline
/// end to end without a real consensus library.
///
/// It deliberately implements no replication: `step` rejects everything and
/// no outbound messages are ever produced.
pub struct SingleNodeCore {
    id: NodeId,
    election_tick: u32,
    idle_ticks: u32,

    term: u64,
    vote: Option<NodeId>,
    leader: Option<NodeId>,
    last_index: u64,
    commit: u64,

    // Side effects accumulated since the last take_ready().
    pending_entries: Vec<Entry>,
    hard_state_dirty: bool,
    announced_commit: u64,
}

impl SingleNodeCore {
    pub fn new(config: CoreConfig) -> Self {
        SingleNodeCore {
            id: config.id,
            election_tick: config.election_tick,
            idle_ticks: 0,
            term: 0,
            vote: None,
            leader: None,
            last_index: 0,
            commit: 0,
            pending_entries: Vec::new(),
            hard_state_dirty: false,
            announced_commit: 0,
        }
    }

    fn append(&mut self, payload: Bytes) {
        self.last_index += 1;
        self.pending_entries.push(Entry {
            term: self.term,
            index: self.last_index,
            payload,
        });
        // Single voter: the entry is replicated to a quorum by existing.
        self.commit = self.last_index;
        self.hard_state_dirty = true;
    }
}

impl RaftCore for SingleNodeCore {
    fn propose(&mut self, payload: Bytes) -> Result<(), CoreError> {
        if self.leader != Some(self.id) {
            return Err(CoreError::ProposalDropped(
                "no elected leader to accept the proposal".to_string(),
            ));
        }
        self.append(payload);
        Ok(())
    }

    fn step(&mut self, message: Message) -> Result<(), CoreError> {
        if message.from == self.id {
            return Err(CoreError::StepLocalMessage);
        }
        Err(CoreError::UnknownPeer(message.from))
    }

    fn tick(&mut self) {
        if self.leader.is_some() {
            return;
        }
        self.idle_ticks += 1;
        if self.idle_ticks >= self.election_tick {
            self.campaign();
        }
    }

    fn campaign(&mut self) {
        if self.leader == Some(self.id) {
            return;
        }
        self.idle_ticks = 0;
        self.term += 1;
        self.vote = Some(self.id);
        self.leader = Some(self.id);
        self.hard_state_dirty = true;
        // The new leader appends an empty entry to commit earlier terms.
        self.append(Bytes::new());
    }

    fn take_ready(&mut self) -> Option<Ready> {
        let commit_index = if self.commit > self.announced_commit {
            self.announced_commit = self.commit;
            Some(self.commit)
        } else {
            None
        };

        let hard_state = if self.hard_state_dirty {
            self.hard_state_dirty = false;
            Some(HardState {
                term: self.term,
                vote: self.vote,
                commit: self.commit,
            })
        } else {
            None
        };

        let ready = Ready {
            entries: std::mem::take(&mut self.pending_entries),
            hard_state,
            messages: Vec::new(),
            commit_index,
        };

        if ready.is_empty() {
            None
        } else {
            Some(ready)
        }
    }

    fn info(&self) -> NodeInfo {
        NodeInfo {
            local_id: self.id,
            leader_id: self.leader,
            last_log_index: self.last_index,
            term: self.term,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_node_config() -> CoreConfig {
        CoreConfig {
            id: NodeId::new(1),
            peers: vec![NodeId::new(1)],
            election_tick: 10,
            heartbeat_tick: 1,
        }
    }

    #[test]
    fn campaign_elects_self_and_appends_noop() {
        let mut core = SingleNodeCore::new(single_node_config());
        core.campaign();

        let info = core.info();
        assert!(info.is_leader());
        assert_eq!(1, info.last_log_index);

        let ready = core.take_ready().expect("campaign produces a ready");
        assert_eq!(1, ready.entries.len());
        assert_eq!(Some(1), ready.commit_index);
        assert!(ready.hard_state.is_some());

        // Drained; nothing new until the next transition.
        assert!(core.take_ready().is_none());
    }

    #[test]
    fn propose_without_leader_is_rejected() {
        let mut core = SingleNodeCore::new(single_node_config());
        let result = core.propose(Bytes::from_static(b"a"));
        assert!(matches!(result, Err(CoreError::ProposalDropped(_))));
    }

    #[test]
    fn election_tick_triggers_campaign() {
        let mut core = SingleNodeCore::new(single_node_config());
        for _ in 0..10 {
            core.tick();
        }
        assert!(core.info().is_leader());
    }
}
