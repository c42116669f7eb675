use crate::cluster::ClusterSender;
use crate::consensus::{Message, Ready};
use crate::observer::CommitObserver;
use crate::store::LogStore;
use std::io;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Unrecoverable pipeline failure. Continuing past a failed persist would
/// risk acknowledging a write that is not durable, so the flusher halts and
/// surfaces this through the [`FatalSignal`]; the process is expected to
/// crash and replay from the log store on restart.
#[derive(Debug, thiserror::Error)]
pub enum FlushFatal {
    #[error("failed to persist log entries")]
    EntryPersistence(#[source] io::Error),

    #[error("failed to persist hard state")]
    HardStatePersistence(#[source] io::Error),
}

/// Resolves if the ready flusher hits an unrecoverable failure.
pub struct FatalSignal {
    receiver: oneshot::Receiver<FlushFatal>,
}

impl FatalSignal {
    /// Waits for a fatal pipeline failure. Returns `None` if the pipeline
    /// shut down cleanly instead.
    pub async fn wait(self) -> Option<FlushFatal> {
        self.receiver.await.ok()
    }
}

pub fn create(
    logger: slog::Logger,
    store: Arc<dyn LogStore>,
    cluster: Arc<dyn ClusterSender>,
    observer: Arc<CommitObserver>,
) -> (mpsc::UnboundedSender<Ready>, ReadyFlusher, FatalSignal) {
    let (ready_tx, ready_rx) = mpsc::unbounded_channel();
    let (fatal_tx, fatal_rx) = oneshot::channel();

    let flusher = ReadyFlusher {
        logger,
        queue: ready_rx,
        store,
        cluster,
        observer,
        fatal_tx,
    };

    (ready_tx, flusher, FatalSignal { receiver: fatal_rx })
}

/// ReadyFlusher turns each ready batch into durable state, peer traffic,
/// and waiter fulfillment, in that order:
///
/// 1. persist new entries
/// 2. persist the hard-state change
/// 3. broadcast outbound messages (each send independent, best-effort)
/// 4. advance the commit observer
///
/// Step 4 never runs for a batch whose steps 1-2 did not succeed; that is
/// the durability-before-acknowledgment invariant.
pub struct ReadyFlusher {
    logger: slog::Logger,
    queue: mpsc::UnboundedReceiver<Ready>,
    store: Arc<dyn LogStore>,
    cluster: Arc<dyn ClusterSender>,
    observer: Arc<CommitObserver>,
    fatal_tx: oneshot::Sender<FlushFatal>,
}

impl ReadyFlusher {
    /// Worker loop. Batches are consumed in production order. On stop,
    /// batches already enqueued are still flushed so nothing with a
    /// dependent waiter is silently dropped.
    pub async fn run(mut self, mut stop: oneshot::Receiver<()>) {
        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    self.queue.close();
                    break self.drain().await;
                }
                maybe_ready = self.queue.recv() => match maybe_ready {
                    Some(ready) => {
                        if let Err(fatal) = self.process(ready).await {
                            break Err(fatal);
                        }
                    }
                    None => break Ok(()),
                },
            }
        };

        match outcome {
            Ok(()) => slog::info!(self.logger, "ready flusher worker exiting"),
            Err(fatal) => {
                slog::crit!(self.logger, "ready flusher halting"; "error" => %fatal);
                // Waiters for unpersisted batches must not hang; fail them
                // all, then surface the fatal condition.
                self.observer.stop();
                let _ = self.fatal_tx.send(fatal);
            }
        }
    }

    async fn drain(&mut self) -> Result<(), FlushFatal> {
        while let Some(ready) = self.queue.recv().await {
            self.process(ready).await?;
        }
        Ok(())
    }

    async fn process(&mut self, ready: Ready) -> Result<(), FlushFatal> {
        if !ready.entries.is_empty() {
            self.store
                .append_entries(&ready.entries)
                .map_err(FlushFatal::EntryPersistence)?;
        }

        if let Some(hard_state) = &ready.hard_state {
            self.store
                .save_hard_state(hard_state)
                .map_err(FlushFatal::HardStatePersistence)?;
        }

        if !ready.messages.is_empty() {
            self.broadcast(ready.messages).await;
        }

        if let Some(commit_index) = ready.commit_index {
            self.observer.notify(commit_index);
        }

        Ok(())
    }

    /// Each send is independent: a failure to reach one peer is logged and
    /// neither blocks the other sends nor rolls back persistence. The
    /// protocol's own heartbeat/retry traffic resends what matters.
    async fn broadcast(&self, messages: Vec<Message>) {
        for message in messages {
            let to = message.to;
            if let Err(e) = self.cluster.async_send(to, message).await {
                slog::warn!(self.logger, "broadcast to peer failed"; "peer" => %to, "error" => %e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::TransportError;
    use crate::consensus::{Entry, NodeId};
    use crate::api::WriteOutcome;
    use crate::store::InMemoryLogStore;
    use crate::testutil;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    struct FailingStore;

    impl LogStore for FailingStore {
        fn append_entries(&self, _entries: &[Entry]) -> Result<(), io::Error> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }

        fn save_hard_state(
            &self,
            _hard_state: &crate::consensus::HardState,
        ) -> Result<(), io::Error> {
            Ok(())
        }
    }

    /// Fails sends to one peer, records every attempt.
    struct FlakyCluster {
        broken_peer: NodeId,
        attempts: Mutex<Vec<NodeId>>,
    }

    #[async_trait]
    impl ClusterSender for FlakyCluster {
        async fn async_send(&self, to: NodeId, _message: Message) -> Result<(), TransportError> {
            self.attempts.lock().unwrap().push(to);
            if to == self.broken_peer {
                Err(TransportError::NoRoute(to))
            } else {
                Ok(())
            }
        }
    }

    fn entry(index: u64) -> Entry {
        Entry {
            term: 1,
            index,
            payload: Bytes::from_static(b"a"),
        }
    }

    fn message_to(to: u64) -> Message {
        Message {
            to: NodeId::new(to),
            from: NodeId::new(1),
            term: 1,
            body: Bytes::new(),
        }
    }

    struct Fixture {
        ready_tx: mpsc::UnboundedSender<Ready>,
        observer: Arc<CommitObserver>,
        fatal: FatalSignal,
        stop_tx: oneshot::Sender<()>,
    }

    fn spawn_flusher(store: Arc<dyn LogStore>, cluster: Arc<dyn ClusterSender>) -> Fixture {
        let observer = Arc::new(CommitObserver::new(testutil::logger()));
        let (ready_tx, flusher, fatal) =
            create(testutil::logger(), store, cluster, observer.clone());
        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(flusher.run(stop_rx));

        Fixture {
            ready_tx,
            observer,
            fatal,
            stop_tx,
        }
    }

    #[tokio::test]
    async fn entries_are_durable_before_waiter_fulfillment() {
        let store = Arc::new(InMemoryLogStore::new());
        let fixture = spawn_flusher(store.clone(), Arc::new(crate::cluster::NoopCluster));

        let (tx, rx) = oneshot::channel();
        fixture.observer.register(
            (1, 2),
            fixture.observer.allocate_token(),
            WriteOutcome { term: 1, index: 2 },
            tx,
        );

        fixture
            .ready_tx
            .send(Ready {
                entries: vec![entry(1), entry(2)],
                hard_state: None,
                messages: vec![],
                commit_index: Some(2),
            })
            .unwrap();

        rx.await.unwrap().unwrap();
        // Fulfillment is ordered after the append returned, so both
        // entries must already be in the store.
        assert_eq!(2, store.entry_count());
    }

    #[tokio::test]
    async fn broadcast_failure_is_isolated() {
        let store = Arc::new(InMemoryLogStore::new());
        let cluster = Arc::new(FlakyCluster {
            broken_peer: NodeId::new(2),
            attempts: Mutex::new(Vec::new()),
        });
        let fixture = spawn_flusher(store.clone(), cluster.clone());

        let (tx, rx) = oneshot::channel();
        fixture.observer.register(
            (1, 1),
            fixture.observer.allocate_token(),
            WriteOutcome { term: 1, index: 1 },
            tx,
        );

        fixture
            .ready_tx
            .send(Ready {
                entries: vec![entry(1)],
                hard_state: None,
                messages: vec![message_to(2), message_to(3)],
                commit_index: Some(1),
            })
            .unwrap();

        // The failed send to peer 2 blocked neither persistence, nor the
        // send to peer 3, nor the commit notification.
        rx.await.unwrap().unwrap();
        assert_eq!(1, store.entry_count());
        assert_eq!(
            vec![NodeId::new(2), NodeId::new(3)],
            cluster.attempts.lock().unwrap().clone()
        );
    }

    #[tokio::test]
    async fn persistence_failure_is_fatal_and_never_notifies() {
        let fixture = spawn_flusher(Arc::new(FailingStore), Arc::new(crate::cluster::NoopCluster));

        let (tx, rx) = oneshot::channel();
        fixture.observer.register(
            (1, 1),
            fixture.observer.allocate_token(),
            WriteOutcome { term: 1, index: 1 },
            tx,
        );

        fixture
            .ready_tx
            .send(Ready {
                entries: vec![entry(1)],
                hard_state: None,
                messages: vec![],
                commit_index: Some(1),
            })
            .unwrap();

        let fatal = fixture.fatal.wait().await.expect("fatal must fire");
        assert!(matches!(fatal, FlushFatal::EntryPersistence(_)));

        // The waiter was failed, not fulfilled.
        assert!(matches!(
            rx.await.unwrap(),
            Err(crate::api::WriteError::Stopped)
        ));
    }

    #[tokio::test]
    async fn batches_enqueued_before_stop_are_flushed() {
        let store = Arc::new(InMemoryLogStore::new());
        let fixture = spawn_flusher(store.clone(), Arc::new(crate::cluster::NoopCluster));

        fixture
            .ready_tx
            .send(Ready {
                entries: vec![entry(1)],
                hard_state: None,
                messages: vec![],
                commit_index: Some(1),
            })
            .unwrap();
        let _ = fixture.stop_tx.send(());

        // Clean exit drops the fatal sender without firing it.
        assert!(fixture.fatal.wait().await.is_none());
        assert_eq!(1, store.entry_count());
    }
}
