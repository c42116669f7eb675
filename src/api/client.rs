use crate::api::replicated_log::ReplicatedLog;
use crate::flusher::FatalSignal;
use crate::lifecycle::WorkerHandle;
use crate::observer::CommitObserver;
use crate::timer::TickDriver;
use std::sync::Arc;

/// Owning handle for a started pipeline: the facade plus lifecycle control
/// over its background workers.
pub struct ReplicatedLogClient {
    pub log: ReplicatedLog,
    fatal_signal: Option<FatalSignal>,
    timer: Option<TickDriver>,
    executor: WorkerHandle,
    flusher: WorkerHandle,
    observer: Arc<CommitObserver>,
}

impl ReplicatedLogClient {
    pub(super) fn new(
        log: ReplicatedLog,
        fatal_signal: FatalSignal,
        timer: TickDriver,
        executor: WorkerHandle,
        flusher: WorkerHandle,
        observer: Arc<CommitObserver>,
    ) -> Self {
        ReplicatedLogClient {
            log,
            fatal_signal: Some(fatal_signal),
            timer: Some(timer),
            executor,
            flusher,
            observer,
        }
    }

    /// The fatal-failure signal, for the application to supervise. Yields
    /// `Some` the first time; the signal is single-consumer.
    pub fn take_fatal_signal(&mut self) -> Option<FatalSignal> {
        self.fatal_signal.take()
    }

    /// Stop the pipeline. Idempotent. Stops the tick source, drains and
    /// joins the executor, drains and joins the flusher, then fails any
    /// still-pending waiters with a stopped error.
    pub async fn shutdown(&mut self) {
        self.timer.take();
        self.executor.stop().await;
        self.flusher.stop().await;
        self.observer.stop();
    }
}
