use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to a spawned single-purpose worker (task executor, ready
/// flusher). `stop` signals the worker, then joins it; both halves are
/// `Option`-guarded so stopping twice is a no-op.
pub(crate) struct WorkerHandle {
    name: &'static str,
    logger: slog::Logger,
    stop_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn spawn<F>(name: &'static str, logger: slog::Logger, worker: F) -> Self
    where
        F: FnOnce(oneshot::Receiver<()>) -> JoinHandle<()>,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = worker(stop_rx);

        WorkerHandle {
            name,
            logger,
            stop_tx: Some(stop_tx),
            join: Some(join),
        }
    }

    pub(crate) async fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // An already-exited worker has dropped its receiver; that is
            // not an error for stop.
            let _ = stop_tx.send(());
        }

        if let Some(join) = self.join.take() {
            if join.await.is_err() {
                slog::error!(self.logger, "worker panicked"; "worker" => self.name);
            }
        }
    }
}
