use crate::api::{WriteError, WriteOutcome, WriteResult};
use crate::consensus::{CoreError, Message, RaftCore, Ready};
use crate::observer::{CommitObserver, WaiterToken};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Error resolved onto a non-propose command's completion handle.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("task executor is stopped")]
    Stopped,
}

/// One unit of work for the executor's worker. The tagged variants replace
/// arbitrary submitted closures for everything with a caller waiting on a
/// result; `Inspect` remains for read-only access routed through the
/// single-owner worker.
pub enum Command {
    /// Leader-gate, propose, and register a commit waiter bound to the
    /// caller's completion handle.
    Propose {
        payload: bytes::Bytes,
        token: WaiterToken,
        completion: oneshot::Sender<WriteResult>,
    },

    /// Advance the core with a protocol message delivered by the transport.
    Step {
        message: Message,
        completion: oneshot::Sender<Result<(), CommandError>>,
    },

    /// Advance logical time. Submitted by the tick driver at a fixed
    /// cadence; interleaves FIFO with proposals, so heavy proposal load can
    /// delay ticks. Known tradeoff of the single queue.
    Tick,

    /// Start an election.
    Campaign,

    /// Run a read-only closure against the core on the worker.
    Inspect(Box<dyn FnOnce(&dyn RaftCore) + Send>),
}

pub fn create(
    logger: slog::Logger,
    core: Box<dyn RaftCore>,
    observer: Arc<CommitObserver>,
    ready_tx: mpsc::UnboundedSender<Ready>,
) -> (ExecutorClient, TaskExecutor) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = ExecutorClient { sender: tx };
    let executor = TaskExecutor {
        logger,
        queue: rx,
        core,
        observer,
        ready_tx,
    };

    (client, executor)
}

/// Submission side of the task queue. Cheap to clone; submit never blocks.
#[derive(Clone)]
pub struct ExecutorClient {
    sender: mpsc::UnboundedSender<Command>,
}

impl ExecutorClient {
    /// Enqueue a command. FIFO relative to this producer's own submissions.
    /// After the executor has stopped, the command's completion (if any) is
    /// resolved with a stopped error instead of being dropped on the floor.
    pub fn submit(&self, command: Command) {
        if let Err(mpsc::error::SendError(rejected)) = self.sender.send(command) {
            resolve_stopped(rejected);
        }
    }
}

fn resolve_stopped(command: Command) {
    match command {
        Command::Propose { completion, .. } => {
            let _ = completion.send(Err(WriteError::Stopped));
        }
        Command::Step { completion, .. } => {
            let _ = completion.send(Err(CommandError::Stopped));
        }
        // Dropping the closure drops whatever completion it captured,
        // which closes the caller's receiver.
        Command::Tick | Command::Campaign | Command::Inspect(_) => {}
    }
}

/// TaskExecutor is the single writer of the consensus core: it exclusively
/// owns the core instance and applies commands to it one at a time. Each
/// resulting ready batch is forwarded, in production order, to the ready
/// flusher's queue.
pub struct TaskExecutor {
    logger: slog::Logger,
    queue: mpsc::UnboundedReceiver<Command>,
    core: Box<dyn RaftCore>,
    observer: Arc<CommitObserver>,
    ready_tx: mpsc::UnboundedSender<Ready>,
}

impl TaskExecutor {
    /// Worker loop. Runs until `stop` fires or every client is dropped;
    /// on stop, commands already queued are still executed (drain policy)
    /// so no queued completion handle is left unresolved.
    pub async fn run(mut self, mut stop: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    self.queue.close();
                    while let Ok(command) = self.queue.try_recv() {
                        self.apply(command);
                    }
                    break;
                }
                maybe_command = self.queue.recv() => match maybe_command {
                    Some(command) => self.apply(command),
                    None => break,
                },
            }
        }
        slog::info!(self.logger, "task executor worker exiting");
    }

    // Must not await: a command in flight owns the core until it finishes.
    fn apply(&mut self, command: Command) {
        match command {
            Command::Propose {
                payload,
                token,
                completion,
            } => self.handle_propose(payload, token, completion),
            Command::Step {
                message,
                completion,
            } => {
                let result = self.core.step(message);
                if let Err(e) = &result {
                    slog::warn!(self.logger, "step rejected by consensus core"; "error" => %e);
                }
                let _ = completion.send(result.map_err(CommandError::Core));
            }
            Command::Tick => self.core.tick(),
            Command::Campaign => self.core.campaign(),
            Command::Inspect(f) => f(self.core.as_ref()),
        }

        self.forward_ready();
    }

    fn handle_propose(
        &mut self,
        payload: bytes::Bytes,
        token: WaiterToken,
        completion: oneshot::Sender<WriteResult>,
    ) {
        let info = self.core.info();
        if !info.is_leader() {
            // Never touches the core: no entry proposed, no waiter registered.
            let _ = completion.send(Err(WriteError::NotLeader {
                leader_id: info.leader_id,
            }));
            return;
        }

        let new_index = info.last_log_index + 1;
        if let Err(e) = self.core.propose(payload) {
            let _ = completion.send(Err(WriteError::ProposeRejected(e)));
            return;
        }

        // Registration happens on this worker, before the flusher can see
        // the ready batch carrying this entry, so it happens-before any
        // notify that could satisfy it.
        let outcome = WriteOutcome {
            term: info.term,
            index: new_index,
        };
        self.observer
            .register((new_index, new_index), token, outcome, completion);
    }

    fn forward_ready(&mut self) {
        if let Some(ready) = self.core.take_ready() {
            if self.ready_tx.send(ready).is_err() {
                slog::warn!(
                    self.logger,
                    "ready flusher has stopped; discarding ready batch"
                );
            }
        }
    }
}
