use crate::api::{WriteError, WriteOutcome, WriteResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;

/// Identifies one registered waiter, for deregistration by the write
/// handle's timeout path.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WaiterToken(u64);

struct Waiter {
    // Inclusive index range; lo <= hi. The waiter is satisfied once the
    // commit index reaches hi.
    lo: u64,
    hi: u64,
    token: WaiterToken,
    outcome: WriteOutcome,
    completion: oneshot::Sender<WriteResult>,
}

#[derive(Default)]
struct WaiterSet {
    waiters: Vec<Waiter>,
    commit_index: u64,
    stopped: bool,
}

/// CommitObserver decouples "an index range is committed" (known by the
/// ready flusher) from "a client is waiting on that range" (registered from
/// the task executor's worker).
///
/// Register and notify run on different workers. The mutex guards only the
/// waiter-set mutation; completions always fire after the lock is released
/// so a handle consumer can never deadlock back into the observer.
///
/// Thread-safe.
pub struct CommitObserver {
    logger: slog::Logger,
    next_token: AtomicU64,
    set: Mutex<WaiterSet>,
}

impl CommitObserver {
    pub fn new(logger: slog::Logger) -> Self {
        CommitObserver {
            logger,
            next_token: AtomicU64::new(1),
            set: Mutex::new(WaiterSet::default()),
        }
    }

    pub fn allocate_token(&self) -> WaiterToken {
        WaiterToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    /// Record a pending waiter for the inclusive `range`.
    ///
    /// The current commit index is re-checked under the lock: if the range
    /// is already satisfied the completion fires immediately, so callers
    /// cannot lose a registration to a concurrent notify.
    pub fn register(
        &self,
        range: (u64, u64),
        token: WaiterToken,
        outcome: WriteOutcome,
        completion: oneshot::Sender<WriteResult>,
    ) {
        let (lo, hi) = range;
        debug_assert!(lo <= hi, "waiter range [{}, {}] is inverted", lo, hi);

        let immediate = {
            let mut set = self.lock();
            if set.stopped {
                Some(Err(WriteError::Stopped))
            } else if hi <= set.commit_index {
                Some(Ok(outcome))
            } else {
                set.waiters.push(Waiter {
                    lo,
                    hi,
                    token,
                    outcome,
                    completion,
                });
                return;
            }
        };

        if let Some(result) = immediate {
            let _ = completion.send(result);
        }
    }

    /// Fulfill every waiter whose range is covered by `commit_index`.
    /// Called by the ready flusher strictly after the corresponding
    /// entries are durable.
    pub fn notify(&self, commit_index: u64) {
        let fulfilled = {
            let mut set = self.lock();
            if commit_index <= set.commit_index || set.stopped {
                return;
            }
            set.commit_index = commit_index;
            take_satisfied(&mut set.waiters, commit_index)
        };

        for waiter in fulfilled {
            if waiter.completion.send(Ok(waiter.outcome)).is_err() {
                slog::debug!(
                    self.logger,
                    "committed waiter was abandoned by its client";
                    "range_lo" => waiter.lo,
                    "range_hi" => waiter.hi,
                );
            }
        }
    }

    /// Remove a waiter without firing it. Returns false if the waiter was
    /// already fulfilled, deregistered, or never registered.
    pub fn deregister(&self, token: WaiterToken) -> bool {
        let mut set = self.lock();
        match set.waiters.iter().position(|w| w.token == token) {
            Some(i) => {
                set.waiters.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Fail every still-pending waiter with a terminal stopped error and
    /// refuse registrations from now on. Idempotent.
    pub fn stop(&self) {
        let drained = {
            let mut set = self.lock();
            set.stopped = true;
            std::mem::take(&mut set.waiters)
        };

        if !drained.is_empty() {
            slog::info!(
                self.logger,
                "failing pending waiters at observer shutdown";
                "count" => drained.len(),
            );
        }
        for waiter in drained {
            let _ = waiter.completion.send(Err(WriteError::Stopped));
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_count(&self) -> usize {
        self.lock().waiters.len()
    }

    fn lock(&self) -> MutexGuard<'_, WaiterSet> {
        match self.set.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn take_satisfied(waiters: &mut Vec<Waiter>, commit_index: u64) -> Vec<Waiter> {
    let mut satisfied = Vec::new();
    let mut i = 0;
    while i < waiters.len() {
        if waiters[i].hi <= commit_index {
            satisfied.push(waiters.swap_remove(i));
        } else {
            i += 1;
        }
    }
    satisfied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn observer() -> CommitObserver {
        CommitObserver::new(testutil::logger())
    }

    fn outcome(index: u64) -> WriteOutcome {
        WriteOutcome { term: 1, index }
    }

    #[tokio::test]
    async fn notify_fulfills_covered_range() {
        let observer = observer();
        let (tx, rx) = oneshot::channel();
        observer.register((2, 7), observer.allocate_token(), outcome(7), tx);

        observer.notify(7);

        let result = rx.await.expect("completion must fire");
        assert_eq!(7, result.unwrap().index);
        assert_eq!(0, observer.pending_count());
    }

    #[tokio::test]
    async fn partial_range_stays_pending() {
        let observer = observer();
        let (tx, mut rx) = oneshot::channel();
        observer.register((5, 5), observer.allocate_token(), outcome(5), tx);

        observer.notify(4);
        assert!(rx.try_recv().is_err());
        assert_eq!(1, observer.pending_count());

        observer.notify(5);
        let result = rx.await.expect("completion must fire");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn waiter_fires_exactly_once() {
        let observer = observer();
        let (tx, mut rx) = oneshot::channel();
        observer.register((3, 3), observer.allocate_token(), outcome(3), tx);

        observer.notify(3);
        observer.notify(10);
        observer.notify(100);

        assert!(rx.try_recv().unwrap().is_ok());
        // A second fire would panic the oneshot; removal is the guarantee.
        assert_eq!(0, observer.pending_count());
    }

    #[tokio::test]
    async fn register_after_commit_fires_immediately() {
        let observer = observer();
        observer.notify(9);

        let (tx, mut rx) = oneshot::channel();
        observer.register((4, 8), observer.allocate_token(), outcome(8), tx);

        assert!(rx.try_recv().unwrap().is_ok());
    }

    #[tokio::test]
    async fn stale_notify_is_ignored() {
        let observer = observer();
        observer.notify(6);
        observer.notify(3);

        let (tx, mut rx) = oneshot::channel();
        observer.register((7, 7), observer.allocate_token(), outcome(7), tx);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn deregister_suppresses_completion() {
        let observer = observer();
        let token = observer.allocate_token();
        let (tx, mut rx) = oneshot::channel();
        observer.register((5, 5), token, outcome(5), tx);

        assert!(observer.deregister(token));
        assert!(!observer.deregister(token));

        observer.notify(5);
        // Sender was dropped at deregistration.
        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn stop_fails_pending_and_future_waiters() {
        let observer = observer();
        let (tx, rx) = oneshot::channel();
        observer.register((5, 5), observer.allocate_token(), outcome(5), tx);

        observer.stop();
        assert!(matches!(rx.await.unwrap(), Err(WriteError::Stopped)));

        let (tx, rx) = oneshot::channel();
        observer.register((6, 6), observer.allocate_token(), outcome(6), tx);
        assert!(matches!(rx.await.unwrap(), Err(WriteError::Stopped)));
    }
}
