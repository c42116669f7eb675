use crate::executor::{Command, ExecutorClient};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time;
use tokio::time::Duration;

/// TickDriver submits `Command::Tick` to the task executor at a fixed
/// cadence, driving the consensus core's logical clock. Ticks share the
/// task queue with proposals and interleave FIFO with them; under heavy
/// proposal load ticks are delayed rather than prioritized.
///
/// Dropping the handle stops the background task.
pub struct TickDriver {
    // will be dropped
    _stopper: Stopper,
}

impl TickDriver {
    pub fn spawn(tick_interval: Duration, client: ExecutorClient) -> Self {
        let (stopper, stop_check) = stop_signal();

        tokio::task::spawn(Self::tick_task(stop_check, tick_interval, client));

        TickDriver { _stopper: stopper }
    }

    async fn tick_task(stop_check: StopCheck, tick_interval: Duration, client: ExecutorClient) {
        let mut interval = time::interval(tick_interval);
        // The first interval tick completes immediately; consume it so the
        // cadence starts one full interval out.
        interval.tick().await;

        loop {
            interval.tick().await;
            if stop_check.should_stop() {
                return;
            }
            client.submit(Command::Tick);
        }
    }
}

struct Stopper {
    stop_signal: Arc<AtomicBool>,
}

struct StopCheck {
    stop_signal: Arc<AtomicBool>,
}

impl Drop for Stopper {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::Release);
    }
}

impl StopCheck {
    fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::Acquire)
    }
}

fn stop_signal() -> (Stopper, StopCheck) {
    let stop_signal = Arc::new(AtomicBool::new(false));

    let stopper = Stopper {
        stop_signal: stop_signal.clone(),
    };
    let stop_check = StopCheck { stop_signal };

    (stopper, stop_check)
}
