//! Fixed-interval update loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// One synchronization of DNS records with the current public address.
pub trait UpdateCycle: Send + Sync + 'static {
    fn run_cycle(&self) -> impl Future<Output = ()> + Send;
}

/// Runs an [`UpdateCycle`] immediately and then on every tick.
pub struct UpdateScheduler<C> {
    interval: Duration,
    cycle: Arc<C>,
}

impl<C: UpdateCycle> UpdateScheduler<C> {
    pub fn new(interval: Duration, cycle: Arc<C>) -> Self {
        Self { interval, cycle }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tick forever. Each cycle runs in its own task.
    pub async fn run(self) {
        tracing::info!(interval = ?self.interval, "Update scheduler starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut previous: Option<JoinHandle<()>> = None;

        loop {
            ticker.tick().await;

            if previous.as_ref().is_some_and(|h| !h.is_finished()) {
                tracing::debug!("Previous update cycle still running");
            }

            let cycle = Arc::clone(&self.cycle);
            previous = Some(tokio::spawn(async move {
                cycle.run_cycle().await;
            }));
        }
    }
}
