//! Interval-driven refresh with single-flight protection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::updater::Updater;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Runs a refresh cycle on a fixed interval until stopped. The first cycle
/// starts immediately. A tick that fires while a cycle is still in flight is
/// dropped, not queued, so slow cycles never build a backlog. `Stopped` is
/// terminal; an in-flight cycle is allowed to finish first.
pub struct Scheduler {
    state: Arc<AtomicU8>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn start(updater: Arc<Updater>, every: Duration) -> Self {
        let state = Arc::new(AtomicU8::new(IDLE));
        let (shutdown, mut rx) = watch::channel(false);
        let task_state = Arc::clone(&state);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = rx.changed() => break,
                    _ = ticker.tick() => {
                        task_state.store(RUNNING, Ordering::SeqCst);
                        match updater.run_cycle(None).await {
                            Ok(result) => info!(
                                outcome = result.outcome.as_str(),
                                merged = result.merged,
                                "Scheduled refresh finished"
                            ),
                            Err(e) => warn!(error = %e, "Scheduled refresh failed"),
                        }
                        task_state.store(IDLE, Ordering::SeqCst);
                    }
                }
            }
            task_state.store(STOPPED, Ordering::SeqCst);
        });

        Scheduler {
            state,
            shutdown,
            handle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        match self.state.load(Ordering::SeqCst) {
            RUNNING => SchedulerState::Running,
            STOPPED => SchedulerState::Stopped,
            _ => SchedulerState::Idle,
        }
    }

    /// Requests shutdown and waits for any in-flight cycle to complete. No
    /// further ticks fire afterwards.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
