//! Switchback scheduler - delayed toggle back to the original primary
//!
//! A single worker task owns every pending timer. Firing a timer calls the
//! same [`RoutingState::toggle`] used by failing races; if that toggle turns
//! `switched` back on, the worker arms another timer just like a race would.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use contracts::saturating_millis;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::DispatcherMetrics;
use crate::state::{RoutingState, Transition};

/// Cooldown per switch count; the last step repeats forever
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownSchedule {
    steps: Vec<Duration>,
}

impl Default for CooldownSchedule {
    fn default() -> Self {
        Self {
            steps: vec![
                Duration::from_secs(20),
                Duration::from_secs(60),
                Duration::from_secs(120),
            ],
        }
    }
}

impl CooldownSchedule {
    /// Returns `None` for an empty schedule
    pub fn new(steps: Vec<Duration>) -> Option<Self> {
        if steps.is_empty() {
            return None;
        }
        Some(Self { steps })
    }

    pub fn cooldown(&self, switch_count: u64) -> Duration {
        let last = self.steps.len() - 1;
        let index = usize::try_from(switch_count).map_or(last, |n| n.min(last));
        self.steps[index]
    }
}

enum Command {
    Arm { at: Instant },
    Shutdown,
}

/// Handle to the switchback worker
pub struct SwitchbackScheduler {
    tx: mpsc::UnboundedSender<Command>,
    schedule: CooldownSchedule,
    pending: Arc<AtomicUsize>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SwitchbackScheduler {
    /// Spawn the worker
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        state: Arc<RoutingState>,
        schedule: CooldownSchedule,
        metrics: Arc<DispatcherMetrics>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = SwitchbackWorker {
            state,
            schedule: schedule.clone(),
            metrics,
            pending: Arc::clone(&pending),
            timers: BinaryHeap::new(),
        };
        let worker_handle = tokio::spawn(worker.run(rx));

        Self {
            tx,
            schedule,
            pending,
            worker_handle: Mutex::new(Some(worker_handle)),
        }
    }

    pub fn schedule(&self) -> &CooldownSchedule {
        &self.schedule
    }

    /// Timers armed but not yet fired
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Arm a switchback for a failover that saw `switch_count`
    ///
    /// Returns the cooldown that was armed.
    pub fn arm(&self, switch_count: u64) -> Duration {
        let cooldown = self.schedule.cooldown(switch_count);
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self
            .tx
            .send(Command::Arm {
                at: Instant::now() + cooldown,
            })
            .is_err()
        {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!(switch_count, "Switchback worker stopped, timer not armed");
        }
        cooldown
    }

    /// Stop the worker and drop every pending timer
    #[instrument(name = "switchback_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);

        let handle = self
            .worker_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = ?e, "Switchback worker panicked");
            }
        }
    }
}

struct SwitchbackWorker {
    state: Arc<RoutingState>,
    schedule: CooldownSchedule,
    metrics: Arc<DispatcherMetrics>,
    pending: Arc<AtomicUsize>,
    timers: BinaryHeap<Reverse<Instant>>,
}

impl SwitchbackWorker {
    #[instrument(name = "switchback_loop", skip_all)]
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        debug!("Switchback worker started");

        loop {
            let next = self.timers.peek().map(|Reverse(at)| *at);

            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Arm { at }) => {
                        self.timers.push(Reverse(at));
                        if self.timers.len() > 1 {
                            warn!(pending = self.timers.len(), "Switchback timers stacked");
                        }
                    }
                    Some(Command::Shutdown) | None => break,
                },
                () = wait_until(next) => {
                    self.timers.pop();
                    self.pending.fetch_sub(1, Ordering::SeqCst);
                    self.fire();
                }
            }
        }

        let cancelled = self.timers.len();
        self.pending.store(0, Ordering::SeqCst);
        debug!(cancelled, "Switchback worker stopped");
    }

    fn fire(&mut self) {
        match self.state.toggle() {
            Transition::SwitchedBack { primary } => {
                self.metrics.inc_switchbacks();
                info!(primary, "Switched back to original primary");
            }
            Transition::FailedOver {
                primary,
                switch_count,
            } => {
                let cooldown = self.schedule.cooldown(switch_count);
                self.timers.push(Reverse(Instant::now() + cooldown));
                self.pending.fetch_add(1, Ordering::SeqCst);
                self.metrics.record_failover(cooldown);
                warn!(
                    primary,
                    switch_count,
                    cooldown_ms = saturating_millis(cooldown),
                    "Switchback toggled into a failover, re-armed"
                );
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
