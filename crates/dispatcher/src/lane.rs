//! ExecutionLane - single-worker queue that runs endpoint attempts
//!
//! Each lane owns one worker task running attempts in order. A running attempt
//! whose caller gave up is detached onto its own task, so a hung backend call
//! never holds the lane for later attempts.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use contracts::ContractError;
use tokio::sync::{mpsc, oneshot, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, instrument, warn};

use crate::error::LaneError;
use crate::metrics::DispatcherMetrics;
use crate::request::Request;

/// Which side of the race a lane serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneRole {
    Primary,
    Secondary,
}

impl LaneRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneRole::Primary => "primary",
            LaneRole::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for LaneRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cooperative cancellation flag handed to every attempt
///
/// Raising it never stops an attempt by force. An attempt that has not
/// started yet is skipped; a running one sees the flag only if it checks.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once the signal is raised
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    pub(crate) fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            self.inner.notify.notify_waiters();
        }
    }
}

/// How a single attempt ended from the caller's point of view
#[derive(Debug)]
pub(crate) enum AttemptOutcome<T> {
    Completed(T),
    Failed(ContractError),
    TimedOut(Duration),
    /// Lane dropped the attempt before it reported back
    Dropped,
}

/// Caller-side handle to a submitted attempt
pub(crate) struct Attempt<T> {
    id: u64,
    lane: LaneRole,
    signal: CancelSignal,
    rx: oneshot::Receiver<Result<T, ContractError>>,
}

impl<T> Attempt<T> {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the result, optionally bounded by `budget`
    pub(crate) async fn settle(&mut self, budget: Option<Duration>) -> AttemptOutcome<T> {
        let received = match budget {
            Some(budget) => match tokio::time::timeout(budget, &mut self.rx).await {
                Ok(received) => received,
                Err(_) => return AttemptOutcome::TimedOut(budget),
            },
            None => (&mut self.rx).await,
        };

        match received {
            Ok(Ok(value)) => AttemptOutcome::Completed(value),
            Ok(Err(e)) => AttemptOutcome::Failed(e),
            Err(_) => AttemptOutcome::Dropped,
        }
    }

    /// Best-effort cancellation; the attempt may still run to completion
    pub(crate) fn cancel(&self) {
        self.signal.cancel();
        debug!(lane = %self.lane, attempt = self.id, "Cancellation signalled");
    }
}

type LaneTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct LaneJob {
    id: u64,
    signal: CancelSignal,
    task: LaneTask,
}

/// Handle to a running execution lane
pub struct ExecutionLane {
    /// Lane role
    role: LaneRole,
    /// Channel to send attempts to worker
    tx: mpsc::Sender<LaneJob>,
    /// Stop signal for the worker
    stop_tx: watch::Sender<bool>,
    /// Shared metrics
    metrics: Arc<DispatcherMetrics>,
    next_id: AtomicU64,
    /// Worker task handle
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ExecutionLane {
    /// Create a new lane and spawn its worker task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(role: LaneRole, queue_capacity: usize, metrics: Arc<DispatcherMetrics>) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let (stop_tx, stop_rx) = watch::channel(false);

        let worker_metrics = Arc::clone(&metrics);
        let worker_handle = tokio::spawn(async move {
            lane_worker(role, rx, stop_rx, worker_metrics).await;
        });

        Self {
            role,
            tx,
            stop_tx,
            metrics,
            next_id: AtomicU64::new(1),
            worker_handle: Mutex::new(Some(worker_handle)),
        }
    }

    pub fn role(&self) -> LaneRole {
        self.role
    }

    /// Attempts waiting behind the one currently running
    pub fn queue_len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Enqueue `request` against `endpoint` without waiting for it
    pub(crate) fn submit<E, T>(
        &self,
        request: &Request<E, T>,
        endpoint: Arc<E>,
    ) -> Result<Attempt<T>, LaneError>
    where
        E: Send + Sync + 'static,
        T: Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let signal = CancelSignal::new();
        let (result_tx, rx) = oneshot::channel();

        let attempt = request.apply(endpoint, signal.clone());
        let role = self.role;
        let task: LaneTask = Box::pin(async move {
            let started = Instant::now();
            let result = attempt.await;
            ::metrics::histogram!("failover_dispatch_attempt_latency_ms", "lane" => role.as_str())
                .record(started.elapsed().as_secs_f64() * 1000.0);
            // Receiver is gone once the caller stopped waiting
            let _ = result_tx.send(result);
        });

        let job = LaneJob {
            id,
            signal: signal.clone(),
            task,
        };

        match self.tx.try_send(job) {
            Ok(()) => Ok(Attempt {
                id,
                lane: self.role,
                signal,
                rx,
            }),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.inc_lane_rejections();
                warn!(lane = %self.role, attempt = id, "Lane queue full, attempt rejected");
                Err(LaneError::Full { lane: self.role })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(lane = %self.role, "Lane worker closed unexpectedly");
                Err(LaneError::Closed { lane: self.role })
            }
        }
    }

    /// Stop the worker, dropping queued attempts
    ///
    /// An attempt already running is signalled and detached, never aborted.
    #[instrument(name = "execution_lane_shutdown", skip(self), fields(lane = %self.role))]
    pub async fn shutdown(&self) {
        self.stop_tx.send_replace(true);

        let handle = self
            .worker_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(lane = %self.role, error = ?e, "Lane worker panicked");
            }
        }
        debug!(lane = %self.role, "ExecutionLane shutdown complete");
    }
}

/// Worker task that runs attempts one at a time
///
/// Cancellation of the running attempt detaches it and moves on.
#[instrument(
    name = "execution_lane_loop",
    skip(rx, stop_rx, metrics),
    fields(lane = %role)
)]
async fn lane_worker(
    role: LaneRole,
    mut rx: mpsc::Receiver<LaneJob>,
    mut stop_rx: watch::Receiver<bool>,
    metrics: Arc<DispatcherMetrics>,
) {
    debug!(lane = %role, "Execution lane started");

    loop {
        if *stop_rx.borrow() {
            break;
        }

        let job = tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            job = rx.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let LaneJob {
            id,
            signal,
            mut task,
        } = job;

        if signal.is_cancelled() {
            metrics.inc_skipped_attempts();
            debug!(lane = %role, attempt = id, "Attempt cancelled before start, skipped");
            continue;
        }

        tokio::select! {
            biased;
            () = &mut task => {}
            _ = stop_rx.changed() => {
                signal.cancel();
                metrics.inc_detached_attempts();
                warn!(lane = %role, attempt = id, "Lane stopping, in-flight attempt detached");
                tokio::spawn(task);
                break;
            }
            () = signal.cancelled() => {
                metrics.inc_detached_attempts();
                debug!(lane = %role, attempt = id, "Cancelled attempt detached, lane freed");
                tokio::spawn(task);
            }
        }
    }

    let dropped = rx.len();
    rx.close();
    debug!(lane = %role, dropped, "Execution lane stopped");
}
