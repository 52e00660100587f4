//! Workload driver - concurrent callers sharing one dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use contracts::{saturating_millis, DispatcherBlueprint};
use dispatcher::{Endpoint, FailoverDispatcher, MemoryEndpoint};
use observability::{CallMetricsAggregator, CallStatus};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::{ops, WorkloadStats};
use crate::error::{CliError, Result};

/// Forced primary outage
#[derive(Debug, Clone, Copy)]
pub struct Outage {
    /// Calls issued before the primary goes down
    pub after_calls: u64,
    pub duration: Duration,
}

/// Workload configuration
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Dispatcher and endpoint configuration
    pub blueprint: DispatcherBlueprint,

    /// Total calls to issue
    pub calls: u64,

    /// Concurrent callers
    pub concurrency: usize,

    /// Distinct keys touched
    pub key_space: usize,

    pub outage: Option<Outage>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

struct Shared {
    next: AtomicU64,
    aggregator: Mutex<CallMetricsAggregator>,
}

/// Drives calls through a dispatcher over two memory endpoints
pub struct Workload {
    config: WorkloadConfig,
}

impl Workload {
    pub fn new(config: WorkloadConfig) -> Self {
        Self { config }
    }

    /// Run the workload to completion, then shut the dispatcher down
    #[instrument(
        name = "workload_run",
        skip(self),
        fields(calls = self.config.calls, concurrency = self.config.concurrency)
    )]
    pub async fn run(self) -> Result<WorkloadStats> {
        let start_time = Instant::now();
        let config = self.config;

        if let Some(port) = config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let blueprint = &config.blueprint;
        let dispatcher = Arc::new(
            FailoverDispatcher::builder(
                MemoryEndpoint::from_config(&blueprint.primary),
                MemoryEndpoint::from_config(&blueprint.secondary),
            )
            .config(blueprint.failover.clone())
            .build()?,
        );

        let shared = Arc::new(Shared {
            next: AtomicU64::new(0),
            aggregator: Mutex::new(CallMetricsAggregator::new()),
        });

        let mut callers = JoinSet::new();
        for caller in 0..config.concurrency.max(1) {
            callers.spawn(caller_loop(
                caller,
                Arc::clone(&dispatcher),
                Arc::clone(&shared),
                config.calls,
                config.key_space.max(1) as u64,
                config.outage,
            ));
        }

        let drained = async {
            while let Some(joined) = callers.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "Caller task failed");
                }
            }
        };
        let timed_out = match config.timeout {
            Some(limit) => tokio::time::timeout(limit, drained).await.is_err(),
            None => {
                drained.await;
                false
            }
        };
        if timed_out {
            warn!("Workload timeout reached, aborting callers");
            callers.abort_all();
        }

        let switched_at_end = dispatcher.is_switched();
        let pending_switchbacks = dispatcher.pending_switchbacks();
        observability::record_switched(switched_at_end);
        observability::record_pending_switchbacks(pending_switchbacks);

        let stats = WorkloadStats {
            calls_issued: shared.next.load(Ordering::SeqCst).min(config.calls),
            duration: start_time.elapsed(),
            timed_out,
            dispatch: dispatcher.metrics(),
            calls: shared
                .aggregator
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .summary(),
            switched_at_end,
            switch_count: dispatcher.switch_count(),
            pending_switchbacks,
            endpoints: [0, 1].map(|i| {
                (
                    dispatcher.endpoint_name(i).to_string(),
                    dispatcher.endpoint(i).applied_ops(),
                )
            }),
        };

        dispatcher
            .shutdown()
            .await
            .map_err(|e| CliError::shutdown(e.to_string()))?;

        Ok(stats)
    }
}

async fn caller_loop(
    caller: usize,
    dispatcher: Arc<FailoverDispatcher<MemoryEndpoint>>,
    shared: Arc<Shared>,
    calls: u64,
    key_space: u64,
    outage: Option<Outage>,
) {
    loop {
        let n = shared.next.fetch_add(1, Ordering::SeqCst);
        if n >= calls {
            break;
        }
        if let Some(outage) = outage.filter(|o| o.after_calls == n) {
            start_outage(&dispatcher, outage.duration);
        }

        let kind = ops::kind_for(n);
        let request = ops::build_request(kind, format!("key-{}", n % key_space), n);

        let started = Instant::now();
        let status = match dispatcher.execute(&request).await {
            Ok(()) => CallStatus::Ok,
            Err(e) if e.is_dispatcher_failure() => {
                debug!(caller, op = %kind, error = %e, "Call failed in dispatcher");
                CallStatus::DispatchFailure
            }
            Err(e) => {
                debug!(caller, op = %kind, error = %e, "Call failed on endpoint");
                CallStatus::BackendFailure
            }
        };
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        observability::record_call(kind, status, latency_ms);
        shared
            .aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(kind, status, latency_ms);
    }
}

/// Fail every call on the configured primary for `duration`
fn start_outage(dispatcher: &FailoverDispatcher<MemoryEndpoint>, duration: Duration) {
    let primary = Arc::clone(dispatcher.endpoint(0));
    primary.set_failing(true);
    warn!(
        endpoint = %primary.name(),
        duration_ms = saturating_millis(duration),
        "Primary outage started"
    );

    tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        primary.set_failing(false);
        info!(endpoint = %primary.name(), "Primary outage ended");
    });
}
