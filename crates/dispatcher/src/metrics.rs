//! Dispatcher metrics for observability
//!
//! Atomic counters read by tests and the CLI; every increment is mirrored to
//! the `metrics` facade so a Prometheus recorder sees the same events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::saturating_millis;

/// How a routed call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaceOutcome {
    PrimarySuccess,
    SecondarySuccess,
    DualFailure,
    InterruptedFailure,
}

impl RaceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaceOutcome::PrimarySuccess => "primary_success",
            RaceOutcome::SecondarySuccess => "secondary_success",
            RaceOutcome::DualFailure => "dual_failure",
            RaceOutcome::InterruptedFailure => "interrupted",
        }
    }
}

/// Metrics for a single dispatcher
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    primary_successes: AtomicU64,
    secondary_successes: AtomicU64,
    dual_failures: AtomicU64,
    interruptions: AtomicU64,
    /// Failures surfaced verbatim on the pinned path
    backend_failures: AtomicU64,
    /// Races that moved on to the secondary endpoint
    escalations: AtomicU64,
    failovers: AtomicU64,
    switchbacks: AtomicU64,
    /// Cooldown armed by the most recent failover
    last_cooldown_ms: AtomicU64,
    skipped_attempts: AtomicU64,
    detached_attempts: AtomicU64,
    lane_rejections: AtomicU64,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a routed call
    pub fn record(&self, outcome: RaceOutcome) {
        let counter = match outcome {
            RaceOutcome::PrimarySuccess => &self.primary_successes,
            RaceOutcome::SecondarySuccess => &self.secondary_successes,
            RaceOutcome::DualFailure => &self.dual_failures,
            RaceOutcome::InterruptedFailure => &self.interruptions,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("failover_dispatch_calls_total", "outcome" => outcome.as_str())
            .increment(1);
    }

    pub fn inc_backend_failures(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("failover_dispatch_backend_failures_total").increment(1);
    }

    pub fn inc_escalations(&self) {
        self.escalations.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("failover_dispatch_escalations_total").increment(1);
    }

    /// Record a failover and the cooldown it armed
    pub fn record_failover(&self, cooldown: Duration) {
        self.failovers.fetch_add(1, Ordering::Relaxed);
        self.last_cooldown_ms
            .store(saturating_millis(cooldown), Ordering::Relaxed);
        ::metrics::counter!("failover_dispatch_failovers_total").increment(1);
        ::metrics::gauge!("failover_dispatch_cooldown_ms").set(cooldown.as_millis() as f64);
    }

    pub fn inc_switchbacks(&self) {
        self.switchbacks.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("failover_dispatch_switchbacks_total").increment(1);
    }

    pub fn inc_skipped_attempts(&self) {
        self.skipped_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_detached_attempts(&self) {
        self.detached_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_lane_rejections(&self) {
        self.lane_rejections.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("failover_dispatch_lane_rejections_total").increment(1);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            primary_successes: self.primary_successes.load(Ordering::Relaxed),
            secondary_successes: self.secondary_successes.load(Ordering::Relaxed),
            dual_failures: self.dual_failures.load(Ordering::Relaxed),
            interruptions: self.interruptions.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
            failovers: self.failovers.load(Ordering::Relaxed),
            switchbacks: self.switchbacks.load(Ordering::Relaxed),
            last_cooldown_ms: self.last_cooldown_ms.load(Ordering::Relaxed),
            skipped_attempts: self.skipped_attempts.load(Ordering::Relaxed),
            detached_attempts: self.detached_attempts.load(Ordering::Relaxed),
            lane_rejections: self.lane_rejections.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub primary_successes: u64,
    pub secondary_successes: u64,
    pub dual_failures: u64,
    pub interruptions: u64,
    pub backend_failures: u64,
    pub escalations: u64,
    pub failovers: u64,
    pub switchbacks: u64,
    pub last_cooldown_ms: u64,
    pub skipped_attempts: u64,
    pub detached_attempts: u64,
    pub lane_rejections: u64,
}

impl MetricsSnapshot {
    /// Calls that returned a result
    pub fn successes(&self) -> u64 {
        self.primary_successes + self.secondary_successes
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Failover Dispatch Summary ===")?;
        writeln!(f, "Primary successes: {}", self.primary_successes)?;
        writeln!(f, "Secondary successes: {}", self.secondary_successes)?;
        writeln!(f, "Dual failures: {}", self.dual_failures)?;
        writeln!(f, "Backend failures: {}", self.backend_failures)?;
        writeln!(f, "Interrupted: {}", self.interruptions)?;
        writeln!(f, "Escalations: {}", self.escalations)?;
        writeln!(
            f,
            "Failovers: {} (last cooldown {}ms)",
            self.failovers, self.last_cooldown_ms
        )?;
        writeln!(f, "Switchbacks: {}", self.switchbacks)?;
        write!(
            f,
            "Lane: {} skipped, {} detached, {} rejected",
            self.skipped_attempts, self.detached_attempts, self.lane_rejections
        )
    }
}
