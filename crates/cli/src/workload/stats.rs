//! Workload statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::MetricsSummary;

/// Statistics from a workload run
#[derive(Debug, Clone, Default)]
pub struct WorkloadStats {
    /// Calls handed to the dispatcher
    pub calls_issued: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Whether the run timeout cut the workload short
    pub timed_out: bool,

    /// Dispatcher counters at the end of the run
    pub dispatch: MetricsSnapshot,

    /// Caller-side outcome and latency summary
    pub calls: MetricsSummary,

    pub switched_at_end: bool,
    pub switch_count: u64,
    pub pending_switchbacks: usize,

    /// (name, applied operations) per configured endpoint
    pub endpoints: [(String, u64); 2],
}

impl WorkloadStats {
    /// Calls per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.calls.total_calls as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Workload Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Calls issued: {}", self.calls_issued);
        println!("   ├─ Throughput: {:.2} calls/s", self.throughput());
        println!("   └─ Timed out: {}", self.timed_out);

        println!("\n🔀 Routing");
        println!("   ├─ Switched at end: {}", self.switched_at_end);
        println!("   ├─ Switch count: {}", self.switch_count);
        println!("   ├─ Pending switchbacks: {}", self.pending_switchbacks);
        for (i, (name, applied)) in self.endpoints.iter().enumerate() {
            let prefix = if i == self.endpoints.len() - 1 { "└─" } else { "├─" };
            println!("   {} {}: {} operations applied", prefix, name, applied);
        }

        println!("\n{}", self.dispatch);
        println!("\n{}", self.calls);
    }
}
