//! Simulated workload driven through the dispatcher.

mod driver;
mod ops;
mod stats;

pub use driver::{Outage, Workload, WorkloadConfig};
pub use stats::WorkloadStats;
