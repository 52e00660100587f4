//! DispatcherBlueprint - Config Loader output
//!
//! Describes the failover policy and the two endpoints a dispatcher routes to.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Default primary budget in milliseconds
pub const DEFAULT_PRIMARY_TIMEOUT_MS: u64 = 700;

/// Secondary budget multiplier applied when no explicit value is configured
pub const SECONDARY_TIMEOUT_FACTOR: u32 = 15;

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
pub fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatcherBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Failover policy
    #[serde(default)]
    #[validate(nested)]
    pub failover: FailoverConfig,

    /// Endpoint that starts as primary
    #[validate(nested)]
    pub primary: EndpointConfig,

    /// Endpoint that starts as secondary
    #[validate(nested)]
    pub secondary: EndpointConfig,
}

/// Failover policy and timing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FailoverConfig {
    /// Budget for the primary attempt
    #[serde(default = "default_primary_timeout_ms")]
    #[validate(range(min = 1))]
    pub primary_timeout_ms: u64,

    /// Budget for the secondary attempt (None = 15 x primary)
    #[serde(default)]
    #[validate(range(min = 1))]
    pub secondary_timeout_ms: Option<u64>,

    /// Allow failover for `DangerClass::Medium` operations
    #[serde(default)]
    pub failover_medium: bool,

    /// Allow failover for `DangerClass::Dangerous` operations
    #[serde(default)]
    pub failover_dangerous: bool,

    /// Switchback cooldowns indexed by switch count; the last entry repeats
    #[serde(default = "default_cooldowns_ms")]
    #[validate(length(min = 1))]
    pub cooldowns_ms: Vec<u64>,

    /// Reset the switch counter once the original primary has been stable
    /// this long (None = never reset)
    #[serde(default)]
    #[validate(range(min = 1))]
    pub stable_reset_ms: Option<u64>,

    /// Queue depth of each execution lane
    #[serde(default = "default_lane_capacity")]
    #[validate(range(min = 1))]
    pub lane_capacity: usize,
}

fn default_primary_timeout_ms() -> u64 {
    DEFAULT_PRIMARY_TIMEOUT_MS
}

fn default_cooldowns_ms() -> Vec<u64> {
    vec![20_000, 60_000, 120_000]
}

fn default_lane_capacity() -> usize {
    1024
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            primary_timeout_ms: default_primary_timeout_ms(),
            secondary_timeout_ms: None,
            failover_medium: false,
            failover_dangerous: false,
            cooldowns_ms: default_cooldowns_ms(),
            stable_reset_ms: None,
            lane_capacity: default_lane_capacity(),
        }
    }
}

impl FailoverConfig {
    pub fn primary_timeout(&self) -> Duration {
        Duration::from_millis(self.primary_timeout_ms)
    }

    /// Secondary budget, falling back to 15 x primary
    pub fn secondary_timeout(&self) -> Duration {
        match self.secondary_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.primary_timeout() * SECONDARY_TIMEOUT_FACTOR,
        }
    }

    pub fn cooldowns(&self) -> Vec<Duration> {
        self.cooldowns_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }

    pub fn stable_reset(&self) -> Option<Duration> {
        self.stable_reset_ms.map(Duration::from_millis)
    }
}

/// Built-in in-memory endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EndpointConfig {
    /// Endpoint name
    #[validate(length(min = 1))]
    pub name: String,

    /// Simulated response latency
    #[serde(default)]
    pub latency_ms: u64,

    /// Probability that an operation fails (0.0 - 1.0)
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub failure_rate: f64,
}

impl EndpointConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}
