//! Dispatcher error types

use std::time::Duration;

use contracts::ContractError;
use thiserror::Error;

use crate::lane::LaneRole;

/// Dispatcher-level errors
///
/// `Backend` is the only variant that carries an endpoint failure verbatim;
/// every other variant originates in the dispatcher itself.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Endpoint failure surfaced without failover
    #[error(transparent)]
    Backend(#[from] ContractError),

    /// Both endpoints failed or timed out
    #[error("both primary and secondary failed (primary: {primary}): {cause}")]
    DualFailure {
        primary: AttemptFailure,
        #[source]
        cause: SecondaryCause,
    },

    /// Shutdown observed while waiting on an attempt
    #[error("interrupted while waiting on {lane} attempt")]
    Interrupted { lane: LaneRole },

    /// The execution lane refused the attempt
    #[error(transparent)]
    Lane(#[from] LaneError),

    /// Call issued after `shutdown()`
    #[error("dispatcher is shut down")]
    Shutdown,

    /// Endpoint close failed during shutdown
    #[error("failed to close endpoint '{endpoint}': {source}")]
    EndpointClose {
        endpoint: String,
        #[source]
        source: ContractError,
    },

    /// Invalid dispatcher configuration
    #[error("invalid failover config: {0}")]
    Config(String),
}

impl DispatchError {
    /// Whether the error came from the dispatcher rather than an endpoint
    pub fn is_dispatcher_failure(&self) -> bool {
        !matches!(self, DispatchError::Backend(_))
    }

    /// Whether a secondary attempt was made before failing
    pub fn is_dual_failure(&self) -> bool {
        matches!(self, DispatchError::DualFailure { .. })
    }
}

/// Why the secondary attempt did not produce a result
#[derive(Debug, Error)]
pub enum SecondaryCause {
    /// Secondary answered with an error
    #[error("secondary '{endpoint}' failed: {source}")]
    Failed {
        endpoint: String,
        #[source]
        source: ContractError,
    },

    /// Secondary did not answer within its budget
    #[error("both primary and secondary unresponsive, '{endpoint}' silent for {}ms", .waited.as_millis())]
    Unresponsive { endpoint: String, waited: Duration },

    /// Secondary lane refused the attempt
    #[error("secondary lane unavailable: {0}")]
    Lane(#[from] LaneError),
}

/// Why the primary attempt was abandoned
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error("'{endpoint}' failed: {source}")]
    Backend {
        endpoint: String,
        #[source]
        source: ContractError,
    },

    #[error("'{endpoint}' exceeded {}ms", .budget.as_millis())]
    Timeout { endpoint: String, budget: Duration },

    #[error("{0}")]
    Lane(#[from] LaneError),
}

/// Execution lane submission errors
#[derive(Debug, Clone, Error)]
pub enum LaneError {
    /// Lane queue full - attempt not enqueued
    #[error("{lane} lane queue full")]
    Full { lane: LaneRole },

    /// Lane worker stopped
    #[error("{lane} lane closed")]
    Closed { lane: LaneRole },
}
