//! Layered error definitions
//!
//! Categorized by source: config / endpoint

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Endpoint Errors =====
    /// Endpoint could not be reached
    #[error("endpoint '{endpoint}' unavailable: {message}")]
    EndpointUnavailable { endpoint: String, message: String },

    /// Endpoint rejected or failed the operation
    #[error("endpoint '{endpoint}' operation '{operation}' failed: {message}")]
    EndpointOperation {
        endpoint: String,
        operation: String,
        message: String,
    },

    /// Conditional mutation did not match the stored value
    #[error("endpoint '{endpoint}' precondition failed for key '{key}'")]
    PreconditionFailed { endpoint: String, key: String },

    /// Endpoint already closed
    #[error("endpoint '{endpoint}' is closed")]
    EndpointClosed { endpoint: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create endpoint unavailable error
    pub fn endpoint_unavailable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EndpointUnavailable {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create endpoint operation error
    pub fn endpoint_operation(
        endpoint: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::EndpointOperation {
            endpoint: endpoint.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create endpoint closed error
    pub fn endpoint_closed(endpoint: impl Into<String>) -> Self {
        Self::EndpointClosed {
            endpoint: endpoint.into(),
        }
    }
}
