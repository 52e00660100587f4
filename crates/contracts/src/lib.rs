//! # Contracts
//!
//! Frozen interface contracts shared by the dispatcher, config loader and CLI.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Routing Model
//! - Two endpoints, one of which is "current primary" at any instant
//! - Operations carry a `DangerClass` that gates whether failover is allowed

mod config;
mod danger;
mod endpoint;
mod error;

pub use config::*;
pub use danger::{DangerClass, OperationKind};
pub use endpoint::{Endpoint, LocalEndpoint};
pub use error::*;
