//! Endpoint implementations
//!
//! Contains MemoryEndpoint, an in-process store used by the CLI and tests.

mod memory;

pub use self::memory::MemoryEndpoint;
