//! Endpoint trait - backend capability consumed by the dispatcher
//!
//! The dispatcher never calls store operations itself. Callers hand it an
//! operation closure, and the closure is applied to whichever endpoint the
//! routing state selects.

use crate::ContractError;

/// Backend endpoint trait
///
/// Endpoints are shared between the two execution lanes, so every method
/// takes `&self`; implementations use interior mutability where needed.
#[trait_variant::make(Endpoint: Send)]
pub trait LocalEndpoint {
    /// Endpoint name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Release the underlying connection
    ///
    /// # Errors
    /// Returns close error (should include context)
    async fn close(&self) -> Result<(), ContractError>;
}
