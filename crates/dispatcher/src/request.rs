//! Request - an operation closure tagged with its danger class

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use contracts::{ContractError, DangerClass, OperationKind};

use crate::lane::CancelSignal;

/// Boxed future produced by applying a request to an endpoint
pub type AttemptFuture<T> = Pin<Box<dyn Future<Output = Result<T, ContractError>> + Send + 'static>>;

type ApplyFn<E, T> = dyn Fn(Arc<E>, CancelSignal) -> AttemptFuture<T> + Send + Sync;

/// Operation routed by the dispatcher
///
/// The closure may be applied twice (primary then secondary), so it must be
/// `Fn` and build a fresh future on every call.
pub struct Request<E, T> {
    label: String,
    danger: DangerClass,
    apply: Arc<ApplyFn<E, T>>,
}

impl<E, T> Clone for Request<E, T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            danger: self.danger,
            apply: Arc::clone(&self.apply),
        }
    }
}

impl<E, T> std::fmt::Debug for Request<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("label", &self.label)
            .field("danger", &self.danger)
            .finish_non_exhaustive()
    }
}

impl<E, T> Request<E, T>
where
    E: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Create a request that ignores cancellation
    pub fn new<F, Fut>(danger: DangerClass, op: F) -> Self
    where
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ContractError>> + Send + 'static,
    {
        Self::cancellable(danger, move |endpoint, _signal| op(endpoint))
    }

    /// Create a request whose closure observes the cancellation signal
    pub fn cancellable<F, Fut>(danger: DangerClass, op: F) -> Self
    where
        F: Fn(Arc<E>, CancelSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ContractError>> + Send + 'static,
    {
        Self {
            label: danger.as_str().to_string(),
            danger,
            apply: Arc::new(move |endpoint, signal| Box::pin(op(endpoint, signal))),
        }
    }

    /// Create a request classified by its operation kind
    pub fn for_kind<F, Fut>(kind: OperationKind, op: F) -> Self
    where
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ContractError>> + Send + 'static,
    {
        Self::new(kind.danger_class(), op).with_label(kind.as_str())
    }

    /// Set the label used in logs
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl<E, T> Request<E, T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn danger(&self) -> DangerClass {
        self.danger
    }

    pub(crate) fn apply(&self, endpoint: Arc<E>, signal: CancelSignal) -> AttemptFuture<T> {
        (self.apply)(endpoint, signal)
    }
}
