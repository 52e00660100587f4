//! Operation mix issued by workload callers.

use std::sync::Arc;

use bytes::Bytes;
use dispatcher::{MemoryEndpoint, OperationKind, Request};

/// Repeating mix, read heavy with one call per mutating tier
const MIX: [OperationKind; 10] = [
    OperationKind::Find,
    OperationKind::FindOne,
    OperationKind::Find,
    OperationKind::Exists,
    OperationKind::UpsertById,
    OperationKind::Insert,
    OperationKind::Update,
    OperationKind::Delete,
    OperationKind::Increment,
    OperationKind::ConditionalUpdate,
];

/// Operation kind for the `n`-th call
pub fn kind_for(n: u64) -> OperationKind {
    MIX[(n % MIX.len() as u64) as usize]
}

/// Build the request for call `n` against `key`
pub fn build_request(kind: OperationKind, key: String, n: u64) -> Request<MemoryEndpoint, ()> {
    let value = Bytes::from(format!("value-{n}"));

    match kind {
        OperationKind::Find
        | OperationKind::FindOne
        | OperationKind::Count
        | OperationKind::Distinct
        | OperationKind::Aggregate
        | OperationKind::Exists => Request::for_kind(kind, move |endpoint: Arc<MemoryEndpoint>| {
            let key = key.clone();
            async move { endpoint.get(&key).await.map(|_| ()) }
        }),
        OperationKind::UpsertById
        | OperationKind::ReplaceById
        | OperationKind::Update
        | OperationKind::UpdateMany => {
            Request::for_kind(kind, move |endpoint: Arc<MemoryEndpoint>| {
                let key = key.clone();
                let value = value.clone();
                async move { endpoint.put(&key, value).await.map(|_| ()) }
            })
        }
        OperationKind::Insert | OperationKind::InsertMany => {
            let key = format!("{key}:{n}");
            Request::for_kind(kind, move |endpoint: Arc<MemoryEndpoint>| {
                let key = key.clone();
                let value = value.clone();
                async move { endpoint.insert(&key, value).await }
            })
        }
        OperationKind::Delete | OperationKind::DeleteMany => {
            Request::for_kind(kind, move |endpoint: Arc<MemoryEndpoint>| {
                let key = key.clone();
                async move { endpoint.delete(&key).await.map(|_| ()) }
            })
        }
        OperationKind::Increment => {
            let key = format!("counter:{key}");
            Request::for_kind(kind, move |endpoint: Arc<MemoryEndpoint>| {
                let key = key.clone();
                async move { endpoint.increment(&key, 1).await.map(|_| ()) }
            })
        }
        OperationKind::FindAndModify => {
            Request::for_kind(kind, move |endpoint: Arc<MemoryEndpoint>| {
                let key = key.clone();
                let value = value.clone();
                async move {
                    endpoint.get(&key).await?;
                    endpoint.put(&key, value).await.map(|_| ())
                }
            })
        }
        OperationKind::ConditionalUpdate => {
            let key = format!("lock:{n}");
            Request::for_kind(kind, move |endpoint: Arc<MemoryEndpoint>| {
                let key = key.clone();
                let value = value.clone();
                async move { endpoint.compare_and_set(&key, None, value).await }
            })
        }
    }
}
