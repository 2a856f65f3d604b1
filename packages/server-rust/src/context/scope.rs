//! Async-scoped binding of the active request's correlation context.
//!
//! The request context middleware runs each request's future inside
//! [`ActiveRequest::scope`]; any code polled by that future (handlers, REST
//! clients, log statements) can then reach the context through [`current`]
//! without it being threaded through every signature. The binding is
//! per-task: `tokio::spawn`ed work does not inherit it and must re-enter the
//! scope explicitly.

use std::future::Future;
use std::sync::Arc;

use selfservice_core::{CorrelationContext, CorrelationId};
use serde_json::Value;

use super::store::ContextStore;

tokio::task_local! {
    static ACTIVE_REQUEST: ActiveRequest;
}

/// Handle to the request currently being served.
#[derive(Debug, Clone)]
pub struct ActiveRequest {
    id: CorrelationId,
    store: Arc<ContextStore>,
}

impl ActiveRequest {
    #[must_use]
    pub fn new(id: CorrelationId, store: Arc<ContextStore>) -> Self {
        Self { id, store }
    }

    #[must_use]
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }

    /// Polls `fut` with this request bound as the active one.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        ACTIVE_REQUEST.scope(self, fut).await
    }

    fn snapshot(&self) -> Option<CorrelationContext> {
        self.store
            .get(&self.id)
            .map(|fields| CorrelationContext::new(self.id.clone(), (*fields).clone()))
    }
}

/// Returns the active request handle, if called within one.
#[must_use]
pub fn active_request() -> Option<ActiveRequest> {
    ACTIVE_REQUEST.try_with(Clone::clone).ok()
}

/// Correlation identifier of the active request.
#[must_use]
pub fn current_id() -> Option<CorrelationId> {
    ACTIVE_REQUEST.try_with(|active| active.id.clone()).ok()
}

/// Snapshot of the active request's context.
///
/// `None` outside a request, or once the request's entry has been cleared.
#[must_use]
pub fn current() -> Option<CorrelationContext> {
    ACTIVE_REQUEST
        .try_with(ActiveRequest::snapshot)
        .ok()
        .flatten()
}

/// Sets a field on the active request's context.
///
/// Returns `false` when there is no active request or its entry is gone.
pub fn set_field(key: impl Into<String>, value: impl Into<Value>) -> bool {
    let key = key.into();
    let value = value.into();
    ACTIVE_REQUEST
        .try_with(|active| active.store.update(&active.id, key, value))
        .unwrap_or(false)
}
