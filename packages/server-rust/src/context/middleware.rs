//! Middleware binding each inbound request to a correlation context.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use selfservice_core::{AuthenticatedUser, ContextFields, CorrelationId};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use super::scope::ActiveRequest;
use super::CORRELATION_HEADER;
use crate::network::AppState;

/// What the inbound correlation header contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InboundId {
    Present(CorrelationId),
    Missing,
    Malformed,
}

/// Reads the correlation header. Only the first value is considered.
pub(crate) fn read_correlation_header(headers: &HeaderMap) -> InboundId {
    let Some(raw) = headers.get(&CORRELATION_HEADER) else {
        return InboundId::Missing;
    };
    let Ok(text) = raw.to_str() else {
        return InboundId::Malformed;
    };
    if text.trim().is_empty() {
        return InboundId::Missing;
    }
    CorrelationId::parse(text).map_or(InboundId::Malformed, InboundId::Present)
}

fn generate_correlation_id() -> CorrelationId {
    let raw = Uuid::new_v4().simple().to_string();
    CorrelationId::parse(&raw).unwrap_or_else(|| unreachable!("uuid text is visible ascii"))
}

/// Seeds the correlation context for one request and clears it afterwards.
///
/// The entry lives until the inner service returns its response. Response
/// bodies are sent after that, so anything running while a body streams
/// sees no context.
///
/// Requests without a usable identifier pass through untouched unless
/// `generate_missing` is configured. Never rejects a request: a malformed
/// header is logged and treated as absent.
pub async fn request_context(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let id = match read_correlation_header(request.headers()) {
        InboundId::Present(id) => Some(id),
        InboundId::Missing => None,
        InboundId::Malformed => {
            warn!(
                path = %request.uri().path(),
                "ignoring malformed {} header",
                CORRELATION_HEADER
            );
            None
        }
    };

    let id = match id {
        Some(id) => id,
        None if state.config.context.generate_missing => {
            let id = generate_correlation_id();
            match HeaderValue::from_str(id.as_str()) {
                Ok(value) => {
                    request.headers_mut().insert(CORRELATION_HEADER, value);
                }
                Err(e) => warn!(error = %e, "generated correlation id is not a valid header value"),
            }
            id
        }
        None => return next.run(request).await,
    };

    let fields = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(AuthenticatedUser::context_fields)
        .unwrap_or_else(ContextFields::new);

    let span = info_span!(
        "http.request",
        correlation_id = %id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    // Dropped on completion and on cancellation of this future. Completion
    // is when the response head is ready: a streamed body outlives the entry.
    let entry = state.contexts.enter(id, fields);
    ActiveRequest::new(entry.id().clone(), Arc::clone(&state.contexts))
        .scope(next.run(request))
        .instrument(span)
        .await
}
