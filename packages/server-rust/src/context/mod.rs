//! Request correlation context: storage, async propagation, and the middleware
//! that ties both to the inbound HTTP request lifecycle.
//!
//! - [`store`]: keyed store of in-flight contexts, cleared by RAII guards
//! - [`scope`]: task-local binding that survives `.await` points
//! - [`middleware`]: axum middleware seeding both from the inbound header

pub mod middleware;
pub mod scope;
pub mod store;

use http::HeaderName;

pub use middleware::request_context;
pub use scope::{current, current_id, set_field, ActiveRequest};
pub use store::{ContextEntryGuard, ContextStore};

/// Header carrying the correlation identifier, inbound and outbound.
pub const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-request-id");
