//! Selfservice core: correlation context model, authenticated user, and list pagination.

pub mod context;
pub mod pagination;
pub mod types;

pub use context::{ContextFields, CorrelationContext, CorrelationId};
pub use pagination::{DisplaySizeOption, PageLink, PageLinkKind, Paginator};
pub use types::{parse_features, AuthenticatedUser};
