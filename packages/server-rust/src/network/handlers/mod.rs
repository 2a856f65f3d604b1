//! HTTP handler definitions for the selfservice server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod health;
pub mod transactions;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use transactions::transactions_handler;

use std::sync::Arc;
use std::time::Instant;

use super::{NetworkConfig, ShutdownController};
use crate::clients::UpstreamClients;
use crate::context::ContextStore;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Correlation contexts of in-flight requests.
    pub contexts: Arc<ContextStore>,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Clients for the upstream services.
    pub clients: Arc<UpstreamClients>,
    /// Network configuration (bind address, timeouts, context behaviour).
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
