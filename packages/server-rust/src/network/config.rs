//! Network configuration types for the selfservice server.

use std::time::Duration;

/// Top-level network configuration for the server.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
    /// How long open connections may keep draining after shutdown starts.
    pub drain_timeout: Duration,
    /// Correlation context behaviour.
    pub context: ContextConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(30),
            context: ContextConfig::default(),
        }
    }
}

/// Controls how inbound requests are bound to correlation contexts.
#[derive(Debug, Clone, Default)]
pub struct ContextConfig {
    /// Generate an identifier for requests that arrive without one.
    ///
    /// Off by default: such requests are served without a context.
    pub generate_missing: bool,
}
