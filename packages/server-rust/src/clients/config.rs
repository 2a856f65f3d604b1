use std::time::Duration;

/// Base URLs and shared settings for the upstream services.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub adminusers_url: String,
    pub connector_url: String,
    pub ledger_url: String,
    pub products_url: String,
    pub publicauth_url: String,
    /// Per-request timeout for every upstream call.
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            adminusers_url: "http://localhost:9700".to_string(),
            connector_url: "http://localhost:9300".to_string(),
            ledger_url: "http://localhost:10700".to_string(),
            products_url: "http://localhost:18000".to_string(),
            publicauth_url: "http://localhost:9600".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}
