//! Command-line and environment configuration for the `selfservice` binary.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::clients::UpstreamConfig;
use crate::network::{ContextConfig, NetworkConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Parser)]
#[command(name = "selfservice")]
#[command(about = "Selfservice server with request correlation")]
pub struct Cli {
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "PORT", default_value_t = 9400)]
    pub port: u16,

    #[arg(long, env = "ADMINUSERS_URL", default_value = "http://localhost:9700")]
    pub adminusers_url: String,
    #[arg(long, env = "CONNECTOR_URL", default_value = "http://localhost:9300")]
    pub connector_url: String,
    #[arg(long, env = "LEDGER_URL", default_value = "http://localhost:10700")]
    pub ledger_url: String,
    #[arg(long, env = "PRODUCTS_URL", default_value = "http://localhost:18000")]
    pub products_url: String,
    #[arg(long, env = "PUBLIC_AUTH_URL", default_value = "http://localhost:9600")]
    pub publicauth_url: String,
    /// Timeout for each upstream call, in milliseconds.
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value_t = 60_000)]
    pub upstream_timeout_ms: u64,

    /// Generate a correlation id for requests that arrive without one.
    #[arg(long, env = "GENERATE_CORRELATION_ID", default_value_t = false)]
    pub generate_correlation_id: bool,
    /// Comma-separated allowed CORS origins; `*` allows any.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
    /// Grace period for open connections after a shutdown signal.
    #[arg(long, env = "DRAIN_TIMEOUT_SECS", default_value_t = 30)]
    pub drain_timeout_secs: u64,

    /// Serve Prometheus metrics on this port when set.
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Cli {
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            drain_timeout: Duration::from_secs(self.drain_timeout_secs),
            context: ContextConfig {
                generate_missing: self.generate_correlation_id,
            },
        }
    }

    #[must_use]
    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            adminusers_url: self.adminusers_url.clone(),
            connector_url: self.connector_url.clone(),
            ledger_url: self.ledger_url.clone(),
            products_url: self.products_url.clone(),
            publicauth_url: self.publicauth_url.clone(),
            timeout: Duration::from_millis(self.upstream_timeout_ms),
        }
    }
}
