//! REST clients for the upstream services.
//!
//! All clients share [`BaseClient`], which attaches the active request's
//! correlation identifier and logs every call with its context fields.

pub mod adminusers;
pub mod base;
pub mod config;
pub mod connector;
pub mod error;
pub mod ledger;
pub mod products;
pub mod publicauth;

pub use adminusers::AdminusersClient;
pub use base::{logging_fields, BaseClient};
pub use config::UpstreamConfig;
pub use connector::ConnectorClient;
pub use error::ClientError;
pub use ledger::LedgerClient;
pub use products::ProductsClient;
pub use publicauth::PublicAuthClient;

/// One client per upstream service, built from a single configuration.
#[derive(Debug, Clone)]
pub struct UpstreamClients {
    pub adminusers: AdminusersClient,
    pub connector: ConnectorClient,
    pub ledger: LedgerClient,
    pub products: ProductsClient,
    pub publicauth: PublicAuthClient,
}

impl UpstreamClients {
    /// # Errors
    ///
    /// Returns `ClientError::Build` if an HTTP client cannot be constructed.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ClientError> {
        let base = |service, url: &str| BaseClient::new(service, url, config.timeout);
        Ok(Self {
            adminusers: AdminusersClient::new(base(adminusers::SERVICE_NAME, &config.adminusers_url)?),
            connector: ConnectorClient::new(base(connector::SERVICE_NAME, &config.connector_url)?),
            ledger: LedgerClient::new(base(ledger::SERVICE_NAME, &config.ledger_url)?),
            products: ProductsClient::new(base(products::SERVICE_NAME, &config.products_url)?),
            publicauth: PublicAuthClient::new(base(publicauth::SERVICE_NAME, &config.publicauth_url)?),
        })
    }
}
