//! User and service administration client.

use selfservice_core::{parse_features, AuthenticatedUser};
use serde::Deserialize;

use super::base::{path_segment, BaseClient};
use super::error::ClientError;

pub const SERVICE_NAME: &str = "adminusers";

/// A user as returned by user administration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub external_id: String,
    pub username: String,
    pub email: String,
    /// Comma-separated feature flags.
    #[serde(default)]
    pub features: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl User {
    /// Identity used for the request context once this user is logged in.
    #[must_use]
    pub fn authenticated(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            external_id: self.external_id.clone(),
            email: self.email.clone(),
            features: self.features.as_deref().map(parse_features).unwrap_or_default(),
        }
    }
}

/// A payment service and the gateway accounts it owns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Service {
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub gateway_account_ids: Vec<String>,
    #[serde(default)]
    pub redirect_to_service_immediately_on_terminal_state: bool,
}

#[derive(Debug, Clone)]
pub struct AdminusersClient {
    base: BaseClient,
}

impl AdminusersClient {
    #[must_use]
    pub fn new(base: BaseClient) -> Self {
        Self { base }
    }

    /// # Errors
    ///
    /// Propagates upstream failures; unknown users are `Status { status: 404, .. }`.
    pub async fn get_user(&self, external_id: &str) -> Result<User, ClientError> {
        self.base
            .get_json(&format!("/v1/api/users/{}", path_segment(external_id)), &[], "find a user")
            .await
    }

    /// # Errors
    ///
    /// Propagates upstream failures.
    pub async fn get_service(&self, external_id: &str) -> Result<Service, ClientError> {
        self.base
            .get_json(
                &format!("/v1/api/services/{}", path_segment(external_id)),
                &[],
                "find a service",
            )
            .await
    }
}
