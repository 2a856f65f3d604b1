//! API key (public auth) client.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::base::{path_segment, BaseClient};
use super::error::ClientError;

pub const SERVICE_NAME: &str = "publicauth";

/// An issued API key, without its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiToken {
    pub token_link: String,
    pub description: String,
    #[serde(default)]
    pub created_by: Option<String>,
    pub issued_date: String,
    #[serde(default)]
    pub last_used: Option<String>,
    #[serde(default)]
    pub revoked: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenList {
    tokens: Vec<ApiToken>,
}

#[derive(Debug, Deserialize)]
struct CreatedToken {
    token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTokenRequest {
    pub account_id: String,
    pub description: String,
    pub created_by: String,
    pub token_type: String,
}

#[derive(Debug, Clone)]
pub struct PublicAuthClient {
    base: BaseClient,
}

impl PublicAuthClient {
    #[must_use]
    pub fn new(base: BaseClient) -> Self {
        Self { base }
    }

    /// Active API keys for the gateway account.
    ///
    /// # Errors
    ///
    /// Propagates upstream failures.
    pub async fn api_keys(&self, gateway_account_id: &str) -> Result<Vec<ApiToken>, ClientError> {
        let list: TokenList = self
            .base
            .get_json(
                &format!("/v1/frontend/auth/{}", path_segment(gateway_account_id)),
                &[],
                "list API keys",
            )
            .await?;
        Ok(list.tokens)
    }

    /// Issues a new key and returns its secret, which is shown only once.
    ///
    /// # Errors
    ///
    /// Propagates upstream failures.
    pub async fn create_api_key(&self, request: &CreateTokenRequest) -> Result<String, ClientError> {
        let created: CreatedToken = self
            .base
            .post_json("/v1/frontend/auth", request, "create an API key")
            .await?;
        Ok(created.token)
    }

    /// # Errors
    ///
    /// Propagates upstream failures.
    pub async fn revoke_api_key(&self, gateway_account_id: &str, token_link: &str) -> Result<(), ClientError> {
        self.base
            .delete(
                &format!("/v1/frontend/auth/{}", path_segment(gateway_account_id)),
                Some(&json!({ "token_link": token_link })),
                "revoke an API key",
            )
            .await
    }
}
