//! Gateway account management client.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::base::BaseClient;
use super::error::ClientError;

pub const SERVICE_NAME: &str = "connector";

/// Whether the payment pages ask paying users for an email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailCollectionMode {
    Mandatory,
    Optional,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Test,
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayAccount {
    pub gateway_account_id: u64,
    #[serde(default)]
    pub external_id: Option<String>,
    pub payment_provider: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub email_collection_mode: Option<EmailCollectionMode>,
    #[serde(default)]
    pub allow_apple_pay: bool,
    #[serde(default)]
    pub allow_google_pay: bool,
}

#[derive(Debug, Clone)]
pub struct ConnectorClient {
    base: BaseClient,
}

impl ConnectorClient {
    #[must_use]
    pub fn new(base: BaseClient) -> Self {
        Self { base }
    }

    /// # Errors
    ///
    /// Propagates upstream failures.
    pub async fn get_account(&self, gateway_account_id: u64) -> Result<GatewayAccount, ClientError> {
        self.base
            .get_json(
                &format!("/v1/frontend/accounts/{gateway_account_id}"),
                &[],
                "get an account",
            )
            .await
    }

    /// # Errors
    ///
    /// Propagates upstream failures.
    pub async fn set_email_collection_mode(
        &self,
        gateway_account_id: u64,
        mode: EmailCollectionMode,
    ) -> Result<(), ClientError> {
        let patch = json!({
            "op": "replace",
            "path": "email_collection_mode",
            "value": mode,
        });
        self.base
            .patch(
                &format!("/v1/api/accounts/{gateway_account_id}"),
                &patch,
                "update email collection mode",
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::{Path, State};
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde_json::Value;

    use super::*;
    use crate::test_support::spawn_stub;

    type Patches = Arc<Mutex<Vec<Value>>>;

    async fn client(patches: Patches) -> ConnectorClient {
        let stub = Router::new()
            .route(
                "/v1/frontend/accounts/{id}",
                get(|Path(id): Path<u64>| async move {
                    Json(json!({
                        "gateway_account_id": id,
                        "payment_provider": "stripe",
                        "type": "test",
                        "service_name": "Parking",
                        "email_collection_mode": "OPTIONAL"
                    }))
                }),
            )
            .route(
                "/v1/api/accounts/{id}",
                patch(|State(patches): State<Patches>, Json(body): Json<Value>| async move {
                    patches.lock().unwrap().push(body);
                    Json(json!({}))
                }),
            )
            .with_state(patches);
        let url = spawn_stub(stub).await;
        ConnectorClient::new(BaseClient::new(SERVICE_NAME, url, Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn get_account_decodes_type_and_mode() {
        let account = client(Patches::default()).await.get_account(42).await.unwrap();
        assert_eq!(account.gateway_account_id, 42);
        assert_eq!(account.account_type, AccountType::Test);
        assert_eq!(
            account.email_collection_mode,
            Some(EmailCollectionMode::Optional)
        );
    }

    #[tokio::test]
    async fn set_email_collection_mode_sends_replace_patch() {
        let patches = Patches::default();
        client(Arc::clone(&patches))
            .await
            .set_email_collection_mode(42, EmailCollectionMode::Mandatory)
            .await
            .unwrap();

        let sent = patches.lock().unwrap();
        assert_eq!(
            sent.as_slice(),
            &[json!({ "op": "replace", "path": "email_collection_mode", "value": "MANDATORY" })]
        );
    }
}
