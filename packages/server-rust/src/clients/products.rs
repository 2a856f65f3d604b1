//! Payment link (products) client.

use serde::{Deserialize, Serialize};

use super::base::BaseClient;
use super::error::ClientError;

pub const SERVICE_NAME: &str = "products";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Adhoc,
    Demo,
    Prototype,
}

/// A payment link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Fixed price in pence; `None` lets the paying user enter an amount.
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(default)]
    pub reference_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct ProductsClient {
    base: BaseClient,
}

impl ProductsClient {
    #[must_use]
    pub fn new(base: BaseClient) -> Self {
        Self { base }
    }

    /// Payment links of type `ADHOC` owned by the gateway account.
    ///
    /// # Errors
    ///
    /// Propagates upstream failures.
    pub async fn payment_links(&self, gateway_account_id: u64) -> Result<Vec<Product>, ClientError> {
        let products: Vec<Product> = self
            .base
            .get_json(
                &format!("/v1/api/gateway-account/{gateway_account_id}/products"),
                &[],
                "list payment links",
            )
            .await?;
        Ok(products
            .into_iter()
            .filter(|p| p.product_type == ProductType::Adhoc)
            .collect())
    }
}
