//! Transaction ledger client.

use serde::{Deserialize, Serialize};

use super::base::{path_segment, BaseClient};
use super::error::ClientError;

pub const SERVICE_NAME: &str = "ledger";

/// Filters and paging for a transaction search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub page: u64,
    pub display_size: u64,
    pub reference: Option<String>,
    pub email: Option<String>,
    pub payment_states: Vec<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            display_size: selfservice_core::pagination::DEFAULT_PAGE_SIZE,
            reference: None,
            email: None,
            payment_states: Vec::new(),
            from_date: None,
            to_date: None,
        }
    }
}

impl TransactionQuery {
    fn to_params(&self, account_id: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("account_id", account_id.to_string()),
            ("page", self.page.to_string()),
            ("display_size", self.display_size.to_string()),
        ];
        let optional = [
            ("reference", &self.reference),
            ("email", &self.email),
            ("from_date", &self.from_date),
            ("to_date", &self.to_date),
        ];
        params.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.clone().map(|v| (key, v))),
        );
        if !self.payment_states.is_empty() {
            params.push(("payment_states", self.payment_states.join(",")));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionState {
    pub status: String,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub reference: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Amount in pence.
    pub amount: i64,
    pub state: TransactionState,
    #[serde(default)]
    pub email: Option<String>,
    pub created_date: String,
    #[serde(default)]
    pub transaction_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionSearchResults {
    pub total: u64,
    pub count: u64,
    pub page: u64,
    pub results: Vec<Transaction>,
}

#[derive(Debug, Clone)]
pub struct LedgerClient {
    base: BaseClient,
}

impl LedgerClient {
    #[must_use]
    pub fn new(base: BaseClient) -> Self {
        Self { base }
    }

    /// # Errors
    ///
    /// Propagates upstream failures.
    pub async fn transactions(
        &self,
        account_id: &str,
        query: &TransactionQuery,
    ) -> Result<TransactionSearchResults, ClientError> {
        self.base
            .get_json(
                "/v1/transaction",
                &query.to_params(account_id),
                "search transactions",
            )
            .await
    }

    /// # Errors
    ///
    /// Propagates upstream failures; unknown transactions are 404.
    pub async fn transaction(&self, account_id: &str, transaction_id: &str) -> Result<Transaction, ClientError> {
        self.base
            .get_json(
                &format!("/v1/transaction/{}", path_segment(transaction_id)),
                &[("account_id", account_id.to_string())],
                "get a transaction",
            )
            .await
    }
}
