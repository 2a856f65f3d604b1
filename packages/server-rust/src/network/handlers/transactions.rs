//! Transaction list endpoint: one ledger search plus pagination.

use axum::extract::{Path, Query, State};
use axum::Json;
use selfservice_core::pagination::{page_size_or_default, DisplaySizeOption, PageLink};
use selfservice_core::Paginator;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::clients::ledger::{Transaction, TransactionQuery};
use crate::context::set_field;
use crate::network::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub page: Option<u64>,
    pub display_size: Option<u64>,
    pub reference: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub total: u64,
    pub page: u64,
    pub last_page: u64,
    pub page_size: u64,
    pub links: Vec<PageLink>,
    pub show_display_sizes: bool,
    pub display_sizes: Vec<DisplaySizeOption>,
    pub results: Vec<Transaction>,
}

/// `GET /api/accounts/{account_id}/transactions`
///
/// # Errors
///
/// `400` for a non-numeric account id, `404`/`502` for ledger failures.
pub async fn transactions_handler(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<TransactionList>, ApiError> {
    if account_id.is_empty() || !account_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::BadRequest(
            "account id must be numeric".to_string(),
        ));
    }
    set_field("gateway_account_id", account_id.clone());

    let page_size = page_size_or_default(params.display_size.unwrap_or_default());
    let mut query = TransactionQuery {
        page: params.page.unwrap_or(1).max(1),
        display_size: page_size,
        reference: params.reference,
        email: params.email,
        ..TransactionQuery::default()
    };

    let mut found = state.clients.ledger.transactions(&account_id, &query).await?;
    let mut paginator = Paginator::new(found.total, page_size, query.page);
    if paginator.page() != query.page {
        // Requested page is past the end: fetch the last page instead
        query.page = paginator.page();
        found = state.clients.ledger.transactions(&account_id, &query).await?;
        paginator = Paginator::new(found.total, page_size, query.page);
    }

    Ok(Json(TransactionList {
        total: paginator.total(),
        page: paginator.page(),
        last_page: paginator.last_page(),
        page_size: paginator.page_size(),
        links: paginator.page_links(),
        show_display_sizes: paginator.show_display_size_links(),
        display_sizes: paginator.display_size_options(),
        results: found.results,
    }))
}
