use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, UserID,
    app_state::lock_connection,
    ledger::{LedgerState, list_transactions},
    transaction::{Transaction, TransactionKind},
};

/// The query parameters accepted when listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    /// Only list transactions of this kind, "income" or "expense".
    pub kind: Option<String>,
}

/// The response body for a list of transactions.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionList {
    /// The transactions, newest first.
    pub transactions: Vec<Transaction>,
}

/// A route handler for listing the logged in user's ledger, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionList>, Error> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<TransactionKind>)
        .transpose()?;

    let connection = lock_connection(&state.db_connection)?;
    let transactions = list_transactions(user_id, kind, &connection)?;

    Ok(Json(TransactionList { transactions }))
}
