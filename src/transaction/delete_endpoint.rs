use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, UserID,
    app_state::lock_connection,
    database_id::parse_transaction_id,
    ledger::{LedgerState, delete_transaction},
};

/// The response body for a successful deletion.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    /// Confirms what was deleted.
    pub message: String,
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
) -> Result<Json<DeletedResponse>, Error> {
    let transaction_id = parse_transaction_id(&transaction_id)?;

    let connection = lock_connection(&state.db_connection)?;
    let deleted = delete_transaction(
        user_id,
        transaction_id,
        &state.ledger_config,
        &connection,
    )?;

    Ok(Json(DeletedResponse {
        message: format!("Transaction {} was deleted", deleted.id),
    }))
}
