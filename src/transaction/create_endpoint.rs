use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{
    Error, UserID,
    app_state::lock_connection,
    extract::JsonBody,
    ledger::{LedgerState, record_transaction},
    timezone::today,
    transaction::{Transaction, form::TransactionForm},
};

/// A route handler for recording a new transaction.
///
/// Responds with 201 Created and the recorded transaction. A date is not
/// required, it defaults to today in the server's timezone.
pub async fn create_transaction_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(form): JsonBody<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let new_transaction = form.validate(today(&state.local_timezone)?)?;

    let connection = lock_connection(&state.db_connection)?;
    let transaction =
        record_transaction(user_id, &new_transaction, &state.ledger_config, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
