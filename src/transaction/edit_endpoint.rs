use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error, UserID,
    app_state::lock_connection,
    database_id::parse_transaction_id,
    extract::JsonBody,
    ledger::{LedgerState, update_transaction},
    transaction::{Transaction, form::TransactionPatchForm},
};

/// A route handler for changing some fields of a transaction.
///
/// Fields missing from the body are left as they are. Responds with the
/// updated transaction.
pub async fn edit_transaction_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
    JsonBody(form): JsonBody<TransactionPatchForm>,
) -> Result<Json<Transaction>, Error> {
    let transaction_id = parse_transaction_id(&transaction_id)?;
    let patch = form.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    let transaction = update_transaction(
        user_id,
        transaction_id,
        patch,
        &state.ledger_config,
        &connection,
    )?;

    Ok(Json(transaction))
}
