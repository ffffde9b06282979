use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error, UserID,
    app_state::lock_connection,
    database_id::parse_transaction_id,
    ledger::{LedgerState, get_transaction},
    transaction::Transaction,
};

/// A route handler for getting one of the logged in user's transactions.
///
/// Transactions of other users are reported as not found.
pub async fn get_transaction_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Transaction>, Error> {
    let transaction_id = parse_transaction_id(&transaction_id)?;

    let connection = lock_connection(&state.db_connection)?;

    get_transaction(user_id, transaction_id, &connection).map(Json)
}

#[cfg(test)]
mod get_transaction_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    use crate::{
        endpoints::{self, format_endpoint},
        ledger::LedgerConfig,
        test_utils::{assert_error, get_test_server, get_test_state, register_and_log_in},
        transaction::Transaction,
    };

    #[tokio::test]
    async fn gets_own_transaction() {
        let server = get_test_server(get_test_state(LedgerConfig::default()));
        let cookie = register_and_log_in(&server, "foo@bar.baz").await;
        let want = server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(cookie.clone())
            .json(&json!({ "kind": "income", "amount": 100, "category": "Salary" }))
            .await
            .json::<Transaction>();

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, want.id))
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Transaction>(), want);
    }

    #[tokio::test]
    async fn other_users_transaction_is_not_found() {
        let server = get_test_server(get_test_state(LedgerConfig::default()));
        let owner_cookie = register_and_log_in(&server, "foo@bar.baz").await;
        let other_cookie = register_and_log_in(&server, "other@bar.baz").await;
        let transaction = server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(owner_cookie)
            .json(&json!({ "kind": "income", "amount": 100, "category": "Salary" }))
            .await
            .json::<Transaction>();

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, transaction.id))
            .add_cookie(other_cookie)
            .await;

        assert_error(&response, StatusCode::NOT_FOUND, None);
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let server = get_test_server(get_test_state(LedgerConfig::default()));
        let cookie = register_and_log_in(&server, "foo@bar.baz").await;

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, Uuid::new_v4()))
            .add_cookie(cookie)
            .await;

        assert_error(&response, StatusCode::NOT_FOUND, None);
    }

    #[tokio::test]
    async fn malformed_id_is_rejected() {
        let server = get_test_server(get_test_state(LedgerConfig::default()));
        let cookie = register_and_log_in(&server, "foo@bar.baz").await;

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, "not-a-uuid"))
            .add_cookie(cookie)
            .await;

        assert_error(&response, StatusCode::BAD_REQUEST, Some("id"));
    }
}
