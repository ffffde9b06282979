use axum::http::StatusCode;
use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, auth::COOKIE_TOKEN, build_router, endpoints, error::ErrorBody, ledger::LedgerConfig,
};

pub(crate) const TEST_PASSWORD: &str = "averylongandsecurepassword";

pub(crate) fn get_test_state(ledger_config: LedgerConfig) -> AppState {
    let db_connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(db_connection, "42", "Etc/UTC", ledger_config)
        .expect("Could not create app state.")
        .with_password_hash_cost(4)
}

pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// Register a user with [TEST_PASSWORD] and return their session cookie.
pub(crate) async fn register_and_log_in(server: &TestServer, email: &str) -> Cookie<'static> {
    let response = server
        .post(endpoints::USERS)
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;

    response.assert_status(StatusCode::CREATED);

    response.cookie(COOKIE_TOKEN)
}

#[track_caller]
pub(crate) fn assert_error(response: &TestResponse, status: StatusCode, field: Option<&str>) {
    response.assert_status(status);

    let body = response.json::<ErrorBody>();
    assert_eq!(body.field.as_deref(), field, "got error body {body:?}");
    assert!(!body.message.is_empty(), "got empty error message");
}
