//! The paths of the JSON API.
//!
//! Paths with a parameter, e.g. `{transaction_id}`, can be turned into a
//! concrete path with [format_endpoint].

/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for logging in.
pub const LOG_IN: &str = "/api/log_in";
/// The route for logging out.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for the identity of the logged in user.
pub const CURRENT_USER: &str = "/api/me";
/// The route for the logged in user's profile.
pub const PROFILE: &str = "/api/user/profile";
/// The route for changing the logged in user's password.
pub const PASSWORD: &str = "/api/user/password";
/// The route to list and record transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for the budget summary.
pub const SUMMARY: &str = "/api/summary";
/// The route to set the shared expense on the budget summary.
pub const SHARED_EXPENSE: &str = "/api/summary/shared_expense";
/// The route to rebuild the budget summary from the ledger.
pub const RECONCILE_SUMMARY: &str = "/api/summary/reconcile";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let param_start = match endpoint_path.find('{') {
        Some(start) => start,
        None => return endpoint_path.to_owned(),
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
