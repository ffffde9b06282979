//! Handles log-out requests.

use axum::Json;
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::cookie::invalidate_auth_cookie;

/// The response body for a log-out request.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogOutResponse {
    /// Always true, logging out cannot fail.
    pub success: bool,
}

/// Invalidate the session cookie.
///
/// This works whether or not the client was logged in.
pub async fn post_log_out(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<LogOutResponse>) {
    (
        invalidate_auth_cookie(jar),
        Json(LogOutResponse { success: true }),
    )
}
