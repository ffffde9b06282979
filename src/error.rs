//! Defines the app level error type and its conversion to JSON responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a valid session cookie.
    #[error("authentication required")]
    Unauthenticated,

    /// The user provided an email and password combination that does not
    /// match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// A field in the request failed validation.
    ///
    /// `field` names the offending field so that the client can correct it.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// The name of the field that failed validation.
        field: &'static str,
        /// A human readable description of what is wrong with the field.
        reason: String,
    },

    /// The request body could not be parsed as JSON of the expected shape.
    #[error("could not parse the request body: {0}")]
    InvalidRequestBody(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The resource exists but belongs to another user.
    #[error("you do not have permission to access this resource")]
    Forbidden,

    /// The email used to register is already in use.
    #[error("the email is already registered")]
    DuplicateEmail,

    /// The database is busy or locked and did not become available in time.
    #[error("the database is unavailable: {0}")]
    StorageUnavailable(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical
    /// timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The session token could not be serialized, parsed or its expiry
    /// formatted.
    #[error("could not handle the session token: {0}")]
    TokenError(String),

    /// A budget total grew too large to be represented.
    #[error("the budget totals would become too large")]
    TotalOverflow,

    /// A budget summary was about to be saved with totals that do not add up.
    #[error("budget summary for user {0} is inconsistent")]
    InconsistentSummary(i64),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if matches!(
                    sql_error.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Error::StorageUnavailable(sql_error.to_string())
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

/// The JSON body sent to the client for every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A short, human readable description of the problem.
    pub message: String,
    /// The request field that caused the error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    fn with_field(message: impl Into<String>, field: &str) -> Self {
        Self {
            message: message.into(),
            field: Some(field.to_owned()),
        }
    }
}

const GENERIC_SERVER_ERROR: &str =
    "An unexpected error occurred, check the server logs for more details.";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, body) = match self {
            Error::Unauthenticated | Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, ErrorBody::new(self.to_string()))
            }
            Error::Validation { field, ref reason } => (
                StatusCode::BAD_REQUEST,
                ErrorBody::with_field(reason.clone(), field),
            ),
            Error::TooWeak(ref feedback) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::with_field(format!("password is too weak: {feedback}"), "password"),
            ),
            Error::InvalidRequestBody(_) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(self.to_string()))
            }
            Error::TotalOverflow => (
                StatusCode::BAD_REQUEST,
                ErrorBody::with_field(self.to_string(), "amount"),
            ),
            Error::NotFound => (StatusCode::NOT_FOUND, ErrorBody::new(self.to_string())),
            Error::Forbidden => (StatusCode::FORBIDDEN, ErrorBody::new(self.to_string())),
            Error::DuplicateEmail => (
                StatusCode::CONFLICT,
                ErrorBody::with_field(self.to_string(), "email"),
            ),
            Error::StorageUnavailable(ref detail) => {
                tracing::error!("Storage unavailable: {detail}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody::new("The service is temporarily unavailable, try again later."),
                )
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(GENERIC_SERVER_ERROR),
                )
            }
        };

        (status_code, Json(body)).into_response()
    }
}
