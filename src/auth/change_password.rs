//! Handles requests from a logged in user to change their password.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, UserID, ValidatedPassword,
    app_state::lock_connection,
    extract::JsonBody,
    user::{get_user_by_id, update_password},
};

/// The state needed for changing a password.
#[derive(Debug, Clone)]
pub struct ChangePasswordState {
    /// The bcrypt cost used when hashing the new password.
    pub password_hash_cost: u32,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ChangePasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data sent to change a password.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChangePasswordData {
    /// The password the user logs in with now.
    pub current_password: String,
    /// The password to log in with from now on, it must pass the strength check.
    pub new_password: String,
    /// The new password typed a second time. Checked against `new_password`
    /// when sent.
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// The response body for a password change.
#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordChangedResponse {
    /// A short confirmation for the client.
    pub message: String,
}

/// A route handler for replacing the logged in user's password.
///
/// The session stays valid, only later log-ins need the new password.
///
/// # Errors
///
/// Returns an [Error::Validation] if the current password is wrong or the
/// confirmation does not match, and an [Error::TooWeak] if the new password
/// is too easy to guess.
pub async fn change_password(
    State(state): State<ChangePasswordState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(data): JsonBody<ChangePasswordData>,
) -> Result<Json<PasswordChangedResponse>, Error> {
    if data
        .confirm_password
        .as_ref()
        .is_some_and(|confirmation| *confirmation != data.new_password)
    {
        return Err(Error::Validation {
            field: "confirm_password",
            reason: "the passwords do not match".to_owned(),
        });
    }

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        get_user_by_id(user_id, &connection)?
    };

    if !user.password_hash.verify(&data.current_password)? {
        tracing::warn!("Password change with wrong current password for user {user_id}");
        return Err(Error::Validation {
            field: "current_password",
            reason: "the current password is incorrect".to_owned(),
        });
    }

    let validated_password = ValidatedPassword::new(&data.new_password, &[user.email.as_str()])?;
    let password_hash = PasswordHash::new(validated_password, state.password_hash_cost)
        .inspect_err(|error| {
            tracing::error!("An error occurred while hashing a password: {error}")
        })?;

    {
        let connection = lock_connection(&state.db_connection)?;
        update_password(user_id, &password_hash, &connection)?;
    }

    tracing::info!("User {user_id} changed their password");

    Ok(Json(PasswordChangedResponse {
        message: "password changed".to_owned(),
    }))
}
