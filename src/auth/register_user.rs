//! Handles requests to create a new user account.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    app_state::lock_connection,
    auth::cookie::set_auth_cookie,
    extract::JsonBody,
    profile::{ProfileUpdate, save_profile},
    user::{UserIdentity, create_user, parse_email},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt cost used when hashing the new password.
    pub password_hash_cost: u32,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data sent to register a new user.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterData {
    /// The email to log in with.
    pub email: String,
    /// The password to log in with, it must pass the strength check.
    pub password: String,
    /// The name to start the user's profile with.
    #[serde(default)]
    pub name: Option<String>,
}

/// A route handler for creating a new user.
///
/// The new user is logged in straight away: the response carries a session
/// cookie and the user's identity.
///
/// # Errors
///
/// Returns an error if the email is malformed or already registered, or if
/// the password is too weak.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    JsonBody(user_data): JsonBody<RegisterData>,
) -> Result<(StatusCode, PrivateCookieJar, Json<UserIdentity>), Error> {
    let email = parse_email(&user_data.email)?;
    let name = user_data
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned);

    let mut user_inputs = vec![email.as_str()];
    user_inputs.extend(name.as_deref());
    let validated_password = ValidatedPassword::new(&user_data.password, &user_inputs)?;

    let password_hash = PasswordHash::new(validated_password, state.password_hash_cost)
        .inspect_err(|error| {
            tracing::error!("An error occurred while hashing a password: {error}")
        })?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        let transaction = Transaction::new_unchecked(&connection, TransactionBehavior::Immediate)?;

        let user = create_user(email, password_hash, &transaction)?;
        save_profile(
            user.id,
            &ProfileUpdate {
                name,
                ..Default::default()
            },
            &transaction,
        )?;

        transaction.commit()?;
        user
    };

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, jar, Json(UserIdentity::from(&user))))
}
