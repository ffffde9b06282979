//! Resolves the identity of the logged in user.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    app_state::lock_connection,
    user::{UserIdentity, get_user_by_id},
};

/// The state needed to look up the logged in user.
#[derive(Debug, Clone)]
pub struct CurrentUserState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CurrentUserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with the ID and email of the logged in user.
///
/// A session for a user that no longer exists is treated as no session.
pub async fn get_current_user(
    State(state): State<CurrentUserState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<UserIdentity>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    match get_user_by_id(user_id, &connection) {
        Ok(user) => Ok(Json(UserIdentity::from(&user))),
        Err(Error::NotFound) => {
            tracing::warn!("Session cookie refers to unknown user {user_id}");
            Err(Error::Unauthenticated)
        }
        Err(error) => Err(error),
    }
}
