//! A user's profile: optional personal details shown alongside their budget.
//!
//! Every user has at most one profile row. It is created with the user on
//! registration, or lazily the first time it is read.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserID,
    app_state::lock_connection,
    extract::JsonBody,
    user::{UserIdentity, get_user_by_id},
};

/// The oldest age a profile may state.
pub const MAX_AGE: u8 = 150;

/// A user's personal details. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// The name the user goes by.
    pub name: Option<String>,
    /// The user's age in years.
    pub age: Option<u8>,
    /// Where the user lives, free text.
    pub location: Option<String>,
    /// When the profile last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated profile fields that replace the stored ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    /// The new name.
    pub name: Option<String>,
    /// The new age.
    pub age: Option<u8>,
    /// The new location.
    pub location: Option<String>,
}

/// Create the profile table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS profile (
                user_id INTEGER PRIMARY KEY,
                name TEXT,
                age INTEGER CHECK (age IS NULL OR (age >= 0 AND age <= 150)),
                location TEXT,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Get the profile of `user_id`, creating an empty one if there is none.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, e.g. `user_id` is not a user.
pub fn get_or_create_profile(user_id: UserID, connection: &Connection) -> Result<Profile, Error> {
    connection.execute(
        "INSERT OR IGNORE INTO profile (user_id, updated_at) VALUES (?1, ?2)",
        (user_id.as_i64(), OffsetDateTime::now_utc()),
    )?;

    connection
        .prepare("SELECT name, age, location, updated_at FROM profile WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id.as_i64())], map_profile_row)
        .map_err(Error::from)
}

/// Replace the profile of `user_id` with `update`, creating it if needed.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, e.g. `user_id` is not a user.
pub fn save_profile(
    user_id: UserID,
    update: &ProfileUpdate,
    connection: &Connection,
) -> Result<Profile, Error> {
    connection
        .prepare(
            "INSERT INTO profile (user_id, name, age, location, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                location = excluded.location,
                updated_at = excluded.updated_at
            RETURNING name, age, location, updated_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                &update.name,
                update.age,
                &update.location,
                OffsetDateTime::now_utc(),
            ),
            map_profile_row,
        )
        .map_err(Error::from)
}

fn map_profile_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    Ok(Profile {
        name: row.get(0)?,
        age: row.get(1)?,
        location: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

/// The body of a request to update the profile.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    name: Option<Value>,
    age: Option<Value>,
    location: Option<Value>,
}

impl ProfileForm {
    /// Validate the form. Missing, null and blank fields are cleared.
    ///
    /// # Errors
    /// Returns an [Error::Validation] naming the first invalid field.
    pub fn validate(self) -> Result<ProfileUpdate, Error> {
        Ok(ProfileUpdate {
            name: parse_text(self.name, "name")?,
            age: parse_age(self.age)?,
            location: parse_text(self.location, "location")?,
        })
    }
}

fn parse_text(value: Option<Value>, field: &'static str) -> Result<Option<String>, Error> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => {
            let text = text.trim();

            Ok((!text.is_empty()).then(|| text.to_owned()))
        }
        Some(_) => Err(Error::Validation {
            field,
            reason: format!("{field} must be a string"),
        }),
    }
}

fn parse_age(value: Option<Value>) -> Result<Option<u8>, Error> {
    let age = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_u64(),
        Some(_) => None,
    };

    match age.and_then(|age| u8::try_from(age).ok()) {
        Some(age) if age <= MAX_AGE => Ok(Some(age)),
        _ => Err(Error::Validation {
            field: "age",
            reason: format!("age must be a whole number between 0 and {MAX_AGE}"),
        }),
    }
}

/// The state needed to read and update profiles.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for managing profiles.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body for reading a profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    /// The user's profile.
    pub profile: Profile,
    /// Who the profile belongs to.
    pub user: UserIdentity,
}

/// The response body for updating a profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedProfileResponse {
    /// The profile after the update.
    pub profile: Profile,
}

/// A route handler for the logged in user's profile.
pub async fn get_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<ProfileResponse>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = get_user_by_id(user_id, &connection)?;
    let profile = get_or_create_profile(user_id, &connection)?;

    Ok(Json(ProfileResponse {
        profile,
        user: UserIdentity::from(&user),
    }))
}

/// A route handler for replacing the logged in user's profile.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(form): JsonBody<ProfileForm>,
) -> Result<Json<UpdatedProfileResponse>, Error> {
    let update = form.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    let profile = save_profile(user_id, &update, &connection)?;

    tracing::debug!("Updated profile of user {user_id}");

    Ok(Json(UpdatedProfileResponse { profile }))
}
