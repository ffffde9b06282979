//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, UserID, amount::Amount, database_id::TransactionId};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brought money in or sent it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionKind {
    /// The name used in requests, responses and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(Error::Validation {
                field: "kind",
                reason: format!("kind must be \"income\" or \"expense\", got \"{other}\""),
            }),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An entry in a user's ledger: an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user who recorded the transaction.
    #[serde(rename = "owner_id")]
    pub owner: UserID,
    /// Whether the money came in or went out.
    pub kind: TransactionKind,
    /// How much money moved.
    pub amount: Amount,
    /// A label such as "Groceries" or "Salary".
    pub category: String,
    /// An optional free text note.
    pub description: Option<String>,
    /// The day the money moved.
    #[serde(with = "iso_date")]
    pub occurred_on: Date,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl Transaction {
    /// A copy of this transaction with the fields in `patch` replaced.
    pub fn apply(&self, patch: TransactionPatch) -> Transaction {
        Transaction {
            id: self.id,
            owner: self.owner,
            kind: patch.kind.unwrap_or(self.kind),
            amount: patch.amount.unwrap_or(self.amount),
            category: patch.category.unwrap_or_else(|| self.category.clone()),
            description: patch
                .description
                .unwrap_or_else(|| self.description.clone()),
            occurred_on: patch.occurred_on.unwrap_or(self.occurred_on),
            recorded_at: self.recorded_at,
        }
    }
}

/// A validated transaction that has not been recorded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether the money came in or went out.
    pub kind: TransactionKind,
    /// How much money moved.
    pub amount: Amount,
    /// A non-empty, trimmed label.
    pub category: String,
    /// A trimmed, non-empty note, if any.
    pub description: Option<String>,
    /// The day the money moved.
    pub occurred_on: Date,
}

/// Validated changes to an existing transaction.
///
/// `None` leaves a field unchanged. For `description`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    /// The new kind.
    pub kind: Option<TransactionKind>,
    /// The new amount.
    pub amount: Option<Amount>,
    /// The new category.
    pub category: Option<String>,
    /// The new description.
    pub description: Option<Option<String>>,
    /// The new date.
    pub occurred_on: Option<Date>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, owner_id, kind, amount, category, description, occurred_on, recorded_at";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id BLOB PRIMARY KEY,
                owner_id INTEGER NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                amount TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT,
                occurred_on TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Listing a user's ledger newest first is the most common query.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_owner_date
            ON \"transaction\"(owner_id, occurred_on DESC, recorded_at DESC);",
        (),
    )?;

    Ok(())
}

/// Insert a new ledger row for `owner`.
///
/// The ID and `recorded_at` timestamp are assigned here.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error,
/// e.g. `owner` does not refer to a user.
pub fn insert_transaction(
    owner: UserID,
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (id, owner_id, kind, amount, category, description, occurred_on, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                Uuid::new_v4(),
                owner.as_i64(),
                transaction.kind,
                transaction.amount,
                &transaction.category,
                &transaction.description,
                transaction.occurred_on,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve a transaction from the database by its `id`, whoever owns it.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn select_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(Error::from)
}

/// Retrieve the ledger of `owner`, newest first.
///
/// Transactions are ordered by the day they happened, then by when they were
/// recorded, then by insertion order. Pass `kind` to only get income or only
/// get expenses.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn select_transactions(
    owner: UserID,
    kind: Option<TransactionKind>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE owner_id = ?1 AND (?2 IS NULL OR kind = ?2)
             ORDER BY occurred_on DESC, recorded_at DESC, rowid DESC"
        ))?
        .query_map((owner.as_i64(), kind), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Overwrite the stored row of `transaction` with its current fields.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction is not in the database,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction_row(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
        SET kind = ?1, amount = ?2, category = ?3, description = ?4, occurred_on = ?5
        WHERE id = ?6",
        (
            transaction.kind,
            transaction.amount,
            &transaction.category,
            &transaction.description,
            transaction.occurred_on,
            transaction.id,
        ),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Delete the transaction with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction is not in the database,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction_row(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = :id", &[(":id", &id)])?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        owner: UserID::new(row.get(1)?),
        kind: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        occurred_on: row.get(6)?,
        recorded_at: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
