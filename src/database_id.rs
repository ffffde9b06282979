//! Database ID type definitions.

use uuid::Uuid;

use crate::Error;

/// The ID of a ledger entry.
///
/// Transaction IDs are random (v4) UUIDs assigned by the server, so they do
/// not leak how many transactions other users have recorded.
pub type TransactionId = Uuid;

/// Parse a transaction ID taken from a request path.
///
/// # Errors
///
/// Returns an [Error::Validation] for the `id` field if `raw_id` is not a UUID.
pub fn parse_transaction_id(raw_id: &str) -> Result<TransactionId, Error> {
    Uuid::parse_str(raw_id.trim()).map_err(|_| Error::Validation {
        field: "id",
        reason: format!("\"{raw_id}\" is not a valid transaction ID"),
    })
}
