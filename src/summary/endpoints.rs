//! Route handlers for reading and maintaining the budget summary.

use axum::{Extension, Json, extract::State};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error, UserID,
    amount::{MAX_AMOUNT, MAX_FRACTION_DIGITS, decimal_from_json_number},
    app_state::lock_connection,
    extract::JsonBody,
    ledger::{LedgerState, Reconciliation, get_summary, reconcile_summary, set_shared_expense},
    summary::BudgetSummary,
};

/// A route handler for the logged in user's budget summary.
pub async fn get_summary_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<BudgetSummary>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_summary(user_id, &state.ledger_config, &connection).map(Json)
}

/// The body of a request to set the shared expense.
#[derive(Debug, Deserialize)]
pub struct SharedExpenseForm {
    amount: Option<Value>,
}

impl SharedExpenseForm {
    fn validate(self) -> Result<Decimal, Error> {
        let invalid = |reason: &str| Error::Validation {
            field: "amount",
            reason: reason.to_owned(),
        };

        let amount = match self.amount {
            Some(Value::Number(number)) => decimal_from_json_number(&number)?,
            None | Some(Value::Null) => return Err(invalid("amount is required")),
            Some(_) => return Err(invalid("amount must be a number")),
        };

        if amount < Decimal::ZERO {
            return Err(invalid("shared expense cannot be negative"));
        }

        if amount > MAX_AMOUNT {
            return Err(invalid(&format!("amount must be at most {MAX_AMOUNT}")));
        }

        if amount.normalize().scale() > MAX_FRACTION_DIGITS {
            return Err(invalid(&format!(
                "amount must have at most {MAX_FRACTION_DIGITS} decimal places"
            )));
        }

        Ok(amount)
    }
}

/// A route handler for setting the shared expense, responds with the updated summary.
pub async fn set_shared_expense_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(form): JsonBody<SharedExpenseForm>,
) -> Result<Json<BudgetSummary>, Error> {
    let shared_expense = form.validate()?;

    let connection = lock_connection(&state.db_connection)?;

    set_shared_expense(user_id, shared_expense, &state.ledger_config, &connection).map(Json)
}

/// A route handler for rebuilding the stored summary from the ledger.
pub async fn reconcile_summary_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Reconciliation>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    reconcile_summary(user_id, &state.ledger_config, &connection).map(Json)
}
