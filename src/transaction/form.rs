//! Request bodies for creating and editing transactions, and their validation.
//!
//! Fields are deserialized as loose JSON values so that a value of the wrong
//! type is reported against the field it was sent in, rather than as a
//! generic parse error for the whole body.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    amount::Amount,
    transaction::{NewTransaction, TransactionKind, TransactionPatch},
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The body of a request to record a transaction.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionForm {
    #[serde(alias = "type")]
    kind: Option<Value>,
    amount: Option<Value>,
    category: Option<Value>,
    description: Option<Value>,
    #[serde(alias = "transactionDate", alias = "transaction_date")]
    occurred_on: Option<Value>,
}

impl TransactionForm {
    /// Validate every field, using `today` when no date was sent.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] naming the first invalid field.
    pub fn validate(self, today: Date) -> Result<NewTransaction, Error> {
        let kind = parse_kind(required(self.kind.as_ref(), "kind")?)?;
        let amount = Amount::from_json(self.amount.as_ref().unwrap_or(&Value::Null))?;
        let category = parse_category(required(self.category.as_ref(), "category")?)?;
        let description = parse_description(self.description.as_ref())?;
        let occurred_on = match self.occurred_on.as_ref() {
            None | Some(Value::Null) => today,
            Some(value) => parse_date(value)?,
        };

        Ok(NewTransaction {
            kind,
            amount,
            category,
            description,
            occurred_on,
        })
    }
}

/// The body of a request to edit a transaction.
///
/// Only the fields present in the body are changed. An explicit `null` is
/// kept apart from a missing field so that `"description": null` can clear
/// the description.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionPatchForm {
    #[serde(default, alias = "type", deserialize_with = "present")]
    kind: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    amount: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    category: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    description: Option<Value>,
    #[serde(
        default,
        alias = "transactionDate",
        alias = "transaction_date",
        deserialize_with = "present"
    )]
    occurred_on: Option<Value>,
}

impl TransactionPatchForm {
    /// Validate the fields that were sent, with the same rules as [TransactionForm].
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] naming the first invalid field.
    pub fn validate(self) -> Result<TransactionPatch, Error> {
        Ok(TransactionPatch {
            kind: self.kind.as_ref().map(parse_kind).transpose()?,
            amount: self.amount.as_ref().map(Amount::from_json).transpose()?,
            category: self.category.as_ref().map(parse_category).transpose()?,
            description: self
                .description
                .as_ref()
                .map(|value| parse_description(Some(value)))
                .transpose()?,
            occurred_on: self.occurred_on.as_ref().map(parse_date).transpose()?,
        })
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::Validation {
        field,
        reason: reason.into(),
    }
}

fn required<'a>(value: Option<&'a Value>, field: &'static str) -> Result<&'a Value, Error> {
    match value {
        None | Some(Value::Null) => Err(invalid(field, format!("{field} is required"))),
        Some(value) => Ok(value),
    }
}

fn parse_kind(value: &Value) -> Result<TransactionKind, Error> {
    match value {
        Value::String(kind) => kind.trim().parse(),
        Value::Null => Err(invalid("kind", "kind is required")),
        _ => Err(invalid("kind", "kind must be \"income\" or \"expense\"")),
    }
}

fn parse_category(value: &Value) -> Result<String, Error> {
    match value {
        Value::String(category) if !category.trim().is_empty() => {
            Ok(category.trim().to_owned())
        }
        Value::String(_) => Err(invalid("category", "category cannot be empty")),
        Value::Null => Err(invalid("category", "category is required")),
        _ => Err(invalid("category", "category must be a string")),
    }
}

fn parse_description(value: Option<&Value>) -> Result<Option<String>, Error> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(description)) => {
            let description = description.trim();

            Ok((!description.is_empty()).then(|| description.to_owned()))
        }
        Some(_) => Err(invalid("description", "description must be a string")),
    }
}

fn parse_date(value: &Value) -> Result<Date, Error> {
    match value {
        Value::String(date) => Date::parse(date.trim(), DATE_FORMAT).map_err(|_| {
            invalid(
                "occurred_on",
                format!("\"{date}\" is not a date in the format YYYY-MM-DD"),
            )
        }),
        Value::Null => Err(invalid("occurred_on", "occurred_on cannot be null")),
        _ => Err(invalid(
            "occurred_on",
            "occurred_on must be a date string in the format YYYY-MM-DD",
        )),
    }
}


#[cfg(test)]
mod transaction_patch_form_tests {
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        Error,
        amount::Amount,
        transaction::{TransactionKind, TransactionPatch, form::TransactionPatchForm},
    };

    fn parse(body: Value) -> TransactionPatchForm {
        serde_json::from_value(body).expect("could not parse test body")
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let patch = parse(json!({})).validate().unwrap();

        assert_eq!(patch, TransactionPatch::default());
    }

    #[test]
    fn null_description_clears_it() {
        let patch = parse(json!({ "description": null })).validate().unwrap();

        assert_eq!(patch.description, Some(None));
    }

    #[test]
    fn parses_present_fields() {
        let patch = parse(json!({
            "kind": "expense",
            "amount": 99.99,
            "occurred_on": "2025-10-01",
        }))
        .validate()
        .unwrap();

        assert_eq!(patch.kind, Some(TransactionKind::Expense));
        assert_eq!(
            patch.amount,
            Some(Amount::new(Decimal::new(9999, 2)).unwrap())
        );
        assert_eq!(patch.occurred_on, Some(date!(2025 - 10 - 01)));
        assert_eq!(patch.category, None);
    }

    #[test]
    fn rejects_non_positive_amount() {
        let result = parse(json!({ "amount": -1 })).validate();

        assert!(
            matches!(result, Err(Error::Validation { field: "amount", .. })),
            "got {result:?}"
        );
    }

    #[test]
    fn rejects_null_amount() {
        let result = parse(json!({ "amount": null })).validate();

        assert!(
            matches!(result, Err(Error::Validation { field: "amount", .. })),
            "got {result:?}"
        );
    }

    #[test]
    fn rejects_empty_category() {
        let result = parse(json!({ "category": "  " })).validate();

        assert!(
            matches!(result, Err(Error::Validation { field: "category", .. })),
            "got {result:?}"
        );
    }
}
