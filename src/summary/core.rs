//! The budget summary model, the ledger fold and the summary table.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, UserID, amount::get_decimal, transaction::TransactionKind};

/// Income and expense totals folded from an owner's ledger.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTotals {
    /// The sum of all income amounts.
    pub income: Decimal,
    /// The sum of all expense amounts.
    pub expense: Decimal,
}

impl LedgerTotals {
    /// Add one ledger entry to the totals.
    ///
    /// # Errors
    /// Returns an [Error::TotalOverflow] if the total cannot be represented.
    pub fn add(&mut self, kind: TransactionKind, amount: Decimal) -> Result<(), Error> {
        let bucket = match kind {
            TransactionKind::Income => &mut self.income,
            TransactionKind::Expense => &mut self.expense,
        };
        *bucket = checked_add(*bucket, amount)?;

        Ok(())
    }

    /// Fold `entries` into totals.
    ///
    /// # Errors
    /// Returns an [Error::TotalOverflow] if a total cannot be represented.
    pub fn fold(
        entries: impl IntoIterator<Item = (TransactionKind, Decimal)>,
    ) -> Result<Self, Error> {
        entries
            .into_iter()
            .try_fold(Self::default(), |mut totals, (kind, amount)| {
                totals.add(kind, amount)?;
                Ok(totals)
            })
    }
}

fn checked_add(left: Decimal, right: Decimal) -> Result<Decimal, Error> {
    left.checked_add(right).ok_or(Error::TotalOverflow)
}

fn checked_sub(left: Decimal, right: Decimal) -> Result<Decimal, Error> {
    left.checked_sub(right).ok_or(Error::TotalOverflow)
}

/// An owner's aggregated budget figures.
///
/// `balance` and `expected_remainder` are derived from the other figures and
/// are only ever written by [BudgetSummary::recalculate].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    /// The user the summary belongs to.
    pub owner: UserID,
    /// Income minus expense.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Total income recorded.
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    /// Total expenses recorded.
    #[serde(with = "rust_decimal::serde::float")]
    pub expense: Decimal,
    /// Money set aside for expenses shared with others, tracked separately
    /// from the ledger.
    #[serde(with = "rust_decimal::serde::float")]
    pub shared_expense: Decimal,
    /// The balance left after the shared expense is paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub expected_remainder: Decimal,
    /// The currency code all figures are in, e.g. "KRW".
    pub currency: String,
    /// When the summary last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl BudgetSummary {
    /// A summary with every figure set to zero.
    pub fn zero(owner: UserID, currency: &str, now: OffsetDateTime) -> Self {
        Self {
            owner,
            balance: Decimal::ZERO,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            shared_expense: Decimal::ZERO,
            expected_remainder: Decimal::ZERO,
            currency: currency.to_owned(),
            updated_at: now,
        }
    }

    /// Derive `balance` and `expected_remainder` from the other figures.
    ///
    /// The figures are left unchanged on error.
    ///
    /// # Errors
    /// Returns an [Error::TotalOverflow] if a derived figure cannot be represented.
    pub fn recalculate(&mut self) -> Result<(), Error> {
        let balance = checked_sub(self.income, self.expense)?;
        let expected_remainder = checked_sub(balance, self.shared_expense)?;

        self.balance = balance;
        self.expected_remainder = expected_remainder;

        Ok(())
    }

    /// Whether the derived figures agree with the figures they are derived from.
    pub fn is_consistent(&self) -> bool {
        self.income.checked_sub(self.expense) == Some(self.balance)
            && self.balance.checked_sub(self.shared_expense) == Some(self.expected_remainder)
    }

    /// Count a newly recorded transaction.
    ///
    /// The summary is left unchanged on error.
    ///
    /// # Errors
    /// Returns an [Error::TotalOverflow] if a figure cannot be represented.
    pub fn add(
        &mut self,
        kind: TransactionKind,
        amount: Decimal,
        now: OffsetDateTime,
    ) -> Result<(), Error> {
        let mut updated = self.clone();
        let bucket = match kind {
            TransactionKind::Income => &mut updated.income,
            TransactionKind::Expense => &mut updated.expense,
        };
        *bucket = checked_add(*bucket, amount)?;

        updated.recalculate()?;
        updated.updated_at = now;
        *self = updated;

        Ok(())
    }

    /// Stop counting a transaction.
    ///
    /// A bucket never goes below zero, even if the stored figures had drifted
    /// from the ledger.
    ///
    /// # Errors
    /// Returns an [Error::TotalOverflow] if a figure cannot be represented.
    pub fn subtract(
        &mut self,
        kind: TransactionKind,
        amount: Decimal,
        now: OffsetDateTime,
    ) -> Result<(), Error> {
        let mut updated = self.clone();
        let bucket = match kind {
            TransactionKind::Income => &mut updated.income,
            TransactionKind::Expense => &mut updated.expense,
        };
        *bucket = checked_sub(*bucket, amount)?.max(Decimal::ZERO);

        updated.recalculate()?;
        updated.updated_at = now;
        *self = updated;

        Ok(())
    }

    /// Replace the shared expense.
    ///
    /// # Errors
    /// Returns an [Error::TotalOverflow] if a figure cannot be represented.
    pub fn set_shared_expense(
        &mut self,
        shared_expense: Decimal,
        now: OffsetDateTime,
    ) -> Result<(), Error> {
        let mut updated = self.clone();
        updated.shared_expense = shared_expense;
        updated.recalculate()?;
        updated.updated_at = now;
        *self = updated;

        Ok(())
    }

    /// Replace income and expense with `totals`, keeping the shared expense.
    ///
    /// # Errors
    /// Returns an [Error::TotalOverflow] if a figure cannot be represented.
    pub fn with_totals(mut self, totals: LedgerTotals, now: OffsetDateTime) -> Result<Self, Error> {
        self.income = totals.income;
        self.expense = totals.expense;
        self.recalculate()?;
        self.updated_at = now;

        Ok(self)
    }
}

/// Create the budget summary table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_summary_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget_summary (
                owner_id INTEGER PRIMARY KEY,
                balance TEXT NOT NULL,
                income TEXT NOT NULL,
                expense TEXT NOT NULL,
                shared_expense TEXT NOT NULL,
                expected_remainder TEXT NOT NULL,
                currency TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Get the stored summary for `owner`, creating a zeroed one if there is none.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, e.g. `owner` is not a user.
pub fn get_or_create_summary(
    owner: UserID,
    currency: &str,
    connection: &Connection,
) -> Result<BudgetSummary, Error> {
    let zero = BudgetSummary::zero(owner, currency, OffsetDateTime::now_utc());
    let zero_text = Decimal::ZERO.to_string();

    let inserted = connection.execute(
        "INSERT OR IGNORE INTO budget_summary
            (owner_id, balance, income, expense, shared_expense, expected_remainder, currency, updated_at)
            VALUES (?1, ?2, ?2, ?2, ?2, ?2, ?3, ?4)",
        (owner.as_i64(), &zero_text, currency, zero.updated_at),
    )?;

    if inserted > 0 {
        tracing::debug!("Created budget summary for user {owner}");
    }

    connection
        .prepare(
            "SELECT owner_id, balance, income, expense, shared_expense, expected_remainder, currency, updated_at
            FROM budget_summary WHERE owner_id = :owner_id",
        )?
        .query_row(&[(":owner_id", &owner.as_i64())], map_summary_row)
        .map_err(Error::from)
}

/// Write `summary` to its row.
///
/// # Errors
/// Returns an [Error::InconsistentSummary] without writing anything if the
/// derived figures do not add up, or an [Error::SqlError] if there is an SQL error.
pub fn save_summary(summary: &BudgetSummary, connection: &Connection) -> Result<(), Error> {
    if !summary.is_consistent() {
        tracing::error!("Refusing to save inconsistent budget summary: {summary:?}");
        return Err(Error::InconsistentSummary(summary.owner.as_i64()));
    }

    connection.execute(
        "INSERT INTO budget_summary
            (owner_id, balance, income, expense, shared_expense, expected_remainder, currency, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(owner_id) DO UPDATE SET
                balance = excluded.balance,
                income = excluded.income,
                expense = excluded.expense,
                shared_expense = excluded.shared_expense,
                expected_remainder = excluded.expected_remainder,
                currency = excluded.currency,
                updated_at = excluded.updated_at",
        (
            summary.owner.as_i64(),
            summary.balance.to_string(),
            summary.income.to_string(),
            summary.expense.to_string(),
            summary.shared_expense.to_string(),
            summary.expected_remainder.to_string(),
            &summary.currency,
            summary.updated_at,
        ),
    )?;

    Ok(())
}

/// Fold the ledger of `owner` into income and expense totals.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, or an
/// [Error::TotalOverflow] if a total cannot be represented.
pub fn fold_ledger(owner: UserID, connection: &Connection) -> Result<LedgerTotals, Error> {
    let entries = connection
        .prepare("SELECT kind, amount FROM \"transaction\" WHERE owner_id = :owner_id")?
        .query_map(&[(":owner_id", &owner.as_i64())], |row| {
            Ok((row.get(0)?, get_decimal(row, 1)?))
        })?
        .collect::<Result<Vec<(TransactionKind, Decimal)>, rusqlite::Error>>()?;

    LedgerTotals::fold(entries)
}

fn map_summary_row(row: &Row) -> Result<BudgetSummary, rusqlite::Error> {
    Ok(BudgetSummary {
        owner: UserID::new(row.get(0)?),
        balance: get_decimal(row, 1)?,
        income: get_decimal(row, 2)?,
        expense: get_decimal(row, 3)?,
        shared_expense: get_decimal(row, 4)?,
        expected_remainder: get_decimal(row, 5)?,
        currency: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
