//! The budget ledger aggregator.
//!
//! Keeps each user's transaction ledger and their [BudgetSummary] in step.
//! The ledger is the source of truth. How the summary follows it depends on
//! the configured [SummaryStrategy]:
//!
//! - [SummaryStrategy::Recompute] folds the ledger whenever the summary is read.
//! - [SummaryStrategy::Incremental] adjusts the stored summary on every write.
//!
//! Every write opens an IMMEDIATE SQL transaction before it reads anything,
//! so the ledger change and the summary adjustment either both happen or
//! neither does, and two writers can never both read the same summary and
//! overwrite each other's change.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserID,
    database_id::TransactionId,
    summary::{BudgetSummary, SummaryStrategy, fold_ledger, get_or_create_summary, save_summary},
    transaction::{
        NewTransaction, Transaction, TransactionKind, TransactionPatch, delete_transaction_row,
        insert_transaction, select_transaction, select_transactions, update_transaction_row,
    },
    user::get_user_ids,
};

/// The currency used for summaries when none is configured.
pub const DEFAULT_CURRENCY: &str = "KRW";

/// Settings that control how the ledger aggregates summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// How the summary is kept in step with the ledger.
    pub summary_strategy: SummaryStrategy,
    /// The currency code reported on new summaries.
    pub currency: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            summary_strategy: SummaryStrategy::default(),
            currency: DEFAULT_CURRENCY.to_owned(),
        }
    }
}

/// The state needed by the ledger and summary route handlers.
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// The database connection for managing the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How summaries are kept and reported.
    pub ledger_config: LedgerConfig,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            ledger_config: state.ledger_config.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The outcome of checking a stored summary against the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The summary after reconciliation.
    pub summary: BudgetSummary,
    /// Whether the stored summary disagreed with the ledger and was rewritten.
    pub drift_corrected: bool,
}

/// Get the budget summary of `owner`.
///
/// A user without a summary gets a zeroed one.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, or an
/// [Error::TotalOverflow] if the recomputed totals do not fit in a decimal.
pub fn get_summary(
    owner: UserID,
    config: &LedgerConfig,
    connection: &Connection,
) -> Result<BudgetSummary, Error> {
    let stored = get_or_create_summary(owner, &config.currency, connection)?;

    match config.summary_strategy {
        SummaryStrategy::Recompute => {
            let totals = fold_ledger(owner, connection)?;
            stored.with_totals(totals, OffsetDateTime::now_utc())
        }
        SummaryStrategy::Incremental => Ok(stored),
    }
}

/// Add a validated transaction to the ledger of `owner`.
///
/// # Errors
/// Returns an [Error::SqlError] or [Error::StorageUnavailable] if the
/// transaction could not be stored, in which case neither the ledger nor the
/// summary is changed.
pub fn record_transaction(
    owner: UserID,
    new_transaction: &NewTransaction,
    config: &LedgerConfig,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let transaction = insert_transaction(owner, new_transaction, &sql_transaction)?;

    if config.summary_strategy == SummaryStrategy::Incremental {
        adjust_summary(owner, config, &sql_transaction, |summary, now| {
            summary.add(transaction.kind, transaction.amount.as_decimal(), now)
        })?;
    }

    sql_transaction.commit()?;

    tracing::debug!(
        "Recorded {} of {} for user {owner}",
        transaction.kind,
        transaction.amount
    );

    Ok(transaction)
}

/// Change the fields of a transaction owned by `owner`.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if there is no transaction with `id`,
/// - [Error::Forbidden] if the transaction belongs to another user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    owner: UserID,
    id: TransactionId,
    patch: TransactionPatch,
    config: &LedgerConfig,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let existing = select_owned_transaction(owner, id, &sql_transaction)?;
    let updated = existing.apply(patch);
    update_transaction_row(&updated, &sql_transaction)?;

    if config.summary_strategy == SummaryStrategy::Incremental {
        adjust_summary(owner, config, &sql_transaction, |summary, now| {
            summary.subtract(existing.kind, existing.amount.as_decimal(), now)?;
            summary.add(updated.kind, updated.amount.as_decimal(), now)
        })?;
    }

    sql_transaction.commit()?;

    Ok(updated)
}

/// Remove a transaction owned by `owner` from the ledger, returning it.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if there is no transaction with `id`,
/// - [Error::Forbidden] if the transaction belongs to another user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    owner: UserID,
    id: TransactionId,
    config: &LedgerConfig,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let existing = select_owned_transaction(owner, id, &sql_transaction)?;
    delete_transaction_row(existing.id, &sql_transaction)?;

    if config.summary_strategy == SummaryStrategy::Incremental {
        adjust_summary(owner, config, &sql_transaction, |summary, now| {
            summary.subtract(existing.kind, existing.amount.as_decimal(), now)
        })?;
    }

    sql_transaction.commit()?;

    tracing::debug!("Deleted transaction {id} for user {owner}");

    Ok(existing)
}

/// Set the shared expense of `owner` and return the updated summary.
///
/// The caller is responsible for checking that `shared_expense` is not negative.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn set_shared_expense(
    owner: UserID,
    shared_expense: Decimal,
    config: &LedgerConfig,
    connection: &Connection,
) -> Result<BudgetSummary, Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    adjust_summary(owner, config, &sql_transaction, |summary, now| {
        summary.set_shared_expense(shared_expense, now)
    })?;
    let summary = get_summary(owner, config, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(summary)
}

/// Rebuild the stored income and expense of `owner` from the ledger.
///
/// The stored row is only rewritten if it disagrees with the ledger.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn reconcile_summary(
    owner: UserID,
    config: &LedgerConfig,
    connection: &Connection,
) -> Result<Reconciliation, Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let stored = get_or_create_summary(owner, &config.currency, &sql_transaction)?;
    let totals = fold_ledger(owner, &sql_transaction)?;

    let has_drifted = stored.income != totals.income
        || stored.expense != totals.expense
        || !stored.is_consistent();

    let summary = if has_drifted {
        tracing::warn!(
            "Budget summary for user {owner} had drifted from the ledger \
            (stored income {}, expense {}; ledger income {}, expense {})",
            stored.income,
            stored.expense,
            totals.income,
            totals.expense
        );

        let reconciled = stored.with_totals(totals, OffsetDateTime::now_utc())?;
        save_summary(&reconciled, &sql_transaction)?;
        reconciled
    } else {
        stored
    };

    sql_transaction.commit()?;

    Ok(Reconciliation {
        summary,
        drift_corrected: has_drifted,
    })
}

/// Reconcile the summary of every user, returning how many had drifted.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn reconcile_all_summaries(
    config: &LedgerConfig,
    connection: &Connection,
) -> Result<usize, Error> {
    let mut drifted = 0;

    for owner in get_user_ids(connection)? {
        if reconcile_summary(owner, config, connection)?.drift_corrected {
            drifted += 1;
        }
    }

    Ok(drifted)
}

/// The ledger of `owner`, newest first, optionally only of one `kind`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    owner: UserID,
    kind: Option<TransactionKind>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    select_transactions(owner, kind, connection)
}

/// Get a single transaction owned by `owner`.
///
/// A transaction that belongs to another user is reported as not found.
///
/// # Errors
/// Returns an [Error::NotFound] if `owner` has no transaction with `id`.
pub fn get_transaction(
    owner: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = select_transaction(id, connection)?;

    if transaction.owner != owner {
        tracing::warn!("User {owner} tried to read transaction {id} of another user");
        return Err(Error::NotFound);
    }

    Ok(transaction)
}

fn select_owned_transaction(
    owner: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = select_transaction(id, connection)?;

    if transaction.owner != owner {
        tracing::warn!("User {owner} tried to modify transaction {id} of another user");
        return Err(Error::Forbidden);
    }

    Ok(transaction)
}

/// Read the stored summary of `owner`, change it with `adjust` and write it back.
///
/// Must be called inside an IMMEDIATE transaction.
fn adjust_summary(
    owner: UserID,
    config: &LedgerConfig,
    connection: &Connection,
    adjust: impl FnOnce(&mut BudgetSummary, OffsetDateTime) -> Result<(), Error>,
) -> Result<(), Error> {
    let mut summary = get_or_create_summary(owner, &config.currency, connection)?;
    adjust(&mut summary, OffsetDateTime::now_utc())?;
    save_summary(&summary, connection)
}

#[cfg(test)]
mod ledger_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::{Date, macros::date};
    use uuid::Uuid;

    use crate::{
        Error, PasswordHash, UserID,
        amount::Amount,
        db::initialize,
        ledger::{
            LedgerConfig, delete_transaction, get_summary, get_transaction, list_transactions,
            reconcile_all_summaries, reconcile_summary, record_transaction, set_shared_expense,
            update_transaction,
        },
        summary::{SummaryStrategy, get_or_create_summary},
        transaction::{NewTransaction, TransactionKind, TransactionPatch},
        user::{create_user, parse_email},
    };

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn config(summary_strategy: SummaryStrategy) -> LedgerConfig {
        LedgerConfig {
            summary_strategy,
            ..Default::default()
        }
    }

    fn add_user(email: &str, conn: &Connection) -> UserID {
        create_user(
            parse_email(email).unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            conn,
        )
        .unwrap()
        .id
    }

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let owner = add_user("foo@bar.baz", &conn);

        (conn, owner)
    }

    fn entry(kind: TransactionKind, amount: i64) -> NewTransaction {
        entry_on(kind, amount, date!(2025 - 10 - 01))
    }

    fn entry_on(kind: TransactionKind, amount: i64, occurred_on: Date) -> NewTransaction {
        NewTransaction {
            kind,
            amount: Amount::new(dec(amount)).unwrap(),
            category: "General".to_owned(),
            description: None,
            occurred_on,
        }
    }

    #[test]
    fn new_owner_summary_is_zero() {
        for strategy in [SummaryStrategy::Recompute, SummaryStrategy::Incremental] {
            let (conn, owner) = get_test_connection();

            let summary = get_summary(owner, &config(strategy), &conn).unwrap();

            assert_eq!(summary.income, Decimal::ZERO);
            assert_eq!(summary.expense, Decimal::ZERO);
            assert_eq!(summary.balance, Decimal::ZERO);
            assert_eq!(summary.shared_expense, Decimal::ZERO);
            assert_eq!(summary.expected_remainder, Decimal::ZERO);
            assert_eq!(summary.currency, "KRW");
        }
    }

    #[test]
    fn salary_and_rent_scenario() {
        for strategy in [SummaryStrategy::Recompute, SummaryStrategy::Incremental] {
            let (conn, owner) = get_test_connection();
            let config = config(strategy);

            record_transaction(owner, &entry(TransactionKind::Income, 3_200_000), &config, &conn)
                .unwrap();
            record_transaction(owner, &entry(TransactionKind::Expense, 1_800_000), &config, &conn)
                .unwrap();

            let summary = get_summary(owner, &config, &conn).unwrap();
            assert_eq!(summary.income, dec(3_200_000), "strategy {strategy}");
            assert_eq!(summary.expense, dec(1_800_000), "strategy {strategy}");
            assert_eq!(summary.balance, dec(1_400_000), "strategy {strategy}");
            assert_eq!(summary.expected_remainder, dec(1_400_000), "strategy {strategy}");
        }
    }

    fn huge_income() -> NewTransaction {
        NewTransaction {
            amount: Amount::new_unchecked(Decimal::MAX),
            ..entry(TransactionKind::Income, 1)
        }
    }

    #[test]
    fn recompute_overflow_is_an_error() {
        let (conn, owner) = get_test_connection();
        let config = config(SummaryStrategy::Recompute);
        record_transaction(owner, &huge_income(), &config, &conn).unwrap();
        record_transaction(owner, &huge_income(), &config, &conn).unwrap();

        let result = get_summary(owner, &config, &conn);

        assert_eq!(result, Err(Error::TotalOverflow));
    }

    #[test]
    fn incremental_overflow_rolls_back_record() {
        let (conn, owner) = get_test_connection();
        let config = config(SummaryStrategy::Incremental);
        record_transaction(owner, &huge_income(), &config, &conn).unwrap();

        let result = record_transaction(owner, &huge_income(), &config, &conn);

        assert_eq!(result, Err(Error::TotalOverflow));
        assert_eq!(list_transactions(owner, None, &conn).unwrap().len(), 1);
        let summary = get_summary(owner, &config, &conn).unwrap();
        assert_eq!(summary.income, Decimal::MAX);
    }

    #[test]
    fn record_then_list_returns_new_entry() {
        let (conn, owner) = get_test_connection();
        let config = LedgerConfig::default();
        let mut want = entry(TransactionKind::Expense, 12_000);
        want.description = Some("Lunch".to_owned());

        let recorded = record_transaction(owner, &want, &config, &conn).unwrap();
        let listed = list_transactions(owner, None, &conn).unwrap();

        assert_eq!(listed, vec![recorded.clone()]);
        assert_eq!(recorded.kind, want.kind);
        assert_eq!(recorded.amount, want.amount);
        assert_eq!(recorded.category, want.category);
        assert_eq!(recorded.description, want.description);
        assert_eq!(recorded.occurred_on, want.occurred_on);
    }

    #[test]
    fn incremental_matches_recompute_after_edits() {
        let (conn, owner) = get_test_connection();
        let incremental = config(SummaryStrategy::Incremental);
        let recompute = config(SummaryStrategy::Recompute);

        let salary =
            record_transaction(owner, &entry(TransactionKind::Income, 1000), &incremental, &conn)
                .unwrap();
        let groceries =
            record_transaction(owner, &entry(TransactionKind::Expense, 300), &incremental, &conn)
                .unwrap();
        let refund =
            record_transaction(owner, &entry(TransactionKind::Income, 50), &incremental, &conn)
                .unwrap();
        update_transaction(
            owner,
            groceries.id,
            TransactionPatch {
                amount: Some(Amount::new(dec(450)).unwrap()),
                ..Default::default()
            },
            &incremental,
            &conn,
        )
        .unwrap();
        update_transaction(
            owner,
            refund.id,
            TransactionPatch {
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
            &incremental,
            &conn,
        )
        .unwrap();
        delete_transaction(owner, salary.id, &incremental, &conn).unwrap();
        set_shared_expense(owner, dec(25), &incremental, &conn).unwrap();

        let got = get_summary(owner, &incremental, &conn).unwrap();
        let want = get_summary(owner, &recompute, &conn).unwrap();

        assert_eq!(got.income, want.income);
        assert_eq!(got.expense, want.expense);
        assert_eq!(got.balance, want.balance);
        assert_eq!(got.shared_expense, want.shared_expense);
        assert_eq!(got.expected_remainder, want.expected_remainder);
        assert_eq!(got.balance, dec(-500));
        assert_eq!(got.expected_remainder, dec(-525));
    }

    #[test]
    fn delete_clamps_stale_summary_at_zero() {
        let (conn, owner) = get_test_connection();
        let recompute = config(SummaryStrategy::Recompute);
        let incremental = config(SummaryStrategy::Incremental);
        // Recorded while the stored summary was not being maintained.
        let expense =
            record_transaction(owner, &entry(TransactionKind::Expense, 80), &recompute, &conn)
                .unwrap();

        delete_transaction(owner, expense.id, &incremental, &conn).unwrap();

        let summary = get_summary(owner, &incremental, &conn).unwrap();
        assert_eq!(summary.expense, Decimal::ZERO);
        assert_eq!(summary.balance, Decimal::ZERO);
        assert!(summary.is_consistent());
    }

    #[test]
    fn delete_of_another_users_transaction_is_forbidden() {
        let (conn, owner) = get_test_connection();
        let intruder = add_user("intruder@bar.baz", &conn);
        let config = config(SummaryStrategy::Incremental);
        let transaction =
            record_transaction(owner, &entry(TransactionKind::Income, 100), &config, &conn)
                .unwrap();

        let result = delete_transaction(intruder, transaction.id, &config, &conn);

        assert_eq!(result, Err(Error::Forbidden));
        assert_eq!(
            list_transactions(owner, None, &conn).unwrap(),
            vec![transaction]
        );
        assert_eq!(get_summary(owner, &config, &conn).unwrap().income, dec(100));
    }

    #[test]
    fn update_of_another_users_transaction_is_forbidden() {
        let (conn, owner) = get_test_connection();
        let intruder = add_user("intruder@bar.baz", &conn);
        let config = LedgerConfig::default();
        let transaction =
            record_transaction(owner, &entry(TransactionKind::Income, 100), &config, &conn)
                .unwrap();

        let result = update_transaction(
            intruder,
            transaction.id,
            TransactionPatch {
                category: Some("Stolen".to_owned()),
                ..Default::default()
            },
            &config,
            &conn,
        );

        assert_eq!(result, Err(Error::Forbidden));
        assert_eq!(get_transaction(owner, transaction.id, &conn), Ok(transaction));
    }

    #[test]
    fn missing_transaction_is_not_found() {
        let (conn, owner) = get_test_connection();
        let config = LedgerConfig::default();

        assert_eq!(
            delete_transaction(owner, Uuid::new_v4(), &config, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            update_transaction(
                owner,
                Uuid::new_v4(),
                TransactionPatch::default(),
                &config,
                &conn
            ),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_hides_other_users_transactions() {
        let (conn, owner) = get_test_connection();
        let other = add_user("other@bar.baz", &conn);
        let transaction = record_transaction(
            owner,
            &entry(TransactionKind::Income, 100),
            &LedgerConfig::default(),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(other, transaction.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn shared_expense_lowers_expected_remainder() {
        for strategy in [SummaryStrategy::Recompute, SummaryStrategy::Incremental] {
            let (conn, owner) = get_test_connection();
            let config = config(strategy);
            record_transaction(owner, &entry(TransactionKind::Income, 1000), &config, &conn)
                .unwrap();

            let summary = set_shared_expense(owner, dec(400), &config, &conn).unwrap();

            assert_eq!(summary.shared_expense, dec(400), "strategy {strategy}");
            assert_eq!(summary.balance, dec(1000), "strategy {strategy}");
            assert_eq!(summary.expected_remainder, dec(600), "strategy {strategy}");
        }
    }

    #[test]
    fn reconcile_repairs_drift() {
        let (conn, owner) = get_test_connection();
        let incremental = config(SummaryStrategy::Incremental);
        record_transaction(
            owner,
            &entry(TransactionKind::Income, 500),
            &config(SummaryStrategy::Recompute),
            &conn,
        )
        .unwrap();
        assert_eq!(
            get_summary(owner, &incremental, &conn).unwrap().income,
            Decimal::ZERO
        );

        let reconciliation = reconcile_summary(owner, &incremental, &conn).unwrap();

        assert!(reconciliation.drift_corrected);
        assert_eq!(reconciliation.summary.income, dec(500));
        assert_eq!(reconciliation.summary.balance, dec(500));
        assert_eq!(get_summary(owner, &incremental, &conn).unwrap().income, dec(500));

        let reconciliation = reconcile_summary(owner, &incremental, &conn).unwrap();
        assert!(!reconciliation.drift_corrected);
    }

    #[test]
    fn reconcile_all_counts_drifted_summaries() {
        let (conn, owner) = get_test_connection();
        let other = add_user("other@bar.baz", &conn);
        let recompute = config(SummaryStrategy::Recompute);
        let incremental = config(SummaryStrategy::Incremental);
        record_transaction(owner, &entry(TransactionKind::Income, 500), &recompute, &conn)
            .unwrap();
        get_or_create_summary(other, "KRW", &conn).unwrap();

        assert_eq!(reconcile_all_summaries(&incremental, &conn), Ok(1));
        assert_eq!(get_summary(owner, &incremental, &conn).unwrap().income, dec(500));
        assert_eq!(reconcile_all_summaries(&incremental, &conn), Ok(0));
    }

    #[test]
    fn failed_write_leaves_ledger_and_summary_unchanged() {
        let (conn, owner) = get_test_connection();
        let config = config(SummaryStrategy::Incremental);
        let transaction =
            record_transaction(owner, &entry(TransactionKind::Income, 100), &config, &conn)
                .unwrap();
        // Make the summary write fail after the ledger write has happened.
        conn.execute_batch(
            "CREATE TRIGGER reject_summary_update BEFORE UPDATE ON budget_summary
             BEGIN SELECT RAISE(ABORT, 'summary is read only'); END;",
        )
        .unwrap();

        let result = delete_transaction(owner, transaction.id, &config, &conn);

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
        assert_eq!(
            list_transactions(owner, None, &conn).unwrap(),
            vec![transaction]
        );
        assert_eq!(get_summary(owner, &config, &conn).unwrap().income, dec(100));
    }

    #[test]
    fn list_filters_by_kind_newest_first() {
        let (conn, owner) = get_test_connection();
        let config = LedgerConfig::default();
        let old = record_transaction(
            owner,
            &entry_on(TransactionKind::Expense, 1, date!(2025 - 09 - 01)),
            &config,
            &conn,
        )
        .unwrap();
        let new = record_transaction(
            owner,
            &entry_on(TransactionKind::Expense, 2, date!(2025 - 10 - 01)),
            &config,
            &conn,
        )
        .unwrap();
        record_transaction(owner, &entry(TransactionKind::Income, 3), &config, &conn).unwrap();

        let got = list_transactions(owner, Some(TransactionKind::Expense), &conn).unwrap();

        assert_eq!(got, vec![new, old]);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use std::{
        path::Path,
        sync::{Arc, Barrier},
        thread,
    };

    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        PasswordHash, UserID,
        amount::Amount,
        db::initialize,
        ledger::{LedgerConfig, get_summary, record_transaction},
        summary::SummaryStrategy,
        transaction::{NewTransaction, TransactionKind},
        user::{create_user, parse_email},
    };

    fn income(amount: i64) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Income,
            amount: Amount::new(Decimal::new(amount, 0)).unwrap(),
            category: "Salary".to_owned(),
            description: None,
            occurred_on: date!(2025 - 10 - 01),
        }
    }

    fn set_up_database(path: &Path) -> UserID {
        let conn = Connection::open(path).unwrap();
        initialize(&conn).unwrap();

        create_user(
            parse_email("foo@bar.baz").unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap()
        .id
    }

    /// Record each amount `repeats` times, each amount from its own thread
    /// and database connection, all starting at the same moment.
    fn record_concurrently(path: &Path, owner: UserID, amounts: &[i64], repeats: usize) {
        let config = LedgerConfig {
            summary_strategy: SummaryStrategy::Incremental,
            ..Default::default()
        };
        let barrier = Arc::new(Barrier::new(amounts.len()));

        let handles: Vec<_> = amounts
            .iter()
            .map(|&amount| {
                let path = path.to_owned();
                let barrier = barrier.clone();
                let config = config.clone();

                thread::spawn(move || {
                    let conn = Connection::open(&path).unwrap();
                    barrier.wait();

                    for _ in 0..repeats {
                        record_transaction(owner, &income(amount), &config, &conn).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let owner = set_up_database(&path);

        record_concurrently(&path, owner, &[100, 200], 1);

        let conn = Connection::open(&path).unwrap();
        let config = LedgerConfig {
            summary_strategy: SummaryStrategy::Incremental,
            ..Default::default()
        };
        let summary = get_summary(owner, &config, &conn).unwrap();
        assert_eq!(summary.income, Decimal::new(300, 0));
        assert_eq!(summary.balance, Decimal::new(300, 0));
    }

    #[test]
    fn many_concurrent_increments_match_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let owner = set_up_database(&path);

        record_concurrently(&path, owner, &[100, 200, 300], 20);

        let conn = Connection::open(&path).unwrap();
        let incremental = get_summary(
            owner,
            &LedgerConfig {
                summary_strategy: SummaryStrategy::Incremental,
                ..Default::default()
            },
            &conn,
        )
        .unwrap();
        let recompute = get_summary(owner, &LedgerConfig::default(), &conn).unwrap();

        assert_eq!(incremental.income, Decimal::new(12_000, 0));
        assert_eq!(incremental.income, recompute.income);
    }
}
