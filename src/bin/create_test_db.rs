use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use budget_ledger::{
    Amount, LedgerConfig, NewTransaction, PasswordHash, ProfileUpdate, TransactionKind,
    ValidatedPassword, create_user, initialize_db, parse_email, reconcile_all_summaries,
    record_transaction, save_profile,
};

/// A utility for creating a test database for the JSON API server of budget_ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user test@example.com...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(parse_email("test@example.com")?, password_hash, &conn)?;
    save_profile(
        user.id,
        &ProfileUpdate {
            name: Some("Test User".to_owned()),
            age: Some(30),
            location: Some("Seoul".to_owned()),
        },
        &conn,
    )?;

    println!("Recording sample transactions...");

    let config = LedgerConfig::default();
    let today = OffsetDateTime::now_utc().date();
    let samples = [
        (TransactionKind::Income, 3_200_000, "Salary", Some("Monthly pay"), 20),
        (TransactionKind::Expense, 850_000, "Rent", None, 19),
        (TransactionKind::Expense, 64_500, "Groceries", Some("Weekly shop"), 12),
        (TransactionKind::Expense, 12_000, "Transport", None, 5),
        (TransactionKind::Income, 150_000, "Side work", Some("Translation job"), 2),
    ];

    for (kind, amount, category, description, days_ago) in samples {
        record_transaction(
            user.id,
            &NewTransaction {
                kind,
                amount: Amount::new(Decimal::from(amount))?,
                category: category.to_owned(),
                description: description.map(str::to_owned),
                occurred_on: today - Duration::days(days_ago),
            },
            &config,
            &conn,
        )?;
    }

    reconcile_all_summaries(&config, &conn)?;

    println!("Success!");

    Ok(())
}
