use std::{
    error::Error,
    path::PathBuf,
    process::exit,
    sync::{Arc, Mutex},
};

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Month, OffsetDateTime};

use finance_tracker::{
    Attribution, BackendKind, Category, EmailAddress, LiveCollectionAdapter, LocalSnapshotAdapter,
    PasswordHash, Scope, Transaction, TransactionFields, TransactionId, TransactionType,
    ValidatedPassword, create_user, create_user_table,
};

/// A utility for creating sample data to try the finance tracker with.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Which backend to create data for.
    #[arg(long, value_enum, default_value_t = BackendKind::Local)]
    backend: BackendKind,

    /// File path to write the JSON snapshot to (local backend).
    #[arg(long, default_value = "transactions.json")]
    data_path: PathBuf,

    /// File path to write the SQLite database to (live backend).
    #[arg(long, default_value = "finance.db")]
    db_path: PathBuf,
}

/// A sample transaction repeated every month: type, description, amount, category and day.
type MonthlyEntry = (TransactionType, &'static str, f64, Category, u8);

const MONTHLY_ENTRIES: [MonthlyEntry; 8] = [
    (TransactionType::Income, "Salary", 4200.0, Category::Work, 1),
    (TransactionType::Expense, "Rent", 1650.0, Category::Housing, 2),
    (TransactionType::Expense, "Groceries", 182.35, Category::Food, 6),
    (TransactionType::Expense, "Bus pass", 64.0, Category::Transport, 8),
    (TransactionType::Expense, "Dinner out", 78.5, Category::Food, 13),
    (TransactionType::Expense, "Pharmacy", 23.9, Category::Health, 17),
    (TransactionType::Expense, "Cinema", 36.0, Category::Leisure, 21),
    (TransactionType::Expense, "Online course", 49.0, Category::Education, 25),
];

const MONTHS_OF_DATA: u8 = 6;

/// Create a snapshot file or database with six months of transactions for manual testing.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = match args.backend {
        BackendKind::Local => &args.data_path,
        BackendKind::Live => &args.db_path,
    };

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    match args.backend {
        BackendKind::Local => {
            println!("Creating snapshot at {output_path:#?}");
            let transactions = sample_transactions(Attribution::default())?;

            LocalSnapshotAdapter::new(output_path).save(&transactions)?;
            println!("Saved {} transactions.", transactions.len());
        }
        BackendKind::Live => {
            println!("Creating database at {output_path:#?}");
            let connection = Connection::open(output_path)?;
            create_user_table(&connection)?;

            println!("Creating test user...");
            let password_hash = PasswordHash::new(
                ValidatedPassword::new_unchecked("test"),
                PasswordHash::DEFAULT_COST,
            )?;
            let user = create_user(
                EmailAddress::new("test@example.com")?,
                password_hash,
                &connection,
            )?;

            let attribution = Attribution {
                owner_id: Some(user.id),
                owner_email: Some(user.email.to_string()),
            };
            let transactions = sample_transactions(attribution)?;

            let adapter = LiveCollectionAdapter::new(Arc::new(Mutex::new(connection)))?;
            let count = adapter.import(Scope::Shared, &transactions)?;
            println!("Saved {count} transactions for {}.", user.email);
        }
    }

    println!("Success!");

    Ok(())
}

/// The first of the month `months_back` months before `today`.
fn month_start(today: Date, months_back: u8) -> Result<Date, time::error::ComponentRange> {
    let mut year = today.year();
    let mut month = today.month();

    for _ in 0..months_back {
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }

    Date::from_calendar_date(year, month, 1)
}

fn sample_transactions(attribution: Attribution) -> Result<Vec<Transaction>, Box<dyn Error>> {
    let now = OffsetDateTime::now_utc();
    let today = now.date();
    let mut transactions = Vec::new();

    for months_back in (0..MONTHS_OF_DATA).rev() {
        let start = month_start(today, months_back)?;

        for (type_, description, amount, category, day) in MONTHLY_ENTRIES {
            let date = start.replace_day(day)?;
            if date > today {
                continue;
            }

            let fields = TransactionFields::new(type_, description, amount, category, date)?;
            let id = TransactionId::new(transactions.len() as i64 + 1);

            transactions.push(Transaction::from_fields(
                id,
                fields,
                attribution.clone(),
                now,
            ));
        }
    }

    Ok(transactions)
}
