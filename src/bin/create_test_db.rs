use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime, Time};

use backoffice::{
    LedgerConfig, Money, NewBooking, NewExpense, NewJournalEntry, NewJournalLine, NewLease,
    approve_expense, create_booking, create_expense, create_hall, create_lease, create_property,
    get_account_by_code, initialize_db, post_journal_entry, record_booking_payment,
    record_rent_payment,
};

/// A utility for creating a test database for the backoffice server.
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

    let ledger_config = LedgerConfig::default();
    let today = OffsetDateTime::now_utc().date();

    println!("Posting opening balances...");

    let cash = get_account_by_code(&ledger_config.cash_account_code, &conn)?;
    let equity = get_account_by_code("3000", &conn)?;
    let capital = Money::new(Decimal::from(10_000));
    let opening_entry = post_journal_entry(
        NewJournalEntry {
            date: today - Duration::days(90),
            description: "Owner capital contribution".to_owned(),
            lines: vec![
                NewJournalLine::debit(cash.id, capital, ""),
                NewJournalLine::credit(equity.id, capital, ""),
            ],
            reference_type: None,
            reference_id: None,
            source: "opening_balance".to_owned(),
        },
        &conn,
    )?;
    println!("Posted {}", opening_entry.entry_number);

    println!("Creating halls and bookings...");

    let main_hall = create_hall("Main Hall", Money::new(Decimal::from(80)), &conn)?;
    let garden_room = create_hall("Garden Room", Money::new(Decimal::from(45)), &conn)?;

    let next_week = today + Duration::days(7);
    let booking = create_booking(
        NewBooking {
            hall_id: main_hall.id,
            customer_name: "Jane Doe".to_owned(),
            start: next_week.with_time(Time::from_hms(14, 0, 0)?),
            end: next_week.with_time(Time::from_hms(16, 0, 0)?),
        },
        &conn,
    )?;
    create_booking(
        NewBooking {
            hall_id: garden_room.id,
            customer_name: "Arohanui Choir".to_owned(),
            start: next_week.with_time(Time::from_hms(18, 30, 0)?),
            end: next_week.with_time(Time::from_hms(21, 0, 0)?),
        },
        &conn,
    )?;
    record_booking_payment(
        booking.id,
        Money::new(Decimal::from(80)),
        today,
        today,
        &ledger_config,
        &conn,
    )?;

    println!("Creating properties and leases...");

    let flat = create_property("Flat 1, 12 Queen St", Money::new(Decimal::from(1200)), &conn)?;
    create_property("Shop 3, Market Lane", Money::new(Decimal::from(2500)), &conn)?;

    let lease_start = today - Duration::days(60);
    let lease = create_lease(
        NewLease {
            property_id: flat.id,
            tenant_name: "John Smith".to_owned(),
            start_date: lease_start,
            end_date: lease_start + Duration::days(365),
            monthly_rent: None,
        },
        &conn,
    )?;
    record_rent_payment(
        lease.id,
        Money::new(Decimal::from(1200)),
        lease_start,
        today,
        &ledger_config,
        &conn,
    )?;

    println!("Creating expenses...");

    let cleaning = create_expense(
        NewExpense {
            date: today - Duration::days(3),
            description: "Cleaning supplies".to_owned(),
            amount: Money::new(Decimal::new(50000, 2)),
            account_id: None,
        },
        today,
        &conn,
    )?;
    approve_expense(cleaning.id, &ledger_config, &conn)?;

    create_expense(
        NewExpense {
            date: today,
            description: "Replacement light bulbs".to_owned(),
            amount: Money::new(Decimal::new(2499, 2)),
            account_id: None,
        },
        today,
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
