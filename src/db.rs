//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    account::{create_account_table, seed_default_accounts},
    booking::{create_booking_table, create_hall_table},
    expense::create_expense_table,
    lease::{create_lease_table, create_property_table},
    ledger::create_journal_tables,
    payment::create_payment_table,
};

/// Create the tables for the domain models and insert the default chart of accounts.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if a table could not be created or there is some other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // SQLite ignores this pragma inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_journal_tables(&transaction)?;
    create_expense_table(&transaction)?;
    create_hall_table(&transaction)?;
    create_booking_table(&transaction)?;
    create_property_table(&transaction)?;
    create_lease_table(&transaction)?;
    create_payment_table(&transaction)?;
    seed_default_accounts(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("first initialization failed");
        initialize(&connection).expect("second initialization failed");

        let account_count: i64 = connection
            .query_row("SELECT COUNT(*) FROM account", [], |row| row.get(0))
            .unwrap();
        assert_eq!(account_count, 7);
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let foreign_keys: i64 = connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }
}
