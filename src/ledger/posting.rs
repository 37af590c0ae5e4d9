//! Posting journal entries to the ledger and reading them back.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    account::get_account,
    ledger::core::{
        JournalEntry, JournalEntryId, JournalLine, NewJournalEntry, format_entry_number,
        validate_lines,
    },
};

/// Validate and insert a journal entry and its lines using `connection` as is.
///
/// This function does not start a transaction. Callers that need the entry to
/// be written together with other rows, e.g. approving an expense, should
/// call this with their own transaction. Otherwise use [post_journal_entry].
///
/// # Errors
/// - any error from [validate_lines],
/// - [Error::EmptyField] if the description is empty,
/// - [Error::InvalidAccount] if a line refers to an account that does not exist,
/// - [Error::InactiveAccount] if a line refers to an inactive account,
/// - [Error::SqlError] if there is some other SQL error.
pub fn insert_journal_entry(
    entry: NewJournalEntry,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    validate_lines(&entry.lines)?;

    let description = entry.description.trim();

    if description.is_empty() {
        return Err(Error::EmptyField("Description"));
    }

    for line in &entry.lines {
        let account = get_account(line.account_id, connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidAccount(line.account_id),
            error => error,
        })?;

        if !account.is_active {
            return Err(Error::InactiveAccount(account.id));
        }
    }

    let next_number: i64 = connection.query_row(
        "SELECT COALESCE(MAX(CAST(SUBSTR(entry_number, 4) AS INTEGER)), 0) + 1 FROM journal_entry",
        [],
        |row| row.get(0),
    )?;
    let entry_number = format_entry_number(next_number);
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO journal_entry
            (entry_number, date, description, reference_type, reference_id, source, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &entry_number,
            entry.date,
            description,
            entry.reference_type,
            entry.reference_id,
            &entry.source,
            created_at,
        ),
    )?;

    let journal_entry_id = connection.last_insert_rowid();

    let mut statement = connection.prepare(
        "INSERT INTO journal_entry_line (journal_entry_id, account_id, debit, credit, description)
        VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    let mut lines = Vec::with_capacity(entry.lines.len());

    for line in entry.lines {
        statement.execute((
            journal_entry_id,
            line.account_id,
            line.debit,
            line.credit,
            &line.description,
        ))?;

        lines.push(JournalLine {
            id: connection.last_insert_rowid(),
            journal_entry_id,
            account_id: line.account_id,
            debit: line.debit,
            credit: line.credit,
            description: line.description,
        });
    }

    tracing::debug!(
        "inserted journal entry {entry_number} with {} lines",
        lines.len()
    );

    Ok(JournalEntry {
        id: journal_entry_id,
        entry_number,
        date: entry.date,
        description: description.to_owned(),
        reference_type: entry.reference_type,
        reference_id: entry.reference_id,
        source: entry.source,
        created_at,
        lines,
    })
}

/// Post a journal entry in its own transaction.
///
/// Either the entry and all of its lines are saved, or nothing is.
///
/// # Errors
/// Returns the same errors as [insert_journal_entry]. The transaction is
/// rolled back on any error.
pub fn post_journal_entry(
    entry: NewJournalEntry,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    let transaction = connection.unchecked_transaction()?;

    let entry = insert_journal_entry(entry, &transaction)?;

    transaction.commit()?;

    tracing::info!("posted journal entry {}", entry.entry_number);

    Ok(entry)
}

const SELECT_ENTRY_COLUMNS: &str = "SELECT id, entry_number, date, description, reference_type, \
    reference_id, source, created_at FROM journal_entry";

/// Retrieve a journal entry and its lines.
///
/// # Errors
/// Returns [Error::NotFound] if no entry has the ID `id`.
pub fn get_journal_entry(id: JournalEntryId, connection: &Connection) -> Result<JournalEntry, Error> {
    let mut entry = connection
        .prepare(&format!("{SELECT_ENTRY_COLUMNS} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_entry_row)?;

    entry.lines = get_journal_lines(id, connection)?;

    Ok(entry)
}

/// Retrieve the `limit` most recent journal entries, newest first.
pub fn get_recent_journal_entries(
    limit: u32,
    connection: &Connection,
) -> Result<Vec<JournalEntry>, Error> {
    let entries = connection
        .prepare(&format!(
            "{SELECT_ENTRY_COLUMNS} ORDER BY date DESC, created_at DESC, id DESC LIMIT :limit"
        ))?
        .query_map(&[(":limit", &limit)], map_entry_row)?
        .collect::<Result<Vec<_>, _>>()?;

    entries
        .into_iter()
        .map(|mut entry| {
            entry.lines = get_journal_lines(entry.id, connection)?;
            Ok(entry)
        })
        .collect()
}

fn get_journal_lines(
    journal_entry_id: JournalEntryId,
    connection: &Connection,
) -> Result<Vec<JournalLine>, Error> {
    connection
        .prepare(
            "SELECT id, journal_entry_id, account_id, debit, credit, description
            FROM journal_entry_line WHERE journal_entry_id = :id ORDER BY id ASC",
        )?
        .query_map(&[(":id", &journal_entry_id)], |row| {
            Ok(JournalLine {
                id: row.get(0)?,
                journal_entry_id: row.get(1)?,
                account_id: row.get(2)?,
                debit: row.get(3)?,
                credit: row.get(4)?,
                description: row.get(5)?,
            })
        })?
        .map(|maybe_line| maybe_line.map_err(Error::from))
        .collect()
}

fn map_entry_row(row: &Row) -> Result<JournalEntry, rusqlite::Error> {
    Ok(JournalEntry {
        id: row.get(0)?,
        entry_number: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        reference_type: row.get(4)?,
        reference_id: row.get(5)?,
        source: row.get(6)?,
        created_at: row.get(7)?,
        lines: Vec::new(),
    })
}

#[cfg(test)]
mod posting_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountId, get_account_by_code, toggle_account_active},
        db::initialize,
        ledger::{
            NewJournalEntry, NewJournalLine, ReferenceType, get_journal_entry,
            get_recent_journal_entries, post_journal_entry,
        },
        money::Money,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    fn account_id(code: &str, connection: &Connection) -> AccountId {
        get_account_by_code(code, connection).unwrap().id
    }

    fn entry_count(connection: &Connection) -> (i64, i64) {
        let entries = connection
            .query_row("SELECT COUNT(*) FROM journal_entry", [], |row| row.get(0))
            .unwrap();
        let lines = connection
            .query_row("SELECT COUNT(*) FROM journal_entry_line", [], |row| {
                row.get(0)
            })
            .unwrap();

        (entries, lines)
    }

    fn cash_sale(connection: &Connection, amount: Money) -> NewJournalEntry {
        NewJournalEntry {
            date: date!(2024 - 01 - 10),
            description: "Hall hire".to_owned(),
            lines: vec![
                NewJournalLine::debit(account_id("1000", connection), amount, "Cash received"),
                NewJournalLine::credit(account_id("4000", connection), amount, "Hall revenue"),
            ],
            reference_type: Some(ReferenceType::Booking),
            reference_id: Some(7),
            source: "test".to_owned(),
        }
    }

    #[test]
    fn post_persists_header_and_lines() {
        let connection = get_test_connection();
        let amount = Money::new(dec!(250.50));

        let posted = post_journal_entry(cash_sale(&connection, amount), &connection)
            .expect("Could not post journal entry");

        assert_eq!(posted.entry_number, "JE-000001");
        assert_eq!(posted.lines.len(), 2);
        assert_eq!(posted.total_debits(), posted.total_credits());
        assert_eq!(entry_count(&connection), (1, 2));
        assert_eq!(get_journal_entry(posted.id, &connection), Ok(posted));
    }

    #[test]
    fn entry_numbers_are_sequential() {
        let connection = get_test_connection();
        let amount = Money::new(dec!(10));

        let first = post_journal_entry(cash_sale(&connection, amount), &connection).unwrap();
        let second = post_journal_entry(cash_sale(&connection, amount), &connection).unwrap();

        assert_eq!(first.entry_number, "JE-000001");
        assert_eq!(second.entry_number, "JE-000002");
    }

    #[test]
    fn unbalanced_entry_writes_nothing() {
        let connection = get_test_connection();
        let mut entry = cash_sale(&connection, Money::new(dec!(100)));
        entry.lines[1].credit = Money::new(dec!(99.99));

        let result = post_journal_entry(entry, &connection);

        assert_eq!(
            result,
            Err(Error::UnbalancedEntry {
                debits: Money::new(dec!(100)),
                credits: Money::new(dec!(99.99)),
            })
        );
        assert_eq!(entry_count(&connection), (0, 0));
    }

    #[test]
    fn unknown_account_is_rejected() {
        let connection = get_test_connection();
        let mut entry = cash_sale(&connection, Money::new(dec!(100)));
        entry.lines[1].account_id = 999;

        let result = post_journal_entry(entry, &connection);

        assert_eq!(result, Err(Error::InvalidAccount(999)));
        assert_eq!(entry_count(&connection), (0, 0));
    }

    #[test]
    fn inactive_account_is_rejected() {
        let connection = get_test_connection();
        let revenue_id = account_id("4000", &connection);
        toggle_account_active(revenue_id, &connection).unwrap();

        let result = post_journal_entry(cash_sale(&connection, Money::new(dec!(5))), &connection);

        assert_eq!(result, Err(Error::InactiveAccount(revenue_id)));
    }

    #[test]
    fn failure_after_header_insert_rolls_back_everything() {
        let connection = get_test_connection();
        connection
            .execute_batch(
                "CREATE TRIGGER fail_second_line BEFORE INSERT ON journal_entry_line
                WHEN NEW.description = 'Hall revenue'
                BEGIN SELECT RAISE(ABORT, 'line rejected'); END;",
            )
            .unwrap();

        let result = post_journal_entry(cash_sale(&connection, Money::new(dec!(5))), &connection);

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
        assert_eq!(entry_count(&connection), (0, 0));
    }

    #[test]
    fn recent_entries_are_newest_first() {
        let connection = get_test_connection();
        let mut older = cash_sale(&connection, Money::new(dec!(1)));
        older.date = date!(2024 - 01 - 01);
        let newer = cash_sale(&connection, Money::new(dec!(2)));
        post_journal_entry(older, &connection).unwrap();
        post_journal_entry(newer, &connection).unwrap();

        let entries = get_recent_journal_entries(10, &connection).unwrap();

        let dates: Vec<_> = entries.iter().map(|entry| entry.date).collect();
        assert_eq!(dates, vec![date!(2024 - 01 - 10), date!(2024 - 01 - 01)]);
        assert!(entries.iter().all(|entry| entry.lines.len() == 2));
    }

    #[test]
    fn missing_entry_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(get_journal_entry(1, &connection), Err(Error::NotFound));
    }
}
