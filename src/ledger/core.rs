//! Journal entry types, line validation and the journal tables.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use time::{Date, OffsetDateTime};

use crate::{Error, account::AccountId, database_id::DatabaseId, money::Money};

/// Database identifier for a journal entry.
pub type JournalEntryId = DatabaseId;

/// The kind of business record that caused a journal entry to be posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    /// An approved expense.
    Expense,
    /// A payment for a hall booking.
    Booking,
    /// A rent payment for a lease.
    Lease,
}

impl ReferenceType {
    /// The name stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceType::Expense => "Expense",
            ReferenceType::Booking => "Booking",
            ReferenceType::Lease => "Lease",
        }
    }
}

impl Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReferenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Expense" => Ok(ReferenceType::Expense),
            "Booking" => Ok(ReferenceType::Booking),
            "Lease" => Ok(ReferenceType::Lease),
            other => Err(format!("unknown reference type \"{other}\"")),
        }
    }
}

impl ToSql for ReferenceType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ReferenceType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// One side of a journal entry before it is posted.
///
/// Exactly one of `debit` and `credit` should be greater than zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalLine {
    /// The account the line is posted to.
    pub account_id: AccountId,
    /// The amount debited, zero for a credit line.
    pub debit: Money,
    /// The amount credited, zero for a debit line.
    pub credit: Money,
    /// An optional note for this line, may be empty.
    pub description: String,
}

impl NewJournalLine {
    /// A line that debits `amount` to the account.
    pub fn debit(account_id: AccountId, amount: Money, description: &str) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Money::ZERO,
            description: description.to_owned(),
        }
    }

    /// A line that credits `amount` to the account.
    pub fn credit(account_id: AccountId, amount: Money, description: &str) -> Self {
        Self {
            account_id,
            debit: Money::ZERO,
            credit: amount,
            description: description.to_owned(),
        }
    }
}

/// A journal entry before it is posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalEntry {
    /// The date the transaction happened.
    pub date: Date,
    /// What the entry is for, e.g. "Owner capital contribution".
    pub description: String,
    /// The lines in the order they should be stored.
    pub lines: Vec<NewJournalLine>,
    /// The kind of record that caused the entry, if any.
    pub reference_type: Option<ReferenceType>,
    /// The ID of the record that caused the entry.
    pub reference_id: Option<DatabaseId>,
    /// What posted the entry, e.g. "expense_approval".
    pub source: String,
}

/// A posted journal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalLine {
    pub id: DatabaseId,
    pub journal_entry_id: JournalEntryId,
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
    pub description: String,
}

/// A posted journal entry and its lines.
///
/// Journal entries are never changed once posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    /// The human readable, sequential entry number, e.g. "JE-000042".
    pub entry_number: String,
    pub date: Date,
    pub description: String,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<DatabaseId>,
    pub source: String,
    pub created_at: OffsetDateTime,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn total_debits(&self) -> Money {
        self.lines.iter().map(|line| line.debit).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.lines.iter().map(|line| line.credit).sum()
    }
}

/// Check that `lines` form a valid, balanced journal entry and return the entry's total.
///
/// # Errors
/// - [Error::EmptyJournalEntry] if there are no lines,
/// - [Error::InvalidJournalLine] if a line has a negative amount, or does not
///   have exactly one of debit and credit greater than zero,
/// - [Error::AmountOutOfRange] if a line's amount is too large to store,
/// - [Error::UnbalancedEntry] if the total debits do not equal the total credits.
pub fn validate_lines(lines: &[NewJournalLine]) -> Result<Money, Error> {
    if lines.is_empty() {
        return Err(Error::EmptyJournalEntry);
    }

    for (index, line) in lines.iter().enumerate() {
        let has_debit = line.debit.is_positive();
        let has_credit = line.credit.is_positive();

        if line.debit.is_negative() || line.credit.is_negative() || has_debit == has_credit {
            return Err(Error::InvalidJournalLine(index));
        }

        for amount in [line.debit, line.credit] {
            if amount > Money::MAX {
                return Err(Error::AmountOutOfRange(amount.as_decimal()));
            }
        }
    }

    let debits: Money = lines.iter().map(|line| line.debit).sum();
    let credits: Money = lines.iter().map(|line| line.credit).sum();

    if debits != credits {
        return Err(Error::UnbalancedEntry { debits, credits });
    }

    Ok(debits)
}

/// Format the `n`th entry number, e.g. "JE-000001".
pub fn format_entry_number(n: i64) -> String {
    format!("JE-{n:06}")
}

/// Initialize the journal entry and journal line tables.
pub fn create_journal_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS journal_entry (
            id INTEGER PRIMARY KEY,
            entry_number TEXT NOT NULL UNIQUE,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            reference_type TEXT,
            reference_id INTEGER,
            source TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_journal_entry_date ON journal_entry(date);

        CREATE TABLE IF NOT EXISTS journal_entry_line (
            id INTEGER PRIMARY KEY,
            journal_entry_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            debit INTEGER NOT NULL DEFAULT 0 CHECK (debit >= 0),
            credit INTEGER NOT NULL DEFAULT 0 CHECK (credit >= 0),
            description TEXT NOT NULL DEFAULT '',
            FOREIGN KEY(journal_entry_id) REFERENCES journal_entry(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_journal_entry_line_account ON journal_entry_line(account_id);",
    )?;

    Ok(())
}
