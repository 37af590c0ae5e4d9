//! Expenses, their approval workflow and the journal entries approval posts.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use time::Date;

use crate::{
    Error,
    account::{AccountId, get_account},
    config::LedgerConfig,
    database_id::DatabaseId,
    ledger::{
        JournalEntry, JournalEntryId, NewJournalEntry, NewJournalLine, ReferenceType,
        insert_journal_entry,
    },
    money::Money,
};

pub type ExpenseId = DatabaseId;

/// Where an expense is in the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseStatus {
    /// Recorded but not yet posted to the ledger.
    Pending,
    /// Posted to the ledger.
    Approved,
    /// Will never be posted to the ledger.
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseStatus::Pending => "Pending",
            ExpenseStatus::Approved => "Approved",
            ExpenseStatus::Rejected => "Rejected",
        }
    }
}

impl Display for ExpenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExpenseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ExpenseStatus::Pending),
            "Approved" => Ok(ExpenseStatus::Approved),
            "Rejected" => Ok(ExpenseStatus::Rejected),
            other => Err(format!("unknown expense status \"{other}\"")),
        }
    }
}

impl ToSql for ExpenseStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ExpenseStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// Money spent by the business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    pub id: ExpenseId,
    pub date: Date,
    pub description: String,
    pub amount: Money,
    pub status: ExpenseStatus,
    /// The expense account to debit, the configured default is used if `None`.
    pub account_id: Option<AccountId>,
    /// The entry posted when the expense was approved.
    pub journal_entry_id: Option<JournalEntryId>,
}

/// The data needed to record an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub date: Date,
    pub description: String,
    pub amount: Money,
    pub account_id: Option<AccountId>,
}

/// Record a pending expense.
///
/// # Errors
/// - [Error::EmptyField] if the description is empty,
/// - [Error::NonPositiveAmount] if the amount is not greater than zero,
/// - [Error::FutureDate] if the date is after `today`,
/// - [Error::InvalidAccount] if the account does not exist.
pub fn create_expense(
    new_expense: NewExpense,
    today: Date,
    connection: &Connection,
) -> Result<Expense, Error> {
    let description = new_expense.description.trim();

    if description.is_empty() {
        return Err(Error::EmptyField("Description"));
    }

    new_expense.amount.validate_positive()?;

    if new_expense.date > today {
        return Err(Error::FutureDate(new_expense.date));
    }

    if let Some(account_id) = new_expense.account_id {
        get_account(account_id, connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidAccount(account_id),
            error => error,
        })?;
    }

    connection.execute(
        "INSERT INTO expense (date, description, amount, status, account_id)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            new_expense.date,
            description,
            new_expense.amount,
            ExpenseStatus::Pending,
            new_expense.account_id,
        ),
    )?;

    Ok(Expense {
        id: connection.last_insert_rowid(),
        date: new_expense.date,
        description: description.to_owned(),
        amount: new_expense.amount,
        status: ExpenseStatus::Pending,
        account_id: new_expense.account_id,
        journal_entry_id: None,
    })
}

const SELECT_EXPENSE_COLUMNS: &str =
    "SELECT id, date, description, amount, status, account_id, journal_entry_id FROM expense";

pub fn get_expense(expense_id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare(&format!("{SELECT_EXPENSE_COLUMNS} WHERE id = :id"))?
        .query_row(&[(":id", &expense_id)], map_expense_row)
        .map_err(|error| error.into())
}

/// Retrieve all expenses, the most recent first.
pub fn get_all_expenses(connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_EXPENSE_COLUMNS} ORDER BY date DESC, id DESC"
        ))?
        .query_map([], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Approve a pending expense and post it to the ledger.
///
/// Posts debit the expense account and credit cash for the expense amount.
/// The journal entry and the status change are committed together, if either
/// fails nothing is written.
///
/// # Errors
/// - [Error::NotFound] if the expense does not exist,
/// - [Error::ExpenseNotPending] if the expense was already approved or rejected,
/// - [Error::InvalidAccount] if the expense names an account that no longer exists,
/// - [Error::MissingDefaultAccount] if a configured account does not exist,
/// - any error from posting the journal entry, e.g. [Error::InactiveAccount].
pub fn approve_expense(
    expense_id: ExpenseId,
    ledger_config: &LedgerConfig,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    let transaction = connection.unchecked_transaction()?;

    let expense = get_expense(expense_id, &transaction)?;

    if expense.status != ExpenseStatus::Pending {
        return Err(Error::ExpenseNotPending(expense.status));
    }

    let expense_account = match expense.account_id {
        Some(account_id) => {
            get_account(account_id, &transaction).map_err(|error| match error {
                Error::NotFound => Error::InvalidAccount(account_id),
                error => error,
            })?
        }
        None => ledger_config.expense_account(&transaction)?,
    };
    let cash_account = ledger_config.cash_account(&transaction)?;

    let entry = insert_journal_entry(
        NewJournalEntry {
            date: expense.date,
            description: format!("Expense: {}", expense.description),
            lines: vec![
                NewJournalLine::debit(expense_account.id, expense.amount, &expense.description),
                NewJournalLine::credit(cash_account.id, expense.amount, "Paid from cash"),
            ],
            reference_type: Some(ReferenceType::Expense),
            reference_id: Some(expense.id),
            source: "expense_approval".to_owned(),
        },
        &transaction,
    )?;

    transaction.execute(
        "UPDATE expense SET status = ?1, journal_entry_id = ?2 WHERE id = ?3",
        (ExpenseStatus::Approved, entry.id, expense.id),
    )?;

    transaction.commit()?;

    Ok(entry)
}

/// Reject a pending expense without posting anything to the ledger.
///
/// # Errors
/// - [Error::NotFound] if the expense does not exist,
/// - [Error::ExpenseNotPending] if the expense was already approved or rejected.
pub fn reject_expense(expense_id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let expense = get_expense(expense_id, connection)?;

    if expense.status != ExpenseStatus::Pending {
        return Err(Error::ExpenseNotPending(expense.status));
    }

    connection.execute(
        "UPDATE expense SET status = ?1 WHERE id = ?2",
        (ExpenseStatus::Rejected, expense_id),
    )?;

    Ok(())
}

/// Initialize the expense table.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            status TEXT NOT NULL,
            account_id INTEGER,
            journal_entry_id INTEGER,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            FOREIGN KEY(journal_entry_id) REFERENCES journal_entry(id) ON UPDATE CASCADE ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);",
    )?;

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        status: row.get(4)?,
        account_id: row.get(5)?,
        journal_entry_id: row.get(6)?,
    })
}
