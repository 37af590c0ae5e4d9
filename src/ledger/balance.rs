//! Opening, closing and running balances of a single account.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    account::{Account, AccountId, get_account},
    ledger::core::JournalEntryId,
    money::Money,
};

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Create the date range `start..=end`.
    ///
    /// # Errors
    /// Returns [Error::InvalidInterval] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidInterval);
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }
}

/// The balance (debits minus credits) of an account from all entries dated before `start`.
pub fn get_opening_balance(
    account_id: AccountId,
    start: Date,
    connection: &Connection,
) -> Result<Money, Error> {
    connection
        .prepare(
            "SELECT COALESCE(SUM(l.debit), 0) - COALESCE(SUM(l.credit), 0)
            FROM journal_entry_line l
            INNER JOIN journal_entry e ON e.id = l.journal_entry_id
            WHERE l.account_id = :account_id AND e.date < :start",
        )?
        .query_row(
            rusqlite::named_params! {":account_id": account_id, ":start": start},
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// The balance (debits minus credits) of an account from all entries dated on or before `cutoff`.
pub fn get_balance_as_of(
    account_id: AccountId,
    cutoff: Date,
    connection: &Connection,
) -> Result<Money, Error> {
    connection
        .prepare(
            "SELECT COALESCE(SUM(l.debit), 0) - COALESCE(SUM(l.credit), 0)
            FROM journal_entry_line l
            INNER JOIN journal_entry e ON e.id = l.journal_entry_id
            WHERE l.account_id = :account_id AND e.date <= :cutoff",
        )?
        .query_row(
            rusqlite::named_params! {":account_id": account_id, ":cutoff": cutoff},
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// One journal line in an account statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRow {
    pub journal_entry_id: JournalEntryId,
    pub entry_number: String,
    pub date: Date,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
    /// The account's balance after this line.
    pub balance: Money,
}

/// The lines posted to an account within a date range, with running balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStatement {
    pub account: Account,
    pub range: DateRange,
    pub opening_balance: Money,
    pub rows: Vec<StatementRow>,
    pub closing_balance: Money,
}

impl AccountStatement {
    pub fn total_debits(&self) -> Money {
        self.rows.iter().map(|row| row.debit).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.rows.iter().map(|row| row.credit).sum()
    }
}

/// Add each `(debit, credit)` pair to `opening_balance` in order, returning the balance after each.
pub fn running_balances(opening_balance: Money, movements: &[(Money, Money)]) -> Vec<Money> {
    movements
        .iter()
        .scan(opening_balance, |balance, (debit, credit)| {
            *balance += *debit - *credit;
            Some(*balance)
        })
        .collect()
}

/// Get the statement of an account for the dates in `range`.
///
/// Lines are ordered by entry date, then by when the entry was created, so
/// that entries on the same date always appear in the same order.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist.
pub fn get_account_statement(
    account_id: AccountId,
    range: DateRange,
    connection: &Connection,
) -> Result<AccountStatement, Error> {
    let account = get_account(account_id, connection)?;
    let opening_balance = get_opening_balance(account_id, range.start(), connection)?;

    let lines = connection
        .prepare(
            "SELECT e.id, e.entry_number, e.date, e.description, l.description, l.debit, l.credit
            FROM journal_entry_line l
            INNER JOIN journal_entry e ON e.id = l.journal_entry_id
            WHERE l.account_id = :account_id AND e.date BETWEEN :start AND :end
            ORDER BY e.date ASC, e.created_at ASC, e.id ASC, l.id ASC",
        )?
        .query_map(
            rusqlite::named_params! {
                ":account_id": account_id,
                ":start": range.start(),
                ":end": range.end(),
            },
            |row| {
                let entry_description: String = row.get(3)?;
                let line_description: String = row.get(4)?;
                let description = if line_description.is_empty() {
                    entry_description
                } else {
                    line_description
                };

                Ok(StatementRow {
                    journal_entry_id: row.get(0)?,
                    entry_number: row.get(1)?,
                    date: row.get(2)?,
                    description,
                    debit: row.get(5)?,
                    credit: row.get(6)?,
                    balance: Money::ZERO,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let movements: Vec<_> = lines.iter().map(|row| (row.debit, row.credit)).collect();
    let balances = running_balances(opening_balance, &movements);

    let rows: Vec<StatementRow> = lines
        .into_iter()
        .zip(balances)
        .map(|(row, balance)| StatementRow { balance, ..row })
        .collect();

    let closing_balance = rows
        .last()
        .map(|row| row.balance)
        .unwrap_or(opening_balance);

    Ok(AccountStatement {
        account,
        range,
        opening_balance,
        rows,
        closing_balance,
    })
}
