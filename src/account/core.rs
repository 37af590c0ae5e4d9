//! The chart of accounts: account types, database queries and the default accounts.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId, money::Money};

/// Database identifier for an account.
pub type AccountId = DatabaseId;

/// The five kinds of account in double-entry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// The side of the ledger on which an account's balance normally sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalBalance {
    Debit,
    Credit,
}

impl AccountType {
    /// Every account type, in the order they appear in the chart of accounts.
    pub const ALL: [AccountType; 5] = [
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Equity,
        AccountType::Revenue,
        AccountType::Expense,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Equity => "Equity",
            AccountType::Revenue => "Revenue",
            AccountType::Expense => "Expense",
        }
    }

    /// Assets and expenses increase with debits, everything else increases with credits.
    pub fn normal_balance(self) -> NormalBalance {
        match self {
            AccountType::Asset | AccountType::Expense => NormalBalance::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                NormalBalance::Credit
            }
        }
    }
}

impl NormalBalance {
    /// Express a debit-minus-credit amount as a balance on this side of the ledger.
    pub fn signed(self, debit_minus_credit: Money) -> Money {
        match self {
            NormalBalance::Debit => debit_minus_credit,
            NormalBalance::Credit => -debit_minus_credit,
        }
    }
}

impl Display for NormalBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalBalance::Debit => write!(f, "Debit"),
            NormalBalance::Credit => write!(f, "Credit"),
        }
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountType::ALL
            .into_iter()
            .find(|account_type| account_type.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidAccountType(s.to_owned()))
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        text.parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An account in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// The short, unique code used to refer to the account, e.g. "1000".
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    /// Inactive accounts are kept for reporting but cannot be posted to.
    pub is_active: bool,
}

/// The data needed to create an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
}

/// The accounts every new database starts with.
pub const DEFAULT_ACCOUNTS: [(&str, &str, AccountType); 7] = [
    ("1000", "Cash", AccountType::Asset),
    ("1100", "Accounts Receivable", AccountType::Asset),
    ("2000", "Accounts Payable", AccountType::Liability),
    ("3000", "Owner's Equity", AccountType::Equity),
    ("4000", "Hall Rental Revenue", AccountType::Revenue),
    ("4100", "Rental Income", AccountType::Revenue),
    ("5000", "General Expenses", AccountType::Expense),
];

/// Create an account and return it with its generated ID.
///
/// # Errors
/// - [Error::EmptyField] if the code or name is empty,
/// - [Error::DuplicateAccountCode] if an account with the same code exists,
/// - [Error::SqlError] for any other SQL error.
pub fn create_account(new_account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    let code = new_account.code.trim();
    let name = new_account.name.trim();

    if code.is_empty() {
        return Err(Error::EmptyField("Account code"));
    }

    if name.is_empty() {
        return Err(Error::EmptyField("Account name"));
    }

    connection
        .execute(
            "INSERT INTO account (code, name, account_type) VALUES (?1, ?2, ?3)",
            (code, name, new_account.account_type),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("account.code") =>
            {
                Error::DuplicateAccountCode(code.to_owned())
            }
            error => error.into(),
        })?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        code: code.to_owned(),
        name: name.to_owned(),
        account_type: new_account.account_type,
        is_active: true,
    })
}

/// Retrieve a single account by ID.
pub fn get_account(account_id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, code, name, account_type, is_active FROM account WHERE id = :id")?
        .query_row(&[(":id", &account_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a single account by its code, e.g. "1000".
pub fn get_account_by_code(code: &str, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, code, name, account_type, is_active FROM account WHERE code = :code")?
        .query_row(&[(":code", &code)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all accounts ordered by code.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, code, name, account_type, is_active FROM account ORDER BY code ASC")?
        .query_map([], map_row)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Flip an account between active and inactive, returning the new state.
pub fn toggle_account_active(account_id: AccountId, connection: &Connection) -> Result<bool, Error> {
    connection
        .prepare("UPDATE account SET is_active = NOT is_active WHERE id = ?1 RETURNING is_active")?
        .query_row([account_id], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Insert the [DEFAULT_ACCOUNTS] that do not exist yet.
pub fn seed_default_accounts(connection: &Connection) -> Result<(), Error> {
    let mut statement = connection.prepare(
        "INSERT INTO account (code, name, account_type) VALUES (?1, ?2, ?3)
        ON CONFLICT(code) DO NOTHING",
    )?;

    for (code, name, account_type) in DEFAULT_ACCOUNTS {
        statement.execute((code, name, account_type))?;
    }

    Ok(())
}

/// Initialize the account table.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        account_type: row.get(3)?,
        is_active: row.get(4)?,
    })
}


#[cfg(test)]
mod account_query_tests {
    use rusqlite::Connection;

    use crate::Error;

    use super::{
        AccountType, DEFAULT_ACCOUNTS, NewAccount, create_account, create_account_table,
        get_account, get_account_by_code, get_all_accounts, seed_default_accounts,
        toggle_account_active,
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_account_table(&connection).expect("Could not create account table");
        connection
    }

    fn new_account(code: &str, name: &str) -> NewAccount {
        NewAccount {
            code: code.to_owned(),
            name: name.to_owned(),
            account_type: AccountType::Asset,
        }
    }

    #[test]
    fn create_account_succeeds() {
        let connection = get_test_db_connection();

        let account = create_account(new_account(" 1200 ", "Petty Cash"), &connection)
            .expect("Could not create account");

        assert!(account.id > 0);
        assert_eq!(account.code, "1200");
        assert!(account.is_active);
        assert_eq!(get_account(account.id, &connection), Ok(account));
    }

    #[test]
    fn create_account_fails_on_duplicate_code() {
        let connection = get_test_db_connection();
        create_account(new_account("1200", "Petty Cash"), &connection).unwrap();

        let result = create_account(new_account("1200", "Float"), &connection);

        assert_eq!(result, Err(Error::DuplicateAccountCode("1200".to_owned())));
    }

    #[test]
    fn create_account_fails_on_empty_fields() {
        let connection = get_test_db_connection();

        assert_eq!(
            create_account(new_account("  ", "Petty Cash"), &connection),
            Err(Error::EmptyField("Account code"))
        );
        assert_eq!(
            create_account(new_account("1200", ""), &connection),
            Err(Error::EmptyField("Account name"))
        );
    }

    #[test]
    fn get_account_fails_on_missing_id() {
        let connection = get_test_db_connection();

        assert_eq!(get_account(42, &connection), Err(Error::NotFound));
    }

    #[test]
    fn seed_is_idempotent_and_ordered_by_code() {
        let connection = get_test_db_connection();

        seed_default_accounts(&connection).unwrap();
        seed_default_accounts(&connection).unwrap();

        let accounts = get_all_accounts(&connection).unwrap();
        let codes: Vec<_> = accounts.iter().map(|account| account.code.as_str()).collect();
        let want: Vec<_> = DEFAULT_ACCOUNTS.iter().map(|(code, _, _)| *code).collect();
        assert_eq!(codes, want);
    }

    #[test]
    fn get_account_by_code_finds_seeded_cash_account() {
        let connection = get_test_db_connection();
        seed_default_accounts(&connection).unwrap();

        let cash = get_account_by_code("1000", &connection).unwrap();

        assert_eq!(cash.name, "Cash");
        assert_eq!(cash.account_type, AccountType::Asset);
    }

    #[test]
    fn toggle_account_active_flips_flag() {
        let connection = get_test_db_connection();
        let account = create_account(new_account("1200", "Petty Cash"), &connection).unwrap();

        assert_eq!(toggle_account_active(account.id, &connection), Ok(false));
        assert!(!get_account(account.id, &connection).unwrap().is_active);
        assert_eq!(toggle_account_active(account.id, &connection), Ok(true));
    }

    #[test]
    fn toggle_account_active_fails_on_missing_id() {
        let connection = get_test_db_connection();

        assert_eq!(toggle_account_active(99, &connection), Err(Error::NotFound));
    }
}
