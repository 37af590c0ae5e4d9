//! The trial balance report.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    account::{AccountId, AccountType},
    money::Money,
};

/// One account's totals in the trial balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub total_debits: Money,
    pub total_credits: Money,
}

impl TrialBalanceRow {
    /// Total debits minus total credits.
    pub fn net(&self) -> Money {
        self.total_debits - self.total_credits
    }

    /// The balance shown in the debit column, zero if the account has a credit balance.
    pub fn debit_balance(&self) -> Money {
        let net = self.net();

        if net.is_positive() { net } else { Money::ZERO }
    }

    /// The balance shown in the credit column, zero if the account has a debit balance.
    pub fn credit_balance(&self) -> Money {
        let net = self.net();

        if net.is_negative() { -net } else { Money::ZERO }
    }

    /// The balance expressed on the account's normal side, negative if the
    /// account has an abnormal balance, e.g. an overdrawn cash account.
    pub fn normal_balance(&self) -> Money {
        self.account_type.normal_balance().signed(self.net())
    }
}

/// The debit and credit balances of every account as of a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialBalance {
    pub as_of: Date,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: Money,
    pub total_credits: Money,
}

impl TrialBalance {
    /// Whether the debit column adds up to the credit column.
    pub fn is_balanced(&self) -> bool {
        self.total_debits == self.total_credits
    }
}

/// Calculate the trial balance from all entries dated on or before `as_of`.
///
/// Every account in the chart of accounts is listed, ordered by code, even if
/// nothing has been posted to it.
pub fn get_trial_balance(as_of: Date, connection: &Connection) -> Result<TrialBalance, Error> {
    let rows = connection
        .prepare(
            "SELECT a.id, a.code, a.name, a.account_type,
                COALESCE(SUM(l.debit), 0), COALESCE(SUM(l.credit), 0)
            FROM account a
            LEFT JOIN (
                SELECT line.account_id, line.debit, line.credit
                FROM journal_entry_line line
                INNER JOIN journal_entry entry ON entry.id = line.journal_entry_id
                WHERE entry.date <= :as_of
            ) l ON l.account_id = a.id
            GROUP BY a.id
            ORDER BY a.code ASC",
        )?
        .query_map(rusqlite::named_params! {":as_of": as_of}, |row| {
            Ok(TrialBalanceRow {
                account_id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
                account_type: row.get(3)?,
                total_debits: row.get(4)?,
                total_credits: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let total_debits = rows.iter().map(TrialBalanceRow::debit_balance).sum();
    let total_credits = rows.iter().map(TrialBalanceRow::credit_balance).sum();

    Ok(TrialBalance {
        as_of,
        rows,
        total_debits,
        total_credits,
    })
}
