//! The double-entry ledger: posting journal entries and calculating balances.

mod account_ledger_page;
mod balance;
mod core;
mod journal_page;
mod posting;
mod trial_balance;
mod trial_balance_page;

pub use account_ledger_page::get_account_ledger_page;
pub use balance::{AccountStatement, DateRange, get_account_statement, get_balance_as_of};
pub use core::{
    JournalEntry, JournalEntryId, NewJournalEntry, NewJournalLine, ReferenceType,
    create_journal_tables,
};
pub use journal_page::get_journal_page;
pub use posting::{
    get_journal_entry, get_recent_journal_entries, insert_journal_entry, post_journal_entry,
};
pub use trial_balance::{TrialBalance, get_trial_balance};
pub use trial_balance_page::get_trial_balance_page;
