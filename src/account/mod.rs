//! The chart of accounts that journal entries are posted to.

mod accounts_page;
mod core;
mod create;

pub use accounts_page::{get_accounts_page, toggle_account_endpoint};
pub use core::{
    Account, AccountId, AccountType, NewAccount, create_account, create_account_table, get_account,
    get_account_by_code, get_all_accounts, seed_default_accounts, toggle_account_active,
};
pub use create::{create_account_endpoint, get_new_account_page};
