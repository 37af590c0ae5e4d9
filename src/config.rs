//! Settings that control which accounts automatic journal postings use.

use rusqlite::Connection;

use crate::{
    Error,
    account::{Account, get_account_by_code},
};

/// The account codes used when the app posts journal entries on behalf of the user,
/// e.g. when an expense is approved or a payment is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// The asset account that money is paid from and received into.
    pub cash_account_code: String,
    /// The expense account used for expenses that do not name an account.
    pub expense_account_code: String,
    /// The revenue account credited when a hall booking is paid.
    pub hall_revenue_account_code: String,
    /// The revenue account credited when rent is paid on a lease.
    pub rent_revenue_account_code: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            cash_account_code: "1000".to_owned(),
            expense_account_code: "5000".to_owned(),
            hall_revenue_account_code: "4000".to_owned(),
            rent_revenue_account_code: "4100".to_owned(),
        }
    }
}

impl LedgerConfig {
    /// The asset account that payments go through.
    pub fn cash_account(&self, connection: &Connection) -> Result<Account, Error> {
        get_configured_account(&self.cash_account_code, connection)
    }

    /// The fallback account for expenses.
    pub fn expense_account(&self, connection: &Connection) -> Result<Account, Error> {
        get_configured_account(&self.expense_account_code, connection)
    }

    /// The revenue account for booking payments.
    pub fn hall_revenue_account(&self, connection: &Connection) -> Result<Account, Error> {
        get_configured_account(&self.hall_revenue_account_code, connection)
    }

    /// The revenue account for rent payments.
    pub fn rent_revenue_account(&self, connection: &Connection) -> Result<Account, Error> {
        get_configured_account(&self.rent_revenue_account_code, connection)
    }
}

/// Look up an account the ledger settings refer to.
///
/// # Errors
/// Returns [Error::MissingDefaultAccount] if no account has the code `code`.
fn get_configured_account(code: &str, connection: &Connection) -> Result<Account, Error> {
    get_account_by_code(code, connection).map_err(|error| match error {
        Error::NotFound => {
            tracing::error!("the configured account code \"{code}\" does not exist");
            Error::MissingDefaultAccount(code.to_owned())
        }
        error => error,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::LedgerConfig;

    #[test]
    fn default_codes_exist_in_seeded_chart() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let config = LedgerConfig::default();

        assert_eq!(config.cash_account(&connection).unwrap().code, "1000");
        assert_eq!(config.expense_account(&connection).unwrap().code, "5000");
        assert_eq!(config.hall_revenue_account(&connection).unwrap().code, "4000");
        assert_eq!(config.rent_revenue_account(&connection).unwrap().code, "4100");
    }

    #[test]
    fn missing_code_is_reported() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let config = LedgerConfig {
            cash_account_code: "1999".to_owned(),
            ..Default::default()
        };

        assert_eq!(
            config.cash_account(&connection),
            Err(Error::MissingDefaultAccount("1999".to_owned()))
        );
    }
}
