//! Expenses and their approval workflow.

mod core;
mod create;
mod expenses_page;

pub use core::{
    Expense, ExpenseId, ExpenseStatus, NewExpense, approve_expense, create_expense,
    create_expense_table, get_all_expenses, reject_expense,
};
pub use create::{create_expense_endpoint, get_new_expense_page};
pub use expenses_page::{approve_expense_endpoint, get_expenses_page, reject_expense_endpoint};
