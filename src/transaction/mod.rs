//! Spending and income records.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and deleting transactions
//! - Route handlers for the spending and income endpoints

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

pub use core::{
    Amount, MAX_AMOUNT, MEMO_MAX_LENGTH, Memo, Transaction, TransactionBuilder, TransactionKind,
    TransactionQuery, create_transaction, create_transaction_tables, delete_transaction,
    get_transaction, query_transactions,
};
pub use create_endpoint::{create_income_endpoint, create_spending_endpoint};
pub use delete_endpoint::{delete_income_endpoint, delete_spending_endpoint};
pub use list_endpoint::{list_income_endpoint, list_spending_endpoint};
