//! Transactions: movements of money into, out of, or between accounts.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    Transaction, TransactionBuilder, TransactionKind, TransactionQuery, count_transactions,
    count_transactions_for_account, count_transactions_for_category, create_transaction_table,
    get_transaction, list_transactions, map_transaction_row,
};
pub(crate) use core::{delete_transaction_row, insert_transaction_row, update_transaction_row};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::{get_transaction_endpoint, get_transactions_endpoint};
