//! Accounts: the balances that transactions are booked against.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    Account, AccountDetails, BankType, create_account, create_account_table, delete_account,
    get_account, get_total_account_balance, list_accounts, map_row_to_account,
    update_account_details,
};
pub(crate) use core::save_account_balances;
pub use create_endpoint::create_account_endpoint;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use list_endpoint::{
    AccountTotal, get_account_endpoint, get_accounts_endpoint, get_accounts_total_endpoint,
};
