//! Keeps account balances consistent with the transactions that reference them.
//!
//! Transactions are only ever written through [lifecycle], which books them
//! with the postings computed in [engine].

pub mod audit;
pub mod engine;
pub mod lifecycle;

pub use audit::{BalanceMismatch, find_balance_mismatches};
pub use lifecycle::{amend_transaction, create_transaction, delete_transaction};
