//! The storage interface the booking engine and lifecycle controller work against.
//!
//! [Gateway] hands out atomic units of work, [BookingStore] is what the core
//! sees inside one unit. Everything done through a [BookingStore] is committed
//! together or not at all.

mod sqlite;

pub use sqlite::SqliteGateway;

use crate::{
    Error,
    account::Account,
    category::Category,
    database_id::{AccountId, CategoryId, TransactionId},
    transaction::{Transaction, TransactionBuilder},
};

/// Storage operations available inside one atomic unit.
pub trait BookingStore {
    /// Lock the accounts `ids` for the rest of the unit.
    ///
    /// Implementers must visit the accounts in ascending id order so that two
    /// units touching the same accounts cannot deadlock, and must fail with
    /// [Error::AccountNotFound] before anything is written if an account does
    /// not exist.
    fn lock_accounts(&mut self, ids: &[AccountId]) -> Result<(), Error>;

    /// Load the account `id`.
    fn load_account(&self, id: AccountId) -> Result<Account, Error>;

    /// Persist the balances of `account`.
    fn save_account_balances(&mut self, account: &Account) -> Result<(), Error>;

    /// Load the category `id`.
    fn load_category(&self, id: CategoryId) -> Result<Category, Error>;

    /// Load the transaction `id`.
    fn load_transaction(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Persist a new transaction row, returning it with its new id.
    fn insert_transaction(&mut self, builder: &TransactionBuilder) -> Result<Transaction, Error>;

    /// Overwrite the transaction row `id`.
    fn update_transaction(
        &mut self,
        id: TransactionId,
        builder: &TransactionBuilder,
    ) -> Result<Transaction, Error>;

    /// Remove the transaction row `id`.
    fn delete_transaction_row(&mut self, id: TransactionId) -> Result<(), Error>;
}

/// A source of atomic units of work.
pub trait Gateway {
    /// Run `operation` as a single atomic unit.
    ///
    /// The unit is committed if `operation` returns `Ok`, otherwise every write
    /// made through the [BookingStore] is rolled back and the error returned.
    fn with_atomic_unit<T, F>(&mut self, operation: F) -> Result<T, Error>
    where
        F: FnOnce(&mut dyn BookingStore) -> Result<T, Error>;
}

/// Sort and deduplicate `ids` into the order accounts must be locked in.
pub fn lock_order(ids: &[AccountId]) -> Vec<AccountId> {
    let mut ordered = ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    ordered
}
