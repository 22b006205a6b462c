//! Implements the booking gateway on top of a SQLite connection.

use rusqlite::{Connection, TransactionBehavior};

use crate::{
    Error,
    account::{Account, get_account, save_account_balances},
    category::{Category, get_category},
    database_id::{AccountId, CategoryId, TransactionId},
    gateway::{BookingStore, Gateway, lock_order},
    transaction::{
        Transaction, TransactionBuilder, delete_transaction_row, get_transaction,
        insert_transaction_row, update_transaction_row,
    },
};

/// Runs atomic units as SQLite transactions on a borrowed connection.
///
/// Each unit begins with `BEGIN IMMEDIATE`, which takes the database write
/// lock before the first read. SQLite has no row level locks, so this is the
/// equivalent of `SELECT ... FOR UPDATE` on every account the unit touches:
/// a second writer waits (up to the connection's busy timeout) until the
/// first unit commits or rolls back.
#[derive(Debug)]
pub struct SqliteGateway<'c> {
    connection: &'c mut Connection,
}

impl<'c> SqliteGateway<'c> {
    /// Create a new gateway for the SQLite `connection`.
    pub fn new(connection: &'c mut Connection) -> Self {
        Self { connection }
    }
}

impl Gateway for SqliteGateway<'_> {
    fn with_atomic_unit<T, F>(&mut self, operation: F) -> Result<T, Error>
    where
        F: FnOnce(&mut dyn BookingStore) -> Result<T, Error>,
    {
        let transaction = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = operation(&mut SqliteUnit {
            connection: &transaction,
        });

        match result {
            Ok(value) => {
                transaction.commit()?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = transaction.rollback() {
                    tracing::error!("could not roll back after \"{error}\": {rollback_error}");
                }
                Err(error)
            }
        }
    }
}

/// The view of one open SQLite transaction.
struct SqliteUnit<'t> {
    connection: &'t Connection,
}

impl BookingStore for SqliteUnit<'_> {
    fn lock_accounts(&mut self, ids: &[AccountId]) -> Result<(), Error> {
        // The write lock is already held, visiting the rows in order checks
        // that they exist before anything is written.
        for id in lock_order(ids) {
            get_account(id, self.connection)?;
        }

        Ok(())
    }

    fn load_account(&self, id: AccountId) -> Result<Account, Error> {
        get_account(id, self.connection)
    }

    fn save_account_balances(&mut self, account: &Account) -> Result<(), Error> {
        save_account_balances(account, self.connection)
    }

    fn load_category(&self, id: CategoryId) -> Result<Category, Error> {
        get_category(id, self.connection)
    }

    fn load_transaction(&self, id: TransactionId) -> Result<Transaction, Error> {
        get_transaction(id, self.connection)
    }

    fn insert_transaction(&mut self, builder: &TransactionBuilder) -> Result<Transaction, Error> {
        insert_transaction_row(builder, self.connection)
    }

    fn update_transaction(
        &mut self,
        id: TransactionId,
        builder: &TransactionBuilder,
    ) -> Result<Transaction, Error> {
        update_transaction_row(id, builder, self.connection)
    }

    fn delete_transaction_row(&mut self, id: TransactionId) -> Result<(), Error> {
        delete_transaction_row(id, self.connection)
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountDetails, create_account, get_account},
        category::{CategoryDetails, create_category},
        db::initialize,
        gateway::{Gateway, SqliteGateway},
        transaction::{Transaction, count_transactions},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_account(&AccountDetails::new("Checking"), &conn).unwrap();
        conn
    }

    #[test]
    fn commits_on_success() {
        let mut conn = get_test_connection();

        SqliteGateway::new(&mut conn)
            .with_atomic_unit(|store| {
                let mut account = store.load_account(1)?;
                account.balance += Decimal::TEN;
                store.save_account_balances(&account)
            })
            .unwrap();

        assert_eq!(get_account(1, &conn).unwrap().balance, Decimal::TEN);
    }

    #[test]
    fn rolls_back_every_write_on_error() {
        let mut conn = get_test_connection();

        let result: Result<(), Error> = SqliteGateway::new(&mut conn).with_atomic_unit(|store| {
            store.insert_transaction(
                &Transaction::build(Decimal::ONE, date!(2025 - 05 - 01), "Doomed")
                    .destination(Some(1)),
            )?;
            let mut account = store.load_account(1)?;
            account.balance += Decimal::ONE;
            store.save_account_balances(&account)?;

            Err(Error::NotFound)
        });

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(count_transactions(&conn), Ok(0));
        assert_eq!(get_account(1, &conn).unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn lock_accounts_fails_on_missing_account() {
        let mut conn = get_test_connection();

        let result =
            SqliteGateway::new(&mut conn).with_atomic_unit(|store| store.lock_accounts(&[4, 1]));

        assert_eq!(result, Err(Error::AccountNotFound(4)));
    }

    #[test]
    fn connection_is_usable_after_rollback() {
        let mut conn = get_test_connection();
        let mut gateway = SqliteGateway::new(&mut conn);

        let _ = gateway.with_atomic_unit(|_| -> Result<(), Error> { Err(Error::NotFound) });
        let second = gateway.with_atomic_unit(|store| store.lock_accounts(&[1]));

        assert_eq!(second, Ok(()));
    }

    #[test]
    fn load_category_reports_missing_category() {
        let mut conn = get_test_connection();
        create_category(&CategoryDetails::new("Bills"), &conn).unwrap();
        let mut gateway = SqliteGateway::new(&mut conn);

        let found = gateway.with_atomic_unit(|store| store.load_category(1).map(|c| c.name));
        let missing = gateway.with_atomic_unit(|store| store.load_category(2));

        assert_eq!(found, Ok("Bills".to_owned()));
        assert_eq!(missing, Err(Error::CategoryNotFound(2)));
    }
}
