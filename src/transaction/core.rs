//! Defines the core data models and database queries for transactions.
//!
//! The functions that write transaction rows are crate private: every write
//! has to go through [crate::booking] so that account balances follow along.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error, ValidationError,
    database_id::{AccountId, CategoryId, TransactionId},
    db::{decimal_to_sql, get_decimal},
};

// ============================================================================
// MODELS
// ============================================================================

/// A movement of money into, out of, or between accounts.
///
/// To create a new `Transaction`, use [Transaction::build] and pass the builder
/// to [create_transaction](crate::booking::create_transaction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short label for the transaction.
    pub name: String,
    /// A longer text description of what the transaction was for.
    pub description: String,
    /// The amount of money moved from `source` to `destination`.
    pub amount: Decimal,
    /// The account the money leaves, `None` if it comes from outside.
    pub source: Option<AccountId>,
    /// The account the money enters, `None` if it leaves the system.
    pub destination: Option<AccountId>,
    /// Metadata only, inactive transactions are booked like active ones.
    pub active: bool,
    /// The category the transaction is filed under. Metadata only.
    pub category_id: Option<CategoryId>,
    /// When the transaction happened.
    pub date: Date,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
    /// When the transaction was last amended.
    pub updated_at: OffsetDateTime,
}

/// The shape of a transaction, determined by which accounts it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money moves between two accounts.
    Transfer,
    /// Money leaves an account, e.g. an expense.
    Withdrawal,
    /// Money enters an account, e.g. income.
    Deposit,
}

impl TransactionKind {
    /// Classify a transaction by its source and destination.
    ///
    /// # Errors
    /// Returns [ValidationError::NoAccounts] if neither side is present and
    /// [ValidationError::SameAccount] if both sides are the same account.
    pub fn classify(
        source: Option<AccountId>,
        destination: Option<AccountId>,
    ) -> Result<Self, ValidationError> {
        match (source, destination) {
            (Some(source), Some(destination)) if source == destination => {
                Err(ValidationError::SameAccount(source))
            }
            (Some(_), Some(_)) => Ok(TransactionKind::Transfer),
            (Some(_), None) => Ok(TransactionKind::Withdrawal),
            (None, Some(_)) => Ok(TransactionKind::Deposit),
            (None, None) => Err(ValidationError::NoAccounts),
        }
    }
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: Decimal, date: Date, name: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            name: name.to_owned(),
            description: String::new(),
            source: None,
            destination: None,
            active: true,
            category_id: None,
        }
    }

    /// The shape of the transaction, `None` only for rows that bypassed validation.
    pub fn kind(&self) -> Option<TransactionKind> {
        TransactionKind::classify(self.source, self.destination).ok()
    }

    /// A builder holding the current values, handy as a starting point for amendments.
    pub fn to_builder(&self) -> TransactionBuilder {
        TransactionBuilder {
            amount: self.amount,
            date: self.date,
            name: self.name.clone(),
            description: self.description.clone(),
            source: self.source,
            destination: self.destination,
            active: self.active,
            category_id: self.category_id,
        }
    }
}

/// The user supplied fields of a [Transaction].
///
/// Used both to create transactions and to amend them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBuilder {
    /// The amount of money to move, must not be zero.
    pub amount: Decimal,
    /// When the transaction happened.
    pub date: Date,
    /// A short label for the transaction.
    pub name: String,
    /// A longer description.
    #[serde(default)]
    pub description: String,
    /// The account the money leaves.
    #[serde(default)]
    pub source: Option<AccountId>,
    /// The account the money enters.
    #[serde(default)]
    pub destination: Option<AccountId>,
    /// Whether the transaction is marked active.
    #[serde(default = "default_active")]
    pub active: bool,
    /// The category to file the transaction under.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

fn default_active() -> bool {
    true
}

impl TransactionBuilder {
    /// Set the source account.
    pub fn source(mut self, source: Option<AccountId>) -> Self {
        self.source = source;
        self
    }

    /// Set the destination account.
    pub fn destination(mut self, destination: Option<AccountId>) -> Self {
        self.destination = destination;
        self
    }

    /// Set the amount.
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the category.
    pub fn category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Check the builder describes a bookable transaction.
    ///
    /// # Errors
    /// Returns a [ValidationError] if the amount is zero, or if the accounts do
    /// not form a transfer, withdrawal or deposit.
    pub fn validate(&self) -> Result<TransactionKind, ValidationError> {
        if self.amount.is_zero() {
            return Err(ValidationError::ZeroAmount);
        }

        TransactionKind::classify(self.source, self.destination)
    }
}

/// Defines how transactions should be fetched from [list_transactions].
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct TransactionQuery {
    /// Only include transactions with this account as source or destination.
    pub account_id: Option<AccountId>,
    /// Only include transactions filed under this category.
    pub category_id: Option<CategoryId>,
    /// Selects up to the first N (`limit`) transactions.
    pub limit: Option<u64>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, name, description, amount, source_account_id, \
    destination_account_id, active, date, created_at, updated_at, category_id";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                amount TEXT NOT NULL,
                source_account_id INTEGER,
                destination_account_id INTEGER,
                active INTEGER NOT NULL DEFAULT 1,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                category_id INTEGER,
                FOREIGN KEY(source_account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(destination_account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT,
                CHECK (source_account_id IS NOT NULL OR destination_account_id IS NOT NULL)
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_source ON \"transaction\"(source_account_id);",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_destination ON \"transaction\"(destination_account_id);",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        amount: get_decimal(row, 3)?,
        source: row.get(4)?,
        destination: row.get(5)?,
        active: row.get(6)?,
        date: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        category_id: row.get(10)?,
    })
}

/// Insert a transaction row without booking it.
pub(crate) fn insert_transaction_row(
    builder: &TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (name, description, amount, source_account_id, \
                destination_account_id, active, date, created_at, updated_at, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                &builder.name,
                &builder.description,
                decimal_to_sql(builder.amount),
                builder.source,
                builder.destination,
                builder.active,
                builder.date,
                now,
                builder.category_id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Overwrite the fields of the transaction row `id` without rebooking it.
pub(crate) fn update_transaction_row(
    id: TransactionId,
    builder: &TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET name = ?1, description = ?2, amount = ?3, source_account_id = ?4, \
                destination_account_id = ?5, active = ?6, date = ?7, updated_at = ?8, \
                category_id = ?9
             WHERE id = ?10
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                &builder.name,
                &builder.description,
                decimal_to_sql(builder.amount),
                builder.source,
                builder.destination,
                builder.active,
                builder.date,
                OffsetDateTime::now_utc(),
                builder.category_id,
                id,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound(id),
            error => error.into(),
        })
}

/// Remove the transaction row `id` without un-booking it.
pub(crate) fn delete_transaction_row(
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    match connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id",
        &[(":id", &id)],
    )? {
        0 => Err(Error::TransactionNotFound(id)),
        _ => Ok(()),
    }
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound(id),
            error => error.into(),
        })
}

/// Retrieve transactions in the way defined by `query`, newest first.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the limit does not fit in a database integer,
/// - or [Error::SqlError] there is a SQL error.
pub fn list_transactions(
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut query_string_parts = vec![format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\""
    )];
    let mut where_clause_parts = vec![];
    let mut query_parameters = vec![];

    if let Some(account_id) = query.account_id {
        where_clause_parts.push("(source_account_id = ? OR destination_account_id = ?)");
        query_parameters.push(Value::Integer(account_id));
        query_parameters.push(Value::Integer(account_id));
    }

    if let Some(category_id) = query.category_id {
        where_clause_parts.push("category_id = ?");
        query_parameters.push(Value::Integer(category_id));
    }

    if !where_clause_parts.is_empty() {
        query_string_parts.push(format!("WHERE {}", where_clause_parts.join(" AND ")));
    }

    query_string_parts.push("ORDER BY date DESC, id DESC".to_owned());

    if let Some(limit) = query.limit {
        let limit = i64::try_from(limit).map_err(|_| ValidationError::InvalidLimit(limit))?;
        query_string_parts.push("LIMIT ?".to_owned());
        query_parameters.push(Value::Integer(limit));
    }

    let query_string = query_string_parts.join(" ");
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Count the transactions that reference `account_id` as source or destination.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions_for_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<u64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" \
             WHERE source_account_id = ?1 OR destination_account_id = ?1",
            [account_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Count the transactions filed under `category_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions_for_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<u64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE category_id = ?1",
            [category_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error, ValidationError,
        account::{AccountDetails, create_account},
        category::{CategoryDetails, create_category},
        db::initialize,
        transaction::{
            Transaction, TransactionQuery, count_transactions, count_transactions_for_account,
            count_transactions_for_category, get_transaction, list_transactions,
        },
    };

    use super::{delete_transaction_row, insert_transaction_row, update_transaction_row};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_account(&AccountDetails::new("Checking"), &conn).unwrap();
        create_account(&AccountDetails::new("Savings"), &conn).unwrap();
        conn
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = get_test_connection();
        let builder = Transaction::build(Decimal::new(1_234, 2), date!(2025 - 10 - 05), "Lunch")
            .description("Noodles")
            .source(Some(1));

        let inserted = insert_transaction_row(&builder, &conn).unwrap();

        assert_eq!(inserted.amount, Decimal::new(1_234, 2));
        assert_eq!(inserted.source, Some(1));
        assert_eq!(inserted.destination, None);
        assert_eq!(inserted.description, "Noodles");
        assert_eq!(get_transaction(inserted.id, &conn), Ok(inserted));
    }

    #[test]
    fn insert_rejects_unknown_account() {
        let conn = get_test_connection();
        let builder =
            Transaction::build(Decimal::ONE, date!(2025 - 10 - 05), "Ghost").destination(Some(99));

        let result = insert_transaction_row(&builder, &conn);

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
    }

    #[test]
    fn insert_rejects_rows_without_accounts() {
        let conn = get_test_connection();
        let builder = Transaction::build(Decimal::ONE, date!(2025 - 10 - 05), "Nowhere");

        let result = insert_transaction_row(&builder, &conn);

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
    }

    #[test]
    fn get_missing_transaction() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(5, &conn), Err(Error::TransactionNotFound(5)));
    }

    #[test]
    fn update_overwrites_fields() {
        let conn = get_test_connection();
        let inserted = insert_transaction_row(
            &Transaction::build(Decimal::ONE, date!(2025 - 10 - 05), "Before").source(Some(1)),
            &conn,
        )
        .unwrap();

        let updated = update_transaction_row(
            inserted.id,
            &inserted
                .to_builder()
                .amount(Decimal::TWO)
                .destination(Some(2))
                .active(false),
            &conn,
        )
        .unwrap();

        assert_eq!(updated.amount, Decimal::TWO);
        assert_eq!(updated.destination, Some(2));
        assert!(!updated.active);
        assert_eq!(updated.created_at, inserted.created_at);
    }

    #[test]
    fn update_missing_transaction() {
        let conn = get_test_connection();
        let builder =
            Transaction::build(Decimal::ONE, date!(2025 - 10 - 05), "Ghost").source(Some(1));

        assert_eq!(
            update_transaction_row(8, &builder, &conn),
            Err(Error::TransactionNotFound(8))
        );
    }

    #[test]
    fn delete_removes_row() {
        let conn = get_test_connection();
        let inserted = insert_transaction_row(
            &Transaction::build(Decimal::ONE, date!(2025 - 10 - 05), "Gone").source(Some(1)),
            &conn,
        )
        .unwrap();

        delete_transaction_row(inserted.id, &conn).unwrap();

        assert_eq!(
            get_transaction(inserted.id, &conn),
            Err(Error::TransactionNotFound(inserted.id))
        );
        assert_eq!(
            delete_transaction_row(inserted.id, &conn),
            Err(Error::TransactionNotFound(inserted.id))
        );
    }

    #[test]
    fn list_filters_by_account_and_orders_newest_first() {
        let conn = get_test_connection();
        let older = insert_transaction_row(
            &Transaction::build(Decimal::ONE, date!(2025 - 01 - 01), "Older").source(Some(1)),
            &conn,
        )
        .unwrap();
        let newer = insert_transaction_row(
            &Transaction::build(Decimal::ONE, date!(2025 - 02 - 01), "Newer")
                .source(Some(2))
                .destination(Some(1)),
            &conn,
        )
        .unwrap();
        insert_transaction_row(
            &Transaction::build(Decimal::ONE, date!(2025 - 03 - 01), "Other").source(Some(2)),
            &conn,
        )
        .unwrap();

        let got = list_transactions(
            &TransactionQuery {
                account_id: Some(1),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got, vec![newer, older]);
    }

    #[test]
    fn list_respects_limit() {
        let conn = get_test_connection();
        for day in 1..=5 {
            insert_transaction_row(
                &Transaction::build(
                    Decimal::ONE,
                    date!(2025 - 01 - 01).replace_day(day).unwrap(),
                    "Daily",
                )
                .source(Some(1)),
                &conn,
            )
            .unwrap();
        }

        let got = list_transactions(
            &TransactionQuery {
                limit: Some(2),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].date, date!(2025 - 01 - 05));
    }

    #[test]
    fn list_rejects_limit_too_large_for_sqlite() {
        let conn = get_test_connection();

        let got = list_transactions(
            &TransactionQuery {
                limit: Some(u64::MAX),
                ..Default::default()
            },
            &conn,
        );

        assert_eq!(
            got,
            Err(Error::Validation(ValidationError::InvalidLimit(u64::MAX)))
        );
    }

    #[test]
    fn list_filters_by_category_and_account() {
        let conn = get_test_connection();
        let food = create_category(&CategoryDetails::new("Food"), &conn).unwrap();
        let filed = insert_transaction_row(
            &Transaction::build(Decimal::ONE, date!(2025 - 01 - 01), "Lunch")
                .source(Some(1))
                .category(Some(food.id)),
            &conn,
        )
        .unwrap();
        insert_transaction_row(
            &Transaction::build(Decimal::ONE, date!(2025 - 01 - 02), "Snack")
                .source(Some(2))
                .category(Some(food.id)),
            &conn,
        )
        .unwrap();
        insert_transaction_row(
            &Transaction::build(Decimal::ONE, date!(2025 - 01 - 03), "Bus").source(Some(1)),
            &conn,
        )
        .unwrap();

        let got = list_transactions(
            &TransactionQuery {
                account_id: Some(1),
                category_id: Some(food.id),
                limit: Some(10),
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got, vec![filed]);
        assert_eq!(count_transactions_for_category(food.id, &conn), Ok(2));
    }

    #[test]
    fn counts() {
        let conn = get_test_connection();
        for _ in 0..3 {
            insert_transaction_row(
                &Transaction::build(Decimal::ONE, date!(2025 - 01 - 01), "Fee").source(Some(1)),
                &conn,
            )
            .unwrap();
        }
        insert_transaction_row(
            &Transaction::build(Decimal::ONE, date!(2025 - 01 - 01), "Gift").destination(Some(2)),
            &conn,
        )
        .unwrap();

        assert_eq!(count_transactions(&conn), Ok(4));
        assert_eq!(count_transactions_for_account(1, &conn), Ok(3));
        assert_eq!(count_transactions_for_account(2, &conn), Ok(1));
    }
}
