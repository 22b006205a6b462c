//! Sets up the application's SQLite schema and shared column helpers.

use std::str::FromStr;

use rusqlite::{Connection, Row, Transaction as SqlTransaction, types::Type};
use rust_decimal::Decimal;

use crate::{
    Error, account::create_account_table, category::create_category_table,
    transaction::create_transaction_table,
};

/// Create the tables for the domain models.
///
/// Foreign key enforcement is switched on for `connection`, it is what stops
/// an account or category from being deleted while transactions still point at it.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Read a decimal stored as TEXT from column `index` of `row`.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

/// Format a decimal for storage in a TEXT column.
pub(crate) fn decimal_to_sql(value: Decimal) -> String {
    value.normalize().to_string()
}
