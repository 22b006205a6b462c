//! Defines the account model and the database queries that do not touch balances.
//!
//! Balances are only ever written by the booking engine through
//! [save_account_balances], everything else in this module works on metadata.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, ValidationError,
    database_id::AccountId,
    db::{decimal_to_sql, get_decimal},
    transaction::count_transactions_for_account,
};

/// A bank account or online wallet that money moves in and out of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The display name of the account, unique across accounts.
    pub name: String,
    /// Whether the account is still in use. Metadata only.
    pub active: bool,
    /// The settled balance, the sum of every transaction booked against the account.
    pub balance: Decimal,
    /// The balance including transactions that have not settled yet.
    pub balance_forecast: Decimal,
    /// The international bank account number.
    pub iban: String,
    /// The name of the account holder.
    pub holder: String,
    /// The bank code (e.g., BIC or BLZ).
    pub bank_code: String,
    /// The bank's own account number.
    pub account_number: String,
    /// The name of the bank or the online provider.
    pub bank_name: String,
    /// What kind of institution holds the account.
    pub bank_type: BankType,
    /// When the account was created.
    pub created_at: OffsetDateTime,
    /// When the account was last modified.
    pub updated_at: OffsetDateTime,
}

/// The kind of institution that holds an account.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankType {
    /// A traditional bank.
    #[default]
    Bank,
    /// An online payment provider, e.g. a wallet service.
    Online,
}

impl BankType {
    fn as_str(&self) -> &'static str {
        match self {
            BankType::Bank => "bank",
            BankType::Online => "online",
        }
    }
}

impl Display for BankType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BankType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank" => Ok(BankType::Bank),
            "online" => Ok(BankType::Online),
            other => Err(ValidationError::InvalidBankType(other.to_owned())),
        }
    }
}

impl ToSql for BankType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for BankType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The user editable fields of an [Account].
///
/// Balances are deliberately absent: they are derived from transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetails {
    /// The display name of the account.
    pub name: String,
    /// Whether the account is still in use.
    #[serde(default = "default_active")]
    pub active: bool,
    /// The international bank account number.
    #[serde(default)]
    pub iban: String,
    /// The name of the account holder.
    #[serde(default)]
    pub holder: String,
    /// The bank code.
    #[serde(default)]
    pub bank_code: String,
    /// The bank's own account number.
    #[serde(default)]
    pub account_number: String,
    /// The name of the bank or online provider.
    #[serde(default)]
    pub bank_name: String,
    /// What kind of institution holds the account.
    #[serde(default)]
    pub bank_type: BankType,
}

fn default_active() -> bool {
    true
}

impl AccountDetails {
    /// Details for an active bank account named `name` with every other field empty.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            active: true,
            iban: String::new(),
            holder: String::new(),
            bank_code: String::new(),
            account_number: String::new(),
            bank_name: String::new(),
            bank_type: BankType::Bank,
        }
    }

    /// Set the bank type.
    pub fn bank_type(mut self, bank_type: BankType) -> Self {
        self.bank_type = bank_type;
        self
    }

    /// Set the IBAN.
    pub fn iban(mut self, iban: &str) -> Self {
        self.iban = iban.to_owned();
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyAccountName);
        }

        Ok(())
    }
}

const ACCOUNT_COLUMNS: &str = "id, name, active, balance, balance_forecast, iban, holder, \
    bank_code, account_number, bank_name, bank_type, created_at, updated_at";

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            active INTEGER NOT NULL DEFAULT 1,
            balance TEXT NOT NULL DEFAULT '0',
            balance_forecast TEXT NOT NULL DEFAULT '0',
            iban TEXT NOT NULL DEFAULT '',
            holder TEXT NOT NULL DEFAULT '',
            bank_code TEXT NOT NULL DEFAULT '',
            account_number TEXT NOT NULL DEFAULT '',
            bank_name TEXT NOT NULL DEFAULT '',
            bank_type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Account].
///
/// The row must contain the columns in the order of the table definition.
pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
        balance: get_decimal(row, 3)?,
        balance_forecast: get_decimal(row, 4)?,
        iban: row.get(5)?,
        holder: row.get(6)?,
        bank_code: row.get(7)?,
        account_number: row.get(8)?,
        bank_name: row.get(9)?,
        bank_type: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Create a new account with zero balances.
///
/// An opening balance is recorded by creating a deposit into the new account.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the account name is empty,
/// - [Error::DuplicateAccountName] if the name is already taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(details: &AccountDetails, connection: &Connection) -> Result<Account, Error> {
    details.validate()?;
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO account (name, active, balance, balance_forecast, iban, holder, \
                bank_code, account_number, bank_name, bank_type, created_at, updated_at)
             VALUES (?1, ?2, '0', '0', ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             RETURNING {ACCOUNT_COLUMNS}"
        ))?
        .query_row(
            (
                details.name.trim(),
                details.active,
                &details.iban,
                &details.holder,
                &details.bank_code,
                &details.account_number,
                &details.bank_name,
                details.bank_type,
                now,
            ),
            map_row_to_account,
        )
        .map_err(|error| map_duplicate_name(error, &details.name))
}

/// Retrieve an account by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::AccountNotFound] if `id` does not refer to a valid account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_row_to_account)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound(id),
            error => error.into(),
        })
}

/// Retrieve all accounts ordered by name.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM account ORDER BY name ASC"))?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Overwrite the metadata of the account `id` with `details`.
///
/// The balances are left as they are.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the account name is empty,
/// - [Error::AccountNotFound] if `id` does not refer to a valid account,
/// - [Error::DuplicateAccountName] if the new name is already taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_account_details(
    id: AccountId,
    details: &AccountDetails,
    connection: &Connection,
) -> Result<Account, Error> {
    details.validate()?;

    connection
        .prepare(&format!(
            "UPDATE account
             SET name = ?1, active = ?2, iban = ?3, holder = ?4, bank_code = ?5, \
                account_number = ?6, bank_name = ?7, bank_type = ?8, updated_at = ?9
             WHERE id = ?10
             RETURNING {ACCOUNT_COLUMNS}"
        ))?
        .query_row(
            (
                details.name.trim(),
                details.active,
                &details.iban,
                &details.holder,
                &details.bank_code,
                &details.account_number,
                &details.bank_name,
                details.bank_type,
                OffsetDateTime::now_utc(),
                id,
            ),
            map_row_to_account,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound(id),
            error => map_duplicate_name(error, &details.name),
        })
}

/// Delete the account `id`.
///
/// Accounts that any transaction still references cannot be deleted, the
/// transactions have to be deleted (and thereby un-booked) first.
///
/// # Errors
/// This function will return a:
/// - [Error::AccountInUse] if a transaction references the account,
/// - [Error::AccountNotFound] if `id` does not refer to a valid account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_account(id: AccountId, connection: &Connection) -> Result<(), Error> {
    let references = count_transactions_for_account(id, connection)?;
    if references > 0 {
        return Err(Error::AccountInUse(id, references));
    }

    match connection.execute("DELETE FROM account WHERE id = :id", &[(":id", &id)])? {
        0 => Err(Error::AccountNotFound(id)),
        _ => Ok(()),
    }
}

/// Write the balances of `account` back to the database.
///
/// Only the booking engine may call this, see [crate::booking].
///
/// # Errors
/// This function will return a:
/// - [Error::AccountNotFound] if the account does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub(crate) fn save_account_balances(
    account: &Account,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET balance = ?1, balance_forecast = ?2, updated_at = ?3 WHERE id = ?4",
        (
            decimal_to_sql(account.balance),
            decimal_to_sql(account.balance_forecast),
            OffsetDateTime::now_utc(),
            account.id,
        ),
    )?;

    match rows_affected {
        0 => Err(Error::AccountNotFound(account.id)),
        _ => Ok(()),
    }
}

/// Get the total balance across all accounts.
///
/// # Errors
/// Returns [Error] if:
/// - Database connection fails
/// - SQL query preparation or execution fails
/// - The total does not fit in a decimal
pub fn get_total_account_balance(connection: &Connection) -> Result<Decimal, Error> {
    connection
        .prepare("SELECT balance FROM account")?
        .query_map([], |row| get_decimal(row, 0))?
        .try_fold(Decimal::ZERO, |total, balance| -> Result<Decimal, Error> {
            total
                .checked_add(balance?)
                .ok_or_else(|| ValidationError::AmountOutOfRange.into())
        })
}

fn map_duplicate_name(error: rusqlite::Error, name: &str) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateAccountName(name.trim().to_owned()),
        error => error.into(),
    }
}
