//! Database operations for categories.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryDetails},
    database_id::CategoryId,
    transaction::count_transactions_for_category,
};

const CATEGORY_COLUMNS: &str = "id, name, colour, active, created_at, updated_at";

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            colour TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_name ON category(name);",
    )?;

    Ok(())
}

/// Map a database row to a [Category].
pub fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        colour: row.get(2)?,
        active: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Create a category and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the name is empty or the colour is malformed,
/// - [Error::DuplicateCategoryName] if the name is already taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    details: &CategoryDetails,
    connection: &Connection,
) -> Result<Category, Error> {
    let colour = details.validate()?;
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO category (name, colour, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (details.name.trim(), colour, details.active, now),
            map_row_to_category,
        )
        .map_err(|error| map_duplicate_name(error, &details.name))
}

/// Retrieve a single category by ID.
///
/// # Errors
/// Returns [Error::CategoryNotFound] if `category_id` does not refer to a category.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = :id"
        ))?
        .query_row(&[(":id", &category_id)], map_row_to_category)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::CategoryNotFound(category_id),
            error => error.into(),
        })
}

/// Retrieve all categories ordered alphabetically by name.
pub fn list_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category ORDER BY name ASC"
        ))?
        .query_map([], map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the category `category_id` with `details`.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the name is empty or the colour is malformed,
/// - [Error::CategoryNotFound] if the category does not exist,
/// - [Error::DuplicateCategoryName] if the new name is already taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_category(
    category_id: CategoryId,
    details: &CategoryDetails,
    connection: &Connection,
) -> Result<Category, Error> {
    let colour = details.validate()?;

    connection
        .prepare(&format!(
            "UPDATE category SET name = ?1, colour = ?2, active = ?3, updated_at = ?4
             WHERE id = ?5
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (
                details.name.trim(),
                colour,
                details.active,
                OffsetDateTime::now_utc(),
                category_id,
            ),
            map_row_to_category,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::CategoryNotFound(category_id),
            error => map_duplicate_name(error, &details.name),
        })
}

/// Delete a category by ID.
///
/// Categories that transactions are filed under cannot be deleted, those
/// transactions have to be moved to another category first.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryInUse] if a transaction references the category,
/// - [Error::CategoryNotFound] if the category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let references = count_transactions_for_category(category_id, connection)?;
    if references > 0 {
        return Err(Error::CategoryInUse(category_id, references));
    }

    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        return Err(Error::CategoryNotFound(category_id));
    }

    Ok(())
}

fn map_duplicate_name(error: rusqlite::Error, name: &str) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateCategoryName(name.trim().to_owned()),
        error => error.into(),
    }
}
