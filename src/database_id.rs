//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of an [Account](crate::Account) row.
pub type AccountId = DatabaseId;

/// The ID of a [Transaction](crate::Transaction) row.
pub type TransactionId = DatabaseId;

/// The ID of a [Category](crate::category::Category) row.
pub type CategoryId = DatabaseId;
