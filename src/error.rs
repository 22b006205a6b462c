//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::database_id::{AccountId, CategoryId, TransactionId};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client sent a transaction or account that breaks a domain rule.
    ///
    /// Nothing has been written when this error is returned.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An account referenced by a transaction does not exist.
    #[error("account {0} could not be found")]
    AccountNotFound(AccountId),

    /// The transaction to amend or delete does not exist.
    #[error("transaction {0} could not be found")]
    TransactionNotFound(TransactionId),

    /// Tried to delete an account that is still referenced by transactions.
    #[error("account {0} is referenced by {1} transaction(s) and cannot be deleted")]
    AccountInUse(AccountId, u64),

    /// The specified account name already exists in the database.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountName(String),

    /// The category referenced by a transaction or request does not exist.
    #[error("category {0} could not be found")]
    CategoryNotFound(CategoryId),

    /// Tried to delete a category that transactions are still filed under.
    #[error("category {0} is used by {1} transaction(s) and cannot be deleted")]
    CategoryInUse(CategoryId, u64),

    /// The specified category name already exists in the database.
    #[error("the category \"{0}\" already exists in the database")]
    DuplicateCategoryName(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

/// The ways a transaction or account can fail validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    /// Transactions must move a non-zero amount of money.
    #[error("the amount of a transaction cannot be zero")]
    ZeroAmount,

    /// A transaction needs at least one of a source or destination account.
    #[error("a transaction needs a source account, a destination account, or both")]
    NoAccounts,

    /// A transfer must move money between two different accounts.
    #[error("the source and destination account cannot both be account {0}")]
    SameAccount(AccountId),

    /// Amend and delete need the ID of a persisted transaction.
    #[error("a transaction ID is required, got {0}")]
    MissingTransactionId(TransactionId),

    /// An empty string was used as an account name.
    #[error("account name cannot be empty")]
    EmptyAccountName,

    /// An amount or balance left the range a decimal can represent.
    #[error("the amount would take a balance outside the supported range")]
    AmountOutOfRange,

    /// The row limit of a query does not fit in a database integer.
    #[error("{0} is not a valid limit")]
    InvalidLimit(u64),

    /// An empty string was used as a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// A category colour was not a hex colour such as `#1a2b3c`.
    #[error("\"{0}\" is not a hex colour, expected \"#rrggbb\"")]
    InvalidCategoryColour(String),

    /// The bank type was not one of the supported kinds.
    #[error("\"{0}\" is not a valid bank type, expected \"bank\" or \"online\"")]
    InvalidBankType(String),
}

impl Error {
    /// Whether the error came from the storage layer rather than the request.
    ///
    /// Operations that fail this way have been rolled back and may be retried.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Error::SqlError(_) | Error::DatabaseLockError)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::AccountNotFound(_)
            | Error::TransactionNotFound(_)
            | Error::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            Error::AccountInUse(..)
            | Error::DuplicateAccountName(_)
            | Error::CategoryInUse(..)
            | Error::DuplicateCategoryName(_) => StatusCode::CONFLICT,
            Error::SqlError(_) | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if self.is_persistence_failure() {
            // Any errors that are not handled above are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(ErrorBody { error: message })).into_response()
    }
}
