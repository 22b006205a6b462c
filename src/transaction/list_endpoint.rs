//! Defines the endpoints for reading transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::TransactionId,
    transaction::{Transaction, TransactionQuery, get_transaction, list_transactions},
};

/// The state needed to read transactions.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists transactions newest first, optionally filtered
/// by `account_id` and `category_id` and capped by `limit`.
///
/// A `limit` larger than SQLite can bind is refused with `400 Bad Request`.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionsState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_transactions(&query, &connection).map(Json)
}

/// A route handler that responds with a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionsState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, &connection).map(Json)
}
