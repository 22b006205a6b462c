//! Defines the endpoint for amending a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    booking::amend_transaction,
    database_id::TransactionId,
    gateway::SqliteGateway,
    transaction::{Transaction, TransactionBuilder},
};

/// The state needed for amending a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for amending a transaction, the request body replaces
/// every user supplied field and the balances are rebooked to match.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Json(builder): Json<TransactionBuilder>,
) -> Result<Json<Transaction>, Error> {
    let mut connection = lock_connection(&state.db_connection)?;

    amend_transaction(
        transaction_id,
        builder,
        &mut SqliteGateway::new(&mut connection),
    )
    .map(Json)
}
