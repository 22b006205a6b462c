//! Defines the endpoint for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, AccountDetails, create_account},
    app_state::lock_connection,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new account, responds with the account and
/// `201 Created` on success.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Json(details): Json<AccountDetails>,
) -> Result<(StatusCode, Json<Account>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let account = create_account(&details, &connection).inspect_err(|error| {
        tracing::error!("Could not create account with {details:?}: {error}")
    })?;

    tracing::info!("Created account {} \"{}\"", account.id, account.name);

    Ok((StatusCode::CREATED, Json(account)))
}
