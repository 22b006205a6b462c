//! Defines the endpoints for reading accounts.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    account::{Account, get_account, get_total_account_balance, list_accounts},
    app_state::lock_connection,
    database_id::AccountId,
};

/// The state needed to read accounts.
#[derive(Debug, Clone)]
pub struct AccountsState {
    /// The database connection for reading accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists every account ordered by name.
pub async fn get_accounts_endpoint(
    State(state): State<AccountsState>,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_accounts(&connection).map(Json)
}

/// A route handler that responds with a single account.
pub async fn get_account_endpoint(
    State(state): State<AccountsState>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_account(account_id, &connection).map(Json)
}

/// The sum of every account's balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTotal {
    /// The combined balance.
    pub total: Decimal,
}

/// A route handler that responds with the sum of all account balances.
pub async fn get_accounts_total_endpoint(
    State(state): State<AccountsState>,
) -> Result<Json<AccountTotal>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_total_account_balance(&connection).map(|total| Json(AccountTotal { total }))
}
