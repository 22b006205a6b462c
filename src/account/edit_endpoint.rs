//! Defines the endpoint for updating the details of an account.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, AccountDetails, update_account_details},
    app_state::lock_connection,
    database_id::AccountId,
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for replacing the details of an account.
///
/// Balances cannot be edited here, they only change through transactions.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Path(account_id): Path<AccountId>,
    Json(details): Json<AccountDetails>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_account_details(account_id, &details, &connection)
        .inspect_err(|error| tracing::error!("Could not update account {account_id}: {error}"))
        .map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::put};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        account::{Account, AccountDetails, BankType, create_account, edit_account_endpoint},
        booking::create_transaction,
        db::initialize,
        endpoints::{self, format_endpoint},
        gateway::SqliteGateway,
        transaction::Transaction,
    };

    use super::EditAccountState;

    fn get_test_server() -> TestServer {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let account = create_account(&AccountDetails::new("Wallet"), &conn).unwrap();
        create_transaction(
            Transaction::build(Decimal::from(40), date!(2025 - 04 - 01), "Cash")
                .destination(Some(account.id)),
            &mut SqliteGateway::new(&mut conn),
        )
        .unwrap();
        let state = EditAccountState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let app = Router::new()
            .route(endpoints::ACCOUNT, put(edit_account_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn can_update_account_details() {
        let server = get_test_server();

        let response = server
            .put(&format_endpoint(endpoints::ACCOUNT, 1))
            .json(&AccountDetails::new("PayPal").bank_type(BankType::Online))
            .await;

        response.assert_status_ok();
        let account = response.json::<Account>();
        assert_eq!(account.name, "PayPal");
        assert_eq!(account.bank_type, BankType::Online);
        assert_eq!(account.balance, Decimal::from(40));
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let server = get_test_server();

        server
            .put(&format_endpoint(endpoints::ACCOUNT, 2))
            .json(&AccountDetails::new("Nope"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
