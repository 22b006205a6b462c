//! Defines the endpoint for recording a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    booking::create_transaction,
    gateway::SqliteGateway,
    transaction::{Transaction, TransactionBuilder},
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction and booking it against its
/// accounts, responds with the transaction and `201 Created` on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Json(builder): Json<TransactionBuilder>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let mut connection = lock_connection(&state.db_connection)?;

    let transaction = create_transaction(builder, &mut SqliteGateway::new(&mut connection))?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        account::{AccountDetails, create_account, get_account},
        db::initialize,
        endpoints,
        transaction::{Transaction, TransactionKind, count_transactions},
    };

    use super::{CreateTransactionState, create_transaction_endpoint};

    fn get_test_server() -> (TestServer, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_account(&AccountDetails::new("Checking"), &conn).unwrap();
        create_account(&AccountDetails::new("Savings"), &conn).unwrap();
        let db_connection = Arc::new(Mutex::new(conn));
        let state = CreateTransactionState {
            db_connection: db_connection.clone(),
        };
        let app = Router::new()
            .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
            .with_state(state);

        (
            TestServer::try_new(app).expect("Could not create test server."),
            db_connection,
        )
    }

    #[tokio::test]
    async fn creates_transfer_and_moves_balances() {
        let (server, db_connection) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "amount": "30.25",
                "date": "2025-06-01",
                "name": "Top up savings",
                "source": 1,
                "destination": 2,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let transaction = response.json::<Transaction>();
        assert_eq!(transaction.amount, Decimal::new(3_025, 2));
        assert_eq!(transaction.date, date!(2025 - 06 - 01));
        assert_eq!(transaction.kind(), Some(TransactionKind::Transfer));

        let conn = db_connection.lock().unwrap();
        assert_eq!(get_account(1, &conn).unwrap().balance, Decimal::new(-3_025, 2));
        assert_eq!(get_account(2, &conn).unwrap().balance, Decimal::new(3_025, 2));
    }

    #[tokio::test]
    async fn zero_amount_is_a_bad_request() {
        let (server, db_connection) = get_test_server();

        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "amount": "0",
                "date": "2025-06-01",
                "name": "Nothing",
                "destination": 1,
            }))
            .await
            .assert_status_bad_request();

        assert_eq!(count_transactions(&db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn overflowing_balance_is_a_bad_request_and_server_keeps_working() {
        let (server, db_connection) = get_test_server();
        let huge_deposit = json!({
            "amount": Decimal::MAX.to_string(),
            "date": "2025-06-01",
            "name": "Jackpot",
            "destination": 2,
        });

        server
            .post(endpoints::TRANSACTIONS)
            .json(&huge_deposit)
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(endpoints::TRANSACTIONS)
            .json(&huge_deposit)
            .await
            .assert_status_bad_request();
        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "amount": "5",
                "date": "2025-06-02",
                "name": "Pocket money",
                "destination": 1,
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let conn = db_connection.lock().unwrap();
        assert_eq!(get_account(2, &conn).unwrap().balance, Decimal::MAX);
        assert_eq!(count_transactions(&conn), Ok(2));
    }

    #[tokio::test]
    async fn unknown_account_is_not_found_and_books_nothing() {
        let (server, db_connection) = get_test_server();

        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "amount": "10",
                "date": "2025-06-01",
                "name": "Into the void",
                "source": 1,
                "destination": 9,
            }))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let conn = db_connection.lock().unwrap();
        assert_eq!(count_transactions(&conn), Ok(0));
        assert_eq!(get_account(1, &conn).unwrap().balance, Decimal::ZERO);
    }
}
