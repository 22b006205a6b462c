//! Defines the endpoint for deleting a category.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, app_state::lock_connection, category::delete_category,
    database_id::CategoryId,
};

/// The state needed to delete a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a category, responds with `204 No Content`.
///
/// Categories that transactions are still filed under are refused with `409 Conflict`.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryEndpointState>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_category(category_id, &connection)
        .inspect_err(|error| tracing::error!("Could not delete category {category_id}: {error}"))?;

    tracing::info!("Deleted category {category_id}");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::delete};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        account::{AccountDetails, create_account},
        booking::create_transaction,
        category::{CategoryDetails, create_category, delete_category_endpoint},
        db::initialize,
        endpoints::{self, format_endpoint},
        gateway::SqliteGateway,
        transaction::Transaction,
    };

    use super::DeleteCategoryEndpointState;

    fn get_test_server() -> TestServer {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let account = create_account(&AccountDetails::new("Wallet"), &conn).unwrap();
        create_category(&CategoryDetails::new("Unused"), &conn).unwrap();
        let used = create_category(&CategoryDetails::new("Used"), &conn).unwrap();
        create_transaction(
            Transaction::build(Decimal::ONE, date!(2025 - 04 - 01), "Coffee")
                .source(Some(account.id))
                .category(Some(used.id)),
            &mut SqliteGateway::new(&mut conn),
        )
        .unwrap();
        let state = DeleteCategoryEndpointState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let app = Router::new()
            .route(endpoints::CATEGORY, delete(delete_category_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn deletes_unused_category() {
        let server = get_test_server();

        server
            .delete(&format_endpoint(endpoints::CATEGORY, 1))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&format_endpoint(endpoints::CATEGORY, 1))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refuses_category_in_use() {
        let server = get_test_server();

        server
            .delete(&format_endpoint(endpoints::CATEGORY, 2))
            .await
            .assert_status(StatusCode::CONFLICT);
    }
}
