//! Defines the endpoint for creating a new category.
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
    category::{Category, CategoryDetails, create_category},
};

/// The state needed to create a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new category, responds with the category
/// and `201 Created` on success.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    Json(details): Json<CategoryDetails>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let category = create_category(&details, &connection).inspect_err(|error| {
        tracing::error!("Could not create category with {details:?}: {error}")
    })?;

    tracing::info!("Created category {} \"{}\"", category.id, category.name);

    Ok((StatusCode::CREATED, Json(category)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        category::{Category, CategoryDetails, DEFAULT_COLOUR, create_category_endpoint},
        db::initialize,
        endpoints,
    };

    use super::CreateCategoryEndpointState;

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = CreateCategoryEndpointState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let app = Router::new()
            .route(endpoints::CATEGORIES, post(create_category_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn can_create_category() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CATEGORIES)
            .json(&CategoryDetails::new("Groceries").colour("#33AA33"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let category = response.json::<Category>();
        assert_eq!(category.id, 1);
        assert_eq!(category.name, "Groceries");
        assert_eq!(category.colour, "#33aa33");
        assert!(category.active);
    }

    #[tokio::test]
    async fn name_only_gets_default_colour() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CATEGORIES)
            .json(&json!({ "name": "Misc" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Category>().colour, DEFAULT_COLOUR);
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let server = get_test_server();
        server
            .post(endpoints::CATEGORIES)
            .json(&CategoryDetails::new("Rent"))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post(endpoints::CATEGORIES)
            .json(&CategoryDetails::new("Rent"))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_details_are_bad_requests() {
        let server = get_test_server();

        server
            .post(endpoints::CATEGORIES)
            .json(&CategoryDetails::new(""))
            .await
            .assert_status_bad_request();
        server
            .post(endpoints::CATEGORIES)
            .json(&CategoryDetails::new("Fun").colour("pink"))
            .await
            .assert_status_bad_request();
    }
}
