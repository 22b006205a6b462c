//! Defines the endpoints for reading categories.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    category::{Category, get_category, list_categories},
    database_id::CategoryId,
};

/// The state needed to read categories.
#[derive(Debug, Clone)]
pub struct CategoriesEndpointState {
    /// The database connection for reading categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists every category ordered by name.
pub async fn get_categories_endpoint(
    State(state): State<CategoriesEndpointState>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_categories(&connection).map(Json)
}

/// A route handler that responds with a single category.
pub async fn get_category_endpoint(
    State(state): State<CategoriesEndpointState>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_category(category_id, &connection).map(Json)
}
