//! Defines the endpoint for updating a category.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    category::{Category, CategoryDetails, update_category},
    database_id::CategoryId,
};

/// The state needed to update a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryEndpointState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for replacing the details of a category.
pub async fn update_category_endpoint(
    State(state): State<UpdateCategoryEndpointState>,
    Path(category_id): Path<CategoryId>,
    Json(details): Json<CategoryDetails>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_category(category_id, &details, &connection)
        .inspect_err(|error| tracing::error!("Could not update category {category_id}: {error}"))
        .map(Json)
}
