use crate::handlers::adoption::{create, list_for_user};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Mounted under `/adoption`.
pub fn adoption_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:user_id", get(list_for_user))
}
