use crate::handlers::favorites::{create, delete, list_for_user, update_note};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Mounted under `/favorites`. `GET /:id` takes a user id; PATCH/DELETE take a favorite id.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:id", get(list_for_user).patch(update_note).delete(delete))
}
