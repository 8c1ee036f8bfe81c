use crate::handlers::tags::{assign, create, list, list_for_pet};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Mounted under `/tags`.
pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/assign", post(assign))
        .route("/pet/:pet_id", get(list_for_pet))
}
