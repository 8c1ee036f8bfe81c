use crate::handlers::pets::{add_image, create, delete, featured, list, list_images, read, recent, update};
use crate::state::AppState;
use axum::{routing::get, Router};

/// Mounted under `/pets`. Static segments win over `/:id`.
pub fn pet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/recent", get(recent))
        .route("/featured", get(featured))
        .route("/:id", get(read).patch(update).delete(delete))
        .route("/:id/images", get(list_images).post(add_image))
}
