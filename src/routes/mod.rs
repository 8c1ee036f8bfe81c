//! Router assembly: resource routers under their prefixes, plus CORS, tracing,
//! body limit and panic recovery.

mod adoption;
mod common;
mod favorites;
mod pets;
mod tags;

pub use adoption::adoption_routes;
pub use common::{common_routes, BANNER};
pub use favorites::favorite_routes;
pub use pets::pet_routes;
pub use tags::tag_routes;

use crate::error::AppError;
use crate::settings::DEFAULT_MAX_BODY_BYTES;
use crate::state::AppState;
use axum::{
    response::{IntoResponse, Response},
    Router,
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".into());
    AppError::Unexpected(detail).into_response()
}

/// Full API with the default body limit.
pub fn build_router(state: AppState) -> Router {
    build_router_with_limit(state, DEFAULT_MAX_BODY_BYTES)
}

pub fn build_router_with_limit(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes())
        .nest("/pets", pet_routes())
        .nest("/favorites", favorite_routes())
        .nest("/adoption", adoption_routes())
        .nest("/tags", tag_routes())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
