//! Favorites: add, list per user with pet data, update note, remove.

use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::handlers::pick;
use crate::response::{created, message, ok};
use crate::service::{CrudService, RequestValidator};
use crate::state::AppState;
use crate::store::{Select, Table};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::{Map, Value};

#[tracing::instrument(skip(state, body))]
pub async fn create(State(state): State<AppState>, JsonObject(body): JsonObject) -> Result<impl IntoResponse, AppError> {
    RequestValidator::require(&body, &["user_id", "pet_id"], "user_id and pet_id are required fields.")?;
    let values = pick(&body, &["user_id", "pet_id", "note"]);
    let row = CrudService::create(state.store.as_ref(), Table::Favorites, values)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error inserting favorite"))?;
    Ok(created(row))
}

#[tracing::instrument(skip(state))]
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let q = Select::from(Table::Favorites)
        .columns(&["id", "user_id", "pet_id", "note", "created_at"])
        .embed(Table::Pets)
        .eq("user_id", user_id);
    let favorites = CrudService::list(state.store.as_ref(), &q)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error fetching favorites"))?;
    Ok(ok(favorites))
}

#[tracing::instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    CrudService::delete(state.store.as_ref(), Table::Favorites, &id)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error deleting favorite"))?;
    Ok(message("Favorite removed successfully."))
}

/// Replaces the note; a body without `note` clears it.
#[tracing::instrument(skip(state, body))]
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let mut values = Map::new();
    values.insert("note".into(), body.get("note").cloned().unwrap_or(Value::Null));
    let row = CrudService::update(state.store.as_ref(), Table::Favorites, &id, values)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error updating favorite note"))?;
    Ok(ok(row))
}
