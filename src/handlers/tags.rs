//! Tags and their assignment to pets.

use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::handlers::pick;
use crate::response::{created, ok};
use crate::service::{CrudService, RequestValidator};
use crate::state::AppState;
use crate::store::{Select, Table};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let tags = CrudService::list(state.store.as_ref(), &Select::from(Table::Tags))
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error fetching tags"))?;
    Ok(ok(tags))
}

#[tracing::instrument(skip(state, body))]
pub async fn create(State(state): State<AppState>, JsonObject(body): JsonObject) -> Result<impl IntoResponse, AppError> {
    RequestValidator::require(&body, &["name"], "Tag name is required.")?;
    let values = pick(&body, &["name"]);
    let row = CrudService::create(state.store.as_ref(), Table::Tags, values)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error creating tag"))?;
    Ok(created(row))
}

/// Duplicate assignments are stored as separate rows.
#[tracing::instrument(skip(state, body))]
pub async fn assign(State(state): State<AppState>, JsonObject(body): JsonObject) -> Result<impl IntoResponse, AppError> {
    RequestValidator::require(&body, &["pet_id", "tag_id"], "pet_id and tag_id are required.")?;
    let values = pick(&body, &["pet_id", "tag_id"]);
    let row = CrudService::create(state.store.as_ref(), Table::PetTags, values)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error assigning tag"))?;
    Ok(created(row))
}

#[tracing::instrument(skip(state))]
pub async fn list_for_pet(
    State(state): State<AppState>,
    Path(pet_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let q = Select::from(Table::PetTags)
        .columns(&["id", "pet_id", "tag_id"])
        .embed(Table::Tags)
        .eq("pet_id", pet_id);
    let tags = CrudService::list(state.store.as_ref(), &q)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error fetching pet tags"))?;
    Ok(ok(tags))
}
