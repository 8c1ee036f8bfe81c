//! Adoption requests: submit and list per user.

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
use serde_json::Value;

pub const INITIAL_STATUS: &str = "pending";

/// Any `status` in the body is ignored; new requests always start pending.
#[tracing::instrument(skip(state, body))]
pub async fn create(State(state): State<AppState>, JsonObject(body): JsonObject) -> Result<impl IntoResponse, AppError> {
    RequestValidator::require(&body, &["user_id", "pet_id"], "user_id and pet_id are required fields.")?;
    let mut values = pick(&body, &["user_id", "pet_id", "message"]);
    values.insert("status".into(), Value::String(INITIAL_STATUS.into()));
    let row = CrudService::create(state.store.as_ref(), Table::AdoptionRequests, values)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error submitting adoption request"))?;
    Ok(created(row))
}

/// Newest first, each with its pet.
#[tracing::instrument(skip(state))]
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let q = Select::from(Table::AdoptionRequests)
        .columns(&["id", "user_id", "pet_id", "message", "status", "created_at"])
        .embed(Table::Pets)
        .eq("user_id", user_id)
        .order("created_at", false);
    let requests = CrudService::list(state.store.as_ref(), &q)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error fetching adoption requests"))?;
    Ok(ok(requests))
}
