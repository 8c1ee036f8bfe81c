//! Pets: create, list/search/paginate, read, update, delete, recent, featured, images.

use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::response::{created, message, ok};
use crate::service::{is_present, CrudService, RequestValidator};
use crate::state::AppState;
use crate::store::{escape_like, Select, Table};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const RECENT_COUNT: u64 = 10;

/// Query keys usable as equality filters on `GET /pets`. Anything else is ignored.
pub const FILTERABLE: &[&str] = &[
    "name",
    "species",
    "breed",
    "size",
    "energy",
    "age",
    "good_with_kids",
    "good_with_pets",
    "temperament",
];

pub const SORTABLE: &[&str] = &["name", "species", "breed", "size", "energy", "age", "created_at", "id"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetPage {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub pets: Vec<Value>,
}

/// Parsed `GET /pets` query string.
#[derive(Debug, PartialEq)]
pub struct PetListParams {
    pub search: Option<String>,
    pub sort: String,
    pub ascending: bool,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub page: u64,
    pub limit: u64,
    pub filters: Vec<(String, String)>,
}

impl PetListParams {
    pub fn parse(params: HashMap<String, String>) -> Result<Self, AppError> {
        let mut out = PetListParams {
            search: None,
            sort: "name".into(),
            ascending: true,
            min_age: None,
            max_age: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            filters: Vec::new(),
        };
        for (key, value) in params {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "search" => out.search = Some(value),
                "sort" => {
                    if !SORTABLE.contains(&value.as_str()) {
                        return Err(AppError::Validation(format!("cannot sort pets by '{}'", value)));
                    }
                    out.sort = value;
                }
                "order" => out.ascending = value == "asc",
                "minAge" => out.min_age = Some(parse_age("minAge", &value)?),
                "maxAge" => out.max_age = Some(parse_age("maxAge", &value)?),
                "page" => out.page = leading_int(&value).map(at_least_one).unwrap_or(1),
                "limit" => out.limit = leading_int(&value).map(at_least_one).unwrap_or(DEFAULT_PAGE_SIZE),
                _ if FILTERABLE.contains(&key.as_str()) => out.filters.push((key, value)),
                _ => tracing::debug!(key = %key, "ignoring unknown pets filter"),
            }
        }
        // stable SQL and parameter order regardless of query-string order
        out.filters.sort();
        Ok(out)
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn to_select(&self) -> Select {
        let mut q = Select::from(Table::Pets);
        for (column, value) in &self.filters {
            q = q.eq(column, value.as_str());
        }
        if let Some(search) = &self.search {
            q = q.ilike("name", format!("%{}%", escape_like(search)));
        }
        if let Some(min) = self.min_age {
            q = q.gte("age", min);
        }
        if let Some(max) = self.max_age {
            q = q.lte("age", max);
        }
        q.order(&self.sort, self.ascending).range(self.offset(), self.limit)
    }
}

/// Integer prefix of `s` after leading whitespace: `"2abc"` and `"2.5"` read as 2.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

fn at_least_one(n: i64) -> u64 {
    n.max(1).unsigned_abs()
}

fn parse_age(name: &str, value: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be a whole number", name)))
}

pub fn total_pages(total: u64, limit: u64) -> u64 {
    total.div_ceil(limit.max(1))
}

/// Index of the pet of the day: sum of the character codes of `YYYY-MM-DD`, modulo the pet count.
pub fn featured_index(day: NaiveDate, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let key = day.format("%Y-%m-%d").to_string();
    let hash: usize = key.chars().map(|c| c as usize).sum();
    Some(hash % count)
}

#[tracing::instrument(skip(state, body))]
pub async fn create(State(state): State<AppState>, JsonObject(body): JsonObject) -> Result<impl IntoResponse, AppError> {
    RequestValidator::require(&body, &["name", "size", "energy"], "name, size, and energy are required fields.")?;
    let row = CrudService::create(state.store.as_ref(), Table::Pets, body)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error creating pet"))?;
    Ok(created(row))
}

#[tracing::instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(mut body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    body.remove("id");
    if body.is_empty() {
        return Err(AppError::Validation("no fields to update.".into()));
    }
    let row = CrudService::update(state.store.as_ref(), Table::Pets, &id, body)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error updating pet"))?;
    Ok(ok(row))
}

#[tracing::instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    let removed = CrudService::delete(state.store.as_ref(), Table::Pets, &id)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error deleting pet"))?;
    tracing::debug!(removed, "pet delete");
    Ok(message("Pet deleted successfully."))
}

#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = PetListParams::parse(params)?;
    let rows = CrudService::list_counted(state.store.as_ref(), &params.to_select())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error fetching pets"))?;
    let total = rows.total.unwrap_or(rows.rows.len() as u64);
    Ok(ok(PetPage {
        page: params.page,
        limit: params.limit,
        total,
        total_pages: total_pages(total, params.limit),
        pets: rows.rows,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    match CrudService::read(state.store.as_ref(), Table::Pets, &id).await {
        Ok(Some(pet)) => Ok(ok(pet)),
        Ok(None) => Err(AppError::NotFound("Pet not found".into())),
        Err(e) => {
            tracing::error!(error = %e, "error fetching pet by id");
            Err(AppError::NotFound("Pet not found".into()))
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn recent(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let q = Select::from(Table::Pets).order("id", false).limit(RECENT_COUNT);
    let pets = CrudService::list(state.store.as_ref(), &q)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error fetching recent pets"))?;
    Ok(ok(pets))
}

#[tracing::instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let q = Select::from(Table::Pets).order("id", true);
    let mut pets = CrudService::list(state.store.as_ref(), &q)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error fetching pets for featured"))?;
    let pick = featured_index(Utc::now().date_naive(), pets.len())
        .map(|i| pets.swap_remove(i))
        .unwrap_or(Value::Null);
    Ok(ok(pick))
}

#[tracing::instrument(skip(state))]
pub async fn list_images(
    State(state): State<AppState>,
    Path(pet_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let q = Select::from(Table::PetImages).eq("pet_id", pet_id);
    let images = CrudService::list(state.store.as_ref(), &q)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error fetching pet images"))?;
    Ok(ok(images))
}

#[tracing::instrument(skip(state, body))]
pub async fn add_image(
    State(state): State<AppState>,
    Path(pet_id): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let image_url = body.get("image_url").filter(|v| is_present(Some(v))).cloned();
    let Some(image_url) = image_url else {
        return Err(AppError::Validation("image_url is required".into()));
    };
    let mut values = Map::new();
    values.insert("pet_id".into(), Value::String(pet_id));
    values.insert("image_url".into(), image_url);
    let row = CrudService::create(state.store.as_ref(), Table::PetImages, values)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "error inserting pet image"))?;
    Ok(created(row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_query_is_empty() {
        let p = PetListParams::parse(HashMap::new()).unwrap();
        assert_eq!(p.sort, "name");
        assert!(p.ascending);
        assert_eq!((p.page, p.limit, p.offset()), (1, DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn paging_has_a_lower_bound_only() {
        let p = PetListParams::parse(params(&[("page", "0"), ("limit", "5000")])).unwrap();
        assert_eq!((p.page, p.limit), (1, 5000));
        let p = PetListParams::parse(params(&[("page", "abc"), ("limit", "-3")])).unwrap();
        assert_eq!((p.page, p.limit), (1, 1));
        let p = PetListParams::parse(params(&[("page", "x"), ("limit", "")])).unwrap();
        assert_eq!((p.page, p.limit), (1, DEFAULT_PAGE_SIZE));
        let p = PetListParams::parse(params(&[("page", "3"), ("limit", "10")])).unwrap();
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn paging_reads_leading_digits() {
        let p = PetListParams::parse(params(&[("page", "2.5"), ("limit", " 10abc")])).unwrap();
        assert_eq!((p.page, p.limit), (2, 10));
        let p = PetListParams::parse(params(&[("page", "+3")])).unwrap();
        assert_eq!(p.page, 3);
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int("99999999999999999999"), None);
    }

    #[test]
    fn only_allowed_filters_survive() {
        let p = PetListParams::parse(params(&[("size", "small"), ("owner_secret", "x"), ("energy", "")])).unwrap();
        assert_eq!(p.filters, vec![("size".to_string(), "small".to_string())]);
    }

    #[test]
    fn bad_sort_and_age_are_rejected() {
        assert!(PetListParams::parse(params(&[("sort", "attributes")])).is_err());
        assert!(PetListParams::parse(params(&[("minAge", "young")])).is_err());
    }

    #[test]
    fn order_other_than_asc_descends() {
        let p = PetListParams::parse(params(&[("order", "DESC")])).unwrap();
        assert!(!p.ascending);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(0, 20), 0);
    }

    #[test]
    fn featured_index_is_char_code_sum_mod_count() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let sum: usize = "2024-01-01".bytes().map(usize::from).sum();
        assert_eq!(featured_index(day, 7), Some(sum % 7));
        assert_eq!(featured_index(day, 1), Some(0));
        assert_eq!(featured_index(day, 0), None);
    }
}
