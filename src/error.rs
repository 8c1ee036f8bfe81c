//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned to clients for anything that is not their fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing {0} in environment variables")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Failures reported by a datastore. The message is what the caller sees.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("column {table}.{column} does not exist")]
    UnknownColumn { table: &'static str, column: String },
    #[error("could not find a relationship between '{from}' and '{to}'")]
    NoRelationship { from: &'static str, to: &'static str },
    #[error("{0}")]
    Constraint(String),
    #[error("{0}")]
    Database(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("no columns given for update on {0}")]
    EmptyChangeset(&'static str),
    #[error("JSON object requested, multiple (or no) rows returned ({0} rows)")]
    NotSingle(usize),
    #[error("decode: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => StoreError::Database(db.message().to_string()),
            sqlx::Error::RowNotFound => StoreError::NotSingle(0),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. } => StoreError::Decode(e.to_string()),
            other => StoreError::Connection(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unexpected: {0}")]
    Unexpected(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Decode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(_) => StatusCode::BAD_REQUEST,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_bad_request() {
        let e = AppError::from(StoreError::Database("duplicate key".into()));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.to_string(), "duplicate key");
    }

    #[test]
    fn decode_failures_are_internal() {
        let e = AppError::from(StoreError::Decode("bad column".into()));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn row_not_found_is_not_single() {
        let e = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(e, StoreError::NotSingle(0)));
    }
}
