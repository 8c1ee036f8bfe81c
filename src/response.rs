//! Response helpers. Bodies are the records themselves, no envelope.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn message(message: &'static str) -> (StatusCode, Json<Message>) {
    (StatusCode::OK, Json(Message { message }))
}
