//! Data access client: one shared handle to the datastore, used by every handler.

mod memory;
mod postgres;
mod query;
mod schema;

pub use memory::MemoryDatastore;
pub use postgres::PgDatastore;
pub use query::*;
pub use schema::{Column, ColumnDefault, ColumnType, Table};

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// Every call is one round trip; nothing spans more than one call.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn select(&self, query: &Select) -> Result<Rows, StoreError>;

    /// Returns the inserted rows with store defaults filled in.
    async fn insert(&self, query: &Insert) -> Result<Vec<Value>, StoreError>;

    /// Returns the rows as they are after the update.
    async fn update(&self, query: &Update) -> Result<Vec<Value>, StoreError>;

    /// Returns how many rows went away. Zero is not an error.
    async fn delete(&self, query: &Delete) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
