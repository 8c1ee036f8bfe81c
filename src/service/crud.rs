//! Single-row semantics on top of the datastore.

use crate::error::{AppError, StoreError};
use crate::store::{Datastore, Delete, Insert, Rows, Select, Table, Update};
use serde_json::{Map, Value};

pub struct CrudService;

impl CrudService {
    /// Insert one row and return it as stored.
    pub async fn create(
        store: &dyn Datastore,
        table: Table,
        values: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let rows = store.insert(&Insert::new(table, values)).await?;
        Ok(single(rows)?)
    }

    pub async fn list(store: &dyn Datastore, query: &Select) -> Result<Vec<Value>, AppError> {
        Ok(store.select(query).await?.rows)
    }

    pub async fn list_counted(store: &dyn Datastore, query: &Select) -> Result<Rows, AppError> {
        Ok(store.select(&query.clone().with_count()).await?)
    }

    /// Row with the given id, or None.
    pub async fn read(store: &dyn Datastore, table: Table, id: &str) -> Result<Option<Value>, AppError> {
        let rows = store.select(&Select::from(table).eq("id", id)).await?.rows;
        Ok(rows.into_iter().next())
    }

    /// Update the row with the given id; exactly one row must match.
    pub async fn update(
        store: &dyn Datastore,
        table: Table,
        id: &str,
        values: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let rows = store.update(&Update::table(table, values).eq("id", id)).await?;
        Ok(single(rows)?)
    }

    /// Delete by id. Returns how many rows went away (0 or 1).
    pub async fn delete(store: &dyn Datastore, table: Table, id: &str) -> Result<u64, AppError> {
        Ok(store.delete(&Delete::from(table).eq("id", id)).await?)
    }
}

fn single(mut rows: Vec<Value>) -> Result<Value, StoreError> {
    if rows.len() == 1 {
        Ok(rows.remove(0))
    } else {
        Err(StoreError::NotSingle(rows.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDatastore;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_single() {
        let store = MemoryDatastore::new();
        let missing = uuid::Uuid::new_v4().to_string();
        let err = CrudService::update(&store, Table::Pets, &missing, object(json!({ "age": 1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::NotSingle(0))));
    }

    #[tokio::test]
    async fn read_returns_none_for_unknown_id() {
        let store = MemoryDatastore::new();
        let missing = uuid::Uuid::new_v4().to_string();
        assert!(CrudService::read(&store, Table::Pets, &missing).await.unwrap().is_none());
    }
}
