//! PostgreSQL datastore over a sqlx pool.

use crate::error::StoreError;
use crate::settings::DatabaseSettings;
use crate::sql::{self, bind_all, QueryBuf};
use crate::store::{Datastore, Delete, Insert, Rows, Select, Update};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    /// Pool that connects on first use; the service key is the connection password.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let options = PgConnectOptions::from_str(&settings.url)?.password(&settings.service_key);
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_lazy_with(options);
        Ok(PgDatastore { pool })
    }

    async fn fetch_docs(&self, q: &QueryBuf) -> Result<Vec<Value>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(sqlx::query(&q.sql), &q.params).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| r.try_get::<Value, _>("doc").map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn select(&self, query: &Select) -> Result<Rows, StoreError> {
        query.check()?;
        let q = sql::select(query)?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(sqlx::query(&q.sql), &q.params).fetch_one(&self.pool).await?;
        let rows: Value = row.try_get("rows")?;
        let total: Option<i64> = row.try_get("total")?;
        let rows = match rows {
            Value::Array(items) => items,
            other => return Err(StoreError::Decode(format!("expected array of rows, got {}", other))),
        };
        Ok(Rows {
            rows,
            total: total.map(|n| n.max(0) as u64),
        })
    }

    async fn insert(&self, query: &Insert) -> Result<Vec<Value>, StoreError> {
        query.check()?;
        self.fetch_docs(&sql::insert(query)?).await
    }

    async fn update(&self, query: &Update) -> Result<Vec<Value>, StoreError> {
        query.check()?;
        self.fetch_docs(&sql::update(query)?).await
    }

    async fn delete(&self, query: &Delete) -> Result<u64, StoreError> {
        query.check()?;
        let q = sql::delete(query)?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let done = bind_all(sqlx::query(&q.sql), &q.params).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}
