//! Parameters as bound to PostgreSQL.

use crate::store::value_text;
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// A bound parameter. Scalars travel as text and are cast in SQL to the column
/// type from the catalog; whole rows travel as one jsonb document.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Text(Option<String>),
    Json(Value),
}

impl BindValue {
    pub fn text(v: &Value) -> Self {
        BindValue::Text(value_text(v))
    }
}

pub fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [BindValue],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = match p {
            BindValue::Text(s) => query.bind(s.as_deref()),
            BindValue::Json(v) => query.bind(v),
        };
    }
    query
}
