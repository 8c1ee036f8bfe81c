//! Renders the query model to parameterized PostgreSQL.
//!
//! Identifiers come only from the table catalog; values are always parameters.
//! Every statement yields rows as jsonb so the driver never needs per-column types.

use crate::error::StoreError;
use crate::sql::params::BindValue;
use crate::store::{Columns, Delete, Filter, Filters, Insert, Select, Table, Update};
use serde_json::Value;

const MAIN_ALIAS: &str = "main";

/// Quote identifier for PostgreSQL (safe: only from the catalog).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified(column: &str) -> String {
    format!("{}.{}", MAIN_ALIAS, quoted(column))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: BindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// jsonb expression for one row of `main`, with embedded related rows.
fn row_expr(table: Table, columns: &Columns, embeds: &[Table]) -> Result<String, StoreError> {
    let mut expr = match columns {
        Columns::All => format!("to_jsonb({})", MAIN_ALIAS),
        Columns::Only(names) => {
            let pairs = names
                .iter()
                .map(|n| {
                    table.column(n)?;
                    Ok(format!("'{}', {}", n, qualified(n)))
                })
                .collect::<Result<Vec<_>, StoreError>>()?;
            format!("jsonb_build_object({})", pairs.join(", "))
        }
    };
    for related in embeds {
        let fk = table.reference_to(*related)?;
        expr = format!(
            "{} || jsonb_build_object('{}', (SELECT to_jsonb(rel) FROM {} rel WHERE rel.\"id\" = {}))",
            expr,
            related.name(),
            quoted(related.name()),
            qualified(fk.name)
        );
    }
    Ok(expr)
}

/// WHERE clause over `main`; text parameters cast to the column type.
fn where_clause(q: &mut QueryBuf, table: Table, filters: &Filters) -> Result<String, StoreError> {
    let mut parts = Vec::with_capacity(filters.0.len());
    for f in &filters.0 {
        let column = table.column(f.column())?;
        let cast = column.ty.pg_name();
        let lhs = qualified(column.name);
        let part = match f {
            Filter::Eq { value, .. } => {
                let n = q.push_param(BindValue::text(value));
                format!("{} = ${}::{}", lhs, n, cast)
            }
            Filter::Gte { value, .. } => {
                let n = q.push_param(BindValue::text(value));
                format!("{} >= ${}::{}", lhs, n, cast)
            }
            Filter::Lte { value, .. } => {
                let n = q.push_param(BindValue::text(value));
                format!("{} <= ${}::{}", lhs, n, cast)
            }
            Filter::Ilike { pattern, .. } => {
                let n = q.push_param(BindValue::Text(Some(pattern.clone())));
                format!("{}::text ILIKE ${}", lhs, n)
            }
        };
        parts.push(part);
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

/// One row back, always: `rows` (jsonb array, in order) and `total` (bigint or NULL).
pub fn select(s: &Select) -> Result<QueryBuf, StoreError> {
    let mut q = QueryBuf::new();
    let table = quoted(s.table.name());
    let row = row_expr(s.table, &s.columns, &s.embeds)?;
    let filter = where_clause(&mut q, s.table, &s.filters)?;

    let order_by = s
        .order
        .iter()
        .map(|o| {
            s.table.column(&o.column)?;
            Ok(format!("{} {}", qualified(&o.column), if o.ascending { "ASC" } else { "DESC" }))
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    let order_clause = if order_by.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", order_by.join(", "))
    };
    let page_clause = s
        .range
        .map(|r| format!(" LIMIT {} OFFSET {}", r.limit, r.offset))
        .unwrap_or_default();
    let total = if s.count {
        format!("(SELECT count(*) FROM {} {}{})", table, MAIN_ALIAS, filter)
    } else {
        "NULL::bigint".to_string()
    };

    q.sql = format!(
        "SELECT COALESCE(jsonb_agg(page.doc ORDER BY page.ord), '[]'::jsonb) AS rows, {} AS total \
         FROM (SELECT {} AS doc, row_number() OVER ({}) AS ord FROM {} {}{}{}{}) page",
        total,
        row,
        order_clause.trim_start(),
        table,
        MAIN_ALIAS,
        filter,
        order_clause,
        page_clause
    );
    Ok(q)
}

/// INSERT typed through `jsonb_populate_record`; columns left out take their defaults.
pub fn insert(i: &Insert) -> Result<QueryBuf, StoreError> {
    let mut q = QueryBuf::new();
    let table = quoted(i.table.name());
    if i.values.is_empty() {
        q.sql = format!(
            "INSERT INTO {} AS {} DEFAULT VALUES RETURNING to_jsonb({}) AS doc",
            table, MAIN_ALIAS, MAIN_ALIAS
        );
        return Ok(q);
    }
    let mut cols = Vec::with_capacity(i.values.len());
    let mut picks = Vec::with_capacity(i.values.len());
    for name in i.values.keys() {
        let c = i.table.column(name)?;
        cols.push(quoted(c.name));
        picks.push(format!("r.{}", quoted(c.name)));
    }
    let n = q.push_param(BindValue::Json(Value::Object(i.values.clone())));
    q.sql = format!(
        "INSERT INTO {} AS {} ({}) SELECT {} FROM jsonb_populate_record(NULL::{}, ${}) AS r RETURNING to_jsonb({}) AS doc",
        table,
        MAIN_ALIAS,
        cols.join(", "),
        picks.join(", "),
        table,
        n,
        MAIN_ALIAS
    );
    Ok(q)
}

/// UPDATE only the given columns of every row matching the filters.
pub fn update(u: &Update) -> Result<QueryBuf, StoreError> {
    if u.values.is_empty() {
        return Err(StoreError::EmptyChangeset(u.table.name()));
    }
    let mut q = QueryBuf::new();
    let table = quoted(u.table.name());
    let mut sets = Vec::with_capacity(u.values.len());
    for name in u.values.keys() {
        let c = u.table.column(name)?;
        sets.push(format!("{} = r.{}", quoted(c.name), quoted(c.name)));
    }
    let n = q.push_param(BindValue::Json(Value::Object(u.values.clone())));
    let filter = where_clause(&mut q, u.table, &u.filters)?;
    q.sql = format!(
        "UPDATE {} AS {} SET {} FROM jsonb_populate_record(NULL::{}, ${}) AS r{} RETURNING to_jsonb({}) AS doc",
        table,
        MAIN_ALIAS,
        sets.join(", "),
        table,
        n,
        filter,
        MAIN_ALIAS
    );
    Ok(q)
}

pub fn delete(d: &Delete) -> Result<QueryBuf, StoreError> {
    let mut q = QueryBuf::new();
    let filter = where_clause(&mut q, d.table, &d.filters)?;
    q.sql = format!("DELETE FROM {} AS {}{}", quoted(d.table.name()), MAIN_ALIAS, filter);
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn object(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn select_with_filters_order_and_page() {
        let s = Select::from(Table::Pets)
            .eq("size", "medium")
            .ilike("name", "%re%")
            .gte("age", 2)
            .order("name", true)
            .range(20, 10)
            .with_count();
        let q = select(&s).unwrap();
        assert!(q.sql.contains("main.\"size\" = $1::text"));
        assert!(q.sql.contains("main.\"name\"::text ILIKE $2"));
        assert!(q.sql.contains("main.\"age\" >= $3::integer"));
        assert!(q.sql.contains(" ORDER BY main.\"name\" ASC LIMIT 10 OFFSET 20"));
        assert!(q.sql.contains("(SELECT count(*) FROM \"pets\" main WHERE"));
        assert_eq!(
            q.params,
            vec![
                BindValue::Text(Some("medium".into())),
                BindValue::Text(Some("%re%".into())),
                BindValue::Text(Some("2".into())),
            ]
        );
    }

    #[test]
    fn select_without_count_reports_null_total() {
        let q = select(&Select::from(Table::Tags)).unwrap();
        assert!(q.sql.contains("NULL::bigint AS total"));
        assert!(!q.sql.contains("WHERE"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn embed_joins_through_foreign_key() {
        let s = Select::from(Table::Favorites).embed(Table::Pets).eq("user_id", "u1");
        let q = select(&s).unwrap();
        assert!(q
            .sql
            .contains("jsonb_build_object('pets', (SELECT to_jsonb(rel) FROM \"pets\" rel WHERE rel.\"id\" = main.\"pet_id\"))"));
    }

    #[test]
    fn projection_builds_object() {
        let s = Select::from(Table::Pets).columns(&["id", "name"]);
        let q = select(&s).unwrap();
        assert!(q.sql.contains("jsonb_build_object('id', main.\"id\", 'name', main.\"name\")"));
    }

    #[test]
    fn unknown_filter_column_is_rejected() {
        let s = Select::from(Table::Pets).eq("owner; DROP TABLE pets", "x");
        assert!(matches!(select(&s), Err(StoreError::UnknownColumn { .. })));
    }

    #[test]
    fn insert_populates_record_from_json() {
        let i = Insert::new(Table::Tags, object(json!({ "name": "calm" })));
        let q = insert(&i).unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO \"tags\" AS main (\"name\") SELECT r.\"name\" FROM jsonb_populate_record(NULL::\"tags\", $1) AS r RETURNING to_jsonb(main) AS doc"
        );
        assert_eq!(q.params, vec![BindValue::Json(json!({ "name": "calm" }))]);
    }

    #[test]
    fn insert_without_values_uses_defaults() {
        let q = insert(&Insert::new(Table::Tags, Map::new())).unwrap();
        assert!(q.sql.contains("DEFAULT VALUES"));
    }

    #[test]
    fn update_sets_given_columns_by_id() {
        let u = Update::table(Table::Pets, object(json!({ "age": 3 }))).eq("id", "abc");
        let q = update(&u).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"pets\" AS main SET \"age\" = r.\"age\" FROM jsonb_populate_record(NULL::\"pets\", $1) AS r WHERE main.\"id\" = $2::uuid RETURNING to_jsonb(main) AS doc"
        );
        assert_eq!(q.params[1], BindValue::Text(Some("abc".into())));
    }

    #[test]
    fn delete_by_id() {
        let q = delete(&Delete::from(Table::Favorites).eq("id", "f1")).unwrap();
        assert_eq!(q.sql, "DELETE FROM \"favorites\" AS main WHERE main.\"id\" = $1::uuid");
    }
}
