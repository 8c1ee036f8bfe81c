//! In-process datastore with the same observable behavior as the PostgreSQL one:
//! catalog checks, column types, column defaults, foreign keys, null ordering.
//! Used by tests and for running the API without a database.

use crate::error::StoreError;
use crate::store::schema::{Column, ColumnDefault, ColumnType, Table};
use crate::store::{value_text, Columns, Datastore, Delete, Filter, Filters, Insert, Rows, Select, Update};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use regex::RegexBuilder;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

type Record = Map<String, Value>;

static NULL: Value = Value::Null;

#[derive(Default)]
struct Tables {
    rows: HashMap<Table, Vec<Record>>,
    /// Last handed-out `now()`, so creation order survives equal clock readings.
    last_now: Option<DateTime<Utc>>,
}

impl Tables {
    fn rows(&self, table: Table) -> &[Record] {
        self.rows.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_now {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_now = Some(now);
        now
    }

    fn check_references(&self, table: Table, record: &Record) -> Result<(), StoreError> {
        for c in table.columns() {
            let (Some(target), Some(value)) = (c.references, record.get(c.name)) else {
                continue;
            };
            let Some(key) = value_text(value) else { continue };
            let exists = self
                .rows(target)
                .iter()
                .any(|r| r.get("id").and_then(value_text).as_deref() == Some(key.as_str()));
            if !exists {
                return Err(StoreError::Constraint(format!(
                    "insert or update on table \"{}\" violates foreign key constraint \"{}_{}_fkey\"",
                    table.name(),
                    table.name(),
                    c.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDatastore {
    inner: RwLock<Tables>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Connection("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Connection("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn select(&self, query: &Select) -> Result<Rows, StoreError> {
        query.check()?;
        let filters = typed_filters(query.table, &query.filters)?;
        let tables = self.read()?;
        let mut matched: Vec<&Record> = tables
            .rows(query.table)
            .iter()
            .filter(|r| matches_all(r, &filters))
            .collect();

        if !query.order.is_empty() {
            matched.sort_by(|a, b| {
                query
                    .order
                    .iter()
                    .map(|o| {
                        let ord = compare_nulls_last(a.get(&o.column), b.get(&o.column));
                        if o.ascending {
                            ord
                        } else {
                            ord.reverse()
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let total = query.count.then_some(matched.len() as u64);
        let page: Vec<&Record> = match query.range {
            Some(r) => matched
                .into_iter()
                .skip(r.offset as usize)
                .take(r.limit as usize)
                .collect(),
            None => matched,
        };

        let rows = page
            .into_iter()
            .map(|r| project(&tables, query, r))
            .collect();
        Ok(Rows { rows, total })
    }

    async fn insert(&self, query: &Insert) -> Result<Vec<Value>, StoreError> {
        query.check()?;
        let mut tables = self.write()?;
        let mut record = Record::new();
        for c in query.table.columns() {
            let value = match (query.values.get(c.name), c.default) {
                (Some(v), _) => typed(c, v)?,
                (None, Some(ColumnDefault::RandomUuid)) => Value::String(uuid::Uuid::new_v4().to_string()),
                (None, Some(ColumnDefault::Now)) => {
                    Value::String(tables.now().to_rfc3339_opts(SecondsFormat::Micros, true))
                }
                (None, Some(ColumnDefault::Text(s))) => Value::String(s.to_string()),
                (None, None) => Value::Null,
            };
            record.insert(c.name.to_string(), value);
        }
        tables.check_references(query.table, &record)?;
        tables.rows.entry(query.table).or_default().push(record.clone());
        Ok(vec![Value::Object(record)])
    }

    async fn update(&self, query: &Update) -> Result<Vec<Value>, StoreError> {
        query.check()?;
        let filters = typed_filters(query.table, &query.filters)?;
        let mut values = Record::new();
        for (k, v) in &query.values {
            values.insert(k.clone(), typed(query.table.column(k)?, v)?);
        }
        let mut tables = self.write()?;
        let mut changed = Vec::new();
        for r in tables.rows(query.table) {
            if matches_all(r, &filters) {
                let mut next = r.clone();
                for (k, v) in &values {
                    next.insert(k.clone(), v.clone());
                }
                tables.check_references(query.table, &next)?;
                changed.push(next);
            }
        }
        let rows = tables.rows.entry(query.table).or_default();
        let mut updated = changed.iter();
        for r in rows.iter_mut() {
            if matches_all(r, &filters) {
                if let Some(next) = updated.next() {
                    *r = next.clone();
                }
            }
        }
        Ok(changed.into_iter().map(Value::Object).collect())
    }

    async fn delete(&self, query: &Delete) -> Result<u64, StoreError> {
        query.check()?;
        let filters = typed_filters(query.table, &query.filters)?;
        let mut tables = self.write()?;
        let rows = tables.rows.entry(query.table).or_default();
        let before = rows.len();
        rows.retain(|r| !matches_all(r, &filters));
        Ok((before - rows.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}

fn project(tables: &Tables, query: &Select, record: &Record) -> Value {
    let mut out = match &query.columns {
        Columns::All => record.clone(),
        Columns::Only(names) => names
            .iter()
            .map(|n| (n.clone(), record.get(n).cloned().unwrap_or(Value::Null)))
            .collect(),
    };
    for related in &query.embeds {
        let joined = query
            .table
            .reference_to(*related)
            .ok()
            .and_then(|fk| record.get(fk.name))
            .and_then(value_text)
            .and_then(|key| {
                tables
                    .rows(*related)
                    .iter()
                    .find(|r| r.get("id").and_then(value_text).as_deref() == Some(key.as_str()))
            })
            .map(|r| Value::Object(r.clone()))
            .unwrap_or(Value::Null);
        out.insert(related.name().to_string(), joined);
    }
    Value::Object(out)
}

fn invalid_input(ty: ColumnType, text: &str) -> StoreError {
    StoreError::Database(format!("invalid input syntax for type {}: \"{}\"", ty.pg_name(), text))
}

/// `value` converted the way PostgreSQL reads it into `column`, in canonical JSON form.
fn typed(column: &Column, value: &Value) -> Result<Value, StoreError> {
    if column.ty == ColumnType::Jsonb || value.is_null() {
        return Ok(value.clone());
    }
    let text = value_text(value).unwrap_or_default();
    match column.ty {
        ColumnType::Text => Ok(Value::String(text)),
        ColumnType::Integer => {
            if matches!(value, Value::Bool(_)) {
                return Err(invalid_input(column.ty, &text));
            }
            text.trim()
                .parse::<i32>()
                .map(Value::from)
                .map_err(|_| invalid_input(column.ty, &text))
        }
        ColumnType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "f" | "false" | "n" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid_input(column.ty, &text)),
        },
        ColumnType::Uuid => uuid::Uuid::parse_str(text.trim())
            .map(|u| Value::String(u.hyphenated().to_string()))
            .map_err(|_| invalid_input(column.ty, &text)),
        ColumnType::Timestamptz => DateTime::parse_from_rfc3339(text.trim())
            .map(|t| Value::String(t.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, true)))
            .map_err(|_| invalid_input(column.ty, &text)),
        ColumnType::Jsonb => Ok(value.clone()),
    }
}

/// Filter values cast to their column types; LIKE patterns stay text.
fn typed_filters(table: Table, filters: &Filters) -> Result<Filters, StoreError> {
    let mut out = Vec::with_capacity(filters.0.len());
    for f in &filters.0 {
        let column = table.column(f.column())?;
        out.push(match f {
            Filter::Eq { column: name, value } => Filter::Eq { column: name.clone(), value: typed(column, value)? },
            Filter::Gte { column: name, value } => Filter::Gte { column: name.clone(), value: typed(column, value)? },
            Filter::Lte { column: name, value } => Filter::Lte { column: name.clone(), value: typed(column, value)? },
            Filter::Ilike { .. } => f.clone(),
        });
    }
    Ok(Filters(out))
}

fn matches_all(record: &Record, filters: &Filters) -> bool {
    filters.0.iter().all(|f| matches(record, f))
}

fn matches(record: &Record, filter: &Filter) -> bool {
    let cell = record.get(filter.column()).unwrap_or(&NULL);
    match filter {
        Filter::Eq { value, .. } => match (value_text(cell), value_text(value)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        Filter::Gte { value, .. } => compare_present(cell, value).is_some_and(|o| o != Ordering::Less),
        Filter::Lte { value, .. } => compare_present(cell, value).is_some_and(|o| o != Ordering::Greater),
        Filter::Ilike { pattern, .. } => value_text(cell).is_some_and(|s| like_matches(pattern, &s, true)),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Comparison of two non-null cells; numbers numerically, everything else as text.
fn compare_present(a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    Some(value_text(a)?.cmp(&value_text(b)?))
}

/// Ascending order with nulls sorting after everything else.
fn compare_nulls_last(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare_present(x, y).unwrap_or(Ordering::Equal),
    }
}

/// SQL LIKE: `%` any run, `_` one char, `\` escapes the next char.
pub(crate) fn like_matches(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let mut re = String::with_capacity(pattern.len() + 2);
    re.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            '\\' => re.push_str(&regex::escape(&chars.next().unwrap_or('\\').to_string())),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    RegexBuilder::new(&re)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .is_ok_and(|r| r.is_match(text))
}
