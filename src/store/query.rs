//! Backend-neutral query model. Handlers build these; a `Datastore` runs them.

use crate::error::StoreError;
use crate::store::schema::Table;
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq { column: String, value: Value },
    /// Case-insensitive LIKE; `%`/`_` are wildcards, `\` escapes.
    Ilike { column: String, pattern: String },
    Gte { column: String, value: Value },
    Lte { column: String, value: Value },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. }
            | Filter::Ilike { column, .. }
            | Filter::Gte { column, .. }
            | Filter::Lte { column, .. } => column,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Columns {
    All,
    Only(Vec<String>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
    pub offset: u64,
    pub limit: u64,
}

/// Filters shared by select, update and delete.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filters(pub Vec<Filter>);

impl Filters {
    fn check(&self, table: Table) -> Result<(), StoreError> {
        for f in &self.0 {
            table.column(f.column())?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    pub table: Table,
    pub columns: Columns,
    /// Related tables joined through one of our foreign keys.
    pub embeds: Vec<Table>,
    pub filters: Filters,
    pub order: Vec<Order>,
    pub range: Option<Range>,
    /// Also report the exact number of rows matching the filters.
    pub count: bool,
}

impl Select {
    pub fn from(table: Table) -> Self {
        Select {
            table,
            columns: Columns::All,
            embeds: Vec::new(),
            filters: Filters::default(),
            order: Vec::new(),
            range: None,
            count: false,
        }
    }

    pub fn columns(mut self, names: &[&str]) -> Self {
        self.columns = Columns::Only(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn embed(mut self, table: Table) -> Self {
        self.embeds.push(table);
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.0.push(Filter::Eq { column: column.into(), value: value.into() });
        self
    }

    pub fn ilike(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.filters.0.push(Filter::Ilike { column: column.into(), pattern: pattern.into() });
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.0.push(Filter::Gte { column: column.into(), value: value.into() });
        self
    }

    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.0.push(Filter::Lte { column: column.into(), value: value.into() });
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order { column: column.into(), ascending });
        self
    }

    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.range = Some(Range { offset, limit });
        self
    }

    pub fn limit(self, limit: u64) -> Self {
        self.range(0, limit)
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn check(&self) -> Result<(), StoreError> {
        if let Columns::Only(names) = &self.columns {
            for n in names {
                self.table.column(n)?;
            }
        }
        for e in &self.embeds {
            self.table.reference_to(*e)?;
        }
        for o in &self.order {
            self.table.column(&o.column)?;
        }
        self.filters.check(self.table)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Insert {
    pub table: Table,
    pub values: Map<String, Value>,
}

impl Insert {
    pub fn new(table: Table, values: Map<String, Value>) -> Self {
        Insert { table, values }
    }

    pub fn check(&self) -> Result<(), StoreError> {
        for k in self.values.keys() {
            self.table.column(k)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    pub table: Table,
    pub values: Map<String, Value>,
    pub filters: Filters,
}

impl Update {
    pub fn table(table: Table, values: Map<String, Value>) -> Self {
        Update { table, values, filters: Filters::default() }
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.0.push(Filter::Eq { column: column.into(), value: value.into() });
        self
    }

    pub fn check(&self) -> Result<(), StoreError> {
        if self.values.is_empty() {
            return Err(StoreError::EmptyChangeset(self.table.name()));
        }
        for k in self.values.keys() {
            self.table.column(k)?;
        }
        self.filters.check(self.table)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delete {
    pub table: Table,
    pub filters: Filters,
}

impl Delete {
    pub fn from(table: Table) -> Self {
        Delete { table, filters: Filters::default() }
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.0.push(Filter::Eq { column: column.into(), value: value.into() });
        self
    }

    pub fn check(&self) -> Result<(), StoreError> {
        self.filters.check(self.table)
    }
}

/// Result of a select: rows as JSON objects, plus the exact match count when requested.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rows {
    pub rows: Vec<Value>,
    pub total: Option<u64>,
}

/// Text form of a scalar, as compared by equality filters and bound as a query parameter.
pub fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}

/// Escape LIKE metacharacters so `s` matches literally.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
