//! A small query builder covering what the application asks of its tables:
//! column projection, equality filters, a single ordering and a row limit.
//!
//! The same [`Query`] is rendered as PostgREST parameters by the live backend
//! and evaluated directly by the in-memory backend.

use std::cmp::Ordering;

use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    table: String,
    columns: String,
    filters: Vec<(String, Value)>,
    order: Option<Order>,
    limit: Option<usize>,
}

impl Query {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Comma-separated column list, `*` for all.
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &str {
        &self.columns
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// PostgREST query-string parameters for this query.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        for (column, value) in &self.filters {
            let rendered = match value {
                Value::Null => "is.null".to_string(),
                Value::String(s) => format!("eq.{s}"),
                other => format!("eq.{other}"),
            };
            params.push((column.clone(), rendered));
        }
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Filter-only parameters, for updates.
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.to_params()
            .into_iter()
            .filter(|(k, _)| k != "select" && k != "order" && k != "limit")
            .collect()
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| row.get(column).unwrap_or(&Value::Null) == expected)
    }

    /// Filter, order, limit and project `rows`.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
        let mut selected: Vec<&Value> = rows.into_iter().filter(|row| self.matches(row)).collect();

        if let Some(order) = &self.order {
            selected.sort_by(|a, b| {
                let ord = compare(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }

        selected.into_iter().map(|row| self.project(row)).collect()
    }

    fn project(&self, row: &Value) -> Value {
        if self.columns.trim() == "*" {
            return row.clone();
        }
        let mut out = Map::new();
        for column in self.columns.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            out.insert(
                column.to_string(),
                row.get(column).cloned().unwrap_or(Value::Null),
            );
        }
        Value::Object(out)
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
