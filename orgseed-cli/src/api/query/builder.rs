//! Fluent SOQL query builder

use super::query::{Query, QueryKind, WhereIn};

/// Fluent builder producing a reusable [`Query`]
///
/// ```ignore
/// let query = QueryBuilder::new("Contact")
///     .select(&["LastName", "AccountId"])
///     .where_in("AccountId", &ids)
///     .limit(10)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    object: String,
    fields: Vec<String>,
    where_in: Option<WhereIn>,
    limit: Option<usize>,
    count_only: bool,
}

impl QueryBuilder {
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            fields: Vec::new(),
            where_in: None,
            limit: None,
            count_only: false,
        }
    }

    /// Builder for a `SELECT COUNT()` query
    pub fn count(object: impl Into<String>) -> Self {
        let mut builder = Self::new(object);
        builder.count_only = true;
        builder
    }

    /// Add fields to the projection, skipping ones already selected
    pub fn select(mut self, fields: &[&str]) -> Self {
        for field in fields {
            if !self.fields.iter().any(|f| f == field) {
                self.fields.push(field.to_string());
            }
        }
        self
    }

    /// Restrict to records whose `field` is one of `values`
    pub fn where_in<S: AsRef<str>>(mut self, field: &str, values: &[S]) -> Self {
        self.where_in = Some(WhereIn {
            field: field.to_string(),
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> Query {
        let kind = if self.count_only {
            QueryKind::Count
        } else {
            QueryKind::Select(self.fields)
        };

        Query {
            object: self.object,
            kind,
            where_in: self.where_in,
            limit: self.limit,
        }
    }
}
