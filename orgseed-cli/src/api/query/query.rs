//! Reusable SOQL query representation

use std::fmt;

/// A built query, rendered to SOQL text on demand
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub object: String,
    pub kind: QueryKind,
    pub where_in: Option<WhereIn>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryKind {
    Select(Vec<String>),
    Count,
}

/// `WHERE field IN (...)` restriction
#[derive(Debug, Clone, PartialEq)]
pub struct WhereIn {
    pub field: String,
    pub values: Vec<String>,
}

impl Query {
    pub fn is_count(&self) -> bool {
        matches!(self.kind, QueryKind::Count)
    }

    pub fn to_soql(&self) -> String {
        let mut soql = match &self.kind {
            QueryKind::Select(fields) => format!("SELECT {} FROM {}", fields.join(","), self.object),
            QueryKind::Count => format!("SELECT COUNT() FROM {}", self.object),
        };

        if let Some(clause) = &self.where_in {
            let values: Vec<String> = clause
                .values
                .iter()
                .map(|v| format!("'{}'", escape_literal(v)))
                .collect();
            soql.push_str(&format!(" WHERE {} IN ({})", clause.field, values.join(",")));
        }

        if let Some(limit) = self.limit {
            soql.push_str(&format!(" LIMIT {}", limit));
        }

        soql
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_soql())
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
