//! In-memory org used by the pipeline tests

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::api::metadata::models::FieldType;
use crate::api::metadata::{ChildRelationship, Field, ObjectSchema};
use crate::api::query::query::QueryKind;
use crate::api::query::{Query, QueryResult};
use crate::api::OrgApi;

pub fn text_field(name: &str) -> Field {
    Field {
        name: name.to_string(),
        field_type: FieldType::String,
        createable: true,
        reference_to: Vec::new(),
        relationship_name: None,
    }
}

pub fn id_field() -> Field {
    Field {
        name: "Id".to_string(),
        field_type: FieldType::Id,
        createable: false,
        reference_to: Vec::new(),
        relationship_name: None,
    }
}

pub fn ref_field(name: &str, targets: &[&str]) -> Field {
    Field {
        name: name.to_string(),
        field_type: FieldType::Reference,
        createable: true,
        reference_to: targets.iter().map(|t| t.to_string()).collect(),
        relationship_name: Some(name.trim_end_matches("Id").to_string()),
    }
}

pub fn child(child_sobject: &str, field: &str, relationship_name: Option<&str>) -> ChildRelationship {
    ChildRelationship {
        child_sobject: child_sobject.to_string(),
        field: field.to_string(),
        relationship_name: relationship_name.map(str::to_string),
    }
}

pub fn schema(name: &str, fields: Vec<Field>, children: Vec<ChildRelationship>) -> ObjectSchema {
    let mut all = vec![id_field()];
    all.extend(fields);
    ObjectSchema {
        name: name.to_string(),
        layoutable: true,
        fields: all,
        child_relationships: children,
    }
}

/// Fake org answering describe, query and count from fixed data
#[derive(Default)]
pub struct FakeOrg {
    schemas: HashMap<String, ObjectSchema>,
    records: HashMap<String, Vec<Map<String, Value>>>,
    failing: HashSet<String>,
    failing_counts: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeOrg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: ObjectSchema) -> Self {
        self.schemas.insert(schema.name.clone(), schema);
        self
    }

    /// Records for `object`; each gets an `attributes.type` block
    pub fn with_records(mut self, object: &str, records: Vec<Value>) -> Self {
        let rows = records
            .into_iter()
            .map(|r| {
                let mut row = Map::new();
                row.insert(
                    "attributes".to_string(),
                    serde_json::json!({
                        "type": object,
                        "url": format!("/services/data/v60.0/sobjects/{}/x", object)
                    }),
                );
                if let Value::Object(fields) = r {
                    row.extend(fields);
                }
                row
            })
            .collect();
        self.records.insert(object.to_string(), rows);
        self
    }

    /// Make every select query against `object` fail
    pub fn failing_queries(mut self, object: &str) -> Self {
        self.failing.insert(object.to_string());
        self
    }

    /// Make every count query against `object` fail
    pub fn failing_counts(mut self, object: &str) -> Self {
        self.failing_counts.insert(object.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl OrgApi for FakeOrg {
    async fn describe(&self, object: &str) -> Result<ObjectSchema> {
        self.record(format!("describe {}", object));
        self.schemas
            .get(object)
            .cloned()
            .ok_or_else(|| anyhow!("INVALID_TYPE: sObject type '{}' is not supported", object))
    }

    async fn query(&self, query: &Query) -> Result<QueryResult> {
        self.record(format!("query {}", query.to_soql()));
        if self.failing.contains(&query.object) {
            bail!("MALFORMED_QUERY on {}", query.object);
        }
        if !matches!(query.kind, QueryKind::Select(_)) {
            bail!("expected a select query");
        }

        let rows = self.records.get(&query.object).cloned().unwrap_or_default();
        let mut matched: Vec<Map<String, Value>> = rows
            .into_iter()
            .filter(|row| match &query.where_in {
                Some(clause) => row
                    .get(&clause.field)
                    .and_then(Value::as_str)
                    .is_some_and(|v| clause.values.iter().any(|x| x == v)),
                None => true,
            })
            .collect();
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(QueryResult {
            total_size: matched.len() as u64,
            done: true,
            records: matched,
            next_records_url: None,
        })
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        self.record(format!("count {}", query.object));
        if self.failing_counts.contains(&query.object) {
            bail!("REQUEST_LIMIT_EXCEEDED counting {}", query.object);
        }
        Ok(self
            .records
            .get(&query.object)
            .map(|rows| rows.len() as u64)
            .unwrap_or(0))
    }
}
