//! Record model for exported data
//!
//! Records come back from the org as open JSON objects. They are converted to
//! a [`Record`]: an `attributes` block plus an ordered map of typed
//! [`FieldValue`]s, so the rewrite and prune passes can match on value kinds
//! instead of poking at raw JSON.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Prefix marking a symbolic forward reference in a field value
pub const REF_PREFIX: &str = "@ref";

/// Prefix of a record's own `referenceId`
pub const REFERENCE_ID_PREFIX: &str = "ref";

/// Primary key field name
pub const ID_FIELD: &str = "Id";

/// A symbolic reference to another record, resolved by the importer
///
/// Holds the raw source id; serialized as `@ref<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefToken(String);

impl RefToken {
    pub fn new(id: impl Into<String>) -> Self {
        RefToken(id.into())
    }

    /// Parse a serialized `@ref<id>` token
    pub fn parse(value: &str) -> Option<Self> {
        value
            .strip_prefix(REF_PREFIX)
            .filter(|id| !id.is_empty())
            .map(|id| RefToken(id.to_string()))
    }

    /// The source id embedded in the token
    pub fn id(&self) -> &str {
        &self.0
    }

    /// The `referenceId` the record with this id carries
    pub fn reference_id(&self) -> String {
        format!("{}{}", REFERENCE_ID_PREFIX, self.0)
    }
}

impl fmt::Display for RefToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", REF_PREFIX, self.0)
    }
}

/// A field value with its kind made explicit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Reference(RefToken),
    /// Compound values (addresses, geolocations, nested query results)
    Structured(Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&RefToken> {
        match self {
            FieldValue::Reference(token) => Some(token),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => Value::Number(n.clone()),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Reference(token) => Value::String(token.to_string()),
            FieldValue::Structured(v) => v.clone(),
        }
    }

    /// Read a value from a written data file, where `@ref` strings are tokens
    pub fn from_json(json: Value) -> Self {
        match json {
            Value::String(s) => match RefToken::parse(&s) {
                Some(token) => FieldValue::Reference(token),
                None => FieldValue::Text(s),
            },
            other => FieldValue::from_source(other),
        }
    }

    /// Read a value returned by the org. Strings are always text here; only
    /// the rewriter issues references.
    pub fn from_source(json: Value) -> Self {
        match json {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::Text(s),
            other @ (Value::Array(_) | Value::Object(_)) => FieldValue::Structured(other),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::from_json(value)
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        value.to_json()
    }
}

/// The reserved `attributes` block of a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAttributes {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

/// One exported record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<RecordAttributes>,
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Convert a raw query record
    pub fn from_source(mut raw: Map<String, Value>) -> Self {
        let attributes = raw
            .remove("attributes")
            .and_then(|a| serde_json::from_value::<RecordAttributes>(a).ok());

        let fields = raw
            .into_iter()
            .map(|(name, value)| (name, FieldValue::from_source(value)))
            .collect();

        Record { attributes, fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    /// Remove a field, keeping the order of the others
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.shift_remove(field)
    }

    /// The source primary key, while it has not been rewritten yet
    pub fn source_id(&self) -> Option<&str> {
        self.get(ID_FIELD).and_then(FieldValue::as_text)
    }

    #[cfg(test)]
    pub fn reference_id(&self) -> Option<&str> {
        self.attributes
            .as_ref()
            .and_then(|a| a.reference_id.as_deref())
    }

    /// Drop null-valued fields; returns how many were removed
    pub fn strip_nulls(&mut self) -> usize {
        let before = self.fields.len();
        self.fields.retain(|_, value| !value.is_null());
        before - self.fields.len()
    }

    /// Symbolic references held by this record, with their field names
    pub fn references(&self) -> impl Iterator<Item = (&str, &RefToken)> {
        self.fields
            .iter()
            .filter_map(|(name, value)| value.as_reference().map(|t| (name.as_str(), t)))
    }
}

/// The records exported for one object, in the data file layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet {
    pub total_size: u64,
    #[serde(default = "default_done")]
    pub done: bool,
    pub records: Vec<Record>,
}

fn default_done() -> bool {
    true
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            total_size: records.len() as u64,
            done: true,
            records,
        }
    }

    /// Build from raw query records, stripping null fields
    pub fn from_query(raw: Vec<Map<String, Value>>) -> Self {
        let records = raw
            .into_iter()
            .map(|r| {
                let mut record = Record::from_source(r);
                record.strip_nulls();
                record
            })
            .collect();
        Self::new(records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Source ids of the records, in order
    pub fn source_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.source_id().map(str::to_string))
            .collect()
    }

    /// Append records whose id is not present yet; the first-seen record wins.
    /// Returns the ids of the records that were added.
    pub fn merge(&mut self, incoming: RecordSet) -> Vec<String> {
        let mut seen: HashSet<String> = self.source_ids().into_iter().collect();
        let mut added = Vec::new();

        for record in incoming.records {
            match record.source_id() {
                Some(id) if seen.contains(id) => continue,
                Some(id) => {
                    seen.insert(id.to_string());
                    added.push(id.to_string());
                }
                None => {}
            }
            self.records.push(record);
        }

        self.sync_total();
        added
    }

    /// Keep `total_size` equal to the number of records held
    pub fn sync_total(&mut self) {
        self.total_size = self.records.len() as u64;
    }
}

/// Exported records keyed by object name, in fetch order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    sets: IndexMap<String, RecordSet>,
}

impl DataSet {
    pub fn get(&self, object: &str) -> Option<&RecordSet> {
        self.sets.get(object)
    }

    pub fn contains(&self, object: &str) -> bool {
        self.sets.contains_key(object)
    }

    /// Merge records into the set for `object`, creating it if needed.
    /// Returns the ids of the records actually added.
    pub fn merge(&mut self, object: &str, incoming: RecordSet) -> Vec<String> {
        match self.sets.get_mut(object) {
            Some(existing) => existing.merge(incoming),
            None => {
                let mut set = RecordSet::default();
                let added = set.merge(incoming);
                self.sets.insert(object.to_string(), set);
                added
            }
        }
    }

    pub fn remove(&mut self, object: &str) -> Option<RecordSet> {
        self.sets.shift_remove(object)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &RecordSet) -> bool) {
        self.sets.retain(|name, set| keep(name, set));
    }

    #[cfg(test)]
    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordSet)> {
        self.sets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut RecordSet)> {
        self.sets.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.sets.values().map(RecordSet::len).sum()
    }
}
