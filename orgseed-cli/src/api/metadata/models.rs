//! SObject describe models

use serde::{Deserialize, Serialize};

/// Field metadata from an SObject describe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub createable: bool,
    /// Target objects for reference fields; more than one for polymorphic lookups
    #[serde(default)]
    pub reference_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_name: Option<String>,
}

impl Field {
    pub fn is_reference(&self) -> bool {
        matches!(self.field_type, FieldType::Reference)
    }

    /// Check whether any reference target is `object`
    pub fn references(&self, object: &str) -> bool {
        self.reference_to.iter().any(|t| t == object)
    }
}

/// Field data types reported by describe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Id,
    Reference,
    String,
    TextArea,
    Boolean,
    Int,
    Double,
    Currency,
    Percent,
    Date,
    DateTime,
    Picklist,
    MultiPicklist,
    Email,
    Phone,
    Url,
    Other(String),
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "id" => FieldType::Id,
            "reference" => FieldType::Reference,
            "string" => FieldType::String,
            "textarea" => FieldType::TextArea,
            "boolean" => FieldType::Boolean,
            "int" => FieldType::Int,
            "double" => FieldType::Double,
            "currency" => FieldType::Currency,
            "percent" => FieldType::Percent,
            "date" => FieldType::Date,
            "datetime" => FieldType::DateTime,
            "picklist" => FieldType::Picklist,
            "multipicklist" => FieldType::MultiPicklist,
            "email" => FieldType::Email,
            "phone" => FieldType::Phone,
            "url" => FieldType::Url,
            _ => FieldType::Other(value),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Id => "id".to_string(),
            FieldType::Reference => "reference".to_string(),
            FieldType::String => "string".to_string(),
            FieldType::TextArea => "textarea".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Int => "int".to_string(),
            FieldType::Double => "double".to_string(),
            FieldType::Currency => "currency".to_string(),
            FieldType::Percent => "percent".to_string(),
            FieldType::Date => "date".to_string(),
            FieldType::DateTime => "datetime".to_string(),
            FieldType::Picklist => "picklist".to_string(),
            FieldType::MultiPicklist => "multipicklist".to_string(),
            FieldType::Email => "email".to_string(),
            FieldType::Phone => "phone".to_string(),
            FieldType::Url => "url".to_string(),
            FieldType::Other(other) => other,
        }
    }
}

/// A child relationship: another object whose `field` points back at this one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRelationship {
    #[serde(rename = "childSObject")]
    pub child_sobject: String,
    /// Foreign key field on the child object
    pub field: String,
    #[serde(default)]
    pub relationship_name: Option<String>,
}

impl ChildRelationship {
    /// Relationships without a name cannot be traversed by query
    pub fn is_named(&self) -> bool {
        self.relationship_name
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }
}

/// Complete describe result for one object
///
/// Serialized in the same camelCase shape the describe endpoint returns, so a
/// cached file can be read back without a separate format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    pub name: String,
    /// Whether the object has a page layout; non-layoutable objects are skipped
    #[serde(default)]
    pub layoutable: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub child_relationships: Vec<ChildRelationship>,
}

impl ObjectSchema {
    /// Names of every createable field, in describe order
    pub fn createable_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.createable)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Reference fields in describe order
    pub fn reference_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_reference())
    }
}
