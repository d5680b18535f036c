//! SObject metadata: describe models and parsing

pub mod models;

pub use models::{ChildRelationship, Field, ObjectSchema};

use anyhow::{Context, Result};

/// Parse a raw describe response body into an [`ObjectSchema`]
pub fn parse_describe(body: serde_json::Value) -> Result<ObjectSchema> {
    let name = body
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("<unknown>")
        .to_string();
    serde_json::from_value(body).with_context(|| format!("Failed to parse describe for {}", name))
}
