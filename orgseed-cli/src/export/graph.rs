//! Relationship graph between in-scope objects
//!
//! For every described object this records:
//! - `parent_refs`: its reference fields that target another in-scope object
//! - `child_refs`: child relationships from in-scope, layoutable objects
//!
//! Objects with neither carry no relationship value for sampling and are left
//! out of the map.

use indexmap::IndexMap;
use log::debug;

use super::describe::DescribeMap;
use crate::api::metadata::{ChildRelationship, Field};

/// Outgoing and incoming references of one object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipEntry {
    /// One entry per in-scope target, so polymorphic fields may repeat
    pub parent_refs: Vec<Field>,
    pub child_refs: Vec<ChildRelationship>,
}

impl RelationshipEntry {
    pub fn has_parents(&self) -> bool {
        !self.parent_refs.is_empty()
    }

    pub fn has_children(&self) -> bool {
        !self.child_refs.is_empty()
    }

    pub fn is_orphan(&self) -> bool {
        !self.has_parents() && !self.has_children()
    }
}

/// Object name to relationship entry, in describe order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipMap {
    entries: IndexMap<String, RelationshipEntry>,
}

impl RelationshipMap {
    /// Build the map from a set of describes
    pub fn build(describes: &DescribeMap) -> Self {
        let mut entries = IndexMap::new();

        for (name, schema) in describes {
            let child_refs: Vec<ChildRelationship> = schema
                .child_relationships
                .iter()
                .filter(|rel| {
                    describes
                        .get(&rel.child_sobject)
                        .is_some_and(|child| child.layoutable)
                })
                .cloned()
                .collect();

            let mut parent_refs = Vec::new();
            for field in schema.reference_fields() {
                for target in &field.reference_to {
                    if describes.contains_key(target) {
                        parent_refs.push(field.clone());
                    }
                }
            }

            let entry = RelationshipEntry {
                parent_refs,
                child_refs,
            };
            if entry.is_orphan() {
                debug!("Dropping {}: no in-scope relationships", name);
                continue;
            }
            entries.insert(name.clone(), entry);
        }

        Self { entries }
    }

    pub fn get(&self, object: &str) -> Option<&RelationshipEntry> {
        self.entries.get(object)
    }

    pub fn contains(&self, object: &str) -> bool {
        self.entries.contains_key(object)
    }

    pub fn remove(&mut self, object: &str) -> Option<RelationshipEntry> {
        self.entries.shift_remove(object)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|name, _| keep(name));
    }

    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelationshipEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
