//! Id to symbolic reference rewriting
//!
//! Runs once per record set. Every text value shaped like an org id becomes a
//! `@ref<id>` token, the record's own `Id` moves into
//! `attributes.referenceId`, and `OwnerId` is removed outright.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::record::{FieldValue, ID_FIELD, RecordSet, RefToken};

/// Owner lookups point outside the sampled graph and are never exported
pub const OWNER_FIELD: &str = "OwnerId";

/// 15 character case-sensitive or 18 character case-safe ids
static ID_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{15}$|^[a-zA-Z0-9]{18}$").unwrap());

pub fn looks_like_id(value: &str) -> bool {
    ID_SHAPE.is_match(value)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Records without an `attributes` block, dropped before rewriting
    pub dropped_records: usize,
    pub references: usize,
    /// References that reused a token already issued in this set
    pub reused: usize,
    pub owners_removed: usize,
}

impl RewriteStats {
    pub fn add(&mut self, other: RewriteStats) {
        self.dropped_records += other.dropped_records;
        self.references += other.references;
        self.reused += other.reused;
        self.owners_removed += other.owners_removed;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceRewriter;

impl ReferenceRewriter {
    pub fn new() -> Self {
        Self
    }

    /// Drop records that cannot carry a `referenceId`; returns how many
    pub fn drop_unattributed(&self, set: &mut RecordSet) -> usize {
        let before = set.records.len();
        set.records.retain(|r| r.attributes.is_some());
        set.sync_total();
        before - set.records.len()
    }

    /// Rewrite one object's records in place
    pub fn rewrite(&self, set: &mut RecordSet) -> RewriteStats {
        let mut stats = RewriteStats {
            dropped_records: self.drop_unattributed(set),
            ..RewriteStats::default()
        };
        // Scoped to this set; another object's batch issues its own tokens
        let mut issued: HashMap<String, RefToken> = HashMap::new();

        for record in &mut set.records {
            if record.remove(OWNER_FIELD).is_some() {
                stats.owners_removed += 1;
            }

            if let Some(FieldValue::Text(id)) = record.remove(ID_FIELD) {
                if let Some(attributes) = record.attributes.as_mut() {
                    attributes.reference_id = Some(RefToken::new(id).reference_id());
                    attributes.url = None;
                }
            }

            let candidates: Vec<(String, String)> = record
                .fields
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .as_text()
                        .filter(|text| looks_like_id(text))
                        .map(|id| (name.clone(), id.to_string()))
                })
                .collect();

            for (field, id) in candidates {
                let token = match issued.get(&id) {
                    Some(token) => {
                        stats.reused += 1;
                        token.clone()
                    }
                    None => {
                        let token = RefToken::new(id.as_str());
                        issued.insert(id, token.clone());
                        token
                    }
                };
                record.set(field, FieldValue::Reference(token));
                stats.references += 1;
            }
        }

        debug!(
            "Rewrote {} references ({} reused), removed {} owners",
            stats.references, stats.reused, stats.owners_removed
        );
        stats
    }
}
