//! Dangling reference pruning
//!
//! A reference dangles when the id inside its token was never fetched in this
//! run. The check is a single forward pass against the frozen id index: a
//! record removed here can still be the target of a reference that was
//! already accepted.

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use super::ids::FrozenIdIndex;
use super::record::DataSet;

/// What to drop when a reference dangles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PrunePolicy {
    /// Drop the whole record
    Strict,
    /// Drop only the offending field
    #[default]
    Lenient,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub dangling: usize,
    pub records_removed: usize,
    pub fields_removed: usize,
}

/// Remove dangling references from every record set according to `policy`
pub fn prune(data: &mut DataSet, index: &FrozenIdIndex, policy: PrunePolicy) -> PruneReport {
    let mut report = PruneReport::default();

    for (object, set) in data.iter_mut() {
        set.records.retain_mut(|record| {
            let dangling: Vec<String> = record
                .references()
                .filter(|(_, token)| !index.contains(token.id()))
                .map(|(field, token)| {
                    debug!("{}.{} points at unknown record {}", object, field, token.id());
                    field.to_string()
                })
                .collect();

            if dangling.is_empty() {
                return true;
            }
            report.dangling += dangling.len();

            match policy {
                PrunePolicy::Strict => {
                    report.records_removed += 1;
                    false
                }
                PrunePolicy::Lenient => {
                    for field in &dangling {
                        record.remove(field);
                    }
                    report.fields_removed += dangling.len();
                    true
                }
            }
        });
        set.sync_total();
    }

    report
}
