//! Options for a single export run

use std::path::PathBuf;

use super::settings::ExportDefaults;
use crate::export::plan::OrderStrategyKind;
use crate::export::prune::PrunePolicy;

/// Everything the export pipeline needs to know about one run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Requested objects, in declared order
    pub objects: Vec<String>,
    pub target_dir: PathBuf,
    pub plan_name: String,
    pub max_records: usize,
    /// Dump raw describe results next to the data files
    pub save_describes: bool,
    /// Pull in objects referenced by the requested ones
    pub spider_references: bool,
    pub prune_policy: PrunePolicy,
    /// Use the declared object order for the plan instead of computed topology
    pub preserve_object_order: bool,
    pub order_strategy: OrderStrategyKind,
    pub describe_cache_dir: PathBuf,
}

impl ExportConfig {
    #[cfg(test)]
    pub fn new(objects: Vec<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self::with_defaults(objects, target_dir, &ExportDefaults::default())
    }

    pub fn with_defaults(
        objects: Vec<String>,
        target_dir: impl Into<PathBuf>,
        defaults: &ExportDefaults,
    ) -> Self {
        Self {
            objects,
            target_dir: target_dir.into(),
            plan_name: defaults.plan_name.clone(),
            max_records: defaults.max_records,
            save_describes: false,
            spider_references: false,
            prune_policy: PrunePolicy::default(),
            preserve_object_order: false,
            order_strategy: defaults.order_strategy,
            describe_cache_dir: defaults.describe_cache_dir.clone(),
        }
    }

    /// File name of the plan inside the target directory
    pub fn plan_file_name(&self) -> String {
        plan_file_name(&self.plan_name)
    }
}

/// Plan names are given without extension; tolerate one anyway
pub fn plan_file_name(plan_name: &str) -> String {
    if plan_name.ends_with(".json") {
        plan_name.to_string()
    } else {
        format!("{}.json", plan_name)
    }
}

/// Split a comma separated object list, trimming blanks and dropping repeats
pub fn parse_object_list(input: &str) -> Vec<String> {
    let mut objects: Vec<String> = Vec::new();
    for name in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !objects.iter().any(|o| o == name) {
            objects.push(name.to_string());
        }
    }
    objects
}
