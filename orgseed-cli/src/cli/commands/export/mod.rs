//! `orgseed export`

mod handler;

pub use handler::handle_export_command;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::{ExportConfig, ExportDefaults, parse_object_list};
use crate::export::{OrderStrategyKind, PrunePolicy};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Comma separated object names, e.g. Account,Contact,Case
    #[arg(short = 'o', long = "objects")]
    pub objects: String,

    /// Directory receiving the data files and the plan
    #[arg(short = 't', long = "targetdir")]
    pub target_dir: PathBuf,

    /// Maximum records per query [default: 10]
    #[arg(short = 'm', long = "maxrecords")]
    pub max_records: Option<usize>,

    /// Plan file name, without extension [default: new-data-plan]
    #[arg(short = 'n', long = "planname")]
    pub plan_name: Option<String>,

    /// Also write every describe to <targetdir>/describes
    #[arg(short = 's', long = "savedescribes")]
    pub save_describes: bool,

    /// Include objects referenced by the requested ones
    #[arg(short = 'p', long = "spiderreferences")]
    pub spider_references: bool,

    /// Drop records with unresolvable references instead of just the field
    #[arg(short = 'e', long = "enforcereferences")]
    pub enforce_references: bool,

    /// Keep the requested object order in the plan
    #[arg(short = 'b', long = "preserveobjectorder")]
    pub preserve_object_order: bool,

    /// Load order strategy
    #[arg(long, value_enum)]
    pub strategy: Option<OrderStrategyKind>,

    /// Directory holding cached describe results
    #[arg(long = "cache-dir")]
    pub cache_dir: Option<PathBuf>,

    /// REST API version, e.g. 60.0
    #[arg(long = "api-version")]
    pub api_version: Option<String>,
}

impl ExportArgs {
    /// Merge the flags over the settings file defaults
    pub fn into_config(self, defaults: &ExportDefaults) -> Result<ExportConfig> {
        let objects = parse_object_list(&self.objects);
        if objects.is_empty() {
            anyhow::bail!("No objects given; pass a comma separated list with --objects");
        }

        let mut config = ExportConfig::with_defaults(objects, self.target_dir, defaults);
        if let Some(max) = self.max_records {
            config.max_records = max;
        }
        if let Some(name) = self.plan_name {
            config.plan_name = name;
        }
        if let Some(strategy) = self.strategy {
            config.order_strategy = strategy;
        }
        if let Some(dir) = self.cache_dir {
            config.describe_cache_dir = dir;
        }
        config.save_describes = self.save_describes;
        config.spider_references = self.spider_references;
        config.preserve_object_order = self.preserve_object_order;
        config.prune_policy = if self.enforce_references {
            PrunePolicy::Strict
        } else {
            PrunePolicy::Lenient
        };

        Ok(config)
    }
}
