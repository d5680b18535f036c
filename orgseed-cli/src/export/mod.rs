//! Seed data export pipeline
//!
//! describe -> relationship graph -> count pre-check -> plan -> fetch ->
//! rewrite -> prune -> write. Every phase takes the maps it needs by value or
//! reference and hands them on; nothing is kept in shared state.

pub mod describe;
pub mod error;
pub mod graph;
pub mod ids;
pub mod output;
pub mod plan;
pub mod prune;
pub mod record;
pub mod rewrite;
pub mod sample;

#[cfg(test)]
pub mod testing;

pub use error::ExportError;
pub use plan::{OrderStrategyKind, PlanEntry};
pub use prune::{PrunePolicy, PruneReport};
pub use rewrite::RewriteStats;

use log::{debug, info, warn};
use std::path::PathBuf;

use describe::{DescribeMap, SchemaDescriber};
use graph::RelationshipMap;
use plan::LoadOrderPlanner;
use record::DataSet;
use rewrite::ReferenceRewriter;
use sample::SampleQueryEngine;

use crate::api::OrgApi;
use crate::config::ExportConfig;

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub objects_requested: usize,
    pub objects_described: usize,
    pub schema_failures: usize,
    pub empty_objects: Vec<String>,
    /// Exported objects the declared order left out of the plan
    pub unplanned_objects: Vec<String>,
    pub query_failures: usize,
    pub objects_exported: usize,
    pub records_exported: usize,
    pub rewrite: RewriteStats,
    pub prune: PruneReport,
    pub plan_entries: usize,
}

/// Everything a run produced, before it is written out
#[derive(Debug)]
pub struct ExportOutcome {
    pub data: DataSet,
    pub plan: Vec<PlanEntry>,
    /// Every layoutable object described, including ones dropped later
    pub describes: DescribeMap,
    pub summary: ExportSummary,
}

/// Files written by [`Exporter::write`]
#[derive(Debug, Clone, Default)]
pub struct WrittenFiles {
    pub data_files: Vec<PathBuf>,
    pub plan_file: PathBuf,
    pub describe_dumps: usize,
}

/// Runs the export pipeline for one [`ExportConfig`]
pub struct Exporter<'a> {
    api: &'a dyn OrgApi,
    config: ExportConfig,
    concurrency: usize,
}

impl<'a> Exporter<'a> {
    pub fn new(api: &'a dyn OrgApi, config: ExportConfig) -> Self {
        Self {
            api,
            config,
            concurrency: 1,
        }
    }

    /// Bound for concurrently running count queries
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Run every phase up to, but not including, writing files
    pub async fn run(&self) -> ExportOutcome {
        let config = &self.config;
        let mut summary = ExportSummary {
            objects_requested: config.objects.len(),
            ..ExportSummary::default()
        };

        info!("Schema discovery: {} objects", config.objects.len());
        let described = SchemaDescriber::new(self.api, &config.describe_cache_dir)
            .describe_all(&config.objects, config.spider_references)
            .await;
        summary.objects_described = described.describes.len();
        summary.schema_failures = described.failures.len();

        let all_describes = described.describes;
        let mut describes = all_describes.clone();
        let mut map = RelationshipMap::build(&describes);
        if map.is_empty() {
            warn!("None of the described objects are related to each other");
        } else {
            info!("Relationship map: {} objects", map.len());
        }

        let engine = SampleQueryEngine::new(self.api, config.max_records)
            .with_concurrency(self.concurrency);

        info!("Query phase: checking record counts");
        summary.empty_objects = engine.prune_empty_objects(&mut describes, &mut map).await;

        let planner = LoadOrderPlanner::new(config.order_strategy);
        let plan = planner.entries(&map);
        info!("Planned {} objects ({} order)", plan.len(), config.order_strategy);

        info!("Query phase: fetching samples");
        let fetched = engine.fetch_all(&mut describes, &mut map, &plan).await;
        summary.query_failures = fetched.failures.len();
        let mut data = fetched.data;

        let rewriter = ReferenceRewriter::new();
        for (_, set) in data.iter_mut() {
            summary.rewrite.add(rewriter.rewrite(set));
        }

        let index = fetched.ids.freeze();
        if index.is_empty() {
            warn!("No records were fetched");
        } else {
            debug!("{} distinct ids fetched", index.len());
        }
        summary.prune = prune::prune(&mut data, &index, config.prune_policy);

        data.retain(|_, set| !set.is_empty());
        let mut plan: Vec<PlanEntry> = plan
            .into_iter()
            .filter(|entry| data.contains(&entry.sobject))
            .collect();
        if config.preserve_object_order {
            plan = plan::apply_declared_order(plan, &config.objects);
            summary.unplanned_objects = data
                .iter()
                .map(|(object, _)| object.to_string())
                .filter(|object| !plan.iter().any(|e| &e.sobject == object))
                .collect();
            if !summary.unplanned_objects.is_empty() {
                warn!(
                    "Not in the requested object list, so left out of the plan: {} (data files are still written)",
                    summary.unplanned_objects.join(", ")
                );
            }
        }
        if data.is_empty() {
            warn!("Nothing left to export");
        }

        summary.objects_exported = data.len();
        summary.records_exported = data.record_count();
        summary.plan_entries = plan.len();

        ExportOutcome {
            data,
            plan,
            describes: all_describes,
            summary,
        }
    }

    /// Save phase: data files, the plan and optional describe dumps
    pub fn write(&self, outcome: &ExportOutcome) -> Result<WrittenFiles, ExportError> {
        let dir = &self.config.target_dir;
        info!("Save phase: writing to {}", dir.display());

        let data_files = output::write_dataset(dir, &outcome.data)?;
        let plan_file = output::write_plan(dir, &self.config.plan_file_name(), &outcome.plan)?;
        let describe_dumps = if self.config.save_describes {
            output::write_describes(dir, &outcome.describes)?
        } else {
            0
        };

        Ok(WrittenFiles {
            data_files,
            plan_file,
            describe_dumps,
        })
    }

    pub async fn export(&self) -> Result<(ExportOutcome, WrittenFiles), ExportError> {
        let outcome = self.run().await;
        let written = self.write(&outcome)?;
        Ok((outcome, written))
    }
}
