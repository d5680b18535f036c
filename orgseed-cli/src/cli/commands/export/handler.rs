//! Export command handler

use anyhow::{Context, Result};
use colored::*;
use std::time::Instant;

use super::ExportArgs;
use crate::api::{ResilienceConfig, RestClient, Session};
use crate::config::Settings;
use crate::export::{ExportSummary, Exporter, WrittenFiles};

pub async fn handle_export_command(args: ExportArgs, settings: &Settings) -> Result<()> {
    let api_version = args.api_version.clone();
    let config = args.into_config(&settings.export)?;
    let mut session = Session::from_env(&settings.api.version)
        .context("Failed to set up the org session")?;
    // The flag beats SF_API_VERSION
    if let Some(version) = api_version {
        session.api_version = version.trim_start_matches('v').to_string();
    }
    let resilience = ResilienceConfig::from_settings(&settings.api);
    let client = RestClient::new(session, &resilience)?;

    println!(
        "Exporting {} from {} into {}",
        config.objects.join(", ").cyan(),
        client.session().instance_url.dimmed(),
        config.target_dir.display().to_string().cyan()
    );

    let start = Instant::now();
    let target = config.target_dir.clone();
    let exporter = Exporter::new(&client, config)
        .with_concurrency(resilience.concurrency_limit());
    let (outcome, written) = exporter
        .export()
        .await
        .with_context(|| format!("Failed to write export to {}", target.display()))?;

    print_summary(&outcome.summary, &written);
    println!(
        "{} in {:.1}s",
        "Export finished".green().bold(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn print_summary(summary: &ExportSummary, written: &WrittenFiles) {
    println!();
    println!("{}", "Summary".bold());
    println!(
        "  Objects:   {} requested, {} described, {} exported",
        summary.objects_requested, summary.objects_described, summary.objects_exported
    );
    println!("  Records:   {}", summary.records_exported.to_string().cyan());
    println!(
        "  Rewritten: {} references, {} owner fields removed",
        summary.rewrite.references, summary.rewrite.owners_removed
    );
    if summary.prune.dangling > 0 {
        println!(
            "  Pruned:    {} records, {} fields ({} dangling references)",
            summary.prune.records_removed, summary.prune.fields_removed, summary.prune.dangling
        );
    }
    if !summary.empty_objects.is_empty() {
        println!("  Empty:     {}", summary.empty_objects.join(", ").dimmed());
    }
    if summary.schema_failures > 0 || summary.query_failures > 0 {
        println!(
            "  {}",
            format!(
                "{} describe and {} query failures, see the log",
                summary.schema_failures, summary.query_failures
            )
            .yellow()
        );
    }
    println!(
        "  Files:     {} data files, plan with {} entries in {}",
        written.data_files.len(),
        summary.plan_entries,
        written.plan_file.display().to_string().cyan()
    );
    if !summary.unplanned_objects.is_empty() {
        println!(
            "  {}",
            format!(
                "Not in the plan: {}",
                summary.unplanned_objects.join(", ")
            )
            .yellow()
        );
    }
    if written.describe_dumps > 0 {
        println!("  Describes: {} dumped", written.describe_dumps);
    }
}
