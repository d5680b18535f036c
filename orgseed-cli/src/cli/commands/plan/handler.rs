//! Plan post-processing handlers

use anyhow::{Context, Result};
use colored::*;

use super::{SeedArgs, SplitArgs};
use crate::config::Settings;
use crate::plan_tools::{seed_plan, split_plan};

pub fn handle_split_command(args: SplitArgs, settings: &Settings) -> Result<()> {
    let chunk_size = args.chunk_size.unwrap_or(settings.export.split_chunk_size);

    let report = split_plan(&args.plan, chunk_size)
        .with_context(|| format!("Failed to split files of {}", args.plan.display()))?;

    if report.files_split == 0 {
        println!("No data file has more than {} records", chunk_size);
    } else {
        println!(
            "{} {} files into {} chunks",
            "Split".green().bold(),
            report.files_split,
            report.chunks_written
        );
    }
    Ok(())
}

pub fn handle_seed_command(args: SeedArgs, settings: &Settings) -> Result<()> {
    let plan_name = args
        .plan_name
        .clone()
        .unwrap_or_else(|| settings.export.plan_name.clone());
    let request = args.request();

    println!(
        "Adding a seed file for {} to the {} plan in {}",
        request.object.cyan(),
        plan_name,
        args.target_dir.display()
    );

    let outcome = seed_plan(&args.target_dir, &plan_name, &request)
        .with_context(|| format!("Failed to seed {}", request.object))?;

    println!(
        "{} {} records to {}",
        "Wrote".green().bold(),
        outcome.records,
        outcome.seed_file.display()
    );
    Ok(())
}
