//! Seed files for self-referencing objects
//!
//! An object whose records point at each other (a reporting hierarchy, say)
//! cannot be loaded in one pass: the first record already references a record
//! that does not exist yet. Seeding copies a few anchor records into
//! `<Object>_seed.json`, strips the self reference from all but the first of
//! them, and loads that file just before the full one.

use log::{info, warn};
use std::path::{Path, PathBuf};

use super::{read_plan, require_data_file};
use crate::config::plan_file_name;
use crate::export::ExportError;
use crate::export::output::{read_json_file, write_json_file};
use crate::export::plan::data_file_name;
use crate::export::record::{Record, RecordSet};

/// Which records to copy into the seed file
#[derive(Debug, Clone)]
pub struct SeedRequest {
    pub object: String,
    /// Field compared against `match_values`
    pub match_field: String,
    /// One record is taken per value, in this order
    pub match_values: Vec<String>,
    /// Removed from every seed record after the first
    pub strip_field: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub seed_file: PathBuf,
    pub records: usize,
}

/// Write the seed file for `request.object` and add it to the plan
pub fn seed_plan(
    target_dir: &Path,
    plan_name: &str,
    request: &SeedRequest,
) -> Result<SeedOutcome, ExportError> {
    let plan_path = target_dir.join(plan_file_name(plan_name));
    let mut plan = read_plan(&plan_path)?;

    let index = plan
        .iter()
        .position(|e| e.sobject == request.object && !is_seed_entry(&e.files))
        .ok_or_else(|| ExportError::MissingPlanEntry {
            object: request.object.clone(),
            plan: plan_path.clone(),
        })?;

    let data_file = plan[index]
        .files
        .first()
        .cloned()
        .unwrap_or_else(|| data_file_name(&request.object));
    let data_path = target_dir.join(&data_file);
    require_data_file(&data_path)?;
    let data: RecordSet = read_json_file(&data_path)?;

    let records = select_seed_records(&data, request);
    let seed_name = seed_file_name(&data_file);
    let seed_path = target_dir.join(&seed_name);
    write_json_file(&seed_path, &RecordSet::new(records.clone()))?;

    let mut seed_entry = plan[index].clone();
    seed_entry.files = vec![seed_name.clone()];
    match index
        .checked_sub(1)
        .filter(|prev| plan[*prev].sobject == request.object && plan[*prev].files == seed_entry.files)
    {
        // Already seeded by an earlier run
        Some(prev) => plan[prev] = seed_entry,
        None => plan.insert(index, seed_entry),
    }
    write_json_file(&plan_path, &plan)?;

    info!(
        "Seeded {} with {} records in {}",
        request.object,
        records.len(),
        seed_name
    );
    Ok(SeedOutcome {
        seed_file: seed_path,
        records: records.len(),
    })
}

/// `Account.json` -> `Account_seed.json`
pub fn seed_file_name(data_file: &str) -> String {
    let stem = data_file.split('.').next().unwrap_or(data_file);
    format!("{}_seed.json", stem)
}

fn is_seed_entry(files: &[String]) -> bool {
    files.iter().any(|f| f.ends_with("_seed.json"))
}

fn select_seed_records(data: &RecordSet, request: &SeedRequest) -> Vec<Record> {
    let mut selected: Vec<Record> = Vec::new();

    for value in &request.match_values {
        let found = data.records.iter().find(|r| {
            r.get(&request.match_field)
                .and_then(|v| v.as_text())
                .is_some_and(|text| text == value)
        });
        match found {
            Some(record) => selected.push(record.clone()),
            None => warn!(
                "No {} record with {} = {}",
                request.object, request.match_field, value
            ),
        }
    }

    if let Some(strip) = &request.strip_field {
        for record in selected.iter_mut().skip(1) {
            record.remove(strip);
        }
    }

    selected
}
