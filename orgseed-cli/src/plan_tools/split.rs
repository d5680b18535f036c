//! Split oversized data files
//!
//! The tree importer rejects files with more than 200 records. Every data file
//! over the chunk size is rewritten as `<stem><offset>.json` chunks holding
//! only a `records` array, and the plan entry lists the chunks instead.

use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{read_plan, require_data_file};
use crate::export::ExportError;
use crate::export::output::{read_json_file, write_json_file};
use crate::export::record::Record;

/// Record limit of the tree importer
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// A data file reduced to its records; extra keys are ignored on read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkFile {
    #[serde(default)]
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub files_split: usize,
    pub chunks_written: usize,
}

/// Split every oversized data file referenced by the plan at `plan_path`
pub fn split_plan(plan_path: &Path, chunk_size: usize) -> Result<SplitReport, ExportError> {
    let chunk_size = chunk_size.max(1);
    let mut plan = read_plan(plan_path)?;
    let dir = plan_path.parent().unwrap_or(Path::new("."));
    let mut report = SplitReport::default();

    for entry in &mut plan {
        let mut files = Vec::with_capacity(entry.files.len());

        for file in &entry.files {
            let path = dir.join(file);
            require_data_file(&path)?;
            let data: ChunkFile = read_json_file(&path)?;

            if data.records.len() <= chunk_size {
                files.push(file.clone());
                continue;
            }

            let stem = file.split('.').next().unwrap_or(file);
            for (index, chunk) in data.records.chunks(chunk_size).enumerate() {
                let name = format!("{}{}.json", stem, index * chunk_size);
                let chunk = ChunkFile {
                    records: chunk.to_vec(),
                };
                write_json_file(&dir.join(&name), &chunk)?;
                files.push(name);
                report.chunks_written += 1;
            }
            info!("Split {} ({} records)", file, data.records.len());
            report.files_split += 1;
        }

        entry.files = files;
    }

    write_json_file(plan_path, &plan)?;
    Ok(report)
}
