//! Post-processing of an exported plan directory
//!
//! - [`split`]: break large data files into chunks the importer accepts
//! - [`seed`]: anchor a self-referencing object with a small seed file loaded
//!   ahead of the full data file

pub mod seed;
pub mod split;

pub use seed::{SeedRequest, seed_plan};
pub use split::{DEFAULT_CHUNK_SIZE, split_plan};

use std::path::Path;

use crate::export::ExportError;
use crate::export::output;
use crate::export::plan::PlanEntry;

fn read_plan(path: &Path) -> Result<Vec<PlanEntry>, ExportError> {
    if !path.exists() {
        return Err(ExportError::MissingPlanFile {
            path: path.to_path_buf(),
        });
    }
    output::read_json_file(path)
}

fn require_data_file(path: &Path) -> Result<(), ExportError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ExportError::MissingDataFile {
            path: path.to_path_buf(),
        })
    }
}
