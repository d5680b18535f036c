//! `orgseed split` and `orgseed seed`

mod handler;

pub use handler::{handle_seed_command, handle_split_command};

use clap::Args;
use std::path::PathBuf;

use crate::plan_tools::SeedRequest;

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Path to the plan file
    pub plan: PathBuf,

    /// Maximum records per chunk [default: from settings, 200]
    #[arg(short, long)]
    pub chunk_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Directory holding the plan and data files
    #[arg(short = 't', long = "targetdir")]
    pub target_dir: PathBuf,

    /// Plan file name, without extension [default: new-data-plan]
    #[arg(short = 'n', long = "planname")]
    pub plan_name: Option<String>,

    /// Self-referencing object to seed
    #[arg(short = 'o', long = "object")]
    pub object: String,

    /// Field used to pick the seed records
    #[arg(short = 'f', long = "field")]
    pub match_field: String,

    /// Comma separated values of --field; one record is taken per value
    #[arg(short = 'm', long = "values", value_delimiter = ',', required = true)]
    pub match_values: Vec<String>,

    /// Field removed from every seed record after the first
    #[arg(short = 's', long = "strip")]
    pub strip_field: Option<String>,
}

impl SeedArgs {
    pub fn request(&self) -> SeedRequest {
        SeedRequest {
            object: self.object.clone(),
            match_field: self.match_field.clone(),
            match_values: self
                .match_values
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
            strip_field: self.strip_field.clone(),
        }
    }
}
