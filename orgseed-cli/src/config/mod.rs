//! Configuration: settings file defaults and per-run export options

pub mod export;
pub mod settings;

pub use export::{ExportConfig, parse_object_list, plan_file_name};
pub use settings::{ApiSettings, ExportDefaults, Settings};
