//! JSON file persistence for data files, plans and describe dumps

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use super::describe::DescribeMap;
use super::error::ExportError;
use super::plan::{PlanEntry, data_file_name};
use super::record::DataSet;

/// Sub-directory of the target dir receiving describe dumps
pub const DESCRIBES_DIR: &str = "describes";

/// Write `value` as JSON indented with four spaces
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ExportError::serialization(path, e))?;

    fs::write(path, buffer).map_err(|e| ExportError::io(path, e))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, ExportError> {
    let content = fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| ExportError::serialization(path, e))
}

pub fn ensure_dir(dir: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))
}

/// Write one `<Object>.json` per record set
pub fn write_dataset(dir: &Path, data: &DataSet) -> Result<Vec<PathBuf>, ExportError> {
    ensure_dir(dir)?;
    data.iter()
        .map(|(object, set)| {
            let path = dir.join(data_file_name(object));
            write_json_file(&path, set)?;
            Ok(path)
        })
        .collect()
}

pub fn write_plan(dir: &Path, file_name: &str, plan: &[PlanEntry]) -> Result<PathBuf, ExportError> {
    ensure_dir(dir)?;
    let path = dir.join(file_name);
    write_json_file(&path, plan)?;
    Ok(path)
}

/// Dump every describe to `<dir>/describes/<Object>.json`
pub fn write_describes(dir: &Path, describes: &DescribeMap) -> Result<usize, ExportError> {
    let target = dir.join(DESCRIBES_DIR);
    ensure_dir(&target)?;
    for (object, schema) in describes {
        write_json_file(&target.join(format!("{}.json", object)), schema)?;
    }
    Ok(describes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_json_is_indented_with_four_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");

        write_json_file(&path, &json!([{ "sobject": "Account" }])).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[\n    {\n        \"sobject\": \"Account\"\n    }\n]");
        let back: Value = read_json_file(&path).unwrap();
        assert_eq!(back[0]["sobject"], "Account");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = read_json_file::<Value>(&dir.path().join("nope.json")).unwrap_err();

        assert!(matches!(err, ExportError::Io { ref source, .. } if source.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_write_plan_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out");

        let path = write_plan(&target, "new-data-plan.json", &[PlanEntry::new("Account")]).unwrap();

        assert!(path.exists());
        let plan: Vec<PlanEntry> = read_json_file(&path).unwrap();
        assert_eq!(plan[0].files, vec!["Account.json"]);
    }
}
