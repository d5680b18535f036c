//! Errors raised by the export pipeline and the plan tools

use std::path::PathBuf;

/// Export and plan post-processing failures
///
/// `SchemaNotFound` and `QueryFailed` are absorbed by the pipeline (logged and
/// counted in the summary); the file-system variants abort the run.
#[derive(Debug)]
pub enum ExportError {
    /// The object could not be described and no cached describe exists
    SchemaNotFound { object: String, reason: String },
    /// A sample or dependent query failed
    QueryFailed { object: String, query: String, reason: String },
    /// Reading or writing a file failed
    Io { path: PathBuf, source: std::io::Error },
    /// A file did not contain the JSON we expected, or could not be encoded
    Serialization { path: PathBuf, source: serde_json::Error },
    /// The plan file named on the command line does not exist
    MissingPlanFile { path: PathBuf },
    /// A data file referenced by the plan does not exist
    MissingDataFile { path: PathBuf },
    /// The plan has no entry for the requested object
    MissingPlanEntry { object: String, plan: PathBuf },
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        ExportError::Serialization {
            path: path.into(),
            source,
        }
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::SchemaNotFound { object, reason } => {
                write!(f, "Could not describe '{}': {}", object, reason)
            }
            ExportError::QueryFailed {
                object,
                query,
                reason,
            } => {
                write!(f, "Query for '{}' failed: {} ({})", object, reason, query)
            }
            ExportError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            ExportError::Serialization { path, source } => {
                write!(f, "Invalid JSON in {}: {}", path.display(), source)
            }
            ExportError::MissingPlanFile { path } => {
                write!(f, "Could not find the data plan file {}", path.display())
            }
            ExportError::MissingDataFile { path } => {
                write!(f, "Could not find the data file {}", path.display())
            }
            ExportError::MissingPlanEntry { object, plan } => {
                write!(
                    f,
                    "The data plan {} has no entry for '{}'",
                    plan.display(),
                    object
                )
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io { source, .. } => Some(source),
            ExportError::Serialization { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_object_or_path() {
        let schema = ExportError::SchemaNotFound {
            object: "Broker__c".to_string(),
            reason: "INVALID_TYPE".to_string(),
        };
        let missing = ExportError::MissingPlanFile {
            path: PathBuf::from("data/plan.json"),
        };

        assert_eq!(schema.to_string(), "Could not describe 'Broker__c': INVALID_TYPE");
        assert_eq!(
            missing.to_string(),
            "Could not find the data plan file data/plan.json"
        );
    }
}
