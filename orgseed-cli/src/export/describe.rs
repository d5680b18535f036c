//! Schema discovery with an on-disk describe cache
//!
//! Describe results are cached as `<cache dir>/<Object>.json` the first time an
//! object is fetched and read back on every later run from the same working
//! directory. The cache is never invalidated; delete the directory to refresh.

use indexmap::IndexMap;
use log::{debug, info, warn};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::ExportError;
use crate::api::OrgApi;
use crate::api::metadata::ObjectSchema;

/// Describes keyed by object name, in discovery order
pub type DescribeMap = IndexMap<String, ObjectSchema>;

/// Objects reached through these targets are never spidered
const SPIDER_EXCLUDED_TARGETS: &[&str] = &["User"];

/// Result of describing the requested object set
#[derive(Debug, Default)]
pub struct DescribeOutcome {
    pub describes: DescribeMap,
    /// Objects that were described but have no layout
    pub skipped: Vec<String>,
    /// Objects that could not be described at all
    pub failures: Vec<ExportError>,
}

/// Describes objects through the org API, caching results on disk
pub struct SchemaDescriber<'a> {
    api: &'a dyn OrgApi,
    cache_dir: PathBuf,
}

impl<'a> SchemaDescriber<'a> {
    pub fn new(api: &'a dyn OrgApi, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_path(&self, object: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", object))
    }

    /// Describe one object, from cache when possible
    pub async fn describe(&self, object: &str) -> Result<ObjectSchema, ExportError> {
        let path = self.cache_path(object);
        if path.exists() {
            match read_cached(&path) {
                Ok(schema) => {
                    debug!("Using cached describe for {}", object);
                    return Ok(schema);
                }
                Err(e) => warn!("Ignoring unreadable describe cache: {}", e),
            }
        }

        let schema = self
            .api
            .describe(object)
            .await
            .map_err(|e| ExportError::SchemaNotFound {
                object: object.to_string(),
                reason: format!("{:#}", e),
            })?;

        if let Err(e) = write_cached(&self.cache_dir, &path, &schema) {
            warn!("Could not cache describe for {}: {}", object, e);
        }

        Ok(schema)
    }

    /// Describe every requested object, keeping only layoutable ones.
    ///
    /// With `spider` set, reference targets outside the requested set are
    /// described too, transitively, until no new objects turn up. Fields that
    /// can point at `User` are not followed.
    pub async fn describe_all(&self, objects: &[String], spider: bool) -> DescribeOutcome {
        let mut outcome = DescribeOutcome::default();
        let mut attempted: HashSet<String> = HashSet::new();

        for object in objects {
            if !attempted.insert(object.clone()) {
                continue;
            }
            if !self.admit(object, &mut outcome).await {
                continue;
            }
            if spider {
                self.spider_from(object, &mut attempted, &mut outcome).await;
            }
        }

        info!(
            "Described {} objects ({} without layout, {} failed)",
            outcome.describes.len(),
            outcome.skipped.len(),
            outcome.failures.len()
        );
        outcome
    }

    /// Describe `object` and add it to the map if it has a layout
    async fn admit(&self, object: &str, outcome: &mut DescribeOutcome) -> bool {
        match self.describe(object).await {
            Ok(schema) if schema.layoutable => {
                outcome.describes.insert(object.to_string(), schema);
                true
            }
            Ok(_) => {
                debug!("Skipping {}: not layoutable", object);
                outcome.skipped.push(object.to_string());
                false
            }
            Err(e) => {
                warn!("{}", e);
                outcome.failures.push(e);
                false
            }
        }
    }

    async fn spider_from(
        &self,
        root: &str,
        attempted: &mut HashSet<String>,
        outcome: &mut DescribeOutcome,
    ) {
        let mut pending: VecDeque<String> = VecDeque::from([root.to_string()]);

        while let Some(current) = pending.pop_front() {
            let targets: Vec<String> = match outcome.describes.get(&current) {
                Some(schema) => spider_targets(schema),
                None => continue,
            };

            for target in targets {
                if outcome.describes.contains_key(&target) || !attempted.insert(target.clone()) {
                    continue;
                }
                debug!("Spidering {} -> {}", current, target);
                if self.admit(&target, outcome).await {
                    pending.push_back(target);
                }
            }
        }
    }
}

/// Reference targets worth following from `schema`, in field order
fn spider_targets(schema: &ObjectSchema) -> Vec<String> {
    schema
        .reference_fields()
        .filter(|f| !SPIDER_EXCLUDED_TARGETS.iter().any(|t| f.references(t)))
        .flat_map(|f| f.reference_to.iter().cloned())
        .collect()
}

fn read_cached(path: &Path) -> Result<ObjectSchema, ExportError> {
    let content = fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| ExportError::serialization(path, e))
}

fn write_cached(dir: &Path, path: &Path, schema: &ObjectSchema) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;
    let json = serde_json::to_string_pretty(schema).map_err(|e| ExportError::serialization(path, e))?;
    fs::write(path, json).map_err(|e| ExportError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::testing::{FakeOrg, child, ref_field, schema, text_field};

    fn names(map: &DescribeMap) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn test_describe_is_cached_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let org = FakeOrg::new().with_schema(schema("Account", vec![text_field("Name")], vec![]));
        let describer = SchemaDescriber::new(&org, dir.path());

        let first = describer.describe("Account").await.unwrap();
        let second = describer.describe("Account").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(org.count_calls("describe Account"), 1);
        assert!(dir.path().join("Account.json").exists());
    }

    #[tokio::test]
    async fn test_cache_survives_a_new_describer() {
        let dir = tempfile::tempdir().unwrap();
        let org = FakeOrg::new().with_schema(schema("Account", vec![text_field("Name")], vec![]));
        SchemaDescriber::new(&org, dir.path())
            .describe("Account")
            .await
            .unwrap();

        // An org that knows nothing still answers from the cache
        let empty = FakeOrg::new();
        let cached = SchemaDescriber::new(&empty, dir.path())
            .describe("Account")
            .await
            .unwrap();

        assert_eq!(cached.name, "Account");
        assert_eq!(empty.count_calls("describe"), 0);
    }

    #[tokio::test]
    async fn test_unknown_object_is_schema_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let org = FakeOrg::new();

        let err = SchemaDescriber::new(&org, dir.path())
            .describe("Nope__c")
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::SchemaNotFound { ref object, .. } if object == "Nope__c"));
    }

    #[tokio::test]
    async fn test_describe_all_skips_failures_and_unlayoutable() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = schema("AccountHistory", vec![], vec![]);
        history.layoutable = false;
        let org = FakeOrg::new()
            .with_schema(schema("Account", vec![], vec![]))
            .with_schema(history);

        let objects = vec![
            "Account".to_string(),
            "Missing__c".to_string(),
            "AccountHistory".to_string(),
        ];
        let outcome = SchemaDescriber::new(&org, dir.path())
            .describe_all(&objects, false)
            .await;

        assert_eq!(names(&outcome.describes), vec!["Account"]);
        assert_eq!(outcome.skipped, vec!["AccountHistory".to_string()]);
        assert_eq!(outcome.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_spider_follows_references_transitively() {
        let dir = tempfile::tempdir().unwrap();
        let org = FakeOrg::new()
            .with_schema(schema(
                "Case",
                vec![ref_field("ContactId", &["Contact"]), ref_field("OwnerId", &["User", "Group"])],
                vec![],
            ))
            .with_schema(schema("Contact", vec![ref_field("AccountId", &["Account"])], vec![]))
            .with_schema(schema(
                "Account",
                vec![ref_field("ParentId", &["Account"])],
                vec![child("Contact", "AccountId", Some("Contacts"))],
            ))
            .with_schema(schema("Group", vec![], vec![]));

        let outcome = SchemaDescriber::new(&org, dir.path())
            .describe_all(&["Case".to_string()], true)
            .await;

        assert_eq!(names(&outcome.describes), vec!["Case", "Contact", "Account"]);
        assert_eq!(org.count_calls("describe Group"), 0);
        assert_eq!(org.count_calls("describe User"), 0);
    }

    #[tokio::test]
    async fn test_without_spider_only_requested_objects_are_described() {
        let dir = tempfile::tempdir().unwrap();
        let org = FakeOrg::new()
            .with_schema(schema("Contact", vec![ref_field("AccountId", &["Account"])], vec![]))
            .with_schema(schema("Account", vec![], vec![]));

        let outcome = SchemaDescriber::new(&org, dir.path())
            .describe_all(&["Contact".to_string()], false)
            .await;

        assert_eq!(names(&outcome.describes), vec!["Contact"]);
        assert_eq!(org.count_calls("describe Account"), 0);
    }
}
