//! Bounded sampling of related records
//!
//! Two phases:
//! 1. count pre-check: every object in the relationship map gets a
//!    `SELECT COUNT()`; objects with no records leave the maps
//! 2. fetch: a bounded root query per planned object, then one dependent query
//!    per child relationship filtered on the ids the root query returned
//!
//! Query failures never abort the run. They are logged, collected and the
//! affected branch is skipped.

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::HashMap;

use super::describe::DescribeMap;
use super::error::ExportError;
use super::graph::RelationshipMap;
use super::ids::GlobalIdIndex;
use super::plan::PlanEntry;
use super::record::{DataSet, ID_FIELD, RecordSet};
use crate::api::OrgApi;
use crate::api::metadata::{ChildRelationship, ObjectSchema};
use crate::api::query::{Query, QueryBuilder};

/// Records, fetched ids and absorbed failures of the fetch phase
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub data: DataSet,
    pub ids: GlobalIdIndex,
    pub failures: Vec<ExportError>,
}

/// Issues count, root and dependent queries against the org
pub struct SampleQueryEngine<'a> {
    api: &'a dyn OrgApi,
    max_records: usize,
    concurrency: usize,
}

impl<'a> SampleQueryEngine<'a> {
    pub fn new(api: &'a dyn OrgApi, max_records: usize) -> Self {
        Self {
            api,
            max_records,
            concurrency: 1,
        }
    }

    /// Upper bound on count queries in flight
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// `SELECT <createable fields>,Id FROM <object> LIMIT n`
    pub fn root_query(&self, schema: &ObjectSchema) -> Query {
        QueryBuilder::new(schema.name.as_str())
            .select(&schema.createable_fields())
            .select(&[ID_FIELD])
            .limit(self.max_records)
            .build()
    }

    /// Root query restricted to children of the given parent ids
    pub fn dependent_query(
        &self,
        child: &ObjectSchema,
        relationship: &ChildRelationship,
        parent_ids: &[String],
    ) -> Query {
        QueryBuilder::new(child.name.as_str())
            .select(&child.createable_fields())
            .select(&[ID_FIELD])
            .where_in(&relationship.field, parent_ids)
            .limit(self.max_records)
            .build()
    }

    /// Drop objects with no records from both maps.
    ///
    /// Returns the dropped objects in map order. A failed count keeps the
    /// object; the fetch phase will find out.
    pub async fn prune_empty_objects(
        &self,
        describes: &mut DescribeMap,
        map: &mut RelationshipMap,
    ) -> Vec<String> {
        let objects: Vec<String> = map.objects().map(str::to_string).collect();

        let counts: HashMap<String, anyhow::Result<u64>> = stream::iter(objects.clone())
            .map(|object| async move {
                let query = QueryBuilder::count(object.as_str()).build();
                let count = self.api.count(&query).await;
                (object, count)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut empty = Vec::new();
        for object in objects {
            match counts.get(&object) {
                Some(Ok(0)) => {
                    debug!("{} has no records, dropping it", object);
                    describes.shift_remove(&object);
                    map.remove(&object);
                    empty.push(object);
                }
                Some(Ok(count)) => debug!("{} has {} records", object, count),
                Some(Err(e)) => warn!("Count query for {} failed, keeping it: {:#}", object, e),
                None => {}
            }
        }

        if !empty.is_empty() {
            info!("Skipping empty objects: {}", empty.join(", "));
        }
        empty
    }

    /// Fetch samples for every planned object in map order.
    ///
    /// Objects without a plan entry are removed from both maps first.
    pub async fn fetch_all(
        &self,
        describes: &mut DescribeMap,
        map: &mut RelationshipMap,
        plan: &[PlanEntry],
    ) -> FetchOutcome {
        map.retain(|object| plan.iter().any(|e| e.sobject == object));
        describes.retain(|object, _| map.contains(object));

        let mut outcome = FetchOutcome::default();
        let objects: Vec<String> = map.objects().map(str::to_string).collect();

        for object in objects {
            // May have been dropped by an earlier empty result
            if !map.contains(&object) {
                continue;
            }
            let Some(schema) = describes.get(&object) else {
                continue;
            };

            let query = self.root_query(schema);
            let fetched = match self.run(&object, &query).await {
                Ok(set) => set,
                Err(e) => {
                    warn!("{}", e);
                    outcome.failures.push(e);
                    continue;
                }
            };

            if fetched.is_empty() {
                if outcome.data.get(&object).is_none_or(RecordSet::is_empty) {
                    debug!("{} returned no records, dropping it", object);
                    describes.shift_remove(&object);
                    map.remove(&object);
                    outcome.data.remove(&object);
                }
                continue;
            }

            let parent_ids = fetched.source_ids();
            let added = outcome.data.merge(&object, fetched);
            info!("{}: {} records", object, added.len());
            outcome.ids.extend(added);

            self.fetch_children(&object, &parent_ids, describes, map, &mut outcome)
                .await;
        }

        outcome
    }

    async fn fetch_children(
        &self,
        parent: &str,
        parent_ids: &[String],
        describes: &DescribeMap,
        map: &RelationshipMap,
        outcome: &mut FetchOutcome,
    ) {
        let Some(entry) = map.get(parent) else {
            return;
        };

        for relationship in &entry.child_refs {
            let child = relationship.child_sobject.as_str();
            if child == parent || !relationship.is_named() || !map.contains(child) {
                continue;
            }
            let Some(schema) = describes.get(child) else {
                continue;
            };

            let query = self.dependent_query(schema, relationship, parent_ids);
            match self.run(child, &query).await {
                Ok(fetched) => {
                    let added = outcome.data.merge(child, fetched);
                    debug!(
                        "{} via {}.{}: {} new records",
                        child, parent, relationship.field, added.len()
                    );
                    outcome.ids.extend(added);
                }
                Err(e) => {
                    warn!("{}", e);
                    outcome.failures.push(e);
                }
            }
        }
    }

    async fn run(&self, object: &str, query: &Query) -> Result<RecordSet, ExportError> {
        let result = self
            .api
            .query(query)
            .await
            .map_err(|e| ExportError::QueryFailed {
                object: object.to_string(),
                query: query.to_soql(),
                reason: format!("{:#}", e),
            })?;

        Ok(RecordSet::from_query(result.records))
    }
}
