//! Load order planning
//!
//! The importer loads plan entries strictly in sequence and cannot resolve a
//! reference to an object that has not been loaded yet. This module turns the
//! relationship map into an object order and then into plan entries.
//!
//! Two order strategies exist:
//! - [`InsertionOrder`]: first-seen insertion over the reference adjacency.
//!   Cycles leave every member present without a guaranteed order.
//! - [`TopologicalOrder`]: Kahn's algorithm; members of a cycle are appended in
//!   first-seen order once everything else has been placed.
//!
//! [`apply_declared_order`] replaces either result with the requested object
//! list when asked for.

use clap::ValueEnum;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use super::graph::RelationshipMap;

/// Referenced object to the objects referencing it, in first-seen order
pub type ReferenceAdjacency = IndexMap<String, Vec<String>>;

/// One step of the import plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub sobject: String,
    /// The importer must remember the new ids of these records
    #[serde(default, skip_serializing_if = "is_false")]
    pub save_refs: bool,
    /// The importer must resolve `@ref` values before inserting
    #[serde(default, skip_serializing_if = "is_false")]
    pub resolve_refs: bool,
    pub files: Vec<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl PlanEntry {
    pub fn new(sobject: impl Into<String>) -> Self {
        let sobject = sobject.into();
        let files = vec![data_file_name(&sobject)];
        Self {
            sobject,
            save_refs: false,
            resolve_refs: false,
            files,
        }
    }
}

/// Data file holding the records of `object`
pub fn data_file_name(object: &str) -> String {
    format!("{}.json", object)
}

/// A way to derive the object visitation order from the relationship map
pub trait OrderStrategy {
    fn name(&self) -> &'static str;

    fn order(&self, map: &RelationshipMap) -> Vec<String>;
}

/// Selectable order strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrderStrategyKind {
    #[default]
    Insertion,
    Topological,
}

impl OrderStrategyKind {
    pub fn strategy(self) -> Box<dyn OrderStrategy + Send + Sync> {
        match self {
            OrderStrategyKind::Insertion => Box::new(InsertionOrder),
            OrderStrategyKind::Topological => Box::new(TopologicalOrder),
        }
    }
}

impl fmt::Display for OrderStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStrategyKind::Insertion => write!(f, "insertion"),
            OrderStrategyKind::Topological => write!(f, "topological"),
        }
    }
}

/// Build the "referenced -> referencing" adjacency from every parent reference.
///
/// Targets outside the map (e.g. `User`) and self references are kept; the
/// strategies decide what to do with them.
pub fn reference_adjacency(map: &RelationshipMap) -> ReferenceAdjacency {
    let mut adjacency = ReferenceAdjacency::new();

    for (object, entry) in map.iter() {
        for field in &entry.parent_refs {
            for target in &field.reference_to {
                let referencing = adjacency.entry(target.clone()).or_default();
                if !referencing.iter().any(|o| o == object) {
                    referencing.push(object.to_string());
                }
            }
        }
    }

    adjacency
}

/// First-seen insertion order
///
/// For each referenced object: append its referencing objects that are not
/// placed yet, then place the referenced object just before the first of them
/// (or at the front) if it is not placed already. A repair pass then pulls
/// every referenced object that ended up behind one of its referencers to just
/// before the first of them, until nothing moves. Cycles never settle; the
/// passes are capped at the number of objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertionOrder;

impl OrderStrategy for InsertionOrder {
    fn name(&self) -> &'static str {
        "insertion"
    }

    fn order(&self, map: &RelationshipMap) -> Vec<String> {
        let adjacency = reference_adjacency(map);
        let mut order: Vec<String> = Vec::new();

        for (referenced, referencing) in &adjacency {
            for object in referencing {
                if !order.contains(object) {
                    order.push(object.clone());
                }
            }

            if order.contains(referenced) {
                continue;
            }
            let first_referencing = referencing
                .iter()
                .filter_map(|o| order.iter().position(|placed| placed == o))
                .min()
                .unwrap_or(0);
            order.insert(first_referencing, referenced.clone());
        }

        for _ in 0..order.len() {
            if !pull_parents_forward(&adjacency, &mut order) {
                return order;
            }
        }
        debug!("Insertion order did not settle, a reference cycle remains");
        order
    }
}

/// Move each referenced object placed after one of its referencers to just
/// before the first of them. Returns whether anything moved.
fn pull_parents_forward(adjacency: &ReferenceAdjacency, order: &mut Vec<String>) -> bool {
    let mut moved = false;

    for (referenced, referencing) in adjacency {
        let Some(current) = order.iter().position(|o| o == referenced) else {
            continue;
        };
        let first_referencing = referencing
            .iter()
            .filter(|o| *o != referenced)
            .filter_map(|o| order.iter().position(|placed| placed == o))
            .min();

        if let Some(target) = first_referencing.filter(|target| *target < current) {
            let object = order.remove(current);
            order.insert(target, object);
            moved = true;
        }
    }

    moved
}

/// Kahn's algorithm over the reference adjacency
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologicalOrder;

impl OrderStrategy for TopologicalOrder {
    fn name(&self) -> &'static str {
        "topological"
    }

    fn order(&self, map: &RelationshipMap) -> Vec<String> {
        match topological_sort(&reference_adjacency(map)) {
            Ok(order) => order,
            Err(cycle) => {
                warn!("{}", cycle);
                let mut order = cycle.sorted;
                order.extend(cycle.remaining);
                order
            }
        }
    }
}

/// Objects that could not be ordered because they depend on each other
#[derive(Debug, Clone, PartialEq)]
pub struct CycleError {
    /// Everything that could be ordered
    pub sorted: Vec<String>,
    /// Cycle members and their dependents, in first-seen order
    pub remaining: Vec<String>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Circular dependency detected involving: {}",
            self.remaining.join(", ")
        )
    }
}

impl std::error::Error for CycleError {}

/// Order referenced objects before the objects referencing them
pub fn topological_sort(adjacency: &ReferenceAdjacency) -> Result<Vec<String>, CycleError> {
    // Every object mentioned, in first-seen order
    let mut nodes: Vec<&str> = Vec::new();
    for (referenced, referencing) in adjacency {
        for name in std::iter::once(referenced).chain(referencing) {
            if !nodes.contains(&name.as_str()) {
                nodes.push(name);
            }
        }
    }

    // Number of distinct objects each node depends on, self references excluded
    let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|n| (*n, 0)).collect();
    for (referenced, referencing) in adjacency {
        for dependent in referencing.iter().filter(|d| *d != referenced) {
            if let Some(count) = in_degree.get_mut(dependent.as_str()) {
                *count += 1;
            }
        }
    }

    let mut queue: VecDeque<&str> = nodes
        .iter()
        .copied()
        .filter(|n| in_degree.get(n) == Some(&0))
        .collect();
    let mut sorted: Vec<String> = Vec::new();

    while let Some(node) = queue.pop_front() {
        sorted.push(node.to_string());

        if let Some(dependents) = adjacency.get(node) {
            for dependent in dependents.iter().filter(|d| *d != node) {
                if let Some(count) = in_degree.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }
    }

    if sorted.len() != nodes.len() {
        let remaining = nodes
            .into_iter()
            .filter(|n| !sorted.iter().any(|s| s == n))
            .map(str::to_string)
            .collect();
        return Err(CycleError { sorted, remaining });
    }

    Ok(sorted)
}

/// Turn an object order into plan entries.
///
/// Objects with child refs save their ids (and resolve refs too when they
/// also have parents); objects with only parent refs resolve refs. Anything
/// else is skipped. Entries that resolve nothing move to the front, keeping
/// their relative order.
pub fn build_entries(order: &[String], map: &RelationshipMap) -> Vec<PlanEntry> {
    let entries: Vec<PlanEntry> = order
        .iter()
        .filter_map(|object| {
            let rel = map.get(object)?;
            let mut entry = PlanEntry::new(object.as_str());
            if rel.has_children() {
                entry.save_refs = true;
                entry.resolve_refs = rel.has_parents();
            } else if rel.has_parents() {
                entry.resolve_refs = true;
            } else {
                return None;
            }
            Some(entry)
        })
        .collect();

    let (mut front, rest): (Vec<PlanEntry>, Vec<PlanEntry>) =
        entries.into_iter().partition(|e| !e.resolve_refs);
    front.extend(rest);
    front
}

/// Reorder entries to follow `declared`, dropping entries not listed
pub fn apply_declared_order(entries: Vec<PlanEntry>, declared: &[String]) -> Vec<PlanEntry> {
    let mut by_object: HashMap<String, PlanEntry> = entries
        .into_iter()
        .map(|e| (e.sobject.clone(), e))
        .collect();

    declared
        .iter()
        .filter_map(|object| by_object.remove(object))
        .collect()
}

/// Produces the object order and the plan entries
pub struct LoadOrderPlanner {
    strategy: Box<dyn OrderStrategy + Send + Sync>,
}

impl LoadOrderPlanner {
    pub fn new(kind: OrderStrategyKind) -> Self {
        Self::with_strategy(kind.strategy())
    }

    pub fn with_strategy(strategy: Box<dyn OrderStrategy + Send + Sync>) -> Self {
        Self { strategy }
    }

    pub fn plan(&self, map: &RelationshipMap) -> Vec<String> {
        let order = self.strategy.order(map);
        debug!("{} order: {}", self.strategy.name(), order.join(", "));
        order
    }

    pub fn entries(&self, map: &RelationshipMap) -> Vec<PlanEntry> {
        build_entries(&self.plan(map), map)
    }
}

impl Default for LoadOrderPlanner {
    fn default() -> Self {
        Self::new(OrderStrategyKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::metadata::{ChildRelationship, Field};
    use crate::export::describe::DescribeMap;
    use crate::export::testing::{child, ref_field, schema};

    /// Each object with the objects it references; child relationships are
    /// derived from the reverse direction.
    fn graph(objects: &[(&str, &[&str])]) -> RelationshipMap {
        let describes: DescribeMap = objects
            .iter()
            .map(|(name, parents)| {
                let fields: Vec<Field> = parents
                    .iter()
                    .map(|p| ref_field(&format!("{}Ref__c", p), &[*p]))
                    .collect();
                let children: Vec<ChildRelationship> = objects
                    .iter()
                    .filter(|(_, ps)| ps.contains(name))
                    .map(|(c, _)| {
                        let rel = format!("{}s", c);
                        child(c, &format!("{}Ref__c", name), Some(rel.as_str()))
                    })
                    .collect();
                (name.to_string(), schema(name, fields, children))
            })
            .collect();
        RelationshipMap::build(&describes)
    }

    fn position(order: &[String], object: &str) -> usize {
        order.iter().position(|o| o == object).unwrap()
    }

    /// Every in-map parent appears before its referencing object
    fn assert_parents_first(order: &[String], map: &RelationshipMap) {
        for (object, entry) in map.iter() {
            for field in &entry.parent_refs {
                for target in field.reference_to.iter().filter(|t| *t != object) {
                    assert!(
                        position(order, target) < position(order, object),
                        "{} should come before {} in {:?}",
                        target,
                        object,
                        order
                    );
                }
            }
        }
    }

    fn names(entries: &[PlanEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.sobject.as_str()).collect()
    }

    #[test]
    fn test_adjacency_lists_referencing_objects() {
        let map = graph(&[
            ("Account", &[]),
            ("Contact", &["Account"]),
            ("Opportunity", &["Account", "Contact"]),
        ]);

        let adjacency = reference_adjacency(&map);

        assert_eq!(adjacency["Account"], vec!["Contact", "Opportunity"]);
        assert_eq!(adjacency["Contact"], vec!["Opportunity"]);
    }

    #[test]
    fn test_insertion_order_chain() {
        let map = graph(&[
            ("Account", &[]),
            ("Contact", &["Account"]),
            ("Case", &["Contact"]),
        ]);

        assert_eq!(InsertionOrder.order(&map), vec!["Account", "Contact", "Case"]);
    }

    #[test]
    fn test_insertion_order_parents_first_when_declared_backwards() {
        let map = graph(&[
            ("Case", &["Contact", "Account"]),
            ("Contact", &["Account"]),
            ("Account", &[]),
        ]);

        let order = InsertionOrder.order(&map);

        assert_parents_first(&order, &map);
    }

    #[test]
    fn test_insertion_order_self_reference() {
        let map = graph(&[("Account", &["Account"]), ("Contact", &["Account"])]);

        assert_eq!(InsertionOrder.order(&map), vec!["Account", "Contact"]);
    }

    #[test]
    fn test_insertion_order_cycle_keeps_both() {
        let map = graph(&[("A__c", &["B__c"]), ("B__c", &["A__c"])]);

        let order = InsertionOrder.order(&map);

        assert_eq!(order.len(), 2);
        assert!(order.contains(&"A__c".to_string()));
        assert!(order.contains(&"B__c".to_string()));
    }

    #[test]
    fn test_insertion_order_pulls_late_parent_forward() {
        // B is placed as a referencer of X before A is seen as B's parent
        let map = graph(&[("B__c", &["X__c", "A__c"]), ("A__c", &["X__c"]), ("X__c", &[])]);

        let order = InsertionOrder.order(&map);

        assert_eq!(order, vec!["X__c", "A__c", "B__c"]);
        assert_eq!(TopologicalOrder.order(&map), order);
    }

    #[test]
    fn test_default_plan_loads_contact_before_case() {
        // Case's AccountId comes before its ContactId
        let map = graph(&[
            ("Case", &["Account", "Contact"]),
            ("Contact", &["Account"]),
            ("Account", &[]),
        ]);

        let entries = LoadOrderPlanner::default().entries(&map);
        let order: Vec<String> = entries.iter().map(|e| e.sobject.clone()).collect();

        assert_eq!(order, vec!["Account", "Contact", "Case"]);
        assert_parents_first(&order, &map);
    }

    #[test]
    fn test_topological_order_diamond() {
        let map = graph(&[
            ("Account", &[]),
            ("Contact", &["Account"]),
            ("Opportunity", &["Account"]),
            ("OpportunityContactRole", &["Contact", "Opportunity"]),
        ]);

        let order = TopologicalOrder.order(&map);

        assert_eq!(order[0], "Account");
        assert_eq!(order[3], "OpportunityContactRole");
        assert_parents_first(&order, &map);
    }

    #[test]
    fn test_topological_sort_reports_cycle() {
        let map = graph(&[
            ("Account", &[]),
            ("A__c", &["B__c", "Account"]),
            ("B__c", &["A__c"]),
        ]);

        let err = topological_sort(&reference_adjacency(&map)).unwrap_err();

        assert_eq!(err.sorted, vec!["Account"]);
        assert_eq!(err.remaining, vec!["B__c", "A__c"]);
        assert!(err.to_string().contains("Circular dependency"));

        // The strategy still yields every object
        assert_eq!(TopologicalOrder.order(&map), vec!["Account", "B__c", "A__c"]);
    }

    #[test]
    fn test_build_entries_flags_and_front_moving() {
        let map = graph(&[
            ("Case", &["Contact"]),
            ("Contact", &["Account"]),
            ("Account", &[]),
            ("Product2", &[]),
        ]);
        let order: Vec<String> = ["Contact", "Case", "Account", "User"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let entries = build_entries(&order, &map);

        assert_eq!(names(&entries), vec!["Account", "Contact", "Case"]);
        assert!(entries[0].save_refs && !entries[0].resolve_refs);
        assert!(entries[1].save_refs && entries[1].resolve_refs);
        assert!(!entries[2].save_refs && entries[2].resolve_refs);
        assert_eq!(entries[2].files, vec!["Case.json"]);
    }

    #[test]
    fn test_front_moving_is_stable() {
        let map = graph(&[
            ("Child__c", &["First__c", "Second__c"]),
            ("First__c", &[]),
            ("Second__c", &[]),
        ]);
        let order: Vec<String> = ["First__c", "Child__c", "Second__c"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let entries = build_entries(&order, &map);

        assert_eq!(names(&entries), vec!["First__c", "Second__c", "Child__c"]);
    }

    #[test]
    fn test_declared_order_overrides_and_filters() {
        let map = graph(&[("Account", &[]), ("Contact", &["Account"]), ("Case", &["Contact"])]);
        let declared: Vec<String> = ["Case", "Missing__c", "Account"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let entries = LoadOrderPlanner::new(OrderStrategyKind::Insertion).entries(&map);

        assert_eq!(names(&apply_declared_order(entries, &declared)), vec!["Case", "Account"]);
    }

    #[test]
    fn test_plan_entry_json_omits_false_flags() {
        let mut parent = PlanEntry::new("Parent");
        parent.save_refs = true;
        let mut child = PlanEntry::new("Child");
        child.resolve_refs = true;

        let json = serde_json::to_string(&vec![parent, child]).unwrap();

        assert_eq!(
            json,
            r#"[{"sobject":"Parent","saveRefs":true,"files":["Parent.json"]},{"sobject":"Child","resolveRefs":true,"files":["Child.json"]}]"#
        );
    }

    #[test]
    fn test_strategy_kind_from_toml_name() {
        #[derive(Deserialize)]
        struct Wrapper {
            order: OrderStrategyKind,
        }
        let parsed: Wrapper = toml::from_str("order = \"topological\"").unwrap();

        assert_eq!(parsed.order, OrderStrategyKind::Topological);
        assert_eq!(OrderStrategyKind::default().to_string(), "insertion");
    }
}
