//! Index of every source id fetched during a run

use std::collections::HashSet;

/// Append-only set of fetched primary keys, filled while queries run
#[derive(Debug, Clone, Default)]
pub struct GlobalIdIndex {
    ids: HashSet<String>,
}

impl GlobalIdIndex {
    pub fn extend<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
    }

    /// Stop accepting ids; the pruner only ever sees the frozen form
    pub fn freeze(self) -> FrozenIdIndex {
        FrozenIdIndex { ids: self.ids }
    }
}

/// Read-only view of the index once all fetch queries completed
#[derive(Debug, Clone, Default)]
pub struct FrozenIdIndex {
    ids: HashSet<String>,
}

impl FrozenIdIndex {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
impl FromIterator<String> for FrozenIdIndex {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        FrozenIdIndex {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_keeps_ids() {
        let mut index = GlobalIdIndex::default();
        index.extend(vec!["001A", "003A"]);
        index.extend(vec!["003B".to_string(), "001A".to_string()]);

        let frozen = index.freeze();
        assert_eq!(frozen.len(), 3);
        assert!(frozen.contains("003B"));
        assert!(!frozen.contains("003C"));
    }
}
