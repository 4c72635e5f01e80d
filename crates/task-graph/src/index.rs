//! Forward and reverse dependency indices.
//!
//! The forward index maps a task to its prerequisites, the reverse index maps
//! a prerequisite to its dependents. Both are only changed through
//! [`DependencyIndex::relink`] and [`DependencyIndex::forget`], which keep
//! every forward edge paired with exactly one reverse entry.

use crate::TaskNodeData;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

/// Derived adjacency of the task registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyIndex {
    /// Task id to prerequisite ids. Tasks without prerequisites have no entry.
    forward: IndexMap<String, Vec<String>>,
    /// Prerequisite id to dependent ids. Buckets are dropped once empty.
    reverse: IndexMap<String, Vec<String>>,
}

impl DependencyIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build both indices from scratch.
    pub fn rebuild<'a, T>(records: impl IntoIterator<Item = (&'a str, &'a T)>) -> Self
    where
        T: TaskNodeData + 'a,
    {
        let mut index = Self::new();
        for (id, record) in records {
            let deps: Vec<String> = record.dependency_names().map(String::from).collect();
            index.relink(id, &deps);
        }
        index
    }

    /// Replace the prerequisites of `id`.
    ///
    /// `id` leaves the reverse buckets of prerequisites it no longer lists and
    /// joins the buckets of new ones; unchanged edges are left in place.
    /// Repeated ids in `deps` are linked once.
    pub fn relink(&mut self, id: &str, deps: &[String]) {
        let mut next: Vec<String> = Vec::with_capacity(deps.len());
        for dep in deps {
            if !next.contains(dep) {
                next.push(dep.clone());
            }
        }

        let previous = self.forward.get(id).cloned().unwrap_or_default();

        for old in previous.iter().filter(|old| !next.contains(old)) {
            self.remove_dependent(old, id);
        }
        for new in next.iter().filter(|new| !previous.contains(new)) {
            self.reverse
                .entry(new.clone())
                .or_default()
                .push(id.to_string());
        }

        if next.is_empty() {
            self.forward.shift_remove(id);
        } else {
            self.forward.insert(id.to_string(), next);
        }
        debug!(task = id, prerequisites = deps.len(), "relinked task");
    }

    /// Drop every edge owned by `id`.
    ///
    /// The reverse bucket keyed by `id` survives while other tasks still list
    /// it, so their now-dangling edges stay mirrored.
    pub fn forget(&mut self, id: &str) {
        self.relink(id, &[]);
    }

    fn remove_dependent(&mut self, prerequisite: &str, dependent: &str) {
        let Some(bucket) = self.reverse.get_mut(prerequisite) else {
            return;
        };
        bucket.retain(|d| d != dependent);
        if bucket.is_empty() {
            self.reverse.shift_remove(prerequisite);
        }
    }

    /// Prerequisites of `id`, empty if it has none or is unknown.
    #[must_use]
    pub fn prerequisites(&self, id: &str) -> &[String] {
        self.forward.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Dependents of `id`, empty if nothing depends on it.
    #[must_use]
    pub fn dependents(&self, id: &str) -> &[String] {
        self.reverse.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The forward index.
    #[must_use]
    pub fn forward(&self) -> &IndexMap<String, Vec<String>> {
        &self.forward
    }

    /// The reverse index.
    #[must_use]
    pub fn reverse(&self) -> &IndexMap<String, Vec<String>> {
        &self.reverse
    }

    /// Number of dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(Vec::len).sum()
    }

    /// Whether every forward edge has exactly one reverse entry and vice versa.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let forward_ok = self.forward.iter().all(|(task, deps)| {
            deps.iter().all(|dep| {
                self.dependents(dep)
                    .iter()
                    .filter(|d| *d == task)
                    .count()
                    == 1
            })
        });
        let reverse_ok = self.reverse.iter().all(|(dep, dependents)| {
            !dependents.is_empty()
                && dependents.iter().all(|task| {
                    self.prerequisites(task).iter().filter(|p| *p == dep).count() == 1
                })
        });
        forward_ok && reverse_ok && self.edge_count() == self.reverse.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[derive(Clone)]
    struct Record(Vec<String>);

    impl TaskNodeData for Record {
        fn dependency_names(&self) -> impl Iterator<Item = &str> {
            self.0.iter().map(String::as_str)
        }
    }

    #[test]
    fn test_rebuild_populates_both_sides() {
        let a = Record(vec![]);
        let b = Record(ids(&["a"]));
        let c = Record(ids(&["a", "ghost"]));
        let index = DependencyIndex::rebuild([("a", &a), ("b", &b), ("c", &c)]);

        assert_eq!(index.prerequisites("c"), ids(&["a", "ghost"]).as_slice());
        assert_eq!(index.dependents("a"), ids(&["b", "c"]).as_slice());
        assert_eq!(index.dependents("ghost"), ids(&["c"]).as_slice());
        assert!(index.prerequisites("a").is_empty());
        assert_eq!(index.edge_count(), 3);
        assert!(index.is_symmetric());
    }

    #[test]
    fn test_relink_moves_reverse_entries() {
        let mut index = DependencyIndex::new();
        index.relink("t", &ids(&["a", "b"]));
        index.relink("t", &ids(&["b", "c"]));

        assert!(index.dependents("a").is_empty());
        assert!(!index.reverse().contains_key("a"));
        assert_eq!(index.dependents("b"), ids(&["t"]).as_slice());
        assert_eq!(index.dependents("c"), ids(&["t"]).as_slice());
        assert!(index.is_symmetric());
    }

    #[test]
    fn test_relink_ignores_repeats() {
        let mut index = DependencyIndex::new();
        index.relink("t", &ids(&["a", "a"]));
        assert_eq!(index.prerequisites("t"), ids(&["a"]).as_slice());
        assert_eq!(index.dependents("a").len(), 1);
    }

    #[test]
    fn test_forget_keeps_bucket_of_dangling_dependents() {
        let mut index = DependencyIndex::new();
        index.relink("b", &ids(&["a"]));
        index.relink("a", &ids(&["root"]));

        index.forget("a");

        assert!(index.prerequisites("a").is_empty());
        assert!(!index.reverse().contains_key("root"));
        assert_eq!(index.dependents("a"), ids(&["b"]).as_slice());
        assert_eq!(index.prerequisites("b"), ids(&["a"]).as_slice());
        assert!(index.is_symmetric());
    }

    #[test]
    fn test_forget_drops_bucket_when_unreferenced() {
        let mut index = DependencyIndex::new();
        index.relink("a", &ids(&["root"]));
        index.forget("root");
        assert_eq!(index.dependents("root"), ids(&["a"]).as_slice());

        index.forget("a");
        assert!(index.reverse().is_empty());
        assert!(index.forward().is_empty());
    }
}
