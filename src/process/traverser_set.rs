//! Bulk-merging collection of traversers

use super::path::Path;
use super::traverser::{LoopFrame, Traverser};
use crate::structure::Value;
use indexmap::map::Entry;
use indexmap::IndexMap;

type MergeKey = (Value, Path, Vec<LoopFrame>);

/// Insertion-ordered set that folds merge-eligible traversers together
#[derive(Debug, Clone, Default)]
pub struct TraverserSet {
    traversers: IndexMap<MergeKey, Traverser>,
}

impl TraverserSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, adding bulk to an existing equal traverser
    pub fn add(&mut self, traverser: Traverser) {
        let key = (
            traverser.value().clone(),
            traverser.path().clone(),
            traverser.loops().to_vec(),
        );
        match self.traversers.entry(key) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.set_bulk(existing.bulk().saturating_add(traverser.bulk()));
            }
            Entry::Vacant(slot) => {
                slot.insert(traverser);
            }
        }
    }

    /// Distinct traversers
    pub fn len(&self) -> usize {
        self.traversers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traversers.is_empty()
    }

    /// Sum of bulks
    pub fn bulk_size(&self) -> u64 {
        self.traversers.values().map(Traverser::bulk).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Traverser> {
        self.traversers.values()
    }

    pub fn clear(&mut self) {
        self.traversers.clear();
    }

    /// Take every traverser out in insertion order
    pub fn drain(&mut self) -> Vec<Traverser> {
        std::mem::take(&mut self.traversers).into_values().collect()
    }
}

impl Extend<Traverser> for TraverserSet {
    fn extend<I: IntoIterator<Item = Traverser>>(&mut self, iter: I) {
        for traverser in iter {
            self.add(traverser);
        }
    }
}

impl FromIterator<Traverser> for TraverserSet {
    fn from_iter<I: IntoIterator<Item = Traverser>>(iter: I) -> Self {
        let mut set = TraverserSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for TraverserSet {
    type Item = Traverser;
    type IntoIter = indexmap::map::IntoValues<MergeKey, Traverser>;

    fn into_iter(self) -> Self::IntoIter {
        self.traversers.into_values()
    }
}
