//! The unit of flow through a traversal

use super::path::Path;
use crate::error::{TraversalError, TraversalResult};
use crate::structure::{attach, detach, Graph, GraphResult, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Loop counter of one enclosing repeat
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopFrame {
    pub name: Option<String>,
    pub count: u32,
}

/// Current value, path history, bulk and loop state
///
/// `bulk` counts logically identical traversers that were merged; every
/// step treats a traverser of bulk `n` exactly like `n` traversers of
/// bulk 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traverser {
    value: Value,
    path: Path,
    bulk: u64,
    loops: Vec<LoopFrame>,
}

impl Traverser {
    /// Start traverser whose path holds `value` as its first position
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        let mut path = Path::new();
        path.push(value.clone());
        Self {
            value,
            path,
            bulk: 1,
            loops: Vec::new(),
        }
    }

    pub fn with_bulk(mut self, bulk: u64) -> Self {
        self.bulk = bulk.max(1);
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bulk(&self) -> u64 {
        self.bulk
    }

    pub fn set_bulk(&mut self, bulk: u64) {
        self.bulk = bulk.max(1);
    }

    pub fn loops(&self) -> &[LoopFrame] {
        &self.loops
    }

    /// New traverser for `value` with the path extended by it
    ///
    /// Bulk and loop state carry over.
    pub fn split(&self, value: Value) -> Traverser {
        let mut path = self.path.clone();
        path.push(value.clone());
        Traverser {
            value,
            path,
            bulk: self.bulk,
            loops: self.loops.clone(),
        }
    }

    /// Copy of this traverser with an unchanged path
    pub fn split_same(&self) -> Traverser {
        self.clone()
    }

    /// Label the head of the path
    pub fn add_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path.extend_labels(labels);
    }

    /// Whether `other` may be folded into this traverser
    pub fn can_merge(&self, other: &Traverser) -> bool {
        self.value == other.value && self.path == other.path && self.loops == other.loops
    }

    /// Fold `other` into this traverser by adding its bulk
    pub fn merge(&mut self, other: Traverser) -> TraversalResult<()> {
        if !self.can_merge(&other) {
            return Err(TraversalError::IllegalConfiguration(format!(
                "cannot merge traverser at {} into traverser at {}: value, path or loop state differ",
                other.value, self.value
            )));
        }
        self.bulk = self.bulk.saturating_add(other.bulk);
        Ok(())
    }

    /// Enter a repeat: push a fresh counter
    pub fn initialise_loop(&mut self, name: Option<&str>) {
        self.loops.push(LoopFrame {
            name: name.map(str::to_string),
            count: 0,
        });
    }

    /// Bump the innermost counter
    pub fn incr_loop(&mut self) {
        if let Some(frame) = self.loops.last_mut() {
            frame.count += 1;
        }
    }

    /// Innermost counter, 0 outside any repeat
    pub fn loop_count(&self) -> u32 {
        self.loops.last().map(|f| f.count).unwrap_or(0)
    }

    /// Counter of the nearest enclosing repeat called `name`
    pub fn loop_count_named(&self, name: &str) -> Option<u32> {
        self.loops
            .iter()
            .rev()
            .find(|f| f.name.as_deref() == Some(name))
            .map(|f| f.count)
    }

    /// Leave a repeat: pop the innermost counter
    pub fn reset_loop(&mut self) {
        self.loops.pop();
    }

    /// Copy whose value and path are graph-independent
    pub fn detach(&self, with_properties: bool) -> Traverser {
        let path = match detach(&Value::Path(self.path.clone()), with_properties) {
            Value::Path(p) => p,
            _ => self.path.clone(),
        };
        Traverser {
            value: detach(&self.value, with_properties),
            path,
            bulk: self.bulk,
            loops: self.loops.clone(),
        }
    }

    /// Copy whose value and path are bound to `graph` again
    pub fn attach(&self, graph: &Arc<dyn Graph>) -> GraphResult<Traverser> {
        let path = match attach(&Value::Path(self.path.clone()), graph)? {
            Value::Path(p) => p,
            _ => self.path.clone(),
        };
        Ok(Traverser {
            value: attach(&self.value, graph)?,
            path,
            bulk: self.bulk,
            loops: self.loops.clone(),
        })
    }
}

impl fmt::Display for Traverser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bulk > 1 {
            write!(f, "{}x{}", self.value, self.bulk)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extends_path_and_keeps_bulk() {
        let start = Traverser::new(1).with_bulk(3);
        let next = start.split(Value::from(2));
        assert_eq!(next.value(), &Value::from(2));
        assert_eq!(next.path().size(), 2);
        assert_eq!(next.bulk(), 3);
        assert_eq!(start.path().size(), 1);
    }

    #[test]
    fn test_merge_requires_equal_state() {
        let mut a = Traverser::new(1);
        let b = Traverser::new(1).with_bulk(2);
        a.merge(b).unwrap();
        assert_eq!(a.bulk(), 3);

        let mut looped = Traverser::new(1);
        looped.initialise_loop(None);
        assert!(a.merge(looped).is_err());

        let mut labeled = Traverser::new(1);
        labeled.add_labels(["x"]);
        assert!(!a.can_merge(&labeled));
        assert!(a.merge(Traverser::new(2)).is_err());
    }

    #[test]
    fn test_nested_loop_counters() {
        let mut t = Traverser::new(1);
        assert_eq!(t.loop_count(), 0);
        t.initialise_loop(Some("outer"));
        t.incr_loop();
        t.initialise_loop(Some("inner"));
        t.incr_loop();
        t.incr_loop();
        assert_eq!(t.loop_count(), 2);
        assert_eq!(t.loop_count_named("outer"), Some(1));
        t.reset_loop();
        assert_eq!(t.loop_count(), 1);
        assert_eq!(t.loop_count_named("inner"), None);
    }

    #[test]
    fn test_zero_bulk_clamps() {
        let mut t = Traverser::new("x").with_bulk(0);
        assert_eq!(t.bulk(), 1);
        t.set_bulk(0);
        assert_eq!(t.bulk(), 1);
    }
}
