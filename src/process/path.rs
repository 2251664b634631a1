//! Labeled history of the objects a traverser visited

use crate::structure::Value;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Which labeled position to pick when a label occurs more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pop {
    First,
    Last,
    /// Every labeled position, as a list
    All,
}

/// Append-only sequence of `(object, labels)` positions
///
/// Objects may themselves be lists (of lists); they are stored as a
/// single position and keep their nesting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Path {
    objects: Vec<Value>,
    labels: Vec<IndexSet<String>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one position
    pub fn extend<I, S>(&mut self, object: Value, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects.push(object);
        self.labels.push(labels.into_iter().map(Into::into).collect());
    }

    /// Append an unlabeled position
    pub fn push(&mut self, object: Value) {
        self.objects.push(object);
        self.labels.push(IndexSet::new());
    }

    /// Add labels to the head position; no-op on an empty path
    pub fn extend_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(head) = self.labels.last_mut() {
            head.extend(labels.into_iter().map(Into::into));
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.objects.get(index)
    }

    pub fn head(&self) -> Option<&Value> {
        self.objects.last()
    }

    pub fn size(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[Value] {
        &self.objects
    }

    pub fn labels(&self) -> &[IndexSet<String>] {
        &self.labels
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|set| set.contains(label))
    }

    /// Object at the position carrying `label`
    ///
    /// `First`/`Last` return `None` when no position has the label; `All`
    /// always returns a (possibly empty) list.
    pub fn get_by_label(&self, pop: Pop, label: &str) -> Option<Value> {
        let mut matches = self
            .objects
            .iter()
            .zip(self.labels.iter())
            .filter(|(_, set)| set.contains(label))
            .map(|(object, _)| object);
        match pop {
            Pop::First => matches.next().cloned(),
            Pop::Last => matches.last().cloned(),
            Pop::All => Some(Value::List(matches.cloned().collect())),
        }
    }

    /// `true` when no object occurs twice
    pub fn is_simple(&self) -> bool {
        let mut seen = IndexSet::with_capacity(self.objects.len());
        self.objects.iter().all(|object| seen.insert(object))
    }

    /// Shape-preserving transform of every leaf object; labels are kept
    pub fn map_leaves<F: FnMut(&Value) -> Value>(&self, f: &mut F) -> Path {
        Path {
            objects: self.objects.iter().map(|o| o.map_leaves(f)).collect(),
            labels: self.labels.clone(),
        }
    }

    pub fn try_map_leaves<E, F>(&self, f: &mut F) -> Result<Path, E>
    where
        F: FnMut(&Value) -> Result<Value, E>,
    {
        let objects = self
            .objects
            .iter()
            .map(|o| o.try_map_leaves(f))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Path {
            objects,
            labels: self.labels.clone(),
        })
    }
}

// Equal length, equal objects and equal label sets at every position.
impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.objects.len() == other.objects.len()
            && self
                .objects
                .iter()
                .zip(other.objects.iter())
                .rev()
                .all(|(a, b)| a == b)
            && self.labels.iter().zip(other.labels.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.objects.hash(state);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path[")?;
        for (i, object) in self.objects.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", object)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // labels are space separated
    fn path(items: &[(i64, &str)]) -> Path {
        let mut p = Path::new();
        for (v, labels) in items {
            p.extend(Value::from(*v), labels.split_whitespace());
        }
        p
    }

    #[test]
    fn test_equality_laws() {
        let a = path(&[(1, "a"), (2, "b c")]);
        let b = path(&[(1, "a"), (2, "c b")]);
        let c = path(&[(1, "a"), (2, "b c")]);
        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(b, c);
        assert_eq!(a, c);
    }

    #[test]
    fn test_equality_requires_labels_and_length() {
        let a = path(&[(1, "a"), (2, "")]);
        assert_ne!(a, path(&[(1, "x"), (2, "")]));
        assert_ne!(a, path(&[(1, "a")]));
        assert_ne!(a, path(&[(1, "a"), (3, "")]));
    }

    #[test]
    fn test_labels_accumulate_on_head() {
        let mut p = path(&[(1, "a"), (2, "")]);
        p.extend_labels(["b"]);
        p.extend_labels(["b", "c"]);
        assert_eq!(p.labels()[1].len(), 2);
        assert!(p.has_label("c"));
        assert!(!p.has_label("z"));
        assert_eq!(p.head(), Some(&Value::from(2)));
    }

    #[test]
    fn test_get_by_label_pop() {
        let p = path(&[(1, "x"), (2, ""), (3, "x")]);
        assert_eq!(p.get_by_label(Pop::First, "x"), Some(Value::from(1)));
        assert_eq!(p.get_by_label(Pop::Last, "x"), Some(Value::from(3)));
        assert_eq!(
            p.get_by_label(Pop::All, "x"),
            Some(Value::List(vec![Value::from(1), Value::from(3)]))
        );
        assert_eq!(p.get_by_label(Pop::Last, "missing"), None);
        assert_eq!(p.get_by_label(Pop::All, "missing"), Some(Value::List(vec![])));
    }

    #[test]
    fn test_is_simple() {
        assert!(path(&[(1, ""), (2, "")]).is_simple());
        assert!(!path(&[(1, ""), (2, ""), (1, "")]).is_simple());
    }

    #[test]
    fn test_nested_positions_keep_shape() {
        let mut p = Path::new();
        p.extend(Value::List(vec![Value::List(vec![Value::from(1)])]), ["n"]);
        let mapped = p.map_leaves(&mut |leaf| Value::from(leaf.to_string()));
        assert_eq!(
            mapped.get(0),
            Some(&Value::List(vec![Value::List(vec![Value::from("1")])]))
        );
        assert!(mapped.has_label("n"));
    }
}
