//! Values that flow through a traversal

use super::element::{Edge, Element, Vertex};
use super::property::{Property, PropertyValue};
use super::types::ElementId;
use crate::process::Path;
use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

/// The object a traverser carries
///
/// Elements compare by id; lists and paths compare structurally. Maps
/// keep insertion order but compare without regard to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Vertex(Vertex),
    Edge(Edge),
    Property(Property),
    Scalar(PropertyValue),
    List(Vec<Value>),
    Path(Path),
    /// Keys are arbitrary values, so maps travel as entry sequences
    Map(#[serde(with = "indexmap::map::serde_seq")] IndexMap<Value, Value>),
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Value::Vertex(v) => v.hash(state),
            Value::Edge(e) => e.hash(state),
            Value::Property(p) => p.hash(state),
            Value::Scalar(s) => s.hash(state),
            Value::List(items) => items.hash(state),
            Value::Path(p) => p.hash(state),
            Value::Map(map) => {
                // order-independent, like map equality
                let combined = map.iter().fold(0u64, |acc, (k, v)| {
                    let mut entry = FxHasher::default();
                    k.hash(&mut entry);
                    v.hash(&mut entry);
                    acc.wrapping_add(entry.finish())
                });
                map.len().hash(state);
                combined.hash(state);
            }
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Vertex(_) => "Vertex",
            Value::Edge(_) => "Edge",
            Value::Property(_) => "Property",
            Value::Scalar(s) => s.type_name(),
            Value::List(_) => "List",
            Value::Path(_) => "Path",
            Value::Map(_) => "Map",
        }
    }

    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            Value::Vertex(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Value::Edge(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&PropertyValue> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<Value, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Element capability of a vertex or edge value
    pub fn as_element(&self) -> Option<&dyn Element> {
        match self {
            Value::Vertex(v) => Some(v),
            Value::Edge(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_id(&self) -> Option<&ElementId> {
        self.as_element().map(|e| e.id())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Scalar(s) if s.is_numeric())
    }

    /// Sort order used by ordering barriers
    ///
    /// Scalars sort before elements, elements by id, lists lexicographically,
    /// maps by their entries in insertion order.
    pub fn order_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a.compare_loose(b).unwrap_or_else(|| a.cmp(b)),
            (Value::Vertex(a), Value::Vertex(b)) => a.cmp(b),
            (Value::Edge(a), Value::Edge(b)) => a.cmp(b),
            (Value::Property(a), Value::Property(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.order_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Path(a), Value::Path(b)) => {
                Value::List(a.objects().to_vec()).order_cmp(&Value::List(b.objects().to_vec()))
            }
            (Value::Map(a), Value::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.order_cmp(kb).then_with(|| va.order_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Scalar(_) => 0,
            Value::Vertex(_) => 1,
            Value::Edge(_) => 2,
            Value::Property(_) => 3,
            Value::List(_) => 4,
            Value::Path(_) => 5,
            Value::Map(_) => 6,
        }
    }

    /// Shape-preserving transform of every leaf
    ///
    /// Lists, paths and maps (keys and values) are rebuilt with the same
    /// nesting; `f` sees every other value.
    pub fn map_leaves<F: FnMut(&Value) -> Value>(&self, f: &mut F) -> Value {
        let result: Result<Value, Infallible> = self.try_map_leaves(&mut |leaf| Ok(f(leaf)));
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`Value::map_leaves`]; stops at the first error
    pub fn try_map_leaves<E, F>(&self, f: &mut F) -> Result<Value, E>
    where
        F: FnMut(&Value) -> Result<Value, E>,
    {
        match self {
            Value::List(items) => items
                .iter()
                .map(|item| item.try_map_leaves(f))
                .collect::<Result<Vec<_>, E>>()
                .map(Value::List),
            Value::Path(path) => path.try_map_leaves(f).map(Value::Path),
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| Ok((k.try_map_leaves(f)?, v.try_map_leaves(f)?)))
                .collect::<Result<IndexMap<_, _>, E>>()
                .map(Value::Map),
            leaf => f(leaf),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Vertex(v) => write!(f, "{}", v),
            Value::Edge(e) => write!(f, "{}", e),
            Value::Property(p) => write!(f, "{}", p),
            Value::Scalar(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Path(p) => write!(f, "{}", p),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<Vertex> for Value {
    fn from(v: Vertex) -> Self {
        Value::Vertex(v)
    }
}

impl From<Edge> for Value {
    fn from(e: Edge) -> Self {
        Value::Edge(e)
    }
}

impl From<Property> for Value {
    fn from(p: Property) -> Self {
        Value::Property(p)
    }
}

impl From<PropertyValue> for Value {
    fn from(s: PropertyValue) -> Self {
        Value::Scalar(s)
    }
}

/// Ids surface as scalars
impl From<ElementId> for Value {
    fn from(id: ElementId) -> Self {
        Value::Scalar(match id {
            ElementId::Int(i) => PropertyValue::Integer(i),
            ElementId::Str(s) => PropertyValue::String(s),
        })
    }
}

impl From<Path> for Value {
    fn from(p: Path) -> Self {
        Value::Path(p)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<Value, Value>> for Value {
    fn from(map: IndexMap<Value, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(PropertyValue::Integer(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Scalar(PropertyValue::Integer(i as i64))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Scalar(PropertyValue::Float(f))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(PropertyValue::Boolean(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(PropertyValue::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(PropertyValue::String(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_cmp_promotes_numbers() {
        assert_eq!(Value::from(1).order_cmp(&Value::from(1.5)), Ordering::Less);
        assert_eq!(Value::from(2.0).order_cmp(&Value::from(2)), Ordering::Equal);
        assert_eq!(Value::from("a").order_cmp(&Value::from("b")), Ordering::Less);
    }

    #[test]
    fn test_map_leaves_preserves_shape() {
        let nested = Value::List(vec![
            Value::from(1),
            Value::List(vec![Value::from(2), Value::List(vec![Value::from(3)])]),
        ]);
        let doubled = nested.map_leaves(&mut |leaf| match leaf.as_scalar().and_then(|s| s.as_integer()) {
            Some(i) => Value::from(i * 2),
            None => leaf.clone(),
        });
        assert_eq!(
            doubled,
            Value::List(vec![
                Value::from(2),
                Value::List(vec![Value::from(4), Value::List(vec![Value::from(6)])]),
            ])
        );
    }

    #[test]
    fn test_try_map_leaves_stops_on_error() {
        let list = Value::List(vec![Value::from(1), Value::from("x"), Value::from(3)]);
        let mut seen = 0;
        let result: Result<Value, String> = list.try_map_leaves(&mut |leaf| {
            seen += 1;
            if leaf.is_numeric() {
                Ok(leaf.clone())
            } else {
                Err(format!("not a number: {}", leaf))
            }
        });
        assert_eq!(result, Err("not a number: x".to_string()));
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_maps_compare_without_order() {
        let a: IndexMap<Value, Value> = [(Value::from("x"), Value::from(1)), (Value::from("y"), Value::from(2))]
            .into_iter()
            .collect();
        let b: IndexMap<Value, Value> = [(Value::from("y"), Value::from(2)), (Value::from("x"), Value::from(1))]
            .into_iter()
            .collect();
        assert_eq!(Value::Map(a.clone()), Value::Map(b.clone()));

        let hash = |v: &Value| {
            let mut h = FxHasher::default();
            v.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&Value::Map(a.clone())), hash(&Value::Map(b)));
        assert_eq!(Value::Map(a).to_string(), "{x: 1, y: 2}");
    }

    #[test]
    fn test_map_leaves_reaches_keys_and_values() {
        let map: IndexMap<Value, Value> = [(Value::from(1), Value::List(vec![Value::from(2)]))]
            .into_iter()
            .collect();
        let bumped = Value::Map(map).map_leaves(&mut |leaf| match leaf.as_scalar().and_then(|s| s.as_integer()) {
            Some(i) => Value::from(i + 10),
            None => leaf.clone(),
        });
        let entries: Vec<_> = bumped.as_map().unwrap().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(entries, vec![(Value::from(11), Value::List(vec![Value::from(12)]))]);
    }

    #[test]
    fn test_map_json_round_trip_with_value_keys() {
        let map: IndexMap<Value, Value> = [(Value::from(29), Value::from("marko")), (Value::from("k"), Value::from(1.5))]
            .into_iter()
            .collect();
        let value = Value::Map(map);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_scalar_json_round_trip() {
        let value = Value::List(vec![Value::from("marko"), Value::from(29)]);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
