//! Property values and property bags for vertices and edges
//!
//! A key maps to one or many values (multi-properties); single-valued
//! keys are simply a bag entry holding one value.

use super::types::ElementId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Scalar or composite property value
///
/// Supports:
/// - Null
/// - Boolean
/// - Integer (i64)
/// - Float (f64)
/// - String
/// - List (Vec<PropertyValue>)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PropertyValue::Integer(_) | PropertyValue::Float(_))
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric view of the value, promoting integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "Null",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::String(_) => "String",
            PropertyValue::List(_) => "List",
        }
    }

    /// Compare two values the way predicates do: integers and floats are
    /// compared numerically, strings and booleans among themselves.
    /// Returns `None` for incomparable pairs.
    pub fn compare_loose(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::Integer(l), PropertyValue::Integer(r)) => Some(l.cmp(r)),
            (l, r) if l.is_numeric() && r.is_numeric() => {
                let (l, r) = (l.as_f64()?, r.as_f64()?);
                l.partial_cmp(&r)
            }
            (PropertyValue::String(l), PropertyValue::String(r)) => Some(l.cmp(r)),
            (PropertyValue::Boolean(l), PropertyValue::Boolean(r)) => Some(l.cmp(r)),
            _ => None,
        }
    }

    /// Equality with numeric promotion (`1 == 1.0`)
    pub fn eq_loose(&self, other: &PropertyValue) -> bool {
        match self.compare_loose(other) {
            Some(ord) => ord == Ordering::Equal,
            None => self == other,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PropertyValue::Null => 0,
            PropertyValue::Boolean(_) => 1,
            PropertyValue::Integer(_) => 2,
            PropertyValue::Float(_) => 3,
            PropertyValue::String(_) => 4,
            PropertyValue::List(_) => 5,
        }
    }
}

// Strict equality: Integer(1) and Float(1.0) are different values. Floats
// compare by total order so that NaN equals itself and hashing stays sound.
impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PropertyValue {}

impl PartialOrd for PropertyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropertyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PropertyValue::Null, PropertyValue::Null) => Ordering::Equal,
            (PropertyValue::Boolean(l), PropertyValue::Boolean(r)) => l.cmp(r),
            (PropertyValue::Integer(l), PropertyValue::Integer(r)) => l.cmp(r),
            (PropertyValue::Float(l), PropertyValue::Float(r)) => l.total_cmp(r),
            (PropertyValue::String(l), PropertyValue::String(r)) => l.cmp(r),
            (PropertyValue::List(l), PropertyValue::List(r)) => l.cmp(r),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            PropertyValue::Null => {}
            PropertyValue::Boolean(b) => b.hash(state),
            PropertyValue::Integer(i) => i.hash(state),
            PropertyValue::Float(f) => f.to_bits().hash(state),
            PropertyValue::String(s) => s.hash(state),
            PropertyValue::List(items) => items.hash(state),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::List(items) => {
                write!(f, "[")?;
                for (i, val) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::List(items)
    }
}

/// Ordered mapping from property key to one-or-many values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    entries: IndexMap<String, Vec<PropertyValue>>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values of `key` with a single value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(key.into(), vec![value.into()]);
    }

    /// Append a value to `key` (list cardinality)
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// All values of `key`; empty when the key is absent
    pub fn get(&self, key: &str) -> &[PropertyValue] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<PropertyValue>> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PropertyValue])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into property handles, restricted to `keys` unless empty
    pub fn to_properties(&self, keys: &[&str], owner: Option<&ElementId>) -> Vec<Property> {
        self.entries
            .iter()
            .filter(|(k, _)| keys.is_empty() || keys.contains(&k.as_str()))
            .flat_map(|(k, values)| {
                values.iter().map(move |v| Property {
                    key: k.clone(),
                    value: v.clone(),
                    owner: owner.cloned(),
                })
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        for (k, v) in iter {
            bag.add(k, v);
        }
        bag
    }
}

/// A single key/value handle, optionally tied to its owning element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: PropertyValue,
    pub owner: Option<ElementId>,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            owner: None,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p[{}->{}]", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_types() {
        assert_eq!(PropertyValue::String("test".to_string()).type_name(), "String");
        assert_eq!(PropertyValue::Integer(42).type_name(), "Integer");
        assert_eq!(PropertyValue::Float(3.14).type_name(), "Float");
        assert_eq!(PropertyValue::Boolean(true).type_name(), "Boolean");
        assert_eq!(PropertyValue::List(vec![]).type_name(), "List");
        assert_eq!(PropertyValue::Null.type_name(), "Null");
    }

    #[test]
    fn test_strict_and_loose_equality() {
        let i = PropertyValue::Integer(1);
        let f = PropertyValue::Float(1.0);
        assert_ne!(i, f);
        assert!(i.eq_loose(&f));
        assert_eq!(i.compare_loose(&PropertyValue::Float(1.5)), Some(Ordering::Less));
        assert_eq!(i.compare_loose(&PropertyValue::from("1")), None);
    }

    #[test]
    fn test_nan_is_self_equal() {
        let nan = PropertyValue::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
    }

    #[test]
    fn test_property_bag_multi_values() {
        let mut bag = PropertyBag::new();
        bag.set("name", "marko");
        bag.add("location", "san diego");
        bag.add("location", "santa cruz");

        assert_eq!(bag.get("name"), &[PropertyValue::from("marko")]);
        assert_eq!(bag.get("location").len(), 2);
        assert!(bag.get("missing").is_empty());

        bag.set("location", "brussels");
        assert_eq!(bag.get("location").len(), 1);
    }

    #[test]
    fn test_to_properties_filters_keys() {
        let bag: PropertyBag = vec![("name", PropertyValue::from("lop")), ("lang", "java".into())]
            .into_iter()
            .collect();
        let owner = ElementId::Int(3);
        let props = bag.to_properties(&["lang"], Some(&owner));
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].key, "lang");
        assert_eq!(props[0].owner, Some(owner));
        assert_eq!(bag.to_properties(&[], None).len(), 2);
    }
}
