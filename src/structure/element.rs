//! Element capability set and the variant enums over it
//!
//! A [`Vertex`] or [`Edge`] is either live (bound to a graph), detached
//! (a self-contained snapshot) or a reference (id and label only).
//! Identity is decided by id alone, so a detached vertex equals the live
//! vertex it was taken from.

use super::detached::{DetachedEdge, DetachedVertex};
use super::live::{LiveEdge, LiveVertex};
use super::property::{Property, PropertyValue};
use super::reference::{ReferenceEdge, ReferenceVertex};
use super::types::{Direction, ElementId, ElementKind};
use crate::util::DoubleIterator;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Lazy sequence of property values
pub type Values = std::iter::Map<std::vec::IntoIter<Property>, fn(Property) -> PropertyValue>;

fn property_value(property: Property) -> PropertyValue {
    property.value
}

/// Capabilities shared by every vertex and edge variant
pub trait Element {
    fn id(&self) -> &ElementId;

    fn label(&self) -> &str;

    fn kind(&self) -> ElementKind;

    /// Property handles for `keys`, or for every key when `keys` is empty.
    /// Unknown keys yield nothing.
    fn properties(&self, keys: &[&str]) -> std::vec::IntoIter<Property>;

    fn values(&self, keys: &[&str]) -> Values {
        self.properties(keys).map(property_value as fn(Property) -> PropertyValue)
    }

    /// First value of `key`
    fn value(&self, key: &str) -> Option<PropertyValue> {
        self.values(&[key]).next()
    }

    /// Distinct property keys in storage order
    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for property in self.properties(&[]) {
            if !keys.contains(&property.key) {
                keys.push(property.key);
            }
        }
        keys
    }
}

macro_rules! dispatch {
    ($enum:ident, $self:expr, $inner:ident => $body:expr) => {
        match $self {
            $enum::Live($inner) => $body,
            $enum::Detached($inner) => $body,
            $enum::Reference($inner) => $body,
        }
    };
}

/// A vertex in one of its three representations
#[derive(Debug, Clone)]
pub enum Vertex {
    Live(LiveVertex),
    Detached(DetachedVertex),
    Reference(ReferenceVertex),
}

impl Vertex {
    pub fn is_live(&self) -> bool {
        matches!(self, Vertex::Live(_))
    }

    pub fn as_live(&self) -> Option<&LiveVertex> {
        match self {
            Vertex::Live(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_detached(&self) -> Option<&DetachedVertex> {
        match self {
            Vertex::Detached(v) => Some(v),
            _ => None,
        }
    }

    /// Graph-independent snapshot; already detached or reference vertices
    /// are returned as they are
    pub fn detach(&self, with_properties: bool) -> Vertex {
        match self {
            Vertex::Live(v) => Vertex::Detached(DetachedVertex::from_element(v, with_properties)),
            other => other.clone(),
        }
    }

    pub fn reference(&self) -> Vertex {
        match self {
            Vertex::Reference(_) => self.clone(),
            other => Vertex::Reference(ReferenceVertex::new(other.id().clone(), other.label())),
        }
    }
}

impl Element for Vertex {
    fn id(&self) -> &ElementId {
        dispatch!(Vertex, self, v => v.id())
    }

    fn label(&self) -> &str {
        dispatch!(Vertex, self, v => v.label())
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Vertex
    }

    fn properties(&self, keys: &[&str]) -> std::vec::IntoIter<Property> {
        dispatch!(Vertex, self, v => v.properties(keys))
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ElementKind::Vertex.hash(state);
        self.id().hash(state);
    }
}

impl PartialOrd for Vertex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Vertex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(other.id())
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v[{}]", self.id())
    }
}

/// An edge in one of its three representations
#[derive(Debug, Clone)]
pub enum Edge {
    Live(LiveEdge),
    Detached(DetachedEdge),
    Reference(ReferenceEdge),
}

impl Edge {
    pub fn is_live(&self) -> bool {
        matches!(self, Edge::Live(_))
    }

    pub fn as_live(&self) -> Option<&LiveEdge> {
        match self {
            Edge::Live(e) => Some(e),
            _ => None,
        }
    }

    pub fn out_id(&self) -> &ElementId {
        match self {
            Edge::Live(e) => e.out_id(),
            Edge::Detached(e) => e.out_v().id(),
            Edge::Reference(e) => e.out_v().id(),
        }
    }

    pub fn in_id(&self) -> &ElementId {
        match self {
            Edge::Live(e) => e.in_id(),
            Edge::Detached(e) => e.in_v().id(),
            Edge::Reference(e) => e.in_v().id(),
        }
    }

    /// Endpoint on one side; `None` for `Both` or a removed live endpoint
    pub fn vertex(&self, direction: Direction) -> Option<Vertex> {
        let reference = match (self, direction) {
            (_, Direction::Both) => return None,
            (Edge::Live(e), direction) => return e.vertex(direction),
            (Edge::Detached(e), Direction::Out) => e.out_v(),
            (Edge::Detached(e), Direction::In) => e.in_v(),
            (Edge::Reference(e), Direction::Out) => e.out_v(),
            (Edge::Reference(e), Direction::In) => e.in_v(),
        };
        Some(Vertex::Reference(reference.clone()))
    }

    /// Out endpoint then in endpoint
    pub fn both_vertices(&self) -> Option<DoubleIterator<Vertex>> {
        Some(DoubleIterator::new(
            self.vertex(Direction::Out)?,
            self.vertex(Direction::In)?,
        ))
    }

    pub fn detach(&self, with_properties: bool) -> Edge {
        match self {
            Edge::Live(e) => Edge::Detached(DetachedEdge::from_live(e, with_properties)),
            other => other.clone(),
        }
    }

    pub fn reference(&self) -> Edge {
        match self {
            Edge::Live(e) => Edge::Reference(ReferenceEdge::from_live(e)),
            Edge::Detached(e) => Edge::Reference(ReferenceEdge::new(
                e.id().clone(),
                e.label(),
                e.out_v().clone(),
                e.in_v().clone(),
            )),
            Edge::Reference(_) => self.clone(),
        }
    }
}

impl Element for Edge {
    fn id(&self) -> &ElementId {
        dispatch!(Edge, self, e => e.id())
    }

    fn label(&self) -> &str {
        dispatch!(Edge, self, e => e.label())
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }

    fn properties(&self, keys: &[&str]) -> std::vec::IntoIter<Property> {
        dispatch!(Edge, self, e => e.properties(keys))
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ElementKind::Edge.hash(state);
        self.id().hash(state);
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(other.id())
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e[{}][{}-{}->{}]", self.id(), self.out_id(), self.label(), self.in_id())
    }
}

// Wire shapes: only graph-independent variants are representable.

#[derive(Serialize)]
enum WireVertexRef<'a> {
    Detached(&'a DetachedVertex),
    Reference(&'a ReferenceVertex),
}

#[derive(Deserialize)]
enum WireVertex {
    Detached(DetachedVertex),
    Reference(ReferenceVertex),
}

#[derive(Serialize)]
enum WireEdgeRef<'a> {
    Detached(&'a DetachedEdge),
    Reference(&'a ReferenceEdge),
}

#[derive(Deserialize)]
enum WireEdge {
    Detached(DetachedEdge),
    Reference(ReferenceEdge),
}

impl Serialize for Vertex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Vertex::Live(v) => Err(serde::ser::Error::custom(format!(
                "live vertex {} must be detached before serialization",
                v.id()
            ))),
            Vertex::Detached(v) => WireVertexRef::Detached(v).serialize(serializer),
            Vertex::Reference(v) => WireVertexRef::Reference(v).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Vertex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireVertex::deserialize(deserializer)? {
            WireVertex::Detached(v) => Vertex::Detached(v),
            WireVertex::Reference(v) => Vertex::Reference(v),
        })
    }
}

impl Serialize for Edge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Edge::Live(e) => Err(serde::ser::Error::custom(format!(
                "live edge {} must be detached before serialization",
                e.id()
            ))),
            Edge::Detached(e) => WireEdgeRef::Detached(e).serialize(serializer),
            Edge::Reference(e) => WireEdgeRef::Reference(e).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Edge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireEdge::deserialize(deserializer)? {
            WireEdge::Detached(e) => Edge::Detached(e),
            WireEdge::Reference(e) => Edge::Reference(e),
        })
    }
}
