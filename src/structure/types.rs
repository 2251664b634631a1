//! Core type definitions for the element model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a vertex, edge or vertex property
///
/// Identifiers are totally ordered: integers sort before strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    Int(i64),
    Str(String),
}

impl ElementId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ElementId::Int(i) => Some(*i),
            ElementId::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ElementId::Str(s) => Some(s),
            ElementId::Int(_) => None,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Int(i) => write!(f, "{}", i),
            ElementId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        ElementId::Int(id)
    }
}

impl From<i32> for ElementId {
    fn from(id: i32) -> Self {
        ElementId::Int(id as i64)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        ElementId::Str(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        ElementId::Str(id)
    }
}

/// The structural kind of a graph element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex,
    Edge,
    VertexProperty,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => write!(f, "vertex"),
            ElementKind::Edge => write!(f, "edge"),
            ElementKind::VertexProperty => write!(f, "vertex_property"),
        }
    }
}

/// Edge direction relative to a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Out,
    In,
    Both,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Out => Direction::In,
            Direction::In => Direction::Out,
            Direction::Both => Direction::Both,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Out => write!(f, "OUT"),
            Direction::In => write!(f, "IN"),
            Direction::Both => write!(f, "BOTH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id() {
        let id = ElementId::from(42);
        assert_eq!(id.as_i64(), Some(42));
        assert_eq!(format!("{}", id), "42");

        let id2: ElementId = "v1".into();
        assert_eq!(id2.as_str(), Some("v1"));
        assert_eq!(id2.as_i64(), None);
    }

    #[test]
    fn test_id_ordering() {
        let a = ElementId::Int(1);
        let b = ElementId::Int(2);
        let c = ElementId::Str("a".to_string());
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_id_serializes_untagged() {
        let json = serde_json::to_string(&ElementId::Int(7)).unwrap();
        assert_eq!(json, "7");
        let back: ElementId = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(back, ElementId::Str("x".to_string()));
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Out.opposite(), Direction::In);
        assert_eq!(Direction::Both.opposite(), Direction::Both);
    }
}
