//! Detachment: graph-independent snapshots of elements and the values
//! that contain them
//!
//! Detaching walks any [`Value`] tree (lists, lists of lists, paths whose
//! positions are themselves lists) and replaces each element leaf with
//! its snapshot. The shape of the tree is preserved exactly; non-element
//! leaves are copied through.

use super::element::{Edge, Element, Vertex};
use super::graph::{Graph, GraphError, GraphExt, GraphResult};
use super::live::LiveEdge;
use super::property::{Property, PropertyBag};
use super::reference::{endpoint, ReferenceVertex};
use super::types::{Direction, ElementId, ElementKind};
use super::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Vertex snapshot with its properties as of detach time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachedVertex {
    id: ElementId,
    label: String,
    properties: PropertyBag,
}

impl DetachedVertex {
    pub fn new(id: impl Into<ElementId>, label: impl Into<String>, properties: PropertyBag) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties,
        }
    }

    pub fn from_element(element: &impl Element, with_properties: bool) -> Self {
        Self::new(
            element.id().clone(),
            element.label(),
            snapshot(element, with_properties),
        )
    }

    pub fn property_bag(&self) -> &PropertyBag {
        &self.properties
    }

    /// Re-resolve the live vertex with this id
    pub fn attach(&self, graph: &Arc<dyn Graph>) -> GraphResult<Vertex> {
        graph
            .vertex(&self.id)
            .ok_or_else(|| GraphError::VertexNotFound(self.id.clone()))
    }
}

impl Element for DetachedVertex {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Vertex
    }

    fn properties(&self, keys: &[&str]) -> std::vec::IntoIter<Property> {
        self.properties.to_properties(keys, Some(&self.id)).into_iter()
    }
}

/// Edge snapshot; endpoints are kept as references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachedEdge {
    id: ElementId,
    label: String,
    out_v: ReferenceVertex,
    in_v: ReferenceVertex,
    properties: PropertyBag,
}

impl DetachedEdge {
    pub fn new(
        id: impl Into<ElementId>,
        label: impl Into<String>,
        out_v: ReferenceVertex,
        in_v: ReferenceVertex,
        properties: PropertyBag,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            out_v,
            in_v,
            properties,
        }
    }

    pub fn from_live(edge: &LiveEdge, with_properties: bool) -> Self {
        Self::new(
            edge.id().clone(),
            edge.label(),
            endpoint(edge, Direction::Out),
            endpoint(edge, Direction::In),
            snapshot(edge, with_properties),
        )
    }

    pub fn out_v(&self) -> &ReferenceVertex {
        &self.out_v
    }

    pub fn in_v(&self) -> &ReferenceVertex {
        &self.in_v
    }

    pub fn property_bag(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn attach(&self, graph: &Arc<dyn Graph>) -> GraphResult<Edge> {
        graph
            .edge(&self.id)
            .ok_or_else(|| GraphError::EdgeNotFound(self.id.clone()))
    }
}

impl Element for DetachedEdge {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }

    fn properties(&self, keys: &[&str]) -> std::vec::IntoIter<Property> {
        self.properties.to_properties(keys, Some(&self.id)).into_iter()
    }
}

fn snapshot(element: &impl Element, with_properties: bool) -> PropertyBag {
    if !with_properties {
        return PropertyBag::new();
    }
    element.properties(&[]).map(|p| (p.key, p.value)).collect()
}

/// Detach every element leaf of `value`, preserving its nesting shape
pub fn detach(value: &Value, with_properties: bool) -> Value {
    value.map_leaves(&mut |leaf| match leaf {
        Value::Vertex(v) => Value::Vertex(v.detach(with_properties)),
        Value::Edge(e) => Value::Edge(e.detach(with_properties)),
        other => other.clone(),
    })
}

/// Replace every element leaf of `value` with its id-and-label reference
pub fn reference(value: &Value) -> Value {
    value.map_leaves(&mut |leaf| match leaf {
        Value::Vertex(v) => Value::Vertex(v.reference()),
        Value::Edge(e) => Value::Edge(e.reference()),
        other => other.clone(),
    })
}

/// Resolve every element leaf of `value` against `graph` by id
pub fn attach(value: &Value, graph: &Arc<dyn Graph>) -> GraphResult<Value> {
    value.try_map_leaves(&mut |leaf| match leaf {
        Value::Vertex(v) => graph
            .vertex(v.id())
            .map(Value::Vertex)
            .ok_or_else(|| GraphError::VertexNotFound(v.id().clone())),
        Value::Edge(e) => graph
            .edge(e.id())
            .map(Value::Edge)
            .ok_or_else(|| GraphError::EdgeNotFound(e.id().clone())),
        other => Ok(other.clone()),
    })
}
