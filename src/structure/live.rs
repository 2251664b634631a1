//! Live, graph-bound element handles
//!
//! A live handle stores only identity and structure; every property read
//! goes back to the owning graph, so mutations made through the graph are
//! visible immediately.

use super::element::{Edge, Element, Vertex};
use super::graph::{EdgeRecord, Graph};
use super::property::{Property, PropertyValue};
use super::types::{Direction, ElementId, ElementKind};
use std::fmt;
use std::sync::Arc;

/// Vertex owned by a graph
#[derive(Clone)]
pub struct LiveVertex {
    id: ElementId,
    label: String,
    graph: Arc<dyn Graph>,
}

impl LiveVertex {
    pub fn new(id: ElementId, label: impl Into<String>, graph: Arc<dyn Graph>) -> Self {
        Self {
            id,
            label: label.into(),
            graph,
        }
    }

    pub fn graph(&self) -> &Arc<dyn Graph> {
        &self.graph
    }

    /// Incident edges in `direction`, restricted to `labels` unless empty
    pub fn edges(&self, direction: Direction, labels: &[String]) -> Vec<Edge> {
        self.graph
            .edges_of(&self.id, direction, labels)
            .into_iter()
            .filter_map(|edge_id| {
                let record = self.graph.edge_record(&edge_id)?;
                Some(Edge::Live(LiveEdge::new(edge_id, record, Arc::clone(&self.graph))))
            })
            .collect()
    }

    /// Adjacent vertices reached over incident edges
    pub fn vertices(&self, direction: Direction, labels: &[String]) -> Vec<Vertex> {
        let mut result = Vec::new();
        for edge_id in self.graph.edges_of(&self.id, direction, labels) {
            let Some(record) = self.graph.edge_record(&edge_id) else {
                continue;
            };
            let other = match direction {
                Direction::Out => record.in_v,
                Direction::In => record.out_v,
                Direction::Both => {
                    if record.out_v == self.id {
                        record.in_v
                    } else {
                        record.out_v
                    }
                }
            };
            if let Some(label) = self.graph.vertex_label(&other) {
                result.push(Vertex::Live(LiveVertex::new(other, label, Arc::clone(&self.graph))));
            }
        }
        result
    }
}

impl Element for LiveVertex {
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
        self.graph
            .properties(ElementKind::Vertex, &self.id)
            .map(|bag| bag.to_properties(keys, Some(&self.id)))
            .unwrap_or_default()
            .into_iter()
    }
}

impl fmt::Debug for LiveVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveVertex")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

/// Edge owned by a graph
#[derive(Clone)]
pub struct LiveEdge {
    id: ElementId,
    label: String,
    out_v: ElementId,
    in_v: ElementId,
    graph: Arc<dyn Graph>,
}

impl LiveEdge {
    pub fn new(id: ElementId, record: EdgeRecord, graph: Arc<dyn Graph>) -> Self {
        Self {
            id,
            label: record.label,
            out_v: record.out_v,
            in_v: record.in_v,
            graph,
        }
    }

    pub fn out_id(&self) -> &ElementId {
        &self.out_v
    }

    pub fn in_id(&self) -> &ElementId {
        &self.in_v
    }

    pub fn graph(&self) -> &Arc<dyn Graph> {
        &self.graph
    }

    /// Endpoint vertex on the given side; `Both` is not a single side
    pub fn vertex(&self, direction: Direction) -> Option<Vertex> {
        let id = match direction {
            Direction::Out => &self.out_v,
            Direction::In => &self.in_v,
            Direction::Both => return None,
        };
        let label = self.graph.vertex_label(id)?;
        Some(Vertex::Live(LiveVertex::new(id.clone(), label, Arc::clone(&self.graph))))
    }

    pub fn property_value(&self, key: &str) -> Option<PropertyValue> {
        self.values(&[key]).next()
    }
}

impl Element for LiveEdge {
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
        self.graph
            .properties(ElementKind::Edge, &self.id)
            .map(|bag| bag.to_properties(keys, Some(&self.id)))
            .unwrap_or_default()
            .into_iter()
    }
}

impl fmt::Debug for LiveEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveEdge")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("out_v", &self.out_v)
            .field("in_v", &self.in_v)
            .finish()
    }
}
