//! Storage collaborator interface
//!
//! The traversal engine never assumes a storage format. A backend only has
//! to answer id, label, adjacency and property lookups; the engine wraps
//! the answers in live element handles.

use super::element::{Edge, Vertex};
use super::live::{LiveEdge, LiveVertex};
use super::property::PropertyBag;
use super::types::{Direction, ElementId, ElementKind};
use std::sync::Arc;
use thiserror::Error;

/// Storage-side errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Vertex not found
    #[error("Vertex not found: {0}")]
    VertexNotFound(ElementId),

    /// Edge not found
    #[error("Edge not found: {0}")]
    EdgeNotFound(ElementId),

    /// Neither a vertex nor an edge carries this id
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    /// Element id already in use
    #[error("Element id already exists: {0}")]
    DuplicateId(ElementId),

    /// Invalid edge: endpoint vertex missing
    #[error("Invalid edge: {0}")]
    InvalidEdge(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Structural data of an edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub label: String,
    pub out_v: ElementId,
    pub in_v: ElementId,
}

/// Capability set the engine requires from graph storage
pub trait Graph: Send + Sync {
    /// All vertex ids, in storage order
    fn vertex_ids(&self) -> Vec<ElementId>;

    /// Label of a vertex, `None` when absent
    fn vertex_label(&self, id: &ElementId) -> Option<String>;

    /// Label and endpoints of an edge, `None` when absent
    fn edge_record(&self, id: &ElementId) -> Option<EdgeRecord>;

    /// Current property snapshot of an element
    fn properties(&self, kind: ElementKind, id: &ElementId) -> Option<PropertyBag>;

    /// Ids of edges incident to `vertex` in `direction`, restricted to
    /// `labels` unless empty. A self-loop appears twice for `Both`.
    fn edges_of(&self, vertex: &ElementId, direction: Direction, labels: &[String]) -> Vec<ElementId>;
}

/// Live-handle construction on top of a shared graph
pub trait GraphExt {
    fn vertex(&self, id: &ElementId) -> Option<Vertex>;
    fn edge(&self, id: &ElementId) -> Option<Edge>;
    fn vertices(&self) -> Vec<Vertex>;
}

impl GraphExt for Arc<dyn Graph> {
    fn vertex(&self, id: &ElementId) -> Option<Vertex> {
        let label = self.vertex_label(id)?;
        Some(Vertex::Live(LiveVertex::new(id.clone(), label, Arc::clone(self))))
    }

    fn edge(&self, id: &ElementId) -> Option<Edge> {
        let record = self.edge_record(id)?;
        Some(Edge::Live(LiveEdge::new(id.clone(), record, Arc::clone(self))))
    }

    fn vertices(&self) -> Vec<Vertex> {
        self.vertex_ids().iter().filter_map(|id| self.vertex(id)).collect()
    }
}
