//! Reference elements: id and label only

use super::element::Element;
use super::live::LiveEdge;
use super::property::Property;
use super::types::{Direction, ElementId, ElementKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceVertex {
    id: ElementId,
    label: String,
}

impl ReferenceVertex {
    pub fn new(id: impl Into<ElementId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl Element for ReferenceVertex {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Vertex
    }

    fn properties(&self, _keys: &[&str]) -> std::vec::IntoIter<Property> {
        Vec::new().into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceEdge {
    id: ElementId,
    label: String,
    out_v: ReferenceVertex,
    in_v: ReferenceVertex,
}

impl ReferenceEdge {
    pub fn new(
        id: impl Into<ElementId>,
        label: impl Into<String>,
        out_v: ReferenceVertex,
        in_v: ReferenceVertex,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            out_v,
            in_v,
        }
    }

    pub fn from_live(edge: &LiveEdge) -> Self {
        Self::new(
            edge.id().clone(),
            edge.label(),
            endpoint(edge, Direction::Out),
            endpoint(edge, Direction::In),
        )
    }

    pub fn out_v(&self) -> &ReferenceVertex {
        &self.out_v
    }

    pub fn in_v(&self) -> &ReferenceVertex {
        &self.in_v
    }
}

/// Reference to one endpoint of a live edge; the label is empty when the
/// endpoint has been removed from the graph
pub(crate) fn endpoint(edge: &LiveEdge, direction: Direction) -> ReferenceVertex {
    let id = match direction {
        Direction::In => edge.in_id(),
        _ => edge.out_id(),
    };
    let label = edge.graph().vertex_label(id).unwrap_or_default();
    ReferenceVertex::new(id.clone(), label)
}

impl Element for ReferenceEdge {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }

    fn properties(&self, _keys: &[&str]) -> std::vec::IntoIter<Property> {
        Vec::new().into_iter()
    }
}
