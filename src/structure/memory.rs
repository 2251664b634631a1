//! In-memory graph storage
//!
//! Reference implementation of the [`Graph`] collaborator. Vertices and
//! edges share one id space; adjacency lists are kept per vertex.

use super::graph::{EdgeRecord, Graph, GraphError, GraphResult};
use super::property::{PropertyBag, PropertyValue};
use super::types::{Direction, ElementId, ElementKind};
use indexmap::IndexMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
struct VertexData {
    label: String,
    properties: PropertyBag,
    outgoing: Vec<ElementId>,
    incoming: Vec<ElementId>,
}

#[derive(Debug, Clone)]
struct EdgeData {
    record: EdgeRecord,
    properties: PropertyBag,
}

#[derive(Debug, Default)]
struct Store {
    vertices: IndexMap<ElementId, VertexData>,
    edges: IndexMap<ElementId, EdgeData>,
    next_id: i64,
}

impl Store {
    fn contains(&self, id: &ElementId) -> bool {
        self.vertices.contains_key(id) || self.edges.contains_key(id)
    }

    fn allocate_id(&mut self) -> ElementId {
        loop {
            self.next_id += 1;
            let id = ElementId::Int(self.next_id);
            if !self.contains(&id) {
                return id;
            }
        }
    }

    fn properties_mut(&mut self, id: &ElementId) -> GraphResult<&mut PropertyBag> {
        if let Some(vertex) = self.vertices.get_mut(id) {
            return Ok(&mut vertex.properties);
        }
        match self.edges.get_mut(id) {
            Some(edge) => Ok(&mut edge.properties),
            None => Err(GraphError::ElementNotFound(id.clone())),
        }
    }
}

/// Thread-safe in-memory property graph
#[derive(Debug, Default)]
pub struct MemoryGraph {
    store: RwLock<Store>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a vertex with a generated integer id
    pub fn add_vertex<I, K, V>(&self, label: impl Into<String>, properties: I) -> ElementId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        let mut store = self.write();
        let id = store.allocate_id();
        store.vertices.insert(
            id.clone(),
            VertexData {
                label: label.into(),
                properties: properties.into_iter().collect(),
                outgoing: Vec::new(),
                incoming: Vec::new(),
            },
        );
        id
    }

    /// Create a vertex with a caller-chosen id
    pub fn add_vertex_with_id<I, K, V>(
        &self,
        id: impl Into<ElementId>,
        label: impl Into<String>,
        properties: I,
    ) -> GraphResult<ElementId>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        let id = id.into();
        let mut store = self.write();
        if store.contains(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        store.vertices.insert(
            id.clone(),
            VertexData {
                label: label.into(),
                properties: properties.into_iter().collect(),
                outgoing: Vec::new(),
                incoming: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Create an edge `out -label-> in` with a generated id
    pub fn add_edge<I, K, V>(
        &self,
        out_v: &ElementId,
        label: impl Into<String>,
        in_v: &ElementId,
        properties: I,
    ) -> GraphResult<ElementId>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        let mut store = self.write();
        let id = store.allocate_id();
        Self::insert_edge(&mut store, id, out_v, label.into(), in_v, properties.into_iter().collect())
    }

    /// Create an edge with a caller-chosen id
    pub fn add_edge_with_id<I, K, V>(
        &self,
        id: impl Into<ElementId>,
        out_v: &ElementId,
        label: impl Into<String>,
        in_v: &ElementId,
        properties: I,
    ) -> GraphResult<ElementId>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        let id = id.into();
        let mut store = self.write();
        if store.contains(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        Self::insert_edge(&mut store, id, out_v, label.into(), in_v, properties.into_iter().collect())
    }

    fn insert_edge(
        store: &mut Store,
        id: ElementId,
        out_v: &ElementId,
        label: String,
        in_v: &ElementId,
        properties: PropertyBag,
    ) -> GraphResult<ElementId> {
        if !store.vertices.contains_key(out_v) {
            return Err(GraphError::InvalidEdge(format!("source vertex {} does not exist", out_v)));
        }
        if !store.vertices.contains_key(in_v) {
            return Err(GraphError::InvalidEdge(format!("target vertex {} does not exist", in_v)));
        }

        if let Some(source) = store.vertices.get_mut(out_v) {
            source.outgoing.push(id.clone());
        }
        if let Some(target) = store.vertices.get_mut(in_v) {
            target.incoming.push(id.clone());
        }
        store.edges.insert(
            id.clone(),
            EdgeData {
                record: EdgeRecord {
                    label,
                    out_v: out_v.clone(),
                    in_v: in_v.clone(),
                },
                properties,
            },
        );
        Ok(id)
    }

    /// Replace the values of `key` on a vertex or edge
    pub fn set_property(
        &self,
        id: &ElementId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<()> {
        self.write().properties_mut(id)?.set(key, value);
        Ok(())
    }

    /// Append a value to `key` on a vertex or edge
    pub fn add_property(
        &self,
        id: &ElementId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<()> {
        self.write().properties_mut(id)?.add(key, value);
        Ok(())
    }

    /// Delete a vertex and every edge incident to it
    pub fn remove_vertex(&self, id: &ElementId) -> GraphResult<()> {
        let mut store = self.write();
        let vertex = store
            .vertices
            .shift_remove(id)
            .ok_or_else(|| GraphError::VertexNotFound(id.clone()))?;

        for edge_id in vertex.outgoing.iter().chain(vertex.incoming.iter()) {
            if let Some(edge) = store.edges.shift_remove(edge_id) {
                let other = if &edge.record.out_v == id {
                    &edge.record.in_v
                } else {
                    &edge.record.out_v
                };
                if let Some(adjacent) = store.vertices.get_mut(other) {
                    adjacent.outgoing.retain(|e| e != edge_id);
                    adjacent.incoming.retain(|e| e != edge_id);
                }
            }
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.read().vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.read().edges.len()
    }

    /// The six-vertex, six-edge toy graph of people and software
    pub fn modern() -> Self {
        let graph = MemoryGraph::new();
        let people: [(i64, &str, i64); 4] = [(1, "marko", 29), (2, "vadas", 27), (4, "josh", 32), (6, "peter", 35)];
        let software: [(i64, &str); 2] = [(3, "lop"), (5, "ripple")];

        let mut store = graph.write();
        for (id, name, age) in people {
            store.vertices.insert(
                ElementId::Int(id),
                VertexData {
                    label: "person".to_string(),
                    properties: [("name", PropertyValue::from(name)), ("age", PropertyValue::from(age))]
                        .into_iter()
                        .collect(),
                    outgoing: Vec::new(),
                    incoming: Vec::new(),
                },
            );
        }
        for (id, name) in software {
            store.vertices.insert(
                ElementId::Int(id),
                VertexData {
                    label: "software".to_string(),
                    properties: [("name", name), ("lang", "java")].into_iter().collect(),
                    outgoing: Vec::new(),
                    incoming: Vec::new(),
                },
            );
        }
        store.vertices.sort_keys();

        let edges: [(i64, i64, &str, i64, f64); 6] = [
            (7, 1, "knows", 2, 0.5),
            (8, 1, "knows", 4, 1.0),
            (9, 1, "created", 3, 0.4),
            (10, 4, "created", 5, 1.0),
            (11, 4, "created", 3, 0.4),
            (12, 6, "created", 3, 0.2),
        ];
        for (id, out_v, label, in_v, weight) in edges {
            let mut properties = PropertyBag::new();
            properties.set("weight", weight);
            // endpoints were inserted above
            let _ = Self::insert_edge(
                &mut store,
                ElementId::Int(id),
                &ElementId::Int(out_v),
                label.to_string(),
                &ElementId::Int(in_v),
                properties,
            );
        }
        store.next_id = 12;
        drop(store);
        graph
    }
}

impl Graph for MemoryGraph {
    fn vertex_ids(&self) -> Vec<ElementId> {
        self.read().vertices.keys().cloned().collect()
    }

    fn vertex_label(&self, id: &ElementId) -> Option<String> {
        self.read().vertices.get(id).map(|v| v.label.clone())
    }

    fn edge_record(&self, id: &ElementId) -> Option<EdgeRecord> {
        self.read().edges.get(id).map(|e| e.record.clone())
    }

    fn properties(&self, kind: ElementKind, id: &ElementId) -> Option<PropertyBag> {
        let store = self.read();
        match kind {
            ElementKind::Vertex => store.vertices.get(id).map(|v| v.properties.clone()),
            ElementKind::Edge => store.edges.get(id).map(|e| e.properties.clone()),
            ElementKind::VertexProperty => None,
        }
    }

    fn edges_of(&self, vertex: &ElementId, direction: Direction, labels: &[String]) -> Vec<ElementId> {
        let store = self.read();
        let Some(data) = store.vertices.get(vertex) else {
            return Vec::new();
        };
        let candidates: Vec<&ElementId> = match direction {
            Direction::Out => data.outgoing.iter().collect(),
            Direction::In => data.incoming.iter().collect(),
            Direction::Both => data.outgoing.iter().chain(data.incoming.iter()).collect(),
        };
        candidates
            .into_iter()
            .filter(|edge_id| {
                labels.is_empty()
                    || store
                        .edges
                        .get(*edge_id)
                        .map(|e| labels.iter().any(|l| l == &e.record.label))
                        .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_shape() {
        let graph = MemoryGraph::modern();
        assert_eq!(graph.vertex_count(), 6);
        assert_eq!(graph.edge_count(), 6);
        assert_eq!(
            graph.vertex_ids(),
            (1..=6).map(ElementId::Int).collect::<Vec<_>>()
        );
        let marko = graph.properties(ElementKind::Vertex, &ElementId::Int(1)).unwrap();
        assert_eq!(marko.get("name"), &[PropertyValue::from("marko")]);
    }

    #[test]
    fn test_adjacency_and_label_filter() {
        let graph = MemoryGraph::modern();
        let marko = ElementId::Int(1);
        assert_eq!(graph.edges_of(&marko, Direction::Out, &[]).len(), 3);
        assert_eq!(graph.edges_of(&marko, Direction::Out, &["knows".to_string()]).len(), 2);
        assert_eq!(graph.edges_of(&marko, Direction::In, &[]).len(), 0);
        assert_eq!(graph.edges_of(&ElementId::Int(3), Direction::In, &[]).len(), 3);
    }

    #[test]
    fn test_generated_ids_skip_taken() {
        let graph = MemoryGraph::modern();
        let id = graph.add_vertex("person", [("name", "stephen")]);
        assert_eq!(id, ElementId::Int(13));
        let e = graph.add_edge(&id, "knows", &ElementId::Int(1), Vec::<(String, PropertyValue)>::new()).unwrap();
        assert_eq!(e, ElementId::Int(14));
    }

    #[test]
    fn test_edge_validation() {
        let graph = MemoryGraph::new();
        let a = graph.add_vertex("person", Vec::<(String, PropertyValue)>::new());
        let result = graph.add_edge(&a, "knows", &ElementId::Int(99), Vec::<(String, PropertyValue)>::new());
        assert!(matches!(result, Err(GraphError::InvalidEdge(_))));
        assert_eq!(
            graph.add_vertex_with_id(a.clone(), "person", Vec::<(String, PropertyValue)>::new()),
            Err(GraphError::DuplicateId(a))
        );
    }

    #[test]
    fn test_remove_vertex_drops_incident_edges() {
        let graph = MemoryGraph::modern();
        graph.remove_vertex(&ElementId::Int(4)).unwrap();
        assert_eq!(graph.vertex_count(), 5);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edges_of(&ElementId::Int(1), Direction::Out, &[]).len(), 2);
        assert!(graph.remove_vertex(&ElementId::Int(4)).is_err());
    }

    #[test]
    fn test_multi_properties() {
        let graph = MemoryGraph::modern();
        let id = ElementId::Int(1);
        graph.add_property(&id, "location", "santa fe").unwrap();
        graph.add_property(&id, "location", "brussels").unwrap();
        let bag = graph.properties(ElementKind::Vertex, &id).unwrap();
        assert_eq!(bag.get("location").len(), 2);
        assert!(graph.set_property(&ElementId::Int(77), "x", 1).is_err());
    }

    #[test]
    fn test_property_update_on_edges_and_missing_ids() {
        let graph = MemoryGraph::modern();
        graph.set_property(&ElementId::Int(7), "weight", 0.9).unwrap();
        let bag = graph.properties(ElementKind::Edge, &ElementId::Int(7)).unwrap();
        assert_eq!(bag.get("weight")[0].as_f64(), Some(0.9));

        assert_eq!(
            graph.add_property(&ElementId::Int(77), "weight", 1.0),
            Err(GraphError::ElementNotFound(ElementId::Int(77)))
        );
    }
}
