//! Integration tests for detached results
//!
//! Verifies that detached traversal output survives graph mutation,
//! serializes, and can be bound to a graph again.

use pathweave::process::{anon, GraphTraversalSource, Traverser};
use pathweave::structure::{
    attach, detach, reference, Element, ElementId, Graph, GraphError, MemoryGraph, Value, Vertex,
};
use pathweave::TraversalError;
use std::sync::Arc;

fn setup() -> (Arc<MemoryGraph>, GraphTraversalSource) {
    let graph = Arc::new(MemoryGraph::modern());
    let g = GraphTraversalSource::new(graph.clone());
    (graph, g)
}

#[test]
fn test_snapshot_survives_mutation() {
    let (graph, g) = setup();
    let marko = g.v([1]).to_list().unwrap().remove(0);
    let snapshot = detach(&marko, true);

    graph.set_property(&ElementId::Int(1), "age", 30).unwrap();

    let live_age = g.v([1]).values(&["age"]).to_list().unwrap();
    assert_eq!(live_age, vec![Value::from(30)]);

    let mut t = anon().values(&["age"]);
    t.add_start(Traverser::new(snapshot));
    assert_eq!(t.to_list().unwrap(), vec![Value::from(29)]);
}

#[test]
fn test_detach_without_properties() {
    let (_, g) = setup();
    let marko = g.v([1]).to_list().unwrap().remove(0);
    let bare = detach(&marko, false);
    let vertex = bare.as_vertex().unwrap();
    assert!(!vertex.is_live());
    assert_eq!(vertex.id(), &ElementId::Int(1));
    assert_eq!(vertex.label(), "person");
    assert!(vertex.keys().is_empty());
}

#[test]
fn test_path_json_round_trip_and_attach() {
    let (graph, g) = setup();
    let paths = g.v([1]).out_e(&["created"]).in_v().path().to_list().unwrap();
    assert_eq!(paths.len(), 1);

    let json = serde_json::to_string(&detach(&paths[0], true)).unwrap();
    let decoded: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, paths[0]);

    let dyn_graph: Arc<dyn Graph> = graph;
    let live = attach(&decoded, &dyn_graph).unwrap();
    let objects = live.as_path().unwrap().objects();
    assert_eq!(objects.len(), 3);
    assert!(objects[0].as_vertex().is_some_and(Vertex::is_live));
    assert!(objects[1].as_edge().is_some_and(|e| e.is_live()));
}

#[test]
fn test_live_elements_refuse_to_serialize() {
    let (_, g) = setup();
    let marko = g.v([1]).to_list().unwrap().remove(0);
    assert!(serde_json::to_string(&marko).is_err());
}

#[test]
fn test_attach_missing_vertex() {
    let (graph, g) = setup();
    let detached = detach(&g.v([2]).to_list().unwrap().remove(0), true);
    graph.remove_vertex(&ElementId::Int(2)).unwrap();

    let dyn_graph: Arc<dyn Graph> = graph;
    let err = attach(&detached, &dyn_graph).unwrap_err();
    assert_eq!(err, GraphError::VertexNotFound(ElementId::Int(2)));
}

#[test]
fn test_detached_edge_endpoints() {
    let (_, g) = setup();
    let edge = g.v([1]).out_e(&["knows"]).limit(1).to_list().unwrap().remove(0);
    let detached = detach(&edge, true);

    let mut t = anon().out_v().id();
    t.add_start(Traverser::new(detached.clone()));
    assert_eq!(t.to_list().unwrap(), vec![Value::from(1)]);

    let mut t = anon().both_v().label();
    t.add_start(Traverser::new(detached.clone()));
    assert_eq!(t.to_list().unwrap(), vec![Value::from("person"), Value::from("person")]);

    let mut t = anon().values(&["weight"]);
    t.add_start(Traverser::new(detached));
    assert_eq!(t.to_list().unwrap(), vec![Value::from(0.5)]);
}

#[test]
fn test_navigation_needs_a_live_vertex() {
    let (_, g) = setup();
    let detached = detach(&g.v([1]).to_list().unwrap().remove(0), true);
    let mut t = anon().out(&[]);
    t.add_start(Traverser::new(detached));
    let err = t.to_list().unwrap_err();
    assert!(matches!(err, TraversalError::TypeMismatch { ref step, .. } if step.starts_with("out@")));
}

#[test]
fn test_reference_keeps_identity_only() {
    let (_, g) = setup();
    let names = g.v([1]).out(&["knows"]).fold().to_list().unwrap().remove(0);
    let refs = reference(&names);
    let list = refs.as_list().unwrap();
    assert_eq!(list.len(), 2);
    for (referenced, original) in list.iter().zip(names.as_list().unwrap()) {
        assert_eq!(referenced, original);
        assert!(referenced.as_vertex().unwrap().keys().is_empty());
    }
}

#[test]
fn test_traverser_detach_keeps_bulk_and_path() {
    let (graph, g) = setup();
    let mut traversers = g.v([1]).out(&["created"]).to_traverser_list().unwrap();
    let original = traversers.remove(0).with_bulk(3);
    let detached = original.detach(true);
    assert_eq!(detached.bulk(), 3);
    assert_eq!(detached.path().size(), 2);
    assert!(!detached.value().as_vertex().unwrap().is_live());

    let dyn_graph: Arc<dyn Graph> = graph;
    let back = detached.attach(&dyn_graph).unwrap();
    assert!(back.can_merge(&original));
}
