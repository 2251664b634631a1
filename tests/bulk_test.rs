//! Integration tests for bulking
//!
//! A traverser of bulk `n` stands for `n` identical traversers. Results
//! must not depend on whether equal traversers were merged.

use pathweave::process::{anon, GraphTraversalSource, Traverser};
use pathweave::structure::{MemoryGraph, Value};
use pathweave::EngineConfig;
use std::sync::Arc;

fn modern() -> GraphTraversalSource {
    GraphTraversalSource::new(Arc::new(MemoryGraph::modern()))
}

fn marko(g: &GraphTraversalSource) -> Value {
    g.v([1]).to_list().unwrap().remove(0)
}

#[test]
fn test_bulk_flows_through_navigation() {
    let g = modern();
    let mut t = anon().out(&[]).count();
    t.add_start(Traverser::new(marko(&g)).with_bulk(3));
    assert_eq!(t.to_list().unwrap(), vec![Value::from(9)]);
}

#[test]
fn test_to_list_expands_bulk() {
    let mut t = anon().constant("x");
    t.add_start(Traverser::new(1).with_bulk(3));
    assert_eq!(t.to_list().unwrap(), vec![Value::from("x"); 3]);

    t.reset();
    t.add_start(Traverser::new(1).with_bulk(3));
    let traversers = t.to_traverser_list().unwrap();
    assert_eq!(traversers.len(), 1);
    assert_eq!(traversers[0].bulk(), 3);
}

#[test]
fn test_barrier_merges_equal_traversers() {
    let traversers = anon()
        .inject(vec![Value::from(1), Value::from(1), Value::from(2)])
        .barrier()
        .to_traverser_list()
        .unwrap();
    let bulks: Vec<(Value, u64)> = traversers.iter().map(|t| (t.value().clone(), t.bulk())).collect();
    assert_eq!(bulks, vec![(Value::from(1), 2), (Value::from(2), 1)]);
}

#[test]
fn test_barrier_does_not_change_counts() {
    let g = modern();
    let plain = g.v_all().both(&[]).both(&[]).count().to_list().unwrap();
    let merged = g.v_all().both(&[]).barrier().both(&[]).count().to_list().unwrap();
    assert_eq!(plain, merged);

    let plain = g.v([1]).repeat(anon().both(&[])).times(3).count().to_list().unwrap();
    let merged = g
        .v([1])
        .repeat(anon().both(&[]).barrier())
        .times(3)
        .count()
        .to_list()
        .unwrap();
    assert_eq!(plain, merged);
}

#[test]
fn test_small_barrier_batches() {
    let g = modern().with_config(EngineConfig::default().with_barrier_size(1));
    let names = g.v_all().barrier().values(&["name"]).to_list().unwrap();
    assert_eq!(names.len(), 6);
    assert_eq!(names[0], Value::from("marko"));
}

#[test]
fn test_numeric_reductions_weight_by_bulk() {
    let mut sum = anon().sum();
    sum.add_start(Traverser::new(2).with_bulk(3));
    sum.add_start(Traverser::new(4));
    assert_eq!(sum.to_list().unwrap(), vec![Value::from(10)]);

    let mut mean = anon().mean();
    mean.add_start(Traverser::new(2).with_bulk(3));
    mean.add_start(Traverser::new(4));
    assert_eq!(mean.to_list().unwrap(), vec![Value::from(2.5)]);
}

#[test]
fn test_range_counts_bulk() {
    let mut t = anon().limit(2);
    t.add_start(Traverser::new("x").with_bulk(5));
    let traversers = t.to_traverser_list().unwrap();
    assert_eq!(traversers.len(), 1);
    assert_eq!(traversers[0].bulk(), 2);

    let mut t = anon().range(1, Some(3)).count();
    t.add_start(Traverser::new("x").with_bulk(2));
    t.add_start(Traverser::new("y").with_bulk(2));
    assert_eq!(t.to_list().unwrap(), vec![Value::from(2)]);
}

#[test]
fn test_dedup_collapses_bulk() {
    let mut t = anon().dedup().count();
    t.add_start(Traverser::new("x").with_bulk(4));
    assert_eq!(t.to_list().unwrap(), vec![Value::from(1)]);
}
