//! Integration tests for map-producing and branching steps
//!
//! Covers group, groupCount, project, valueMap, elementMap, coalesce,
//! choose and tail against the modern graph.

use indexmap::IndexMap;
use pathweave::process::step::Pick;
use pathweave::process::{anon, GraphTraversalSource, P};
use pathweave::structure::{attach, detach, Graph, MemoryGraph, Value};
use pathweave::TraversalError;
use std::sync::Arc;

fn modern() -> GraphTraversalSource {
    GraphTraversalSource::new(Arc::new(MemoryGraph::modern()))
}

fn map<const N: usize>(entries: [(Value, Value); N]) -> Value {
    Value::Map(entries.into_iter().collect::<IndexMap<_, _>>())
}

fn list(values: &[&str]) -> Value {
    Value::List(values.iter().map(|s| Value::from(*s)).collect())
}

#[test]
fn test_group_count_by_label() {
    let counts = modern().v_all().label().group_count().to_list().unwrap();
    assert_eq!(
        counts,
        vec![map([
            (Value::from("person"), Value::from(4)),
            (Value::from("software"), Value::from(2)),
        ])]
    );

    let by_key = modern()
        .v_all()
        .out(&["created"])
        .group_count_by(anon().values(&["name"]))
        .to_list()
        .unwrap();
    assert_eq!(
        by_key,
        vec![map([(Value::from("lop"), Value::from(3)), (Value::from("ripple"), Value::from(1))])]
    );
}

#[test]
fn test_group_count_counts_bulk() {
    let counts = modern()
        .v_all()
        .out(&["created"])
        .barrier()
        .values(&["name"])
        .group_count()
        .to_list()
        .unwrap();
    assert_eq!(
        counts,
        vec![map([(Value::from("lop"), Value::from(3)), (Value::from("ripple"), Value::from(1))])]
    );
}

#[test]
fn test_group_by_with_value_traversals() {
    let names = modern()
        .v_all()
        .group_by_with(anon().label(), anon().values(&["name"]))
        .to_list()
        .unwrap();
    assert_eq!(
        names,
        vec![map([
            (Value::from("person"), list(&["marko", "vadas", "josh", "peter"])),
            (Value::from("software"), list(&["lop", "ripple"])),
        ])]
    );

    let counted = modern()
        .v_all()
        .group_by_with(anon().label(), anon().count())
        .to_list()
        .unwrap();
    assert_eq!(
        counted,
        vec![map([(Value::from("person"), Value::from(4)), (Value::from("software"), Value::from(2))])]
    );
}

#[test]
fn test_group_skips_unproductive_keys_and_empty_input() {
    let by_age = modern()
        .v_all()
        .group_by(anon().values(&["age"]))
        .to_list()
        .unwrap();
    let groups = by_age[0].as_map().unwrap();
    assert_eq!(groups.len(), 4);
    assert!(groups.keys().all(|k| k.as_scalar().and_then(|s| s.as_integer()).is_some()));

    let empty = modern().v([2]).out(&[]).group().to_list().unwrap();
    assert_eq!(empty, vec![Value::Map(IndexMap::new())]);
}

#[test]
fn test_project_round_robins_by_traversals() {
    let rows = modern()
        .v([1, 4])
        .project(&["name", "created"], vec![anon().values(&["name"]), anon().out(&["created"]).count()])
        .to_list()
        .unwrap();
    assert_eq!(
        rows,
        vec![
            map([(Value::from("name"), Value::from("marko")), (Value::from("created"), Value::from(1))]),
            map([(Value::from("name"), Value::from("josh")), (Value::from("created"), Value::from(2))]),
        ]
    );

    let same = modern()
        .v([2])
        .project(&["a", "b"], vec![anon().values(&["name"])])
        .to_list()
        .unwrap();
    assert_eq!(
        same,
        vec![map([(Value::from("a"), Value::from("vadas")), (Value::from("b"), Value::from("vadas"))])]
    );
}

#[test]
fn test_project_omits_unproductive_keys() {
    let rows = modern()
        .v([3])
        .project(&["name", "age"], vec![anon().values(&["name"]), anon().values(&["age"])])
        .to_list()
        .unwrap();
    assert_eq!(rows, vec![map([(Value::from("name"), Value::from("lop"))])]);

    let mut dup = modern().v([1]).project(&["a", "a"], vec![]);
    assert!(matches!(dup.to_list(), Err(TraversalError::IllegalConfiguration(_))));
}

#[test]
fn test_value_map_lists_vertex_properties() {
    let all = modern().v([1]).value_map(&[]).to_list().unwrap();
    assert_eq!(
        all,
        vec![map([
            (Value::from("name"), Value::List(vec![Value::from("marko")])),
            (Value::from("age"), Value::List(vec![Value::from(29)])),
        ])]
    );

    let edge = modern().v([1]).out_e(&["knows"]).limit(1).value_map(&[]).to_list().unwrap();
    assert_eq!(edge, vec![map([(Value::from("weight"), Value::from(0.5))])]);
}

#[test]
fn test_element_map_includes_endpoints() {
    let rows = modern().v([1]).out_e(&["knows"]).limit(1).element_map(&[]).to_list().unwrap();
    assert_eq!(
        rows,
        vec![map([
            (Value::from("id"), Value::from(7)),
            (Value::from("label"), Value::from("knows")),
            (
                Value::from("IN"),
                map([(Value::from("id"), Value::from(2)), (Value::from("label"), Value::from("person"))]),
            ),
            (
                Value::from("OUT"),
                map([(Value::from("id"), Value::from(1)), (Value::from("label"), Value::from("person"))]),
            ),
            (Value::from("weight"), Value::from(0.5)),
        ])]
    );

    let vertex = modern().v([3]).element_map(&["lang"]).to_list().unwrap();
    assert_eq!(
        vertex,
        vec![map([
            (Value::from("id"), Value::from(3)),
            (Value::from("label"), Value::from("software")),
            (Value::from("lang"), Value::from("java")),
        ])]
    );
}

#[test]
fn test_map_steps_reject_non_elements() {
    let mut t = anon().inject(vec![Value::from(1)]).value_map(&[]);
    assert!(matches!(t.to_list(), Err(TraversalError::TypeMismatch { .. })));
}

#[test]
fn test_coalesce_takes_first_productive_branch() {
    let out = modern()
        .v([1, 2])
        .coalesce(vec![anon().out(&["created"]).values(&["name"]), anon().constant("none")])
        .to_list()
        .unwrap();
    assert_eq!(out, vec![Value::from("lop"), Value::from("none")]);

    let dropped = modern()
        .v([2])
        .coalesce(vec![anon().out(&[]), anon().in_(&["created"])])
        .to_list()
        .unwrap();
    assert!(dropped.is_empty());
}

#[test]
fn test_choose_if_then_else() {
    let out = modern()
        .v([1, 2, 3])
        .choose_if(
            anon().has("age", P::gt(28)),
            anon().values(&["age"]),
            anon().values(&["name"]),
        )
        .to_list()
        .unwrap();
    assert_eq!(out, vec![Value::from(29), Value::from("vadas"), Value::from("lop")]);
}

#[test]
fn test_choose_options_and_pass_through() {
    let out = modern()
        .v_all()
        .choose(anon().label())
        .option(Pick::Value(Value::from("software")), anon().values(&["lang"]))
        .option(Pick::None, anon().constant("other"))
        .to_list()
        .unwrap();
    assert_eq!(
        out,
        ["other", "other", "java", "other", "java", "other"]
            .iter()
            .map(|s| Value::from(*s))
            .collect::<Vec<_>>()
    );

    let passed = modern()
        .v([2, 3])
        .choose(anon().label())
        .option(Pick::Value(Value::from("software")), anon().in_(&["created"]))
        .values(&["name"])
        .to_list()
        .unwrap();
    assert_eq!(
        passed,
        ["vadas", "marko", "josh", "peter"].iter().map(|s| Value::from(*s)).collect::<Vec<_>>()
    );
}

#[test]
fn test_option_requires_choose() {
    let mut orphan = modern().v([1]).out(&[]).option(Pick::None, anon().constant(1));
    assert!(matches!(orphan.to_list(), Err(TraversalError::IllegalConfiguration(_))));

    let mut twice = modern()
        .v([1])
        .choose(anon().label())
        .option(Pick::None, anon().constant(1))
        .option(Pick::None, anon().constant(2));
    assert!(matches!(twice.to_list(), Err(TraversalError::IllegalConfiguration(_))));
}

#[test]
fn test_tail_keeps_last_units_of_bulk() {
    let plain = anon()
        .inject(vec![Value::from(1), Value::from(2), Value::from(3)])
        .tail(2)
        .to_list()
        .unwrap();
    assert_eq!(plain, vec![Value::from(2), Value::from(3)]);

    let bulked = modern()
        .v_all()
        .out(&["created"])
        .barrier()
        .values(&["name"])
        .tail(2)
        .to_list()
        .unwrap();
    assert_eq!(bulked, vec![Value::from("lop"), Value::from("ripple")]);

    let none = modern().v_all().tail(0).to_list().unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_grouped_elements_detach_and_attach() {
    let graph = Arc::new(MemoryGraph::modern());
    let g = GraphTraversalSource::new(graph.clone());
    let grouped = g.v_all().out(&["created"]).group().to_list().unwrap().remove(0);

    let detached = detach(&grouped, true);
    let entries = detached.as_map().unwrap();
    assert_eq!(entries.len(), 2);
    for (key, members) in entries {
        assert!(!key.as_vertex().unwrap().is_live());
        assert!(members.as_list().unwrap().iter().all(|m| !m.as_vertex().unwrap().is_live()));
    }

    let json = serde_json::to_string(&detached).unwrap();
    let decoded: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, grouped);

    let dyn_graph: Arc<dyn Graph> = graph;
    let live = attach(&decoded, &dyn_graph).unwrap();
    let (lop, members) = live.as_map().unwrap().get_index(0).unwrap();
    assert!(lop.as_vertex().unwrap().is_live());
    assert_eq!(members.as_list().unwrap().len(), 3);
}
