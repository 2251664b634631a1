//! Integration tests for the traversal lifecycle
//!
//! Verifies lazy pulling, failure handling, reset and the common step
//! families against the modern graph.

use pathweave::process::step::{Order, Step};
use pathweave::process::{anon, GraphTraversalSource, TraversalState, P};
use pathweave::structure::{ElementId, MemoryGraph, Value};
use pathweave::TraversalError;
use std::sync::Arc;

fn modern() -> GraphTraversalSource {
    GraphTraversalSource::new(Arc::new(MemoryGraph::modern()))
}

fn names(values: &[&str]) -> Vec<Value> {
    values.iter().map(|s| Value::from(*s)).collect()
}

#[test]
fn test_lifecycle() {
    let mut t = modern().v([1]).out(&["knows"]).values(&["name"]);
    assert_eq!(t.state(), TraversalState::Building);

    assert_eq!(t.explain().unwrap(), vec!["start", "out", "values"]);
    assert_eq!(t.state(), TraversalState::Locked);

    assert!(t.has_next().unwrap());
    assert_eq!(t.try_next().unwrap(), Some(Value::from("vadas")));
    assert_eq!(t.try_next().unwrap(), Some(Value::from("josh")));
    assert!(!t.has_next().unwrap());
    assert_eq!(t.try_next().unwrap(), None);
}

#[test]
fn test_failure_poisons_until_reset() {
    let mut t = modern().v_all().filter(|t| {
        if t.value().element_id() == Some(&ElementId::Int(3)) {
            Err(TraversalError::predicate("filter", "lop is not allowed"))
        } else {
            Ok(true)
        }
    });

    assert!(t.try_next().unwrap().is_some());
    assert!(t.try_next().unwrap().is_some());
    assert!(matches!(t.try_next(), Err(TraversalError::PredicateFailure { .. })));
    assert_eq!(t.state(), TraversalState::Failed);
    match t.try_next() {
        Err(TraversalError::Poisoned(cause)) => {
            assert!(matches!(*cause, TraversalError::PredicateFailure { .. }));
            assert!(cause.to_string().contains("lop is not allowed"));
        }
        other => panic!("expected a poisoned traversal, got {:?}", other),
    }

    t.reset();
    assert_eq!(t.state(), TraversalState::Locked);
    assert!(t.try_next().unwrap().is_some());
}

#[test]
fn test_iterator_yields_error_once() {
    let results: Vec<_> = modern().v([1]).values(&["name"]).out(&[]).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(TraversalError::TypeMismatch { .. })));

    let ok: Result<Vec<Value>, _> = modern().v([1]).out(&["knows"]).id().collect();
    assert_eq!(ok.unwrap(), vec![Value::from(2), Value::from(4)]);
}

#[test]
fn test_build_errors_surface_on_first_pull() {
    let mut t = modern().v([1]).inject(vec![Value::from(1)]);
    assert!(matches!(t.to_list(), Err(TraversalError::IllegalConfiguration(_))));
    assert!(matches!(t.explain(), Err(TraversalError::IllegalConfiguration(_))));
}

#[test]
fn test_nested_build_errors_fail_the_parent() {
    let misplaced = || anon().out(&[]).inject(vec![Value::from(1)]);

    let nested = vec![
        modern().v([1]).local(misplaced()),
        modern().v([1]).repeat(misplaced()).times(1),
        modern().v([1]).union(vec![anon().out(&[]), misplaced()]),
        modern().v([1]).where_(misplaced()),
        modern().v([1]).not(misplaced()),
        modern().v([1]).optional(misplaced()),
        modern().v([1]).local(anon().local(misplaced())),
    ];
    for t in nested {
        assert!(matches!(t.build(), Err(TraversalError::IllegalConfiguration(_))));
    }

    let mut t = modern().v([1]).local(misplaced());
    assert!(matches!(t.to_list(), Err(TraversalError::IllegalConfiguration(_))));
    assert!(matches!(t.explain(), Err(TraversalError::IllegalConfiguration(_))));
}

#[test]
fn test_clone_gets_its_own_identity() {
    let original = modern().v_all().out(&[]).build().unwrap();
    let copy = original.clone();
    assert_ne!(original.traversal_id(), copy.traversal_id());
    for (a, b) in original.steps().iter().zip(copy.steps()) {
        assert_eq!(a.name(), b.name());
        assert_ne!(a.describe(), b.describe());
        assert_eq!(b.id().traversal, copy.traversal_id());
    }
}

#[test]
fn test_clone_is_independent() {
    let mut original = modern().v_all().values(&["name"]);
    assert!(original.try_next().unwrap().is_some());

    let mut copy = original.clone();
    assert_eq!(copy.to_list().unwrap().len(), 6);
    assert_eq!(original.to_list().unwrap().len(), 5);
}

#[test]
fn test_reset_reiterates() {
    let mut t = modern().v_all().has_label(&["software"]).values(&["name"]);
    let first = t.to_list().unwrap();
    t.reset();
    assert_eq!(t.to_list().unwrap(), first);
}

#[test]
fn test_where_and_not() {
    let g = modern();
    let creators = g.v_all().where_(anon().out(&["created"])).values(&["name"]).to_list().unwrap();
    assert_eq!(creators, names(&["marko", "josh", "peter"]));

    let others = g.v_all().not(anon().out(&["created"])).values(&["name"]).to_list().unwrap();
    assert_eq!(others, names(&["vadas", "lop", "ripple"]));
}

#[test]
fn test_has_predicates() {
    let g = modern();
    let older = g.v_all().has("age", P::gt(30)).values(&["name"]).to_list().unwrap();
    assert_eq!(older, names(&["josh", "peter"]));

    let between = g.v_all().has("age", P::between(27, 32)).values(&["name"]).to_list().unwrap();
    assert_eq!(between, names(&["marko", "vadas"]));

    let picked = g
        .v_all()
        .has("name", P::within(["lop", "ripple"]))
        .id()
        .to_list()
        .unwrap();
    assert_eq!(picked, vec![Value::from(3), Value::from(5)]);
}

#[test]
fn test_edges_and_endpoints() {
    let g = modern();
    let known = g.v([1]).out_e(&["knows"]).other_v().values(&["name"]).to_list().unwrap();
    assert_eq!(known, names(&["vadas", "josh"]));

    let labels = g.v([4]).both_e(&[]).label().dedup().to_list().unwrap();
    assert_eq!(labels, names(&["created", "knows"]));

    let creators = g.v([3]).in_(&["created"]).values(&["name"]).order().to_list().unwrap();
    assert_eq!(creators, names(&["josh", "marko", "peter"]));
}

#[test]
fn test_path_labels_and_select() {
    let g = modern();
    let selected = g
        .v([1])
        .as_("a")
        .out(&["knows"])
        .as_("b")
        .select("a")
        .values(&["name"])
        .to_list()
        .unwrap();
    assert_eq!(selected, names(&["marko", "marko"]));

    let paths = g.v([1]).out(&["created"]).in_(&["created"]).path().to_list().unwrap();
    assert_eq!(paths.len(), 3);
    assert!(paths.iter().all(|p| p.as_path().is_some_and(|p| p.size() == 3)));

    let simple = g
        .v([1])
        .out(&["created"])
        .in_(&["created"])
        .simple_path()
        .values(&["name"])
        .to_list()
        .unwrap();
    assert_eq!(simple, names(&["josh", "peter"]));
}

#[test]
fn test_branching_steps() {
    let g = modern();
    let both = g
        .v([4])
        .union(vec![anon().in_(&["knows"]), anon().out(&["created"])])
        .values(&["name"])
        .to_list()
        .unwrap();
    assert_eq!(both, names(&["marko", "ripple", "lop"]));

    let degrees = g.v_all().has_label(&["person"]).local(anon().out_e(&[]).count()).to_list().unwrap();
    assert_eq!(
        degrees,
        vec![Value::from(3), Value::from(0), Value::from(2), Value::from(1)]
    );
}

#[test]
fn test_order_range_and_limit() {
    let g = modern();
    let youngest = g
        .v_all()
        .has_label(&["person"])
        .order_by("age", Order::Asc)
        .limit(2)
        .values(&["name"])
        .to_list()
        .unwrap();
    assert_eq!(youngest, names(&["vadas", "marko"]));

    let middle = g.v_all().id().range(2, Some(4)).to_list().unwrap();
    assert_eq!(middle, vec![Value::from(3), Value::from(4)]);

    let ages = g.v_all().values(&["age"]).order_desc().to_list().unwrap();
    assert_eq!(ages, vec![Value::from(35), Value::from(32), Value::from(29), Value::from(27)]);
}

#[test]
fn test_reducing_barriers() {
    let g = modern();
    assert_eq!(g.v_all().count().to_list().unwrap(), vec![Value::from(6)]);
    assert_eq!(g.v_all().values(&["age"]).sum().to_list().unwrap(), vec![Value::from(123)]);
    assert_eq!(g.v_all().values(&["age"]).max().to_list().unwrap(), vec![Value::from(35)]);
    assert_eq!(g.v_all().values(&["age"]).min().to_list().unwrap(), vec![Value::from(27)]);
    assert_eq!(
        g.v([1]).out(&["knows"]).values(&["age"]).fold().to_list().unwrap(),
        vec![Value::List(vec![Value::from(27), Value::from(32)])]
    );

    // nothing to reduce
    assert_eq!(g.v([2]).out(&[]).count().to_list().unwrap(), vec![Value::from(0)]);
    assert!(g.v([2]).out(&[]).values(&["age"]).sum().to_list().unwrap().is_empty());
}

#[test]
fn test_sum_of_text_is_a_type_mismatch() {
    let err = modern().v_all().values(&["name"]).sum().to_list().unwrap_err();
    assert!(matches!(err, TraversalError::TypeMismatch { ref step, .. } if step.starts_with("sum@")));
}

#[test]
fn test_aggregate_and_cap() {
    let mut t = modern()
        .v_all()
        .has_label(&["person"])
        .values(&["age"])
        .aggregate("ages")
        .cap("ages");
    let expected = vec![Value::List(vec![
        Value::from(29),
        Value::from(27),
        Value::from(32),
        Value::from(35),
    ])];
    assert_eq!(t.to_list().unwrap(), expected);

    // reset clears the collected values but keeps the registration
    t.reset();
    assert_eq!(t.to_list().unwrap(), expected);
}

#[test]
fn test_aggregate_passes_traversers_on() {
    let made_by_friends = modern()
        .v([1])
        .out(&["knows"])
        .aggregate("friends")
        .out(&[])
        .where_(anon().has_label(&["software"]))
        .values(&["name"])
        .to_list()
        .unwrap();
    assert_eq!(made_by_friends, names(&["ripple", "lop"]));
}

#[test]
fn test_missing_side_effect() {
    let err = modern().v_all().cap("missing").to_list().unwrap_err();
    assert_eq!(err, TraversalError::SideEffectNotFound("missing".to_string()));
}
