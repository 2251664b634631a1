//! Fluent construction of traversals
//!
//! ```ignore
//! let g = GraphTraversalSource::new(Arc::new(MemoryGraph::modern()));
//! let names = g.v([1]).out(&["knows"]).values(&["name"]).to_list()?;
//! let reach = g.v([1]).repeat(anon().out(&[])).times(2).path().to_list()?;
//! ```
//!
//! `until`, `emit` and `times` attach to the nearest preceding `repeat`.
//! Written before `repeat` they open a pending repeat that the following
//! `repeat` fills in, which turns them into checks made before each pass
//! instead of after it.

use super::computer::GraphComputer;
use super::path::Pop;
use super::predicate::{Condition, P};
use super::side_effects::SideEffects;
use super::step::barrier::Order;
use super::step::filter::FilterFn;
use super::step::flat_map::FlatMapFn;
use super::step::map::MapFn;
use super::step::side_effect::SideEffectFn;
use super::step::{
    AggregateStep, CapStep, Choice, ChooseStep, CoalesceStep, DedupStep, FilterKind, FilterStep, FlatMapKind,
    FlatMapStep, GroupStep, GroupValue, LocalStep, MapKind, MapStep, NoOpBarrierStep, OptionalStep, OrderStep,
    Pick, ProjectStep, RangeStep, ReduceOp, ReducingBarrierStep, RepeatStep, StartStep, Step, TailStep, UnionStep,
};
use super::traversal::Traversal;
use super::traverser::Traverser;
use crate::config::EngineConfig;
use crate::error::{TraversalError, TraversalResult};
use crate::structure::{Direction, ElementId, Graph, Value};
use std::sync::Arc;

/// Anonymous traversal, used for nested bodies and conditions
pub fn anon() -> Traversal {
    Traversal::anonymous()
}

/// Spawns traversals over one graph
#[derive(Clone)]
pub struct GraphTraversalSource {
    graph: Arc<dyn Graph>,
    config: EngineConfig,
    computer: Option<Arc<dyn GraphComputer>>,
}

impl GraphTraversalSource {
    pub fn new(graph: Arc<dyn Graph>) -> Self {
        Self {
            graph,
            config: EngineConfig::default(),
            computer: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawned traversals run their worker section on `computer`
    pub fn with_computer(mut self, computer: Arc<dyn GraphComputer>) -> Self {
        self.computer = Some(computer);
        self
    }

    pub fn graph(&self) -> &Arc<dyn Graph> {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn spawn(&self, start: StartStep) -> Traversal {
        let traversal = Traversal::with_start(start, Some(Arc::clone(&self.graph)), self.config.clone());
        match &self.computer {
            Some(computer) => traversal.with_computer(Arc::clone(computer)),
            None => traversal,
        }
    }

    /// Traversal over the given vertices; missing ids are skipped
    pub fn v<I, T>(&self, ids: I) -> Traversal
    where
        I: IntoIterator<Item = T>,
        T: Into<ElementId>,
    {
        let ids: Vec<ElementId> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return self.v_all();
        }
        self.spawn(StartStep::vertices(Arc::clone(&self.graph), ids))
    }

    /// Traversal over every vertex in id order
    pub fn v_all(&self) -> Traversal {
        self.spawn(StartStep::vertices(Arc::clone(&self.graph), Vec::new()))
    }

    /// Traversal over constant values
    pub fn inject(&self, values: Vec<Value>) -> Traversal {
        let traversal = Traversal::with_start(
            StartStep::values(values),
            Some(Arc::clone(&self.graph)),
            self.config.clone(),
        );
        match &self.computer {
            Some(computer) => traversal.with_computer(Arc::clone(computer)),
            None => traversal,
        }
    }
}

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

impl Traversal {
    fn then(mut self, step: impl Step + 'static) -> Self {
        self.add_step(Box::new(step));
        self
    }

    fn map_kind(self, kind: MapKind) -> Self {
        self.then(MapStep::new(kind))
    }

    fn flat_map_kind(self, kind: FlatMapKind) -> Self {
        self.then(FlatMapStep::new(kind))
    }

    fn filter_kind(self, kind: FilterKind) -> Self {
        self.then(FilterStep::new(kind))
    }

    fn reduce(self, op: ReduceOp) -> Self {
        self.then(ReducingBarrierStep::new(op))
    }

    /// Prepend constant start values to a traversal that has no other steps
    pub fn inject(mut self, values: Vec<Value>) -> Self {
        let injected = self.steps().len() == 1
            && self
                .steps_mut()
                .first_mut()
                .and_then(|s| s.as_any_mut().downcast_mut::<StartStep>())
                .is_some_and(|start| start.inject(values));
        if !injected {
            self.fail_build(TraversalError::IllegalConfiguration(
                "inject() must directly follow a non-graph start".to_string(),
            ));
        }
        self
    }

    // --- navigation

    pub fn out(self, labels: &[&str]) -> Self {
        self.flat_map_kind(FlatMapKind::Vertices(Direction::Out, owned(labels)))
    }

    pub fn in_(self, labels: &[&str]) -> Self {
        self.flat_map_kind(FlatMapKind::Vertices(Direction::In, owned(labels)))
    }

    pub fn both(self, labels: &[&str]) -> Self {
        self.flat_map_kind(FlatMapKind::Vertices(Direction::Both, owned(labels)))
    }

    pub fn out_e(self, labels: &[&str]) -> Self {
        self.flat_map_kind(FlatMapKind::Edges(Direction::Out, owned(labels)))
    }

    pub fn in_e(self, labels: &[&str]) -> Self {
        self.flat_map_kind(FlatMapKind::Edges(Direction::In, owned(labels)))
    }

    pub fn both_e(self, labels: &[&str]) -> Self {
        self.flat_map_kind(FlatMapKind::Edges(Direction::Both, owned(labels)))
    }

    pub fn out_v(self) -> Self {
        self.map_kind(MapKind::EdgeVertex(Direction::Out))
    }

    pub fn in_v(self) -> Self {
        self.map_kind(MapKind::EdgeVertex(Direction::In))
    }

    pub fn other_v(self) -> Self {
        self.map_kind(MapKind::OtherV)
    }

    pub fn both_v(self) -> Self {
        self.flat_map_kind(FlatMapKind::BothV)
    }

    // --- maps

    pub fn id(self) -> Self {
        self.map_kind(MapKind::Id)
    }

    pub fn label(self) -> Self {
        self.map_kind(MapKind::Label)
    }

    pub fn constant(self, value: impl Into<Value>) -> Self {
        self.map_kind(MapKind::Constant(value.into()))
    }

    pub fn path(self) -> Self {
        self.map_kind(MapKind::Path)
    }

    /// Most recent object labeled `label`
    pub fn select(self, label: &str) -> Self {
        self.select_pop(Pop::Last, label)
    }

    pub fn select_pop(self, pop: Pop, label: &str) -> Self {
        self.map_kind(MapKind::Select(pop, label.to_string()))
    }

    pub fn loops(self) -> Self {
        self.map_kind(MapKind::Loops(None))
    }

    pub fn loops_named(self, name: &str) -> Self {
        self.map_kind(MapKind::Loops(Some(name.to_string())))
    }

    pub fn map<F>(self, f: F) -> Self
    where
        F: Fn(&Traverser) -> TraversalResult<Value> + Send + Sync + 'static,
    {
        let f: MapFn = Arc::new(f);
        self.map_kind(MapKind::Lambda(f))
    }

    pub fn values(self, keys: &[&str]) -> Self {
        self.flat_map_kind(FlatMapKind::Values(owned(keys)))
    }

    /// Map of property key to values, every key when `keys` is empty
    pub fn value_map(self, keys: &[&str]) -> Self {
        self.map_kind(MapKind::ValueMap(owned(keys)))
    }

    /// Map of `id`, `label`, edge endpoints (`IN`/`OUT`) and properties
    pub fn element_map(self, keys: &[&str]) -> Self {
        self.map_kind(MapKind::ElementMap(owned(keys)))
    }

    /// Map each key to the first result of its `by` traversal
    pub fn project(mut self, keys: &[&str], by: Vec<Traversal>) -> Self {
        let mut seen = rustc_hash::FxHashSet::default();
        if let Some(duplicate) = keys.iter().find(|k| !seen.insert(**k)) {
            self.fail_build(TraversalError::IllegalConfiguration(format!(
                "project() key '{}' is given more than once",
                duplicate
            )));
            return self;
        }
        self.then(ProjectStep::new(owned(keys), by))
    }

    pub fn properties(self, keys: &[&str]) -> Self {
        self.flat_map_kind(FlatMapKind::Properties(owned(keys)))
    }

    pub fn unfold(self) -> Self {
        self.flat_map_kind(FlatMapKind::Unfold)
    }

    pub fn flat_map<F>(self, f: F) -> Self
    where
        F: Fn(&Traverser) -> TraversalResult<Vec<Value>> + Send + Sync + 'static,
    {
        let f: FlatMapFn = Arc::new(f);
        self.flat_map_kind(FlatMapKind::Lambda(f))
    }

    /// Label the output of the previous step
    pub fn as_(mut self, label: &str) -> Self {
        if let Some(last) = self.steps_mut().last_mut() {
            last.add_label(label.to_string());
        }
        self
    }

    // --- filters

    pub fn has(self, key: &str, predicate: P) -> Self {
        self.filter_kind(FilterKind::Has(key.to_string(), predicate))
    }

    pub fn has_label(self, labels: &[&str]) -> Self {
        self.filter_kind(FilterKind::HasLabel(owned(labels)))
    }

    pub fn has_id<I, T>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ElementId>,
    {
        self.filter_kind(FilterKind::HasId(ids.into_iter().map(Into::into).collect()))
    }

    pub fn is(self, predicate: P) -> Self {
        self.filter_kind(FilterKind::Is(predicate))
    }

    pub fn filter<F>(self, f: F) -> Self
    where
        F: Fn(&Traverser) -> TraversalResult<bool> + Send + Sync + 'static,
    {
        let f: FilterFn = Arc::new(f);
        self.filter_kind(FilterKind::Lambda(f))
    }

    pub fn simple_path(self) -> Self {
        self.filter_kind(FilterKind::SimplePath)
    }

    pub fn where_(self, sub: Traversal) -> Self {
        self.filter_kind(FilterKind::Where(Box::new(sub)))
    }

    pub fn not(self, sub: Traversal) -> Self {
        self.filter_kind(FilterKind::Not(Box::new(sub)))
    }

    pub fn limit(self, n: u64) -> Self {
        self.then(RangeStep::limit(n))
    }

    /// Results `low..high`; unbounded above when `high` is `None`
    pub fn range(self, low: u64, high: Option<u64>) -> Self {
        self.then(RangeStep::new(low, high))
    }

    pub fn dedup(self) -> Self {
        self.then(DedupStep::new())
    }

    /// The last `n` results
    pub fn tail(self, n: u64) -> Self {
        self.then(TailStep::new(n))
    }

    // --- branches

    pub fn local(self, child: Traversal) -> Self {
        self.then(LocalStep::new(child))
    }

    pub fn union(self, branches: Vec<Traversal>) -> Self {
        self.then(UnionStep::new(branches))
    }

    pub fn optional(self, child: Traversal) -> Self {
        self.then(OptionalStep::new(child))
    }

    /// Results of the first branch that yields anything
    pub fn coalesce(self, branches: Vec<Traversal>) -> Self {
        self.then(CoalesceStep::new(branches))
    }

    /// `then` when `predicate` yields anything, `otherwise` when not
    pub fn choose_if(self, predicate: Traversal, then: Traversal, otherwise: Traversal) -> Self {
        self.then(ChooseStep::if_then_else(predicate, then, otherwise))
    }

    /// Route by the first result of `selector`; branches are added with
    /// [`Traversal::option`]
    pub fn choose(self, selector: Traversal) -> Self {
        self.then(ChooseStep::new(selector, Choice::First))
    }

    /// Add a branch to the directly preceding `choose`
    pub fn option(mut self, pick: Pick, branch: Traversal) -> Self {
        let target = self
            .steps_mut()
            .last_mut()
            .and_then(|s| s.as_any_mut().downcast_mut::<ChooseStep>());
        let error = match target {
            Some(choose) if choose.has_option(&pick) => {
                Some(format!("choose() already has an option for {:?}", pick))
            }
            Some(choose) => {
                choose.add_option(pick, branch);
                None
            }
            None => Some("option() must directly follow choose()".to_string()),
        };
        if let Some(message) = error {
            self.fail_build(TraversalError::IllegalConfiguration(message));
        }
        self
    }

    // --- loops

    /// Repeat step the next modulator may attach to, creating one when the
    /// last step is not a repeat with that slot free
    fn open_repeat(&mut self, slot_free: impl Fn(&RepeatStep) -> bool) -> Option<&mut RepeatStep> {
        let reusable = self
            .steps()
            .last()
            .and_then(|s| s.as_any().downcast_ref::<RepeatStep>())
            .is_some_and(|r| slot_free(r));
        if !reusable {
            self.add_step(Box::new(RepeatStep::new()));
        }
        self.steps_mut()
            .last_mut()
            .and_then(|s| s.as_any_mut().downcast_mut::<RepeatStep>())
    }

    pub fn repeat(self, body: Traversal) -> Self {
        self.repeat_with(None, body)
    }

    /// Repeat whose counter `loops_named(name)` can read from inside
    pub fn repeat_named(self, name: &str, body: Traversal) -> Self {
        self.repeat_with(Some(name.to_string()), body)
    }

    fn repeat_with(mut self, name: Option<String>, body: Traversal) -> Self {
        if let Some(repeat) = self.open_repeat(|r| !r.has_body()) {
            repeat.set_body(body, name);
        }
        self
    }

    pub fn until(mut self, condition: impl Into<Condition>) -> Self {
        let condition = condition.into();
        if let Some(repeat) = self.open_repeat(|r| !r.has_until()) {
            repeat.set_until(condition);
        }
        self
    }

    /// Emit every traverser the loop visits
    pub fn emit(self) -> Self {
        self.emit_if(true)
    }

    pub fn emit_if(mut self, condition: impl Into<Condition>) -> Self {
        let condition = condition.into();
        if let Some(repeat) = self.open_repeat(|r| !r.has_emit()) {
            repeat.set_emit(condition);
        }
        self
    }

    pub fn times(mut self, n: u32) -> Self {
        if let Some(repeat) = self.open_repeat(|r| !r.has_times()) {
            repeat.set_times(n);
        }
        self
    }

    // --- barriers

    pub fn count(self) -> Self {
        self.reduce(ReduceOp::Count)
    }

    pub fn sum(self) -> Self {
        self.reduce(ReduceOp::Sum)
    }

    pub fn mean(self) -> Self {
        self.reduce(ReduceOp::Mean)
    }

    pub fn min(self) -> Self {
        self.reduce(ReduceOp::Min)
    }

    pub fn max(self) -> Self {
        self.reduce(ReduceOp::Max)
    }

    pub fn fold(self) -> Self {
        self.reduce(ReduceOp::Fold)
    }

    pub fn order(self) -> Self {
        self.then(OrderStep::new(Order::Asc, None))
    }

    pub fn order_desc(self) -> Self {
        self.then(OrderStep::new(Order::Desc, None))
    }

    /// Sort element values by the property `key`
    pub fn order_by(self, key: &str, order: Order) -> Self {
        self.then(OrderStep::new(order, Some(key.to_string())))
    }

    /// Map of each distinct value to the list of its occurrences
    pub fn group(self) -> Self {
        self.then(GroupStep::new(None, GroupValue::Collect(None)))
    }

    /// Group by the first result of `key`, collecting values in a list
    pub fn group_by(self, key: Traversal) -> Self {
        self.then(GroupStep::new(Some(key), GroupValue::Collect(None)))
    }

    /// Group by `key` and run `value` over each group's traversers
    pub fn group_by_with(self, key: Traversal, value: Traversal) -> Self {
        self.then(GroupStep::new(Some(key), GroupValue::Collect(Some(Box::new(value)))))
    }

    /// Map of each distinct value to how often it occurs
    pub fn group_count(self) -> Self {
        self.then(GroupStep::new(None, GroupValue::Count))
    }

    pub fn group_count_by(self, key: Traversal) -> Self {
        self.then(GroupStep::new(Some(key), GroupValue::Count))
    }

    /// Bulking barrier sized by the traversal's configuration
    pub fn barrier(self) -> Self {
        let size = self.config().barrier_size;
        self.then(NoOpBarrierStep::new(size))
    }

    // --- side effects

    pub fn aggregate(self, key: &str) -> Self {
        self.then(AggregateStep::new(key))
    }

    pub fn cap(self, key: &str) -> Self {
        self.then(CapStep::new(key))
    }

    pub fn side_effect<F>(self, f: F) -> Self
    where
        F: Fn(&Traverser, &mut SideEffects) -> TraversalResult<()> + Send + Sync + 'static,
    {
        let f: SideEffectFn = Arc::new(f);
        self.then(super::step::SideEffectStep::new(f))
    }
}
