//! Pipeline operators (pull-based iterator model)
//!
//! Every step pulls its input through an [`Upstream`] view of the steps
//! before it in the same traversal. A step never owns or points at its
//! predecessor; the owning [`Traversal`](crate::process::Traversal) lends
//! the preceding slice of its step vector for the duration of one pull.

pub mod barrier;
pub mod branch;
pub mod filter;
pub mod flat_map;
pub mod map;
pub mod repeat;
pub mod side_effect;
pub mod start;

pub use barrier::{CapStep, GroupStep, GroupValue, NoOpBarrierStep, Order, OrderStep, ReduceOp, ReducingBarrierStep};
pub use branch::{Choice, ChooseStep, CoalesceStep, LocalStep, OptionalStep, Pick, UnionStep};
pub use filter::{DedupStep, FilterKind, FilterStep, RangeStep, TailStep};
pub use flat_map::{FlatMapKind, FlatMapStep};
pub use map::{MapKind, MapStep, ProjectStep};
pub use repeat::RepeatStep;
pub use side_effect::{AggregateStep, SideEffectStep};
pub use start::StartStep;

use super::side_effects::SideEffects;
use super::traversal::Traversal;
use super::traverser::Traverser;
use crate::error::TraversalResult;
use indexmap::IndexSet;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRAVERSAL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique traversal identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraversalId(u64);

impl TraversalId {
    pub fn next() -> Self {
        TraversalId(NEXT_TRAVERSAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Non-owning handle from a step to its position in a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepId {
    pub traversal: TraversalId,
    pub index: usize,
}

impl StepId {
    pub fn detached() -> Self {
        StepId {
            traversal: TraversalId(0),
            index: 0,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}:{}", self.traversal.0, self.index)
    }
}

/// State every step carries
#[derive(Debug, Clone)]
pub struct StepBase {
    pub id: StepId,
    pub labels: IndexSet<String>,
    starts: VecDeque<Traverser>,
    peeked: Option<Traverser>,
}

impl Default for StepBase {
    fn default() -> Self {
        Self {
            id: StepId::detached(),
            labels: IndexSet::new(),
            starts: VecDeque::new(),
            peeked: None,
        }
    }
}

impl StepBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next input: injected starts first, then the upstream step
    pub fn next_start(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if let Some(t) = self.starts.pop_front() {
            return Ok(Some(t));
        }
        upstream.next()
    }

    pub fn push_start(&mut self, traverser: Traverser) {
        self.starts.push_back(traverser);
    }

    pub fn has_starts(&self) -> bool {
        !self.starts.is_empty()
    }

    pub fn reset(&mut self) {
        self.starts.clear();
        self.peeked = None;
    }
}

/// Borrowed view of the steps preceding the one being pulled
pub struct Upstream<'a> {
    steps: &'a mut [Box<dyn Step>],
    side_effects: &'a mut SideEffects,
}

impl<'a> Upstream<'a> {
    pub fn new(steps: &'a mut [Box<dyn Step>], side_effects: &'a mut SideEffects) -> Self {
        Self { steps, side_effects }
    }

    /// Pull one traverser from the nearest predecessor
    pub fn next(&mut self) -> TraversalResult<Option<Traverser>> {
        match self.steps.split_last_mut() {
            None => Ok(None),
            Some((last, rest)) => {
                let mut upstream = Upstream {
                    steps: rest,
                    side_effects: &mut *self.side_effects,
                };
                last.next(&mut upstream)
            }
        }
    }

    /// Whether the nearest predecessor can produce another traverser
    pub fn has_next(&mut self) -> TraversalResult<bool> {
        match self.steps.split_last_mut() {
            None => Ok(false),
            Some((last, rest)) => {
                let mut upstream = Upstream {
                    steps: rest,
                    side_effects: &mut *self.side_effects,
                };
                last.has_next(&mut upstream)
            }
        }
    }

    /// The side-effect store of the traversal being pulled
    pub fn side_effects(&mut self) -> &mut SideEffects {
        self.side_effects
    }
}

/// A pipeline operator
///
/// Implementors provide [`Step::process_next`]; the provided
/// [`Step::next`] applies the step's `as_` labels and serves a traverser
/// buffered by [`Step::has_next`].
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    fn base(&self) -> &StepBase;

    fn base_mut(&mut self) -> &mut StepBase;

    /// Produce the next output, pulling input as needed
    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>>;

    /// Drop all per-iteration state
    fn reset(&mut self) {
        self.base_mut().reset();
    }

    fn clone_step(&self) -> Box<dyn Step>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Needs the whole input stream in one place: reduces or buffers it,
    /// or (like `dedup` and `range`) keeps state across all of it
    fn is_barrier(&self) -> bool {
        false
    }

    /// Writes to the side-effect store
    fn is_side_effect(&self) -> bool {
        false
    }

    /// Nested traversals owned by this step
    fn children(&self) -> Vec<&Traversal> {
        Vec::new()
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        Vec::new()
    }

    fn id(&self) -> StepId {
        self.base().id
    }

    fn labels(&self) -> &IndexSet<String> {
        &self.base().labels
    }

    fn add_label(&mut self, label: String) {
        self.base_mut().labels.insert(label);
    }

    /// Name and position, used in error messages
    fn describe(&self) -> String {
        format!("{}@{}", self.name(), self.base().id)
    }

    fn add_start(&mut self, traverser: Traverser) {
        self.base_mut().push_start(traverser);
    }

    fn next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if let Some(t) = self.base_mut().peeked.take() {
            return Ok(Some(t));
        }
        let Some(mut traverser) = self.process_next(upstream)? else {
            return Ok(None);
        };
        let labels = &self.base().labels;
        if !labels.is_empty() {
            traverser.add_labels(labels.iter().cloned());
        }
        Ok(Some(traverser))
    }

    fn has_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<bool> {
        if self.base().peeked.is_some() {
            return Ok(true);
        }
        match self.next(upstream)? {
            Some(t) => {
                self.base_mut().peeked = Some(t);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Clone for Box<dyn Step> {
    fn clone(&self) -> Self {
        self.clone_step()
    }
}

impl fmt::Debug for dyn Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Accessors every concrete step shares; the one-argument form also
/// supplies a fixed `name()`
macro_rules! step_boilerplate {
    () => {
        fn base(&self) -> &$crate::process::step::StepBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut $crate::process::step::StepBase {
            &mut self.base
        }

        fn clone_step(&self) -> Box<dyn $crate::process::step::Step> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
    ($name:expr) => {
        fn name(&self) -> &'static str {
            $name
        }

        $crate::process::step::step_boilerplate!();
    };
}

pub(crate) use step_boilerplate;
