//! Traversal pipeline
//!
//! A traversal owns an ordered vector of steps, the side-effect store and
//! the strategies applied when it is locked. Results are pulled lazily
//! from the last step; each pull transitively pulls the steps before it.
//!
//! Lifecycle:
//! - `Building`: steps may be appended
//! - `Locked`: strategies applied, ready to iterate
//! - `Failed`: a pull raised an error; further pulls fail with
//!   [`TraversalError::Poisoned`] wrapping that error until `reset()`

use super::computer::{ComputerVerificationStrategy, GraphComputer, VertexProgramStrategy};
use super::side_effects::SideEffects;
use super::step::{StartStep, Step, StepId, TraversalId, Upstream};
use super::strategy::{StandardVerificationStrategy, TraversalStrategy};
use super::traverser::Traverser;
use crate::config::EngineConfig;
use crate::error::{TraversalError, TraversalResult};
use crate::structure::{Graph, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Building,
    Locked,
    Failed,
}

pub struct Traversal {
    id: TraversalId,
    steps: Vec<Box<dyn Step>>,
    side_effects: SideEffects,
    strategies: Vec<Arc<dyn TraversalStrategy>>,
    config: EngineConfig,
    state: TraversalState,
    graph: Option<Arc<dyn Graph>>,
    computer: Option<Arc<dyn GraphComputer>>,
    build_error: Option<TraversalError>,
    // error that moved the traversal to `Failed`
    failure: Option<TraversalError>,
    // value of the last traverser pulled and how many more times to yield it
    current: Option<(Value, u64)>,
}

impl Traversal {
    /// Traversal starting from `start`
    pub fn with_start(start: StartStep, graph: Option<Arc<dyn Graph>>, config: EngineConfig) -> Self {
        let mut traversal = Traversal {
            id: TraversalId::next(),
            steps: Vec::new(),
            side_effects: SideEffects::new(),
            strategies: vec![Arc::new(StandardVerificationStrategy)],
            config,
            state: TraversalState::Building,
            graph,
            computer: None,
            build_error: None,
            failure: None,
            current: None,
        };
        traversal.add_step(Box::new(start));
        traversal
    }

    /// Anonymous traversal: fed only through [`Traversal::add_start`]
    pub fn anonymous() -> Self {
        Self::with_start(StartStep::empty(), None, EngineConfig::default())
    }

    pub fn traversal_id(&self) -> TraversalId {
        self.id
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> Option<&Arc<dyn Graph>> {
        self.graph.as_ref()
    }

    pub fn computer(&self) -> Option<&Arc<dyn GraphComputer>> {
        self.computer.as_ref()
    }

    pub fn steps(&self) -> &[Box<dyn Step>] {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut Vec<Box<dyn Step>> {
        &mut self.steps
    }

    pub fn side_effects(&self) -> &SideEffects {
        &self.side_effects
    }

    pub fn side_effects_mut(&mut self) -> &mut SideEffects {
        &mut self.side_effects
    }

    /// Append a step, assigning its position handle
    pub fn add_step(&mut self, mut step: Box<dyn Step>) {
        if self.state != TraversalState::Building {
            self.fail_build(TraversalError::IllegalConfiguration(format!(
                "cannot add {} to a locked traversal",
                step.name()
            )));
            return;
        }
        step.base_mut().id = StepId {
            traversal: self.id,
            index: self.steps.len(),
        };
        self.steps.push(step);
    }

    /// Replace the whole step vector and renumber
    pub fn replace_steps(&mut self, steps: Vec<Box<dyn Step>>) {
        self.steps = steps;
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.base_mut().id = StepId {
                traversal: self.id,
                index,
            };
        }
    }

    /// Record a construction error; the first one wins and surfaces on lock
    pub fn fail_build(&mut self, error: TraversalError) {
        if self.build_error.is_none() {
            self.build_error = Some(error);
        }
    }

    pub fn add_strategy(mut self, strategy: Arc<dyn TraversalStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute the part before the first barrier on `computer`
    pub fn with_computer(mut self, computer: Arc<dyn GraphComputer>) -> Self {
        self.computer = Some(computer);
        self
    }

    pub fn is_locked(&self) -> bool {
        self.state != TraversalState::Building
    }

    /// Apply strategies once; later calls only report a build error
    pub fn lock(&mut self) -> TraversalResult<()> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        if self.is_locked() {
            return Ok(());
        }

        let mut strategies = self.strategies.clone();
        if self.computer.is_some() {
            strategies.push(Arc::new(ComputerVerificationStrategy));
            strategies.push(Arc::new(VertexProgramStrategy));
        }
        for strategy in &strategies {
            if let Err(err) = strategy.apply(self) {
                self.build_error = Some(err.clone());
                return Err(err);
            }
        }
        if let Err(err) = self.lock_children() {
            self.state = TraversalState::Building;
            self.build_error = Some(err.clone());
            return Err(err);
        }
        debug!(
            traversal = ?self.id,
            steps = self.steps.len(),
            strategies = strategies.len(),
            "traversal locked"
        );
        Ok(())
    }

    /// Lock nested traversals, surfacing the first construction error
    /// recorded anywhere below this one
    fn lock_children(&mut self) -> TraversalResult<()> {
        self.state = TraversalState::Locked;
        for step in self.steps.iter_mut() {
            for child in step.children_mut() {
                if let Some(err) = &child.build_error {
                    return Err(err.clone());
                }
                child.lock_children()?;
            }
        }
        Ok(())
    }

    /// Lock and surface any construction error
    pub fn build(mut self) -> TraversalResult<Self> {
        self.lock()?;
        Ok(self)
    }

    /// Feed a traverser into the first step
    pub fn add_start(&mut self, traverser: Traverser) {
        if let Some(first) = self.steps.first_mut() {
            first.add_start(traverser);
        }
    }

    fn ensure_ready(&mut self) -> TraversalResult<()> {
        if let Some(cause) = &self.failure {
            return Err(TraversalError::Poisoned(Box::new(cause.clone())));
        }
        self.lock()
    }

    fn guard<T>(&mut self, result: TraversalResult<T>) -> TraversalResult<T> {
        if let Err(err) = &result {
            debug!(traversal = ?self.id, error = %err, "traversal failed");
            if self.state != TraversalState::Failed {
                self.failure = Some(err.clone());
            }
            self.state = TraversalState::Failed;
        }
        result
    }

    /// Next traverser, bulk intact
    pub fn next_traverser(&mut self) -> TraversalResult<Option<Traverser>> {
        let ready = self.ensure_ready();
        self.guard(ready)?;
        let result = Upstream::new(&mut self.steps, &mut self.side_effects).next();
        self.guard(result)
    }

    /// Next result value; a traverser of bulk `n` yields its value `n` times
    pub fn try_next(&mut self) -> TraversalResult<Option<Value>> {
        if let Some((value, remaining)) = self.current.as_mut() {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(Some(value.clone()));
            }
        }
        self.current = None;
        Ok(self.next_traverser()?.map(|t| {
            let bulk = t.bulk();
            let value = t.into_value();
            self.current = Some((value.clone(), bulk - 1));
            value
        }))
    }

    pub fn has_next(&mut self) -> TraversalResult<bool> {
        if matches!(self.current, Some((_, remaining)) if remaining > 0) {
            return Ok(true);
        }
        let ready = self.ensure_ready();
        self.guard(ready)?;
        let result = Upstream::new(&mut self.steps, &mut self.side_effects).has_next();
        self.guard(result)
    }

    /// Drain every result value
    pub fn to_list(&mut self) -> TraversalResult<Vec<Value>> {
        let mut values = Vec::new();
        while let Some(value) = self.try_next()? {
            values.push(value);
        }
        Ok(values)
    }

    /// Drain every traverser without expanding bulk
    pub fn to_traverser_list(&mut self) -> TraversalResult<Vec<Traverser>> {
        let mut traversers = Vec::new();
        while let Some(t) = self.next_traverser()? {
            traversers.push(t);
        }
        Ok(traversers)
    }

    /// Run to exhaustion for side effects only
    pub fn iterate(&mut self) -> TraversalResult<()> {
        while self.next_traverser()?.is_some() {}
        Ok(())
    }

    /// Step names in pipeline order, after strategies
    pub fn explain(&mut self) -> TraversalResult<Vec<String>> {
        self.lock()?;
        Ok(self.steps.iter().map(|s| s.name().to_string()).collect())
    }

    /// Restart iteration: clears step state, side-effect values and a
    /// failed state. Graph data is untouched.
    pub fn reset(&mut self) {
        self.reset_steps();
        self.side_effects.reset();
        if self.state == TraversalState::Failed {
            self.state = TraversalState::Locked;
        }
        self.failure = None;
        debug!(traversal = ?self.id, "traversal reset");
    }

    /// Clear step state only
    pub fn reset_steps(&mut self) {
        for step in self.steps.iter_mut() {
            step.reset();
        }
        self.current = None;
    }

    /// Pull as a nested traversal sharing the parent's side effects
    pub fn pull_in(&mut self, side_effects: &mut SideEffects) -> TraversalResult<Option<Traverser>> {
        Upstream::new(&mut self.steps, side_effects).next()
    }

    pub fn has_next_in(&mut self, side_effects: &mut SideEffects) -> TraversalResult<bool> {
        Upstream::new(&mut self.steps, side_effects).has_next()
    }

    /// First value this nested traversal yields for `traverser`, if any
    pub fn produce_in(
        &mut self,
        traverser: &Traverser,
        side_effects: &mut SideEffects,
    ) -> TraversalResult<Option<Value>> {
        self.reset_steps();
        self.add_start(traverser.split_same());
        Ok(self.pull_in(side_effects)?.map(Traverser::into_value))
    }
}

impl Clone for Traversal {
    /// Independent copy: nested traversals are deep-copied and all step
    /// state starts fresh
    fn clone(&self) -> Self {
        let mut steps: Vec<Box<dyn Step>> = self.steps.iter().map(|s| s.clone_step()).collect();
        for step in steps.iter_mut() {
            step.reset();
        }
        let mut side_effects = self.side_effects.clone();
        side_effects.reset();
        let mut copy = Traversal {
            id: TraversalId::next(),
            steps: Vec::new(),
            side_effects,
            strategies: self.strategies.clone(),
            config: self.config.clone(),
            state: match self.state {
                TraversalState::Failed => TraversalState::Locked,
                other => other,
            },
            graph: self.graph.clone(),
            computer: self.computer.clone(),
            build_error: self.build_error.clone(),
            failure: None,
            current: None,
        };
        copy.replace_steps(steps);
        copy
    }
}

impl Default for Traversal {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Iterator for Traversal {
    type Item = TraversalResult<Value>;

    /// Yields a failure once, then stops
    fn next(&mut self) -> Option<Self::Item> {
        if self.state == TraversalState::Failed {
            return None;
        }
        self.try_next().transpose()
    }
}

impl fmt::Debug for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traversal")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("steps", &self.steps.iter().map(|s| s.describe()).collect::<Vec<_>>())
            .finish()
    }
}
