//! Steps that write to the side-effect store and pass their input on

use super::{step_boilerplate, Step, StepBase, Upstream};
use crate::error::TraversalResult;
use crate::process::side_effects::{append_reducer, SideEffects};
use crate::process::traverser::Traverser;
use crate::util::ListSupplier;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// User side-effect function
pub type SideEffectFn = Arc<dyn Fn(&Traverser, &mut SideEffects) -> TraversalResult<()> + Send + Sync>;

/// Runs a closure per traverser, unchanged traverser out
#[derive(Clone)]
pub struct SideEffectStep {
    base: StepBase,
    f: SideEffectFn,
}

impl SideEffectStep {
    pub fn new(f: SideEffectFn) -> Self {
        Self {
            base: StepBase::new(),
            f,
        }
    }
}

impl Step for SideEffectStep {
    step_boilerplate!("sideEffect");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        let Some(traverser) = self.base.next_start(upstream)? else {
            return Ok(None);
        };
        (self.f)(&traverser, upstream.side_effects())?;
        Ok(Some(traverser))
    }

    fn is_side_effect(&self) -> bool {
        true
    }
}

/// Appends every input value to the list stored under `key`
///
/// The whole input is collected before anything is passed on, so a later
/// `cap` or nested traversal sees the complete list. A traverser of bulk
/// `n` appends its value `n` times.
#[derive(Clone)]
pub struct AggregateStep {
    base: StepBase,
    key: String,
    drained: Option<VecDeque<Traverser>>,
}

impl AggregateStep {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            base: StepBase::new(),
            key: key.into(),
            drained: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Step for AggregateStep {
    step_boilerplate!("aggregate");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if self.drained.is_none() {
            upstream
                .side_effects()
                .register_if_absent(self.key.clone(), Some(Arc::new(ListSupplier)), Some(append_reducer()));
            let mut buffer = VecDeque::new();
            while let Some(traverser) = self.base.next_start(upstream)? {
                let side_effects = upstream.side_effects();
                for _ in 0..traverser.bulk() {
                    side_effects.add(&self.key, traverser.value().clone())?;
                }
                buffer.push_back(traverser);
            }
            debug!(step = %self.describe(), key = %self.key, count = buffer.len(), "aggregated");
            self.drained = Some(buffer);
        }
        Ok(self.drained.as_mut().and_then(VecDeque::pop_front))
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn is_side_effect(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.base.reset();
        self.drained = None;
    }
}
