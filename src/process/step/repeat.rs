//! Loop control: `repeat`, `until`, `emit`, `times`
//!
//! A traverser entering the step pushes a loop frame and is checked
//! against the entry-side modulators (those declared before `repeat`).
//! It then runs through the owned body traversal; every traverser leaving
//! the body has its counter bumped and is checked against the exit-side
//! modulators. `times(n)` is checked on both sides. A traverser that
//! stops looping pops its frame and leaves the step; an emitted copy
//! leaves with its frame popped while the original keeps looping.

use super::{step_boilerplate, Step, StepBase, Upstream};
use crate::error::TraversalResult;
use crate::process::predicate::Condition;
use crate::process::side_effects::SideEffects;
use crate::process::traversal::Traversal;
use crate::process::traverser::Traverser;
use std::collections::VecDeque;
use tracing::trace;

#[derive(Clone)]
pub struct RepeatStep {
    base: StepBase,
    body: Option<Box<Traversal>>,
    loop_name: Option<String>,
    until: Option<Condition>,
    emit: Option<Condition>,
    times: Option<u32>,
    until_first: bool,
    emit_first: bool,
    // traversers that finished a pass and re-enter through the entry checks
    reentry: VecDeque<Traverser>,
}

impl RepeatStep {
    pub fn new() -> Self {
        Self {
            base: StepBase::new(),
            body: None,
            loop_name: None,
            until: None,
            emit: None,
            times: None,
            until_first: false,
            emit_first: false,
            reentry: VecDeque::new(),
        }
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn loop_name(&self) -> Option<&str> {
        self.loop_name.as_deref()
    }

    pub fn has_until(&self) -> bool {
        self.until.is_some()
    }

    pub fn has_emit(&self) -> bool {
        self.emit.is_some()
    }

    pub fn has_times(&self) -> bool {
        self.times.is_some()
    }

    pub fn until_first(&self) -> bool {
        self.until_first
    }

    pub fn emit_first(&self) -> bool {
        self.emit_first
    }

    pub fn set_body(&mut self, body: Traversal, loop_name: Option<String>) {
        self.body = Some(Box::new(body));
        self.loop_name = loop_name;
    }

    /// Modulators set before the body become entry-side checks
    pub fn set_until(&mut self, condition: Condition) {
        self.until_first = self.body.is_none();
        self.until = Some(condition);
    }

    pub fn set_emit(&mut self, condition: Condition) {
        self.emit_first = self.body.is_none();
        self.emit = Some(condition);
    }

    pub fn set_times(&mut self, times: u32) {
        self.times = Some(times);
    }

    fn times_reached(&self, traverser: &Traverser) -> bool {
        self.times.is_some_and(|n| traverser.loop_count() >= n)
    }

    fn do_until(
        &mut self,
        traverser: &Traverser,
        entry: bool,
        side_effects: &mut SideEffects,
        step: &str,
    ) -> TraversalResult<bool> {
        if self.times_reached(traverser) {
            return Ok(true);
        }
        match &mut self.until {
            Some(condition) if entry == self.until_first => condition.test(traverser, side_effects, step),
            _ => Ok(false),
        }
    }

    fn do_emit(
        &mut self,
        traverser: &Traverser,
        entry: bool,
        side_effects: &mut SideEffects,
        step: &str,
    ) -> TraversalResult<bool> {
        match &mut self.emit {
            Some(condition) if entry == self.emit_first => condition.test(traverser, side_effects, step),
            _ => Ok(false),
        }
    }

    fn emit_split(traverser: &Traverser) -> Traverser {
        let mut split = traverser.split_same();
        split.reset_loop();
        split
    }
}

impl Default for RepeatStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for RepeatStep {
    step_boilerplate!("repeat");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        let step = self.describe();
        loop {
            // exit side: traversers that completed a pass through the body
            let finished = match self.body.as_mut() {
                Some(body) => body.pull_in(upstream.side_effects())?,
                None => None,
            };
            if let Some(mut traverser) = finished {
                traverser.incr_loop();
                if self.do_until(&traverser, false, upstream.side_effects(), &step)? {
                    trace!(step = %step, loops = traverser.loop_count(), "repeat done");
                    traverser.reset_loop();
                    return Ok(Some(traverser));
                }
                let emitted = if self.do_emit(&traverser, false, upstream.side_effects(), &step)? {
                    Some(Self::emit_split(&traverser))
                } else {
                    None
                };
                if !self.until_first && !self.emit_first {
                    if let Some(body) = self.body.as_mut() {
                        body.add_start(traverser);
                    }
                } else {
                    self.reentry.push_back(traverser);
                }
                if emitted.is_some() {
                    return Ok(emitted);
                }
                continue;
            }

            // entry side
            let mut traverser = match self.reentry.pop_front() {
                Some(t) => t,
                None => match self.base.next_start(upstream)? {
                    Some(mut t) => {
                        t.initialise_loop(self.loop_name.as_deref());
                        t
                    }
                    None => return Ok(None),
                },
            };
            if self.do_until(&traverser, true, upstream.side_effects(), &step)? {
                trace!(step = %step, loops = traverser.loop_count(), "repeat bypassed");
                traverser.reset_loop();
                return Ok(Some(traverser));
            }
            let emitted = if self.do_emit(&traverser, true, upstream.side_effects(), &step)? {
                Some(Self::emit_split(&traverser))
            } else {
                None
            };
            match self.body.as_mut() {
                Some(body) => body.add_start(traverser),
                // rejected at lock time; an unlocked bodiless repeat passes through
                None => {
                    traverser.reset_loop();
                    return Ok(Some(traverser));
                }
            }
            if emitted.is_some() {
                return Ok(emitted);
            }
        }
    }

    fn reset(&mut self) {
        self.base.reset();
        self.reentry.clear();
        for child in self.children_mut() {
            child.reset_steps();
        }
    }

    fn children(&self) -> Vec<&Traversal> {
        let mut children: Vec<&Traversal> = Vec::new();
        if let Some(body) = &self.body {
            children.push(body);
        }
        children.extend(self.until.as_ref().and_then(Condition::traversal));
        children.extend(self.emit.as_ref().and_then(Condition::traversal));
        children
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        let mut children: Vec<&mut Traversal> = Vec::new();
        if let Some(body) = self.body.as_mut() {
            children.push(body);
        }
        children.extend(self.until.as_mut().and_then(Condition::traversal_mut));
        children.extend(self.emit.as_mut().and_then(Condition::traversal_mut));
        children
    }
}
