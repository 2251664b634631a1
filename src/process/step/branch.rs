//! Steps that run nested traversals per input
//!
//! Each input restarts the nested traversal(s) from a clean state and is
//! fully expanded before the next input is pulled.

use super::{step_boilerplate, Step, StepBase, Upstream};
use crate::error::TraversalResult;
use crate::process::traversal::Traversal;
use crate::process::traverser::Traverser;
use crate::structure::Value;

/// Runs `child` on each input in isolation, so barriers inside it
/// reduce per input
#[derive(Clone)]
pub struct LocalStep {
    base: StepBase,
    child: Box<Traversal>,
    active: bool,
}

impl LocalStep {
    pub fn new(child: Traversal) -> Self {
        Self {
            base: StepBase::new(),
            child: Box::new(child),
            active: false,
        }
    }
}

impl Step for LocalStep {
    step_boilerplate!("local");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        loop {
            if self.active {
                if let Some(t) = self.child.pull_in(upstream.side_effects())? {
                    return Ok(Some(t));
                }
                self.active = false;
            }
            let Some(traverser) = self.base.next_start(upstream)? else {
                return Ok(None);
            };
            self.child.reset_steps();
            self.child.add_start(traverser);
            self.active = true;
        }
    }

    fn reset(&mut self) {
        self.base.reset();
        self.child.reset_steps();
        self.active = false;
    }

    fn children(&self) -> Vec<&Traversal> {
        vec![&*self.child]
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        vec![&mut *self.child]
    }
}

/// Feeds each input to every branch and concatenates their outputs in
/// branch order
#[derive(Clone)]
pub struct UnionStep {
    base: StepBase,
    branches: Vec<Traversal>,
    // branch currently being drained for the current input
    current: Option<usize>,
}

impl UnionStep {
    pub fn new(branches: Vec<Traversal>) -> Self {
        Self {
            base: StepBase::new(),
            branches,
            current: None,
        }
    }
}

impl Step for UnionStep {
    step_boilerplate!("union");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        loop {
            if let Some(index) = self.current {
                match self.branches.get_mut(index) {
                    Some(branch) => {
                        if let Some(t) = branch.pull_in(upstream.side_effects())? {
                            return Ok(Some(t));
                        }
                        self.current = Some(index + 1);
                        continue;
                    }
                    None => self.current = None,
                }
            }
            let Some(traverser) = self.base.next_start(upstream)? else {
                return Ok(None);
            };
            for branch in self.branches.iter_mut() {
                branch.reset_steps();
                branch.add_start(traverser.split_same());
            }
            self.current = Some(0);
        }
    }

    fn reset(&mut self) {
        self.base.reset();
        self.current = None;
        for branch in self.branches.iter_mut() {
            branch.reset_steps();
        }
    }

    fn children(&self) -> Vec<&Traversal> {
        self.branches.iter().collect()
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        self.branches.iter_mut().collect()
    }
}

/// Emits the child's results, or the input itself when the child yields
/// nothing
#[derive(Clone)]
pub struct OptionalStep {
    base: StepBase,
    child: Box<Traversal>,
    active: bool,
}

impl OptionalStep {
    pub fn new(child: Traversal) -> Self {
        Self {
            base: StepBase::new(),
            child: Box::new(child),
            active: false,
        }
    }
}

impl Step for OptionalStep {
    step_boilerplate!("optional");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        loop {
            if self.active {
                if let Some(t) = self.child.pull_in(upstream.side_effects())? {
                    return Ok(Some(t));
                }
                self.active = false;
            }
            let Some(traverser) = self.base.next_start(upstream)? else {
                return Ok(None);
            };
            self.child.reset_steps();
            self.child.add_start(traverser.split_same());
            if self.child.has_next_in(upstream.side_effects())? {
                self.active = true;
            } else {
                return Ok(Some(traverser));
            }
        }
    }

    fn reset(&mut self) {
        self.base.reset();
        self.child.reset_steps();
        self.active = false;
    }

    fn children(&self) -> Vec<&Traversal> {
        vec![&*self.child]
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        vec![&mut *self.child]
    }
}

/// Emits the results of the first branch that yields anything for the
/// input; the input is dropped when none does
#[derive(Clone)]
pub struct CoalesceStep {
    base: StepBase,
    branches: Vec<Traversal>,
    // branch being drained for the current input
    current: Option<usize>,
}

impl CoalesceStep {
    pub fn new(branches: Vec<Traversal>) -> Self {
        Self {
            base: StepBase::new(),
            branches,
            current: None,
        }
    }
}

impl Step for CoalesceStep {
    step_boilerplate!("coalesce");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        loop {
            if let Some(branch) = self.current.and_then(|i| self.branches.get_mut(i)) {
                if let Some(t) = branch.pull_in(upstream.side_effects())? {
                    return Ok(Some(t));
                }
                self.current = None;
            }
            let Some(traverser) = self.base.next_start(upstream)? else {
                return Ok(None);
            };
            for (index, branch) in self.branches.iter_mut().enumerate() {
                branch.reset_steps();
                branch.add_start(traverser.split_same());
                if branch.has_next_in(upstream.side_effects())? {
                    self.current = Some(index);
                    break;
                }
            }
        }
    }

    fn reset(&mut self) {
        self.base.reset();
        self.current = None;
        for branch in self.branches.iter_mut() {
            branch.reset_steps();
        }
    }

    fn children(&self) -> Vec<&Traversal> {
        self.branches.iter().collect()
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        self.branches.iter_mut().collect()
    }
}

/// Option key of a [`ChooseStep`]
#[derive(Debug, Clone, PartialEq)]
pub enum Pick {
    /// Taken when the choice equals this value
    Value(Value),
    /// Taken when no value option matches
    None,
}

/// How a [`ChooseStep`] turns its selector into a choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// `true` when the selector yields anything, `false` otherwise
    Exists,
    /// The selector's first result; no result matches only [`Pick::None`]
    First,
}

/// Routes each input to the option picked by its selector
///
/// An input with no matching option passes through unchanged.
#[derive(Clone)]
pub struct ChooseStep {
    base: StepBase,
    selector: Box<Traversal>,
    choice: Choice,
    options: Vec<(Pick, Traversal)>,
    // option being drained for the current input
    current: Option<usize>,
}

impl ChooseStep {
    pub fn new(selector: Traversal, choice: Choice) -> Self {
        Self {
            base: StepBase::new(),
            selector: Box::new(selector),
            choice,
            options: Vec::new(),
            current: None,
        }
    }

    /// `choose(predicate, then, otherwise)`
    pub fn if_then_else(predicate: Traversal, then: Traversal, otherwise: Traversal) -> Self {
        let mut step = Self::new(predicate, Choice::Exists);
        step.add_option(Pick::Value(Value::from(true)), then);
        step.add_option(Pick::Value(Value::from(false)), otherwise);
        step
    }

    pub fn add_option(&mut self, pick: Pick, option: Traversal) {
        self.options.push((pick, option));
    }

    pub fn has_option(&self, pick: &Pick) -> bool {
        self.options.iter().any(|(p, _)| p == pick)
    }

    fn pick(&self, choice: Option<&Value>) -> Option<usize> {
        let matched = choice.and_then(|value| {
            self.options
                .iter()
                .position(|(pick, _)| matches!(pick, Pick::Value(v) if v == value))
        });
        matched.or_else(|| self.options.iter().position(|(pick, _)| *pick == Pick::None))
    }
}

impl Step for ChooseStep {
    step_boilerplate!("choose");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        loop {
            if let Some(index) = self.current {
                if let Some((_, option)) = self.options.get_mut(index) {
                    if let Some(t) = option.pull_in(upstream.side_effects())? {
                        return Ok(Some(t));
                    }
                }
                self.current = None;
            }
            let Some(traverser) = self.base.next_start(upstream)? else {
                return Ok(None);
            };
            let choice = match self.choice {
                Choice::Exists => {
                    self.selector.reset_steps();
                    self.selector.add_start(traverser.split_same());
                    Some(Value::from(self.selector.has_next_in(upstream.side_effects())?))
                }
                Choice::First => self.selector.produce_in(&traverser, upstream.side_effects())?,
            };
            let Some(index) = self.pick(choice.as_ref()) else {
                return Ok(Some(traverser));
            };
            if let Some((_, option)) = self.options.get_mut(index) {
                option.reset_steps();
                option.add_start(traverser);
                self.current = Some(index);
            }
        }
    }

    fn reset(&mut self) {
        self.base.reset();
        self.current = None;
        self.selector.reset_steps();
        for (_, option) in self.options.iter_mut() {
            option.reset_steps();
        }
    }

    fn children(&self) -> Vec<&Traversal> {
        let mut children: Vec<&Traversal> = vec![&*self.selector];
        children.extend(self.options.iter().map(|(_, option)| option));
        children
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        let mut children: Vec<&mut Traversal> = vec![&mut *self.selector];
        children.extend(self.options.iter_mut().map(|(_, option)| option));
        children
    }
}

#[cfg(test)]
mod tests {
    use crate::process::dsl::anon;
    use crate::process::GraphTraversalSource;
    use crate::structure::{MemoryGraph, Value};
    use std::sync::Arc;

    fn source() -> GraphTraversalSource {
        GraphTraversalSource::new(Arc::new(MemoryGraph::modern()))
    }

    #[test]
    fn test_local_reduces_per_input() {
        let counts = source()
            .v([1, 2, 4])
            .local(anon().out(&[]).count())
            .to_list()
            .unwrap();
        assert_eq!(counts, vec![Value::from(3), Value::from(0), Value::from(2)]);
    }

    #[test]
    fn test_union_is_depth_first_per_input() {
        let out = anon()
            .inject(vec![Value::from(1), Value::from(2)])
            .union(vec![anon().constant("a"), anon().constant("b")])
            .to_list()
            .unwrap();
        assert_eq!(
            out,
            vec![Value::from("a"), Value::from("b"), Value::from("a"), Value::from("b")]
        );
    }

    #[test]
    fn test_optional_falls_back_to_input() {
        let names = source()
            .v([2, 4])
            .optional(anon().out(&["created"]))
            .values(&["name"])
            .to_list()
            .unwrap();
        assert_eq!(names, vec![Value::from("vadas"), Value::from("ripple"), Value::from("lop")]);
    }
}
