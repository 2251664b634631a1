//! Steps that pass or drop traversers without changing their value

use super::{step_boilerplate, Step, StepBase, Upstream};
use crate::error::{TraversalError, TraversalResult};
use crate::process::predicate::P;
use crate::process::side_effects::SideEffects;
use crate::process::traversal::Traversal;
use crate::process::traverser::Traverser;
use crate::structure::{Element, ElementId, Value};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// User filter function
pub type FilterFn = Arc<dyn Fn(&Traverser) -> TraversalResult<bool> + Send + Sync>;

#[derive(Clone)]
pub enum FilterKind {
    /// Some value of the property satisfies the predicate
    Has(String, P),
    HasLabel(Vec<String>),
    HasId(Vec<ElementId>),
    /// The traverser's value satisfies the predicate
    Is(P),
    Lambda(FilterFn),
    /// No object repeats in the path
    SimplePath,
    /// The sub-traversal yields at least one result
    Where(Box<Traversal>),
    /// The sub-traversal yields nothing
    Not(Box<Traversal>),
}

#[derive(Clone)]
pub struct FilterStep {
    base: StepBase,
    kind: FilterKind,
}

impl FilterStep {
    pub fn new(kind: FilterKind) -> Self {
        Self {
            base: StepBase::new(),
            kind,
        }
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    fn test(&mut self, traverser: &Traverser, side_effects: &mut SideEffects) -> TraversalResult<bool> {
        let step = self.describe();
        let value = traverser.value();
        match &mut self.kind {
            FilterKind::Has(key, predicate) => {
                let element = element(&step, value)?;
                for v in element.values(&[key.as_str()]) {
                    if predicate
                        .test(&Value::Scalar(v))
                        .map_err(|message| TraversalError::predicate(&step, message))?
                    {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            FilterKind::HasLabel(labels) => {
                let element = element(&step, value)?;
                Ok(labels.iter().any(|l| l == element.label()))
            }
            FilterKind::HasId(ids) => {
                let element = element(&step, value)?;
                Ok(ids.contains(element.id()))
            }
            FilterKind::Is(predicate) => predicate
                .test(value)
                .map_err(|message| TraversalError::predicate(&step, message)),
            FilterKind::Lambda(f) => f(traverser),
            FilterKind::SimplePath => Ok(traverser.path().is_simple()),
            FilterKind::Where(sub) => {
                sub.reset_steps();
                sub.add_start(traverser.split_same());
                sub.has_next_in(side_effects)
            }
            FilterKind::Not(sub) => {
                sub.reset_steps();
                sub.add_start(traverser.split_same());
                Ok(!sub.has_next_in(side_effects)?)
            }
        }
    }
}

fn element<'v>(step: &str, value: &'v Value) -> TraversalResult<&'v dyn Element> {
    value
        .as_element()
        .ok_or_else(|| TraversalError::type_mismatch(step, "Element", value.type_name()))
}

impl Step for FilterStep {
    step_boilerplate!();

    fn name(&self) -> &'static str {
        match self.kind {
            FilterKind::Has(..) => "has",
            FilterKind::HasLabel(_) => "hasLabel",
            FilterKind::HasId(_) => "hasId",
            FilterKind::Is(_) => "is",
            FilterKind::Lambda(_) => "filter",
            FilterKind::SimplePath => "simplePath",
            FilterKind::Where(_) => "where",
            FilterKind::Not(_) => "not",
        }
    }

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        while let Some(traverser) = self.base.next_start(upstream)? {
            if self.test(&traverser, upstream.side_effects())? {
                return Ok(Some(traverser));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.base.reset();
        for child in self.children_mut() {
            child.reset_steps();
        }
    }

    fn children(&self) -> Vec<&Traversal> {
        match &self.kind {
            FilterKind::Where(sub) | FilterKind::Not(sub) => vec![&**sub],
            _ => Vec::new(),
        }
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        match &mut self.kind {
            FilterKind::Where(sub) | FilterKind::Not(sub) => vec![&mut **sub],
            _ => Vec::new(),
        }
    }
}

/// Passes results `low..high` of the stream, counting bulk
///
/// A traverser straddling a bound is split so that only the part inside
/// the window passes. Once `high` is reached no further input is pulled.
#[derive(Clone)]
pub struct RangeStep {
    base: StepBase,
    low: u64,
    high: Option<u64>,
    seen: u64,
}

impl RangeStep {
    pub fn new(low: u64, high: Option<u64>) -> Self {
        Self {
            base: StepBase::new(),
            low,
            high,
            seen: 0,
        }
    }

    pub fn limit(n: u64) -> Self {
        Self::new(0, Some(n))
    }

    pub fn low(&self) -> u64 {
        self.low
    }

    pub fn high(&self) -> Option<u64> {
        self.high
    }

    fn exhausted(&self) -> bool {
        self.high.is_some_and(|high| self.seen >= high)
    }
}

impl Step for RangeStep {
    step_boilerplate!("range");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        while !self.exhausted() {
            let Some(mut traverser) = self.base.next_start(upstream)? else {
                return Ok(None);
            };
            let start = self.seen;
            let end = start.saturating_add(traverser.bulk());
            self.seen = end;

            let from = start.max(self.low);
            let to = self.high.map_or(end, |high| end.min(high));
            if from < to {
                traverser.set_bulk(to - from);
                return Ok(Some(traverser));
            }
        }
        trace!(step = %self.describe(), "range exhausted");
        Ok(None)
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.base.reset();
        self.seen = 0;
    }
}

/// Passes the last `limit` results of the stream, counting bulk
///
/// The whole input is drained first. The oldest kept traverser is trimmed
/// when only part of its bulk fits.
#[derive(Clone)]
pub struct TailStep {
    base: StepBase,
    limit: u64,
    kept: VecDeque<Traverser>,
    kept_bulk: u64,
    drained: bool,
}

impl TailStep {
    pub fn new(limit: u64) -> Self {
        Self {
            base: StepBase::new(),
            limit,
            kept: VecDeque::new(),
            kept_bulk: 0,
            drained: false,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    fn keep(&mut self, traverser: Traverser) {
        self.kept_bulk = self.kept_bulk.saturating_add(traverser.bulk());
        while let Some(oldest) = self.kept.front() {
            let bulk = oldest.bulk();
            if self.kept_bulk - bulk < self.limit {
                break;
            }
            self.kept.pop_front();
            self.kept_bulk -= bulk;
        }
        self.kept.push_back(traverser);
    }
}

impl Step for TailStep {
    step_boilerplate!("tail");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if !self.drained {
            while let Some(traverser) = self.base.next_start(upstream)? {
                self.keep(traverser);
            }
            self.drained = true;
        }
        if self.limit == 0 {
            return Ok(None);
        }
        let Some(mut oldest) = self.kept.pop_front() else {
            return Ok(None);
        };
        let excess = self.kept_bulk.saturating_sub(self.limit);
        if excess > 0 {
            oldest.set_bulk(oldest.bulk() - excess);
            self.kept_bulk -= excess;
        }
        self.kept_bulk -= oldest.bulk();
        Ok(Some(oldest))
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.base.reset();
        self.kept.clear();
        self.kept_bulk = 0;
        self.drained = false;
    }
}

/// Passes the first traverser of each distinct value, with bulk 1
#[derive(Clone, Default)]
pub struct DedupStep {
    base: StepBase,
    seen: FxHashSet<Value>,
}

impl DedupStep {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Step for DedupStep {
    step_boilerplate!("dedup");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        while let Some(mut traverser) = self.base.next_start(upstream)? {
            if self.seen.insert(traverser.value().clone()) {
                traverser.set_bulk(1);
                return Ok(Some(traverser));
            }
        }
        Ok(None)
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.base.reset();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::process::dsl::anon;
    use crate::process::{Traverser, P};
    use crate::structure::Value;
    use crate::TraversalError;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&i| Value::from(i)).collect()
    }

    #[test]
    fn test_is_with_predicate() {
        let out = anon().inject(ints(&[1, 5, 10])).is(P::gt(3)).to_list().unwrap();
        assert_eq!(out, ints(&[5, 10]));
    }

    #[test]
    fn test_range_splits_bulk() {
        let mut t = anon().range(1, Some(4));
        t.add_start(Traverser::new(7).with_bulk(3));
        t.add_start(Traverser::new(8).with_bulk(3));
        let out = t.to_traverser_list().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].bulk(), 2);
        assert_eq!(out[1].bulk(), 1);
    }

    #[test]
    fn test_limit_and_reset() {
        let mut t = anon().inject(ints(&[1, 2, 3, 4])).limit(2);
        assert_eq!(t.to_list().unwrap(), ints(&[1, 2]));
        t.reset();
        assert_eq!(t.to_list().unwrap(), ints(&[1, 2]));
    }

    #[test]
    fn test_dedup_drops_bulk() {
        let mut t = anon().dedup();
        t.add_start(Traverser::new(1).with_bulk(4));
        t.add_start(Traverser::new(2));
        t.add_start(Traverser::new(1));
        assert_eq!(t.to_list().unwrap(), ints(&[1, 2]));
    }

    #[test]
    fn test_has_on_scalar_is_type_mismatch() {
        let err = anon().inject(ints(&[1])).has("name", P::eq("x")).to_list().unwrap_err();
        assert!(matches!(err, TraversalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_predicate_closure_failure() {
        let err = anon()
            .inject(ints(&[1]))
            .is(P::test_fn(|_| Err("bad input".to_string())))
            .to_list()
            .unwrap_err();
        assert!(matches!(err, TraversalError::PredicateFailure { ref message, .. } if message == "bad input"));
    }
}
