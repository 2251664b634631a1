//! Barrier steps: consume all (or a bounded batch of) input before
//! producing output

use super::{step_boilerplate, Step, StepBase, Upstream};
use crate::error::{TraversalError, TraversalResult};
use crate::process::traversal::Traversal;
use crate::process::traverser::Traverser;
use crate::process::traverser_set::TraverserSet;
use crate::structure::{Element, PropertyValue, Value};
use crate::util::{number, BulkAccumulator};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::debug;

/// Aggregation performed by a [`ReducingBarrierStep`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Count,
    Sum,
    Mean,
    Min,
    Max,
    Fold,
}

impl ReduceOp {
    fn name(self) -> &'static str {
        match self {
            ReduceOp::Count => "count",
            ReduceOp::Sum => "sum",
            ReduceOp::Mean => "mean",
            ReduceOp::Min => "min",
            ReduceOp::Max => "max",
            ReduceOp::Fold => "fold",
        }
    }
}

/// Running state of one reduction
enum Accumulator {
    Count(u64),
    Numeric(BulkAccumulator),
    Extreme(Option<PropertyValue>),
    Fold(Vec<Value>),
}

/// Reduces its whole input to at most one traverser
///
/// Bulk is honored: a traverser of bulk `n` counts `n` times. With no
/// input, `count` yields 0 and `fold` an empty list; the numeric
/// reductions yield nothing.
#[derive(Clone)]
pub struct ReducingBarrierStep {
    base: StepBase,
    op: ReduceOp,
    done: bool,
}

impl ReducingBarrierStep {
    pub fn new(op: ReduceOp) -> Self {
        Self {
            base: StepBase::new(),
            op,
            done: false,
        }
    }

    pub fn op(&self) -> ReduceOp {
        self.op
    }

    fn accumulate(&self, acc: &mut Accumulator, traverser: Traverser) -> TraversalResult<()> {
        let bulk = traverser.bulk();
        match acc {
            Accumulator::Count(n) => *n = n.saturating_add(bulk),
            Accumulator::Numeric(sum) => {
                let value = traverser.value();
                let added = value.as_scalar().is_some_and(|s| sum.add(s, bulk));
                if !added {
                    return Err(TraversalError::type_mismatch(self.describe(), "number", value.type_name()));
                }
            }
            Accumulator::Extreme(current) => {
                let value = traverser.value();
                let scalar = value
                    .as_scalar()
                    .ok_or_else(|| TraversalError::type_mismatch(self.describe(), "comparable scalar", value.type_name()))?;
                let next = match current.as_ref() {
                    None => Some(scalar.clone()),
                    Some(best) if self.op == ReduceOp::Min => number::min(best, scalar),
                    Some(best) => number::max(best, scalar),
                };
                match next {
                    Some(next) => *current = Some(next),
                    None => {
                        return Err(TraversalError::type_mismatch(
                            self.describe(),
                            current.as_ref().map(PropertyValue::type_name).unwrap_or("comparable scalar"),
                            scalar.type_name(),
                        ))
                    }
                }
            }
            Accumulator::Fold(items) => {
                let value = traverser.into_value();
                for _ in 1..bulk {
                    items.push(value.clone());
                }
                items.push(value);
            }
        }
        Ok(())
    }

    fn finish(&self, acc: Accumulator) -> Option<Value> {
        match acc {
            Accumulator::Count(n) => Some(Value::from(i64::try_from(n).unwrap_or(i64::MAX))),
            Accumulator::Numeric(sum) if sum.count() == 0 => None,
            Accumulator::Numeric(sum) if self.op == ReduceOp::Mean => sum.mean().map(Value::Scalar),
            Accumulator::Numeric(sum) => Some(Value::Scalar(sum.sum().clone())),
            Accumulator::Extreme(best) => best.map(Value::Scalar),
            Accumulator::Fold(items) => Some(Value::List(items)),
        }
    }
}

impl Step for ReducingBarrierStep {
    step_boilerplate!();

    fn name(&self) -> &'static str {
        self.op.name()
    }

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if self.done {
            return Ok(None);
        }
        let mut acc = match self.op {
            ReduceOp::Count => Accumulator::Count(0),
            ReduceOp::Sum | ReduceOp::Mean => Accumulator::Numeric(BulkAccumulator::new()),
            ReduceOp::Min | ReduceOp::Max => Accumulator::Extreme(None),
            ReduceOp::Fold => Accumulator::Fold(Vec::new()),
        };
        let mut consumed = 0usize;
        while let Some(traverser) = self.base.next_start(upstream)? {
            consumed += 1;
            self.accumulate(&mut acc, traverser)?;
        }
        self.done = true;
        debug!(step = %self.describe(), consumed, "barrier drained");
        Ok(self.finish(acc).map(Traverser::new))
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.base.reset();
        self.done = false;
    }
}

/// What a [`GroupStep`] keeps per key
#[derive(Clone)]
pub enum GroupValue {
    /// Sum of bulks
    Count,
    /// Every grouped value as a list, or the result of a reducing
    /// traversal run over the group's traversers
    Collect(Option<Box<Traversal>>),
}

/// Reduces its whole input to a single map keyed by the first result of
/// `key` (the value itself when absent)
///
/// Traversers whose key traversal yields nothing are skipped. With no
/// input the map is empty.
#[derive(Clone)]
pub struct GroupStep {
    base: StepBase,
    key: Option<Box<Traversal>>,
    value: GroupValue,
    done: bool,
}

impl GroupStep {
    pub fn new(key: Option<Traversal>, value: GroupValue) -> Self {
        Self {
            base: StepBase::new(),
            key: key.map(Box::new),
            value,
            done: false,
        }
    }

    /// Run the value traversal over one group: a reducing traversal gives
    /// its single result, any other is folded into a list
    fn reduce_group(
        child: &mut Traversal,
        members: Vec<Traverser>,
        upstream: &mut Upstream<'_>,
    ) -> TraversalResult<Option<Value>> {
        child.reset_steps();
        for member in members {
            child.add_start(member);
        }
        let reducing = child
            .steps()
            .iter()
            .any(|s| s.as_any().is::<ReducingBarrierStep>() || s.as_any().is::<GroupStep>());
        if reducing {
            return Ok(child.pull_in(upstream.side_effects())?.map(Traverser::into_value));
        }
        let mut items = Vec::new();
        while let Some(t) = child.pull_in(upstream.side_effects())? {
            let bulk = t.bulk();
            let value = t.into_value();
            for _ in 1..bulk {
                items.push(value.clone());
            }
            items.push(value);
        }
        Ok(Some(Value::List(items)))
    }
}

impl Step for GroupStep {
    step_boilerplate!();

    fn name(&self) -> &'static str {
        match self.value {
            GroupValue::Count => "groupCount",
            GroupValue::Collect(_) => "group",
        }
    }

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if self.done {
            return Ok(None);
        }
        let mut groups: IndexMap<Value, Vec<Traverser>> = IndexMap::new();
        let mut consumed = 0usize;
        while let Some(traverser) = self.base.next_start(upstream)? {
            consumed += 1;
            let key = match self.key.as_mut() {
                Some(key) => key.produce_in(&traverser, upstream.side_effects())?,
                None => Some(traverser.value().clone()),
            };
            if let Some(key) = key {
                groups.entry(key).or_default().push(traverser);
            }
        }
        self.done = true;

        let mut result: IndexMap<Value, Value> = IndexMap::with_capacity(groups.len());
        for (key, members) in groups {
            let value = match &mut self.value {
                GroupValue::Count => {
                    let count: u64 = members.iter().map(Traverser::bulk).sum();
                    Some(Value::from(i64::try_from(count).unwrap_or(i64::MAX)))
                }
                GroupValue::Collect(Some(child)) => Self::reduce_group(child, members, upstream)?,
                GroupValue::Collect(None) => {
                    let mut items = Vec::new();
                    for member in members {
                        let bulk = member.bulk();
                        let value = member.into_value();
                        for _ in 1..bulk {
                            items.push(value.clone());
                        }
                        items.push(value);
                    }
                    Some(Value::List(items))
                }
            };
            if let Some(value) = value {
                result.insert(key, value);
            }
        }
        debug!(step = %self.describe(), consumed, groups = result.len(), "barrier drained");
        Ok(Some(Traverser::new(Value::Map(result))))
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.base.reset();
        self.done = false;
        for child in self.children_mut() {
            child.reset_steps();
        }
    }

    fn children(&self) -> Vec<&Traversal> {
        let mut children: Vec<&Traversal> = Vec::new();
        children.extend(self.key.as_deref());
        if let GroupValue::Collect(Some(child)) = &self.value {
            children.push(child);
        }
        children
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        let mut children: Vec<&mut Traversal> = Vec::new();
        children.extend(self.key.as_deref_mut());
        if let GroupValue::Collect(Some(child)) = &mut self.value {
            children.push(child);
        }
        children
    }
}

/// Collects up to `max_barrier_size` traversers, merging equal ones, then
/// releases them
#[derive(Clone)]
pub struct NoOpBarrierStep {
    base: StepBase,
    max_barrier_size: usize,
    released: VecDeque<Traverser>,
}

impl NoOpBarrierStep {
    pub fn new(max_barrier_size: usize) -> Self {
        Self {
            base: StepBase::new(),
            max_barrier_size: max_barrier_size.max(1),
            released: VecDeque::new(),
        }
    }

    pub fn max_barrier_size(&self) -> usize {
        self.max_barrier_size
    }
}

impl Step for NoOpBarrierStep {
    step_boilerplate!("barrier");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if self.released.is_empty() {
            let mut batch = TraverserSet::new();
            let mut pulled = 0usize;
            while pulled < self.max_barrier_size {
                match self.base.next_start(upstream)? {
                    Some(t) => {
                        batch.add(t);
                        pulled += 1;
                    }
                    None => break,
                }
            }
            if pulled > 0 {
                debug!(step = %self.describe(), pulled, merged = batch.len(), "barrier filled");
            }
            self.released = batch.into_iter().collect();
        }
        Ok(self.released.pop_front())
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.base.reset();
        self.released.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Sorts its whole input, by value or by a property of element values
///
/// The sort is stable. Elements without the `by` property sort first in
/// ascending order.
#[derive(Clone)]
pub struct OrderStep {
    base: StepBase,
    order: Order,
    by: Option<String>,
    sorted: Option<VecDeque<Traverser>>,
}

impl OrderStep {
    pub fn new(order: Order, by: Option<String>) -> Self {
        Self {
            base: StepBase::new(),
            order,
            by,
            sorted: None,
        }
    }

    fn sort_key(&self, traverser: &Traverser) -> TraversalResult<Option<Value>> {
        let value = traverser.value();
        match &self.by {
            None => Ok(Some(value.clone())),
            Some(key) => {
                let element = value
                    .as_element()
                    .ok_or_else(|| TraversalError::type_mismatch(self.describe(), "Element", value.type_name()))?;
                Ok(element.value(key).map(Value::Scalar))
            }
        }
    }
}

impl Step for OrderStep {
    step_boilerplate!("order");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if self.sorted.is_none() {
            let mut keyed = Vec::new();
            while let Some(traverser) = self.base.next_start(upstream)? {
                keyed.push((self.sort_key(&traverser)?, traverser));
            }
            keyed.sort_by(|(a, _), (b, _)| {
                let ord = match (a, b) {
                    (Some(a), Some(b)) => a.order_cmp(b),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match self.order {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
            debug!(step = %self.describe(), sorted = keyed.len(), "barrier drained");
            self.sorted = Some(keyed.into_iter().map(|(_, t)| t).collect());
        }
        Ok(self.sorted.as_mut().and_then(VecDeque::pop_front))
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.base.reset();
        self.sorted = None;
    }
}

/// Drains its input for side effects, then emits the value stored under
/// `key`
#[derive(Clone)]
pub struct CapStep {
    base: StepBase,
    key: String,
    done: bool,
}

impl CapStep {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            base: StepBase::new(),
            key: key.into(),
            done: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Step for CapStep {
    step_boilerplate!("cap");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if self.done {
            return Ok(None);
        }
        while self.base.next_start(upstream)?.is_some() {}
        self.done = true;
        let value = upstream.side_effects().get(&self.key)?;
        Ok(Some(Traverser::new(value)))
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.base.reset();
        self.done = false;
    }
}
