//! Predicates and loop conditions

use super::side_effects::SideEffects;
use super::traversal::Traversal;
use super::traverser::Traverser;
use crate::error::{TraversalError, TraversalResult};
use crate::structure::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Fallible user predicate over a value
pub type PredicateFn = Arc<dyn Fn(&Value) -> Result<bool, String> + Send + Sync>;

/// Value predicate
///
/// Ordering comparisons promote between integers and floats. A comparison
/// between incomparable values is false, never an error.
#[derive(Clone)]
pub enum P {
    Eq(Value),
    Neq(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    Within(Vec<Value>),
    Without(Vec<Value>),
    /// `low <= x < high`
    Between(Value, Value),
    And(Box<P>, Box<P>),
    Or(Box<P>, Box<P>),
    Not(Box<P>),
    Fn(PredicateFn),
}

impl P {
    pub fn eq(value: impl Into<Value>) -> Self {
        P::Eq(value.into())
    }

    pub fn neq(value: impl Into<Value>) -> Self {
        P::Neq(value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        P::Lt(value.into())
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        P::Lte(value.into())
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        P::Gt(value.into())
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        P::Gte(value.into())
    }

    pub fn within<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        P::Within(values.into_iter().map(Into::into).collect())
    }

    pub fn without<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        P::Without(values.into_iter().map(Into::into).collect())
    }

    pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        P::Between(low.into(), high.into())
    }

    pub fn and(self, other: P) -> Self {
        P::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: P) -> Self {
        P::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        P::Not(Box::new(self))
    }

    /// Wrap a fallible closure
    pub fn test_fn<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, String> + Send + Sync + 'static,
    {
        P::Fn(Arc::new(f))
    }

    /// Evaluate against `value`; `Err` only comes from user closures
    pub fn test(&self, value: &Value) -> Result<bool, String> {
        Ok(match self {
            P::Eq(v) => loose_eq(value, v),
            P::Neq(v) => !loose_eq(value, v),
            P::Lt(v) => compare(value, v) == Some(Ordering::Less),
            P::Lte(v) => matches!(compare(value, v), Some(Ordering::Less | Ordering::Equal)),
            P::Gt(v) => compare(value, v) == Some(Ordering::Greater),
            P::Gte(v) => matches!(compare(value, v), Some(Ordering::Greater | Ordering::Equal)),
            P::Within(vs) => vs.iter().any(|v| loose_eq(value, v)),
            P::Without(vs) => !vs.iter().any(|v| loose_eq(value, v)),
            P::Between(low, high) => {
                matches!(compare(value, low), Some(Ordering::Greater | Ordering::Equal))
                    && compare(value, high) == Some(Ordering::Less)
            }
            P::And(a, b) => a.test(value)? && b.test(value)?,
            P::Or(a, b) => a.test(value)? || b.test(value)?,
            P::Not(p) => !p.test(value)?,
            P::Fn(f) => f(value)?,
        })
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => x.eq_loose(y),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => x.compare_loose(y),
        _ => None,
    }
}

impl fmt::Debug for P {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            P::Eq(v) => write!(f, "eq({})", v),
            P::Neq(v) => write!(f, "neq({})", v),
            P::Lt(v) => write!(f, "lt({})", v),
            P::Lte(v) => write!(f, "lte({})", v),
            P::Gt(v) => write!(f, "gt({})", v),
            P::Gte(v) => write!(f, "gte({})", v),
            P::Within(vs) => write!(f, "within({})", Value::List(vs.clone())),
            P::Without(vs) => write!(f, "without({})", Value::List(vs.clone())),
            P::Between(a, b) => write!(f, "between({}, {})", a, b),
            P::And(a, b) => write!(f, "and({:?}, {:?})", a, b),
            P::Or(a, b) => write!(f, "or({:?}, {:?})", a, b),
            P::Not(p) => write!(f, "not({:?})", p),
            P::Fn(_) => write!(f, "fn"),
        }
    }
}

/// Loop condition used by `until` and `emit`
#[derive(Clone)]
pub enum Condition {
    Constant(bool),
    /// Tested against the traverser's current value
    Predicate(P),
    /// Holds when the sub-traversal, started from the traverser, yields anything
    Traversal(Box<Traversal>),
}

impl Condition {
    /// Evaluate for `traverser`; `step` names the owner in failures
    pub fn test(
        &mut self,
        traverser: &Traverser,
        side_effects: &mut SideEffects,
        step: &str,
    ) -> TraversalResult<bool> {
        match self {
            Condition::Constant(b) => Ok(*b),
            Condition::Predicate(p) => p
                .test(traverser.value())
                .map_err(|message| TraversalError::predicate(step, message)),
            Condition::Traversal(t) => {
                t.reset_steps();
                t.add_start(traverser.split_same());
                t.has_next_in(side_effects)
            }
        }
    }

    pub fn traversal(&self) -> Option<&Traversal> {
        match self {
            Condition::Traversal(t) => Some(t),
            _ => None,
        }
    }

    pub fn traversal_mut(&mut self) -> Option<&mut Traversal> {
        match self {
            Condition::Traversal(t) => Some(t),
            _ => None,
        }
    }
}

impl From<bool> for Condition {
    fn from(b: bool) -> Self {
        Condition::Constant(b)
    }
}

impl From<P> for Condition {
    fn from(p: P) -> Self {
        Condition::Predicate(p)
    }
}

impl From<Traversal> for Condition {
    fn from(t: Traversal) -> Self {
        Condition::Traversal(Box::new(t))
    }
}
