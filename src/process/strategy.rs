//! Strategies applied when a traversal is locked

use super::step::map::{MapKind, MapStep};
use super::step::{RepeatStep, Step};
use super::traversal::Traversal;
use crate::error::{TraversalError, TraversalResult};

/// Rewrites or validates a traversal before its first pull
pub trait TraversalStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, traversal: &mut Traversal) -> TraversalResult<()>;
}

/// Rejects malformed loop constructs
///
/// - every `until`/`emit`/`times` has a `repeat` body to attach to
/// - every `loops(name)` sits inside a repeat declared with that name
pub struct StandardVerificationStrategy;

impl TraversalStrategy for StandardVerificationStrategy {
    fn name(&self) -> &'static str {
        "standard-verification"
    }

    fn apply(&self, traversal: &mut Traversal) -> TraversalResult<()> {
        let mut scope = Vec::new();
        verify_steps(traversal, &mut scope)
    }
}

fn verify_steps(traversal: &Traversal, scope: &mut Vec<Option<String>>) -> TraversalResult<()> {
    for step in traversal.steps() {
        verify_step(step.as_ref(), scope)?;
    }
    Ok(())
}

fn verify_step(step: &dyn Step, scope: &mut Vec<Option<String>>) -> TraversalResult<()> {
    if let Some(repeat) = step.as_any().downcast_ref::<RepeatStep>() {
        if !repeat.has_body() {
            return Err(TraversalError::IllegalConfiguration(format!(
                "{} has a modulator but no repeat() body to attach to",
                step.describe()
            )));
        }
        scope.push(repeat.loop_name().map(str::to_string));
        let result = step
            .children()
            .into_iter()
            .try_for_each(|child| verify_steps(child, scope));
        scope.pop();
        return result;
    }

    if let Some(map) = step.as_any().downcast_ref::<MapStep>() {
        if let MapKind::Loops(Some(name)) = map.kind() {
            if !scope.iter().any(|n| n.as_deref() == Some(name.as_str())) {
                return Err(TraversalError::IllegalConfiguration(format!(
                    "{} refers to loop '{}' which no enclosing repeat declares",
                    step.describe(),
                    name
                )));
            }
        }
    }

    for child in step.children() {
        verify_steps(child, scope)?;
    }
    Ok(())
}
