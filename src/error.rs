//! Error taxonomy for traversal construction and evaluation
//!
//! Exhaustion is not an error: pull operations return `Ok(None)` when a
//! traversal has no more results. Everything in [`TraversalError`] aborts
//! the pull that raised it.

use crate::structure::GraphError;
use thiserror::Error;

/// Traversal errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraversalError {
    /// Rejected at build (lock) time
    #[error("Illegal configuration: {0}")]
    IllegalConfiguration(String),

    /// An until/emit/filter predicate failed while evaluating
    #[error("Predicate failed in {step}: {message}")]
    PredicateFailure { step: String, message: String },

    /// A step received a value lacking a capability it requires
    #[error("Type mismatch in {step}: expected {expected}, found {found}")]
    TypeMismatch {
        step: String,
        expected: String,
        found: String,
    },

    /// Pulled past the end of a fail-fast iterator
    #[error("No such element: iterator is exhausted")]
    NoSuchElement,

    /// The traversal failed earlier and must be reset before pulling again
    #[error("Traversal previously failed and must be reset: {0}")]
    Poisoned(Box<TraversalError>),

    /// Side-effect key was never registered nor set
    #[error("Side effect not found: {0}")]
    SideEffectNotFound(String),

    /// The compute collaborator reported a failure
    #[error("Computer error: {0}")]
    Computer(String),

    /// Storage-side error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

impl TraversalError {
    pub fn type_mismatch(step: impl Into<String>, expected: impl Into<String>, found: impl Into<String>) -> Self {
        TraversalError::TypeMismatch {
            step: step.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn predicate(step: impl Into<String>, message: impl Into<String>) -> Self {
        TraversalError::PredicateFailure {
            step: step.into(),
            message: message.into(),
        }
    }
}

pub type TraversalResult<T> = Result<T, TraversalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::ElementId;

    #[test]
    fn test_error_messages_name_the_step() {
        let err = TraversalError::type_mismatch("sum@t1:3", "number", "String");
        assert_eq!(err.to_string(), "Type mismatch in sum@t1:3: expected number, found String");

        let err = TraversalError::predicate("repeat@t1:1", "boom");
        assert!(err.to_string().contains("repeat@t1:1"));
    }

    #[test]
    fn test_graph_error_converts() {
        let err: TraversalError = GraphError::VertexNotFound(ElementId::Int(9)).into();
        assert!(matches!(err, TraversalError::Graph(_)));
    }
}
