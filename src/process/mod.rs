//! Traversal execution: traversers, steps, pipelines and strategies

pub mod computer;
pub mod dsl;
pub mod path;
pub mod predicate;
pub mod side_effects;
pub mod step;
pub mod strategy;
pub mod traversal;
pub mod traverser;
pub mod traverser_set;

pub use computer::{
    partition_round_robin, ComputerResultStep, ComputerVerificationStrategy, GraphComputer, TraversalVertexProgram,
    VertexProgramStrategy,
};
pub use dsl::{anon, GraphTraversalSource};
pub use path::{Path, Pop};
pub use predicate::{Condition, P};
pub use side_effects::{append_reducer, Reducer, SideEffects};
pub use step::{Order, ReduceOp, Step, StepId, TraversalId};
pub use strategy::{StandardVerificationStrategy, TraversalStrategy};
pub use traversal::{Traversal, TraversalState};
pub use traverser::{LoopFrame, Traverser};
pub use traverser_set::TraverserSet;
