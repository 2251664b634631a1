//! Seam to a partitioned graph computer
//!
//! In computer mode a graph-sourced traversal is cut at its first barrier.
//! The section before the cut (the worker section) is frozen into a
//! [`TraversalVertexProgram`] and handed to a [`GraphComputer`] together
//! with a partitioning of the source vertices. Each partition runs its own
//! copy of the worker section and returns detached traversers. The
//! [`ComputerResultStep`] merges those results, re-attaches them to the
//! local graph and feeds them to the section after the cut (the master
//! section), which runs in-process as usual.

use super::step::{step_boilerplate, StartStep, Step, StepBase, Upstream};
use super::strategy::TraversalStrategy;
use super::traversal::Traversal;
use super::traverser::Traverser;
use super::traverser_set::TraverserSet;
use crate::error::{TraversalError, TraversalResult};
use crate::structure::{ElementId, Graph};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Executes a vertex program over vertex partitions
///
/// Returns one result list per partition, in partition order.
pub trait GraphComputer: Send + Sync {
    fn execute(
        &self,
        program: &TraversalVertexProgram,
        partitions: &[Vec<ElementId>],
    ) -> TraversalResult<Vec<Vec<Traverser>>>;
}

/// The frozen worker section of a traversal
pub struct TraversalVertexProgram {
    worker: Traversal,
    graph: Arc<dyn Graph>,
    detach_properties: bool,
}

impl TraversalVertexProgram {
    pub fn new(worker: Traversal, graph: Arc<dyn Graph>, detach_properties: bool) -> Self {
        Self {
            worker,
            graph,
            detach_properties,
        }
    }

    pub fn graph(&self) -> &Arc<dyn Graph> {
        &self.graph
    }

    pub fn detach_properties(&self) -> bool {
        self.detach_properties
    }

    /// Names of the worker steps, in order
    pub fn step_names(&self) -> Vec<&'static str> {
        self.worker.steps().iter().map(|s| s.name()).collect()
    }

    /// Vertex ids the worker section starts from
    pub fn source_ids(&self) -> Vec<ElementId> {
        self.worker
            .steps()
            .first()
            .and_then(|s| s.as_any().downcast_ref::<StartStep>())
            .map(StartStep::vertex_ids)
            .unwrap_or_default()
    }

    /// Run a fresh copy of the worker section over `ids` and detach its
    /// output
    pub fn execute_partition(&self, ids: &[ElementId]) -> TraversalResult<Vec<Traverser>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut worker = self.worker.clone();
        let start = worker
            .steps_mut()
            .first_mut()
            .and_then(|s| s.as_any_mut().downcast_mut::<StartStep>())
            .ok_or_else(|| TraversalError::Computer("worker section has no start step".to_string()))?;
        start.restrict_to(ids.to_vec());

        let results = worker.to_traverser_list()?;
        debug!(vertices = ids.len(), results = results.len(), "partition executed");
        Ok(results
            .iter()
            .map(|t| t.detach(self.detach_properties))
            .collect())
    }
}

impl fmt::Debug for TraversalVertexProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalVertexProgram")
            .field("worker", &self.worker)
            .field("detach_properties", &self.detach_properties)
            .finish()
    }
}

/// Split `ids` round-robin into `count` partitions
pub fn partition_round_robin(ids: Vec<ElementId>, count: usize) -> Vec<Vec<ElementId>> {
    let count = count.max(1);
    let mut partitions: Vec<Vec<ElementId>> = vec![Vec::new(); count];
    for (i, id) in ids.into_iter().enumerate() {
        partitions[i % count].push(id);
    }
    partitions
}

/// Head of the master section: submits the program on first pull and
/// streams the merged results
#[derive(Clone)]
pub struct ComputerResultStep {
    base: StepBase,
    program: Arc<TraversalVertexProgram>,
    computer: Arc<dyn GraphComputer>,
    partitions: usize,
    results: Option<VecDeque<Traverser>>,
}

impl ComputerResultStep {
    pub fn new(program: TraversalVertexProgram, computer: Arc<dyn GraphComputer>, partitions: usize) -> Self {
        Self {
            base: StepBase::new(),
            program: Arc::new(program),
            computer,
            partitions,
            results: None,
        }
    }

    pub fn program(&self) -> &TraversalVertexProgram {
        &self.program
    }

    fn submit(&self) -> TraversalResult<VecDeque<Traverser>> {
        let partitions = partition_round_robin(self.program.source_ids(), self.partitions);
        debug!(
            step = %self.describe(),
            partitions = partitions.len(),
            worker = ?self.program.step_names(),
            "submitting vertex program"
        );
        let returned = self.computer.execute(&self.program, &partitions)?;

        let mut merged = TraverserSet::new();
        for traverser in returned.into_iter().flatten() {
            merged.add(traverser.attach(self.program.graph())?);
        }
        debug!(
            step = %self.describe(),
            traversers = merged.len(),
            bulk = merged.bulk_size(),
            "computer results merged"
        );
        Ok(merged.into_iter().collect())
    }
}

impl Step for ComputerResultStep {
    step_boilerplate!("computerResult");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if self.results.is_none() {
            self.results = Some(self.submit()?);
        }
        if let Some(t) = self.results.as_mut().and_then(VecDeque::pop_front) {
            return Ok(Some(t));
        }
        self.base.next_start(upstream)
    }

    fn reset(&mut self) {
        self.base.reset();
        self.results = None;
    }
}

/// Index of the first barrier after the start step, or the step count
fn worker_end(traversal: &Traversal) -> usize {
    traversal
        .steps()
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, s)| s.is_barrier())
        .map(|(i, _)| i)
        .unwrap_or(traversal.steps().len())
}

fn contains_side_effect(step: &dyn Step) -> bool {
    step.is_side_effect()
        || step
            .children()
            .iter()
            .any(|child| child.steps().iter().any(|s| contains_side_effect(s.as_ref())))
}

/// Rejects traversals that cannot be split for a computer
///
/// - the traversal must start from graph vertices
/// - the worker section must not write side effects, since partitions
///   do not share a store
pub struct ComputerVerificationStrategy;

impl TraversalStrategy for ComputerVerificationStrategy {
    fn name(&self) -> &'static str {
        "computer-verification"
    }

    fn apply(&self, traversal: &mut Traversal) -> TraversalResult<()> {
        let graph_sourced = traversal
            .steps()
            .first()
            .and_then(|s| s.as_any().downcast_ref::<StartStep>())
            .is_some_and(StartStep::is_graph_source);
        if !graph_sourced || traversal.graph().is_none() {
            return Err(TraversalError::IllegalConfiguration(
                "computer execution requires a traversal that starts from graph vertices".to_string(),
            ));
        }

        let end = worker_end(traversal);
        if let Some(step) = traversal.steps()[1..end]
            .iter()
            .find(|s| contains_side_effect(s.as_ref()))
        {
            return Err(TraversalError::IllegalConfiguration(format!(
                "{} writes side effects before the first barrier and cannot run on a computer",
                step.describe()
            )));
        }
        Ok(())
    }
}

/// Cuts the traversal at its first barrier and replaces the worker
/// section with a [`ComputerResultStep`]
pub struct VertexProgramStrategy;

impl TraversalStrategy for VertexProgramStrategy {
    fn name(&self) -> &'static str {
        "vertex-program"
    }

    fn apply(&self, traversal: &mut Traversal) -> TraversalResult<()> {
        let (Some(computer), Some(graph)) = (traversal.computer().cloned(), traversal.graph().cloned()) else {
            return Ok(());
        };
        let config = traversal.config().clone();
        let end = worker_end(traversal);

        let mut steps = std::mem::take(traversal.steps_mut());
        let master = steps.split_off(end);
        let mut section = steps.into_iter();
        let start = section
            .next()
            .and_then(|s| s.as_any().downcast_ref::<StartStep>().cloned())
            .ok_or_else(|| TraversalError::IllegalConfiguration("computer traversal has no start step".to_string()))?;

        let mut worker = Traversal::with_start(start, Some(Arc::clone(&graph)), config.clone());
        for step in section {
            worker.add_step(step);
        }
        let worker = worker.build()?;

        let program = TraversalVertexProgram::new(worker, graph, config.detach_properties);
        let mut replaced: Vec<Box<dyn Step>> = Vec::with_capacity(master.len() + 1);
        replaced.push(Box::new(ComputerResultStep::new(program, computer, config.partitions)));
        replaced.extend(master);
        debug!(traversal = ?traversal.traversal_id(), worker_end = end, "traversal split for computer");
        traversal.replace_steps(replaced);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::dsl::anon;
    use crate::process::GraphTraversalSource;
    use crate::structure::{MemoryGraph, Value};
    use std::sync::Mutex;

    /// Runs partitions one after another and records what it was given
    #[derive(Default)]
    struct SerialComputer {
        seen: Mutex<Vec<usize>>,
    }

    impl GraphComputer for SerialComputer {
        fn execute(
            &self,
            program: &TraversalVertexProgram,
            partitions: &[Vec<ElementId>],
        ) -> TraversalResult<Vec<Vec<Traverser>>> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.extend(partitions.iter().map(Vec::len));
            }
            partitions.iter().map(|ids| program.execute_partition(ids)).collect()
        }
    }

    fn source(computer: Arc<SerialComputer>) -> GraphTraversalSource {
        GraphTraversalSource::new(Arc::new(MemoryGraph::modern())).with_computer(computer)
    }

    #[test]
    fn test_round_robin_partitions() {
        let ids: Vec<ElementId> = (1..=5).map(ElementId::Int).collect();
        let parts = partition_round_robin(ids, 2);
        assert_eq!(parts[0], vec![ElementId::Int(1), ElementId::Int(3), ElementId::Int(5)]);
        assert_eq!(parts[1], vec![ElementId::Int(2), ElementId::Int(4)]);
        assert_eq!(partition_round_robin(Vec::new(), 0).len(), 1);
    }

    #[test]
    fn test_split_at_first_barrier() {
        let computer = Arc::new(SerialComputer::default());
        let mut t = source(Arc::clone(&computer)).v_all().out(&[]).count();
        assert_eq!(t.explain().unwrap(), vec!["computerResult", "count"]);
        assert_eq!(t.to_list().unwrap(), vec![Value::from(6)]);
        assert_eq!(computer.seen.lock().unwrap().iter().sum::<usize>(), 6);
    }

    #[test]
    fn test_results_are_reattached() {
        let computer = Arc::new(SerialComputer::default());
        let vertices = source(computer).v([1]).out(&["knows"]).to_list().unwrap();
        assert_eq!(vertices.len(), 2);
        assert!(vertices.iter().all(|v| v.as_vertex().is_some_and(|v| v.is_live())));
    }

    #[test]
    fn test_side_effect_in_worker_is_rejected() {
        let computer = Arc::new(SerialComputer::default());
        let err = source(computer)
            .v_all()
            .side_effect(|_, _| Ok(()))
            .count()
            .build()
            .unwrap_err();
        assert!(matches!(err, TraversalError::IllegalConfiguration(_)));
    }

    #[test]
    fn test_injected_source_is_rejected() {
        let computer: Arc<dyn GraphComputer> = Arc::new(SerialComputer::default());
        let err = anon()
            .inject(vec![Value::from(1)])
            .with_computer(computer)
            .build()
            .unwrap_err();
        assert!(matches!(err, TraversalError::IllegalConfiguration(_)));
    }
}
