//! Source step

use super::{step_boilerplate, Step, StepBase, Upstream};
use crate::error::TraversalResult;
use crate::process::traverser::Traverser;
use crate::structure::{ElementId, Graph, GraphExt, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
enum Source {
    /// Only traversers added with `add_start`
    Empty,
    Values(Vec<Value>),
    /// Graph vertices, all of them when `ids` is empty
    Vertices {
        graph: Arc<dyn Graph>,
        ids: Vec<ElementId>,
    },
}

/// First step of every traversal
#[derive(Clone)]
pub struct StartStep {
    base: StepBase,
    source: Source,
    pending: VecDeque<Traverser>,
    loaded: bool,
}

impl StartStep {
    fn from_source(source: Source) -> Self {
        Self {
            base: StepBase::new(),
            source,
            pending: VecDeque::new(),
            loaded: false,
        }
    }

    pub fn empty() -> Self {
        Self::from_source(Source::Empty)
    }

    pub fn values(values: Vec<Value>) -> Self {
        Self::from_source(Source::Values(values))
    }

    pub fn vertices(graph: Arc<dyn Graph>, ids: Vec<ElementId>) -> Self {
        Self::from_source(Source::Vertices { graph, ids })
    }

    pub fn is_graph_source(&self) -> bool {
        matches!(self.source, Source::Vertices { .. })
    }

    /// Vertex ids this step would emit
    pub fn vertex_ids(&self) -> Vec<ElementId> {
        match &self.source {
            Source::Vertices { graph, ids } if ids.is_empty() => graph.vertex_ids(),
            Source::Vertices { ids, .. } => ids.clone(),
            _ => Vec::new(),
        }
    }

    /// Add constant start values; `false` for a graph source
    pub fn inject(&mut self, values: Vec<Value>) -> bool {
        self.source = match std::mem::replace(&mut self.source, Source::Empty) {
            Source::Empty => Source::Values(values),
            Source::Values(mut existing) => {
                existing.extend(values);
                Source::Values(existing)
            }
            vertices @ Source::Vertices { .. } => {
                self.source = vertices;
                return false;
            }
        };
        self.pending.clear();
        self.loaded = false;
        true
    }

    /// Narrow a graph source to `ids`
    pub fn restrict_to(&mut self, restricted: Vec<ElementId>) {
        if let Source::Vertices { ids, .. } = &mut self.source {
            *ids = restricted;
            self.pending.clear();
            self.loaded = false;
        }
    }

    fn load(&mut self) {
        self.loaded = true;
        match &self.source {
            Source::Empty => {}
            Source::Values(values) => {
                self.pending.extend(values.iter().cloned().map(Traverser::new));
            }
            Source::Vertices { graph, ids } => {
                let vertices = if ids.is_empty() {
                    graph.vertices()
                } else {
                    ids.iter().filter_map(|id| graph.vertex(id)).collect()
                };
                debug!(count = vertices.len(), "start step loaded vertices");
                self.pending.extend(vertices.into_iter().map(|v| Traverser::new(Value::Vertex(v))));
            }
        }
    }
}

impl Step for StartStep {
    step_boilerplate!("start");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        if !self.loaded {
            self.load();
        }
        if let Some(t) = self.pending.pop_front() {
            return Ok(Some(t));
        }
        self.base.next_start(upstream)
    }

    fn reset(&mut self) {
        self.base.reset();
        self.pending.clear();
        self.loaded = false;
    }
}
