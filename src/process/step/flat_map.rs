//! One-to-many steps
//!
//! The outputs of one input are drained before the next input is pulled.

use super::{step_boilerplate, Step, StepBase, Upstream};
use crate::error::{TraversalError, TraversalResult};
use crate::process::traverser::Traverser;
use crate::structure::{Direction, Element, Value};
use std::collections::VecDeque;
use std::sync::Arc;

/// User expansion function
pub type FlatMapFn = Arc<dyn Fn(&Traverser) -> TraversalResult<Vec<Value>> + Send + Sync>;

#[derive(Clone)]
pub enum FlatMapKind {
    /// Adjacent vertices, optionally restricted to edge labels
    Vertices(Direction, Vec<String>),
    /// Incident edges, optionally restricted to edge labels
    Edges(Direction, Vec<String>),
    /// Both endpoints of an edge, out then in
    BothV,
    /// Property handles, every key when empty
    Properties(Vec<String>),
    /// Property values, every key when empty
    Values(Vec<String>),
    /// Items of a list or path, single-entry maps of a map; any other
    /// value passes through
    Unfold,
    Lambda(FlatMapFn),
}

#[derive(Clone)]
pub struct FlatMapStep {
    base: StepBase,
    kind: FlatMapKind,
    // split outputs of the current input
    pending: VecDeque<Traverser>,
}

impl FlatMapStep {
    pub fn new(kind: FlatMapKind) -> Self {
        Self {
            base: StepBase::new(),
            kind,
            pending: VecDeque::new(),
        }
    }

    pub fn kind(&self) -> &FlatMapKind {
        &self.kind
    }

    fn expand(&self, traverser: &Traverser) -> TraversalResult<Vec<Value>> {
        let value = traverser.value();
        match &self.kind {
            FlatMapKind::Vertices(direction, labels) => {
                let vertex = self.live_vertex(value)?;
                Ok(vertex.vertices(*direction, labels).into_iter().map(Value::Vertex).collect())
            }
            FlatMapKind::Edges(direction, labels) => {
                let vertex = self.live_vertex(value)?;
                Ok(vertex.edges(*direction, labels).into_iter().map(Value::Edge).collect())
            }
            FlatMapKind::BothV => {
                let edge = value
                    .as_edge()
                    .ok_or_else(|| TraversalError::type_mismatch(self.describe(), "Edge", value.type_name()))?;
                Ok(edge
                    .both_vertices()
                    .map(|pair| pair.map(Value::Vertex).collect())
                    .unwrap_or_default())
            }
            FlatMapKind::Properties(keys) => {
                let element = self.element(value)?;
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                Ok(element.properties(&keys).map(Value::Property).collect())
            }
            FlatMapKind::Values(keys) => {
                let element = self.element(value)?;
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                Ok(element.values(&keys).map(Value::Scalar).collect())
            }
            FlatMapKind::Unfold => Ok(match value {
                Value::List(items) => items.clone(),
                Value::Path(path) => path.objects().to_vec(),
                Value::Map(map) => map
                    .iter()
                    .map(|(k, v)| Value::Map([(k.clone(), v.clone())].into_iter().collect()))
                    .collect(),
                other => vec![other.clone()],
            }),
            FlatMapKind::Lambda(f) => f(traverser),
        }
    }

    fn element<'v>(&self, value: &'v Value) -> TraversalResult<&'v dyn Element> {
        value
            .as_element()
            .ok_or_else(|| TraversalError::type_mismatch(self.describe(), "Element", value.type_name()))
    }

    fn live_vertex<'v>(&self, value: &'v Value) -> TraversalResult<&'v crate::structure::LiveVertex> {
        match value {
            Value::Vertex(v) => v
                .as_live()
                .ok_or_else(|| TraversalError::type_mismatch(self.describe(), "live vertex", "detached vertex")),
            other => Err(TraversalError::type_mismatch(self.describe(), "Vertex", other.type_name())),
        }
    }
}

impl Step for FlatMapStep {
    step_boilerplate!();

    fn name(&self) -> &'static str {
        match &self.kind {
            FlatMapKind::Vertices(Direction::Out, _) => "out",
            FlatMapKind::Vertices(Direction::In, _) => "in",
            FlatMapKind::Vertices(Direction::Both, _) => "both",
            FlatMapKind::Edges(Direction::Out, _) => "outE",
            FlatMapKind::Edges(Direction::In, _) => "inE",
            FlatMapKind::Edges(Direction::Both, _) => "bothE",
            FlatMapKind::BothV => "bothV",
            FlatMapKind::Properties(_) => "properties",
            FlatMapKind::Values(_) => "values",
            FlatMapKind::Unfold => "unfold",
            FlatMapKind::Lambda(_) => "flatMap",
        }
    }

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        loop {
            if let Some(t) = self.pending.pop_front() {
                return Ok(Some(t));
            }
            let Some(traverser) = self.base.next_start(upstream)? else {
                return Ok(None);
            };
            let outputs = self.expand(&traverser)?;
            self.pending.extend(outputs.into_iter().map(|v| traverser.split(v)));
        }
    }

    fn reset(&mut self) {
        self.base.reset();
        self.pending.clear();
    }
}
