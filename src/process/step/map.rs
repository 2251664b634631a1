//! One-to-one steps
//!
//! Each input yields exactly one output, a split of the input carrying
//! the mapped value. The exception is `select` of a label that is absent
//! from the path, which drops the traverser.

use super::{step_boilerplate, Step, StepBase, Upstream};
use crate::error::{TraversalError, TraversalResult};
use crate::process::path::Pop;
use crate::process::traversal::Traversal;
use crate::process::traverser::Traverser;
use crate::structure::{Direction, Element, ElementKind, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// User mapping function
pub type MapFn = Arc<dyn Fn(&Traverser) -> TraversalResult<Value> + Send + Sync>;

#[derive(Clone)]
pub enum MapKind {
    Id,
    Label,
    Constant(Value),
    /// The traverser's path as a value
    Path,
    Select(Pop, String),
    /// Loop counter of the innermost repeat, or of the named one
    Loops(Option<String>),
    EdgeVertex(Direction),
    /// The endpoint of an edge that is not the vertex it was reached from
    OtherV,
    /// Property key to values; vertices list every value of a key
    ValueMap(Vec<String>),
    /// Identity, label, edge endpoints and one value per property key
    ElementMap(Vec<String>),
    Lambda(MapFn),
}

#[derive(Clone)]
pub struct MapStep {
    base: StepBase,
    kind: MapKind,
}

impl MapStep {
    pub fn new(kind: MapKind) -> Self {
        Self {
            base: StepBase::new(),
            kind,
        }
    }

    pub fn kind(&self) -> &MapKind {
        &self.kind
    }

    fn map(&self, traverser: &Traverser) -> TraversalResult<Option<Value>> {
        let value = traverser.value();
        let mapped = match &self.kind {
            MapKind::Id => Value::from(self.element(value)?.id().clone()),
            MapKind::Label => Value::from(self.element(value)?.label()),
            MapKind::Constant(c) => c.clone(),
            MapKind::Path => Value::Path(traverser.path().clone()),
            MapKind::Select(pop, label) => match traverser.path().get_by_label(*pop, label) {
                Some(v) => v,
                None => return Ok(None),
            },
            MapKind::Loops(None) => Value::from(traverser.loop_count() as i64),
            MapKind::Loops(Some(name)) => {
                Value::from(traverser.loop_count_named(name).unwrap_or(0) as i64)
            }
            MapKind::EdgeVertex(direction) => {
                let edge = value
                    .as_edge()
                    .ok_or_else(|| TraversalError::type_mismatch(self.describe(), "Edge", value.type_name()))?;
                let vertex = edge.vertex(*direction).ok_or_else(|| {
                    TraversalError::type_mismatch(self.describe(), "edge with a present endpoint", "dangling edge")
                })?;
                Value::Vertex(vertex)
            }
            MapKind::OtherV => {
                let edge = value
                    .as_edge()
                    .ok_or_else(|| TraversalError::type_mismatch(self.describe(), "Edge", value.type_name()))?;
                let objects = traverser.path().objects();
                let previous = objects
                    .iter()
                    .rev()
                    .skip(1)
                    .find_map(Value::as_vertex)
                    .ok_or_else(|| {
                        TraversalError::type_mismatch(self.describe(), "edge reached from a vertex", "edge without vertex history")
                    })?;
                let side = if previous.id() == edge.out_id() {
                    Direction::In
                } else {
                    Direction::Out
                };
                let vertex = edge.vertex(side).ok_or_else(|| {
                    TraversalError::type_mismatch(self.describe(), "edge with a present endpoint", "dangling edge")
                })?;
                Value::Vertex(vertex)
            }
            MapKind::ValueMap(keys) => Value::Map(self.value_map(value, keys)?),
            MapKind::ElementMap(keys) => Value::Map(self.element_map(value, keys)?),
            MapKind::Lambda(f) => f(traverser)?,
        };
        Ok(Some(mapped))
    }

    fn value_map(&self, value: &Value, keys: &[String]) -> TraversalResult<IndexMap<Value, Value>> {
        let element = self.element(value)?;
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        let mut map: IndexMap<Value, Value> = IndexMap::new();
        for property in element.properties(&keys) {
            let key = Value::from(property.key);
            let item = Value::Scalar(property.value);
            if element.kind() == ElementKind::Vertex {
                match map.entry(key).or_insert_with(|| Value::List(Vec::new())) {
                    Value::List(items) => items.push(item),
                    other => *other = Value::List(vec![item]),
                }
            } else {
                map.insert(key, item);
            }
        }
        Ok(map)
    }

    fn element_map(&self, value: &Value, keys: &[String]) -> TraversalResult<IndexMap<Value, Value>> {
        let element = self.element(value)?;
        let mut map: IndexMap<Value, Value> = IndexMap::new();
        map.insert(Value::from("id"), Value::from(element.id().clone()));
        map.insert(Value::from("label"), Value::from(element.label()));
        if let Some(edge) = value.as_edge() {
            for (token, direction) in [("IN", Direction::In), ("OUT", Direction::Out)] {
                if let Some(vertex) = edge.vertex(direction) {
                    let endpoint: IndexMap<Value, Value> = [
                        (Value::from("id"), Value::from(vertex.id().clone())),
                        (Value::from("label"), Value::from(vertex.label())),
                    ]
                    .into_iter()
                    .collect();
                    map.insert(Value::from(token), Value::Map(endpoint));
                }
            }
        }
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        for property in element.properties(&keys) {
            map.insert(Value::from(property.key), Value::Scalar(property.value));
        }
        Ok(map)
    }

    fn element<'v>(&self, value: &'v Value) -> TraversalResult<&'v dyn Element> {
        value
            .as_element()
            .ok_or_else(|| TraversalError::type_mismatch(self.describe(), "Element", value.type_name()))
    }
}

impl Step for MapStep {
    step_boilerplate!();

    fn name(&self) -> &'static str {
        match self.kind {
            MapKind::Id => "id",
            MapKind::Label => "label",
            MapKind::Constant(_) => "constant",
            MapKind::Path => "path",
            MapKind::Select(..) => "select",
            MapKind::Loops(_) => "loops",
            MapKind::EdgeVertex(Direction::Out) => "outV",
            MapKind::EdgeVertex(Direction::In) => "inV",
            MapKind::EdgeVertex(Direction::Both) => "bothV",
            MapKind::OtherV => "otherV",
            MapKind::ValueMap(_) => "valueMap",
            MapKind::ElementMap(_) => "elementMap",
            MapKind::Lambda(_) => "map",
        }
    }

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        while let Some(traverser) = self.base.next_start(upstream)? {
            if let Some(value) = self.map(&traverser)? {
                return Ok(Some(traverser.split(value)));
            }
        }
        Ok(None)
    }
}

/// Projects each input into a map of `keys` to the first result of the
/// matching `by` traversal
///
/// `by` traversals are used round-robin when there are fewer of them than
/// keys; with none, every key maps to the input itself. A key whose
/// traversal yields nothing is left out.
#[derive(Clone)]
pub struct ProjectStep {
    base: StepBase,
    keys: Vec<String>,
    by: Vec<Traversal>,
}

impl ProjectStep {
    pub fn new(keys: Vec<String>, by: Vec<Traversal>) -> Self {
        Self {
            base: StepBase::new(),
            keys,
            by,
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Step for ProjectStep {
    step_boilerplate!("project");

    fn process_next(&mut self, upstream: &mut Upstream<'_>) -> TraversalResult<Option<Traverser>> {
        let Some(traverser) = self.base.next_start(upstream)? else {
            return Ok(None);
        };
        let mut projected: IndexMap<Value, Value> = IndexMap::with_capacity(self.keys.len());
        let ring = self.by.len();
        for (i, key) in self.keys.iter().enumerate() {
            let produced = match self.by.get_mut(i % ring.max(1)) {
                Some(by) => by.produce_in(&traverser, upstream.side_effects())?,
                None => Some(traverser.value().clone()),
            };
            if let Some(value) = produced {
                projected.insert(Value::from(key.as_str()), value);
            }
        }
        Ok(Some(traverser.split(Value::Map(projected))))
    }

    fn reset(&mut self) {
        self.base.reset();
        for by in self.by.iter_mut() {
            by.reset_steps();
        }
    }

    fn children(&self) -> Vec<&Traversal> {
        self.by.iter().collect()
    }

    fn children_mut(&mut self) -> Vec<&mut Traversal> {
        self.by.iter_mut().collect()
    }
}
