//! Property graph element model
//!
//! Elements come in three representations:
//! - live: bound to a [`Graph`], property reads hit storage
//! - detached: a self-contained snapshot, serializable
//! - reference: id and label only

pub mod detached;
pub mod element;
pub mod graph;
pub mod live;
pub mod memory;
pub mod property;
pub mod reference;
pub mod types;
pub mod value;

pub use detached::{attach, detach, reference, DetachedEdge, DetachedVertex};
pub use element::{Edge, Element, Vertex};
pub use graph::{EdgeRecord, Graph, GraphError, GraphExt, GraphResult};
pub use live::{LiveEdge, LiveVertex};
pub use memory::MemoryGraph;
pub use property::{Property, PropertyBag, PropertyValue};
pub use reference::{ReferenceEdge, ReferenceVertex};
pub use types::{Direction, ElementId, ElementKind};
pub use value::Value;
