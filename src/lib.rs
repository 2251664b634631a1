//! Pathweave
//!
//! A lazy, pull-based graph traversal engine. Traversals are chains of
//! steps over a property graph; traversers carry a value, the path that
//! led to it, a bulk count and loop state from step to step.
//!
//! # Layout
//!
//! - [`structure`]: element model (live, detached and reference vertices
//!   and edges), property values, the [`Graph`](structure::Graph) storage
//!   trait and an in-memory graph
//! - [`process`]: traversers, steps, the traversal pipeline, strategies,
//!   the fluent builder and the graph-computer seam
//! - [`util`]: small iterator, supplier and numeric helpers
//!
//! ## Example Usage
//!
//! ```rust
//! use pathweave::process::{anon, GraphTraversalSource};
//! use pathweave::structure::{MemoryGraph, Value};
//! use std::sync::Arc;
//!
//! let g = GraphTraversalSource::new(Arc::new(MemoryGraph::modern()));
//!
//! // Who does marko know?
//! let names = g.v([1]).out(&["knows"]).values(&["name"]).to_list().unwrap();
//! assert_eq!(names, vec![Value::from("vadas"), Value::from("josh")]);
//!
//! // Everything two hops out, with the path taken
//! let paths = g.v([1]).repeat(anon().out(&[])).times(2).path().to_list().unwrap();
//! assert_eq!(paths.len(), 2);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod process;
pub mod structure;
pub mod util;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use error::{TraversalError, TraversalResult};

pub use structure::{
    Direction, Edge, Element, ElementId, Graph, GraphError, GraphResult, MemoryGraph, PropertyValue, Value, Vertex,
};

pub use process::{
    anon, GraphComputer, GraphTraversalSource, Path, Traversal, TraversalVertexProgram, Traverser, P,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.3.0");
    }
}
