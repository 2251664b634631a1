//! Engine configuration
//!
//! Everything here is supplied at construction time; nothing is read from
//! files or the environment.

use serde::{Deserialize, Serialize};

/// Tunables shared by a traversal and the steps it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum traversers a bulking barrier buffers before releasing them
    pub barrier_size: usize,
    /// Whether detachment snapshots element properties
    pub detach_properties: bool,
    /// Partition count used when submitting to a graph computer
    pub partitions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            barrier_size: 2500,
            detach_properties: true,
            partitions: 4,
        }
    }
}

impl EngineConfig {
    pub fn with_barrier_size(mut self, barrier_size: usize) -> Self {
        self.barrier_size = barrier_size.max(1);
        self
    }

    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions.max(1);
        self
    }

    pub fn with_detach_properties(mut self, detach_properties: bool) -> Self {
        self.detach_properties = detach_properties;
        self
    }
}
