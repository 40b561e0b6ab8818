use serde::{Deserialize, Serialize};

/// Spatial index statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Listings currently held by the point store
    pub listing_count: usize,
    /// Generation of the point store (bumped on every write)
    pub generation: u64,
    /// Generation the aggregate hierarchy was built from, if built
    pub aggregate_generation: Option<u64>,
    /// Node count per level, ordered by level
    pub nodes_per_level: Vec<(u8, usize)>,
    /// Seconds since the Unix epoch of the last aggregate build
    pub built_at: Option<u64>,
    /// Duration of the last aggregate build in milliseconds
    pub build_duration_ms: f64,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the aggregates reflect every write to the point store.
    pub fn is_fresh(&self) -> bool {
        self.aggregate_generation == Some(self.generation)
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes_per_level.iter().map(|(_, n)| n).sum()
    }
}
