pub mod aggregate;
pub mod cluster;
pub mod rtree;

pub use aggregate::{AggregateSnapshot, LevelIndex, SharedSnapshot};
pub use cluster::{cap_clusters, cluster_live, cluster_precomputed};
pub use rtree::{IndexedListing, PointStore};
