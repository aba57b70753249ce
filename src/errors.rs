//! Errors raised while assembling the portal graph or running vis

use crate::graph::{ClusterId, PortalId};

/// Everything that can stop a vis run.
///
/// Geometric degeneracies met while clipping are never errors: a clip that
/// leaves nothing simply ends that branch of the search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisError {
    /// (TooManyPoints) A loaded winding exceeds the point limit
    #[error("(TooManyPoints) winding has {count} points, the limit is {max}")]
    TooManyPoints { count: usize, max: usize },
    /// (DegenerateWinding) A loaded winding has fewer than three points
    #[error("(DegenerateWinding) winding has only {0} points")]
    DegenerateWinding(usize),
    /// (ClusterOutOfRange) A portal references a cluster that was never declared
    #[error("(ClusterOutOfRange) cluster {cluster} does not exist ({count} clusters)")]
    ClusterOutOfRange { cluster: usize, count: usize },
    /// (TooManyPortalsOnCluster) A cluster is bounded by too many portals
    #[error("(TooManyPortalsOnCluster) cluster {0} exceeds {max} portals", max = crate::float_types::MAX_PORTALS_ON_CLUSTER)]
    TooManyPortalsOnCluster(ClusterId),
    /// (PortalNotDone) Aggregation was asked for before a portal finished its flow
    #[error("(PortalNotDone) portal {0} has not finished flowing")]
    PortalNotDone(PortalId),
    /// (Reflowed) A portal was handed to flow twice
    #[error("(Reflowed) portal {0} was already flowed")]
    Reflowed(PortalId),
    /// (ThreadPool) The worker pool could not be started
    #[error("(ThreadPool) {0}")]
    ThreadPool(String),
}

#[cfg(feature = "parallel")]
impl From<rayon::ThreadPoolBuildError> for VisError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        VisError::ThreadPool(err.to_string())
    }
}
