//! The might-see approximation: a cheap, conservative superset of what each
//! portal can see, used to prune the exact flow.

use crate::graph::{ClusterId, ClusterSet, PortalGraph, PortalId, empty_set};
use crate::predicates::portal_may_see;
use bitvec::prelude::*;

/// Result of the base pass for one portal.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseVis {
    /// Portals passing the pairwise trivial rejection, one bit per portal
    pub portalsee: BitVec,
    /// Clusters reachable through chains of such portals
    pub mightsee: ClusterSet,
    pub nummightsee: usize,
}

/// Compute `portal`'s might-see set.
///
/// Every other portal is tested pairwise against `portal`; the survivors are
/// then flooded from the cluster `portal` leads into.
pub fn portal_base(graph: &PortalGraph, portal: PortalId) -> BaseVis {
    let p = graph.portal(portal);

    let mut portalsee = bitvec![0; graph.num_portals()];
    for (j, target) in graph.portals().iter().enumerate() {
        if j == portal.0 {
            continue;
        }
        if portal_may_see(p, target) {
            portalsee.set(j, true);
        }
    }

    let mut mightsee = empty_set(graph.num_clusters());
    let nummightsee = simple_flood(graph, &portalsee, &mut mightsee, p.cluster);

    BaseVis {
        portalsee,
        mightsee,
        nummightsee,
    }
}

/// Mark every cluster reachable from `start` through portals set in
/// `portalsee`. Each cluster is marked at most once; returns how many were.
pub fn simple_flood(
    graph: &PortalGraph,
    portalsee: &BitSlice,
    mightsee: &mut ClusterSet,
    start: ClusterId,
) -> usize {
    let mut count = 0;
    let mut pending = vec![start];

    while let Some(cluster) = pending.pop() {
        if mightsee[cluster.0] {
            continue;
        }
        mightsee.set(cluster.0, true);
        count += 1;

        for &portal in &graph.cluster(cluster).portals {
            if portalsee[portal.0] {
                pending.push(graph.portal(portal).cluster);
            }
        }
    }

    count
}
