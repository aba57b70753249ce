//! Precomputed separating planes for portal pairs through a single cluster
//!
//! A passage covers the first hop of every flow: leaving cluster `from`
//! through `entry`, crossing the neighbour, and leaving it through `exit`
//! into `to`. While the flow's source and pass windings are both still the
//! portals' own geometry, the separators are exactly these planes and need
//! not be rebuilt.

use crate::graph::{ClusterId, PortalGraph, PortalId};
use crate::plane::Plane;
use crate::predicates::find_separators;
use crate::threads::Scheduler;

/// A directed cluster-pair relation and the planes that bound sight through it.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    /// Cluster the entry portal looks out of
    pub from: ClusterId,
    /// Cluster the exit portal leads into
    pub to: ClusterId,
    pub entry: PortalId,
    pub exit: PortalId,
    /// `[source → pass, pass → source (flipped)]`; for both lists the entry
    /// portal is behind every plane and the far side is in front.
    pub planes: [Vec<Plane>; 2],
}

impl Passage {
    /// Separators between `entry` and `exit`.
    pub fn new(graph: &PortalGraph, entry: PortalId, exit: PortalId) -> Self {
        let source = graph.portal(entry);
        let pass = graph.portal(exit);

        let mut forward = Vec::new();
        find_separators(source.winding.points(), pass.winding.points(), false, &mut forward);
        let mut backward = Vec::new();
        find_separators(pass.winding.points(), source.winding.points(), true, &mut backward);

        Passage {
            from: source.owner,
            to: pass.cluster,
            entry,
            exit,
            planes: [forward, backward],
        }
    }

    /// Total number of separating planes carried.
    pub fn num_planes(&self) -> usize {
        self.planes[0].len() + self.planes[1].len()
    }
}

/// All passages starting in `cluster`.
fn cluster_passages(graph: &PortalGraph, cluster: ClusterId) -> Vec<Passage> {
    let mut passages = Vec::new();
    for &entry in &graph.cluster(cluster).portals {
        let neighbour = graph.portal(entry).cluster;
        for &exit in &graph.cluster(neighbour).portals {
            // don't go back
            if graph.portal(exit).cluster == cluster {
                continue;
            }
            passages.push(Passage::new(graph, entry, exit));
        }
    }
    passages
}

/// Build and attach the passages of every cluster, one cluster per job.
pub fn calc_passages(graph: &mut PortalGraph, scheduler: &Scheduler) -> usize {
    let shared: &PortalGraph = graph;
    let all = scheduler.map(shared.num_clusters(), |c| cluster_passages(shared, ClusterId(c)));
    attach(graph, all)
}

fn attach(graph: &mut PortalGraph, all: Vec<Vec<Passage>>) -> usize {
    let mut count = 0;
    for (cluster, passages) in graph.clusters_mut().iter_mut().zip(all) {
        count += passages.len();
        cluster.set_passages(passages);
    }
    log::debug!("built {count} passages");
    count
}
