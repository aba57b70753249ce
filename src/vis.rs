//! Top-level driver: base pass, flow pass, aggregation

use crate::base::portal_base;
use crate::errors::VisError;
use crate::float_types::Real;
use crate::flow::{ThreadData, portal_flow};
use crate::graph::{ClusterId, ClusterSet, PortalGraph, PortalId};
use crate::options::VisOptions;
use crate::passage::calc_passages;
use crate::pvs::{Pvs, encode_state};
use crate::state::VisState;
use crate::stats::VisStats;
use crate::threads::Scheduler;
use log::{debug, info};

/// Everything a vis run hands to whoever persists it.
#[derive(Debug, Clone, PartialEq)]
pub struct VisOutput {
    /// Exact visibility of each directed portal
    pub portal_vis: Vec<ClusterSet>,
    /// The might-see approximation each flow started from
    pub mightsee: Vec<ClusterSet>,
    pub pvs: Pvs,
    /// Counters summed over every worker
    pub stats: VisStats,
}

impl VisOutput {
    /// Whether `from` can see into `to` in the final PVS.
    pub fn cluster_sees(&self, from: ClusterId, to: ClusterId) -> bool {
        self.pvs.can_see(from, to)
    }

    /// Mean number of clusters visible from a cluster, itself included.
    pub fn average_visible(&self) -> Real {
        if self.pvs.rows.is_empty() {
            return 0.0;
        }
        let total: usize = self.pvs.rows.iter().map(|row| row.count_ones()).sum();
        total as Real / self.pvs.rows.len() as Real
    }

    pub fn portal_vis(&self, portal: PortalId) -> &ClusterSet {
        &self.portal_vis[portal.0]
    }
}

/// Compute the PVS of `graph`.
///
/// Offsets of the compressed rows are written back onto the graph's
/// clusters. Passages, when enabled, are attached to the graph as well.
pub fn calc_vis(graph: &mut PortalGraph, options: &VisOptions) -> Result<VisOutput, VisError> {
    info!(
        "{} clusters, {} portals, level {}{}",
        graph.num_clusters(),
        graph.num_portals(),
        options.level,
        if options.fast { ", fast" } else { "" }
    );

    let scheduler = Scheduler::new(options.threads)?;
    info!("running on {} thread(s)", scheduler.threads());

    if options.use_passages && !options.fast {
        calc_passages(graph, &scheduler);
    }

    let state = {
        let graph: &PortalGraph = graph;
        let mightsee = scheduler.map(graph.num_portals(), |i| {
            portal_base(graph, PortalId(i)).mightsee
        });
        let state = VisState::new(mightsee, scheduler.threads() > 1);
        log_average_mightsee(&state);

        if options.fast {
            fast_flow(&state)?;
        } else {
            scheduler.broadcast(|worker| flow_worker(graph, &state, options, worker))?;
        }
        state
    };

    let stats = state.total_stats();
    let mightsee = (0..state.num_portals())
        .map(|i| state.mightsee(PortalId(i)).clone())
        .collect();
    let (portal_vis, pvs) = encode_state(graph, state)?;

    let output = VisOutput {
        portal_vis,
        mightsee,
        pvs,
        stats,
    };
    if !options.fast {
        info!("flow statistics:\n{}", output.stats);
    }
    info!("average clusters visible: {:.1}", output.average_visible());
    info!(
        "compressed pvs: {} bytes ({} uncompressed)",
        output.pvs.data.len(),
        output.pvs.row_bytes * graph.num_clusters()
    );
    Ok(output)
}

fn log_average_mightsee(state: &VisState) {
    if let Some(average) = average_mightsee(state) {
        info!("average portal might-see: {average:.1}");
    }
}

/// Mean might-see count over all portals, `None` without portals.
fn average_mightsee(state: &VisState) -> Option<Real> {
    let num_portals = state.num_portals();
    if num_portals == 0 {
        return None;
    }
    let total: usize = (0..num_portals).map(|i| state.nummightsee(PortalId(i))).sum();
    Some(total as Real / num_portals as Real)
}

/// Claim and flow portals until none are left.
fn flow_worker(
    graph: &PortalGraph,
    state: &VisState,
    options: &VisOptions,
    worker: usize,
) -> Result<(), VisError> {
    let mut thread = ThreadData::new();
    let total = state.num_portals();
    while let Some(id) = state.next_portal() {
        let visbits = portal_flow(graph, state, options, &mut thread, id)?;
        let done = state.finish(id, visbits, &mut thread.stats);
        debug!(
            "worker {worker}: portal {id} done ({done}/{total}), {} of {} might-see visible",
            state.numcansee(id),
            state.nummightsee(id)
        );
    }
    Ok(())
}

/// Publish every portal's might-see set as its final visibility.
fn fast_flow(state: &VisState) -> Result<(), VisError> {
    let mut stats = VisStats::default();
    while let Some(id) = state.next_portal() {
        state.begin_flow(id)?;
        state.finish(id, state.mightsee(id).clone(), &mut stats);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn quad_at_x(x: Real) -> Vec<Point3<Real>> {
        vec![
            Point3::new(x, 0.0, 0.0),
            Point3::new(x, 4.0, 0.0),
            Point3::new(x, 4.0, 4.0),
            Point3::new(x, 0.0, 4.0),
        ]
    }

    #[test]
    fn corridor_sees_end_to_end() {
        let mut graph = PortalGraph::new(3);
        graph.add_portal(quad_at_x(4.0), ClusterId(0), ClusterId(1)).unwrap();
        graph.add_portal(quad_at_x(8.0), ClusterId(1), ClusterId(2)).unwrap();

        let output = calc_vis(&mut graph, &VisOptions::default().with_threads(1)).unwrap();
        for from in 0..3 {
            for to in 0..3 {
                assert!(output.cluster_sees(ClusterId(from), ClusterId(to)));
            }
        }
        assert_eq!(output.average_visible(), 3.0);
        assert!(graph.clusters().iter().all(|c| c.visofs.is_some()));
    }

    #[test]
    fn average_mightsee_keeps_the_fraction() {
        let mut graph = PortalGraph::new(3);
        graph.add_portal(quad_at_x(4.0), ClusterId(0), ClusterId(1)).unwrap();
        graph.add_portal(quad_at_x(8.0), ClusterId(1), ClusterId(2)).unwrap();

        // 2 + 1 + 1 + 2 clusters over four portals
        let mightsee = graph.portal_ids().map(|id| portal_base(&graph, id).mightsee).collect();
        let state = VisState::new(mightsee, false);
        assert_eq!(average_mightsee(&state), Some(1.5));

        assert_eq!(average_mightsee(&VisState::new(Vec::new(), false)), None);
    }

    #[test]
    fn empty_graph_runs() {
        let mut graph = PortalGraph::new(0);
        let output = calc_vis(&mut graph, &VisOptions::default()).unwrap();
        assert!(output.portal_vis.is_empty());
        assert_eq!(output.average_visible(), 0.0);
        assert_eq!(output.stats, VisStats::default());
    }
}
