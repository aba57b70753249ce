//! Exact portal flow
//!
//! Starting from a base portal, the search walks cluster to cluster through
//! chains of portals, narrowing two windings as it goes: the *source* (the
//! part of the base portal that can still see down the chain) and the *pass*
//! (the part of the last portal crossed that is still visible from the
//! source). A candidate exit portal survives only if some of it lies in front
//! of the base portal, in front of the pass portal, and on the far side of
//! every plane separating source from pass. Each cluster reached with a
//! non-empty pass winding is visible from the base portal.
//!
//! The chain is an explicit stack of [`Frame`]s rather than recursion; a
//! cluster already on the stack is never entered again, so the depth is
//! bounded by the number of clusters.

use crate::errors::VisError;
use crate::graph::{ClusterId, ClusterSet, PortalGraph, PortalId, empty_set};
use crate::options::VisOptions;
use crate::plane::{Plane, Side};
use crate::predicates::find_separators;
use crate::sphere::BoundingSphere;
use crate::state::VisState;
use crate::stats::VisStats;
use crate::winding::{Clipped, Winding};
use std::borrow::Cow;

/// Buffers kept past this count are dropped on [`ScratchPool::reset`].
const MAX_POOLED: usize = 64;

/// Recycled separator lists and cluster sets owned by one worker.
#[derive(Debug, Default)]
pub struct ScratchPool {
    planes: Vec<Vec<Plane>>,
    sets: Vec<ClusterSet>,
}

impl ScratchPool {
    fn take_planes(&mut self) -> Vec<Plane> {
        let mut planes = self.planes.pop().unwrap_or_default();
        planes.clear();
        planes
    }

    fn give_planes(&mut self, planes: Vec<Plane>) {
        self.planes.push(planes);
    }

    fn take_set(&mut self, num_clusters: usize) -> ClusterSet {
        match self.sets.pop() {
            Some(mut set) if set.len() == num_clusters => {
                set.fill(false);
                set
            },
            _ => empty_set(num_clusters),
        }
    }

    fn give_set(&mut self, set: ClusterSet) {
        self.sets.push(set);
    }

    /// Trim the pool between portals.
    pub fn reset(&mut self) {
        self.planes.truncate(MAX_POOLED);
        self.sets.truncate(MAX_POOLED);
    }

    pub fn pooled(&self) -> (usize, usize) {
        (self.planes.len(), self.sets.len())
    }
}

/// Working state owned by exactly one worker thread.
#[derive(Debug, Default)]
pub struct ThreadData {
    pub stats: VisStats,
    pub scratch: ScratchPool,
}

impl ThreadData {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One level of the search.
#[derive(Debug)]
struct Frame<'g> {
    /// Cluster being flowed through
    cluster: ClusterId,
    /// Clipped base portal winding
    source: Winding<'g>,
    /// Portal the chain entered `cluster` through
    pass_portal: Option<PortalId>,
    /// Clipped winding of `pass_portal`
    pass: Option<Winding<'g>>,
    pass_plane: Plane,
    mightsee: ClusterSet,
    /// `[source → pass, pass → source]` separators, built on first use
    separators: [Option<Cow<'g, [Plane]>>; 2],
    /// Next portal of `cluster` to try
    next: usize,
}

#[derive(Clone, Copy)]
enum Clipping {
    Target,
    Source,
}

struct Flow<'g, 't> {
    graph: &'g PortalGraph,
    state: &'g VisState,
    thread: &'t mut ThreadData,
    level: u8,
    use_passages: bool,
    base: PortalId,
    clustervis: ClusterSet,
    on_chain: ClusterSet,
}

/// Refine `base`'s might-see set into the clusters it really sees.
///
/// The portal must have been claimed through [`VisState::next_portal`].
pub fn portal_flow(
    graph: &PortalGraph,
    state: &VisState,
    options: &VisOptions,
    thread: &mut ThreadData,
    base: PortalId,
) -> Result<ClusterSet, VisError> {
    state.begin_flow(base)?;

    let num_clusters = graph.num_clusters();
    let portal = graph.portal(base);

    let mut flow = Flow {
        graph,
        state,
        thread,
        level: options.level,
        use_passages: options.use_passages,
        base,
        clustervis: empty_set(num_clusters),
        on_chain: empty_set(num_clusters),
    };

    let mut mightsee = flow.thread.scratch.take_set(num_clusters);
    mightsee.copy_from_bitslice(state.mightsee(base));

    let head = Frame {
        cluster: portal.cluster,
        source: portal.original_winding(),
        pass_portal: None,
        pass: None,
        pass_plane: portal.plane,
        mightsee,
        separators: [None, None],
        next: 0,
    };
    flow.enter(head.cluster);

    let mut stack = vec![head];
    while let Some(top) = stack.last_mut() {
        let Some(&candidate) = graph.cluster(top.cluster).portals.get(top.next) else {
            if let Some(frame) = stack.pop() {
                flow.leave(frame);
            }
            continue;
        };
        top.next += 1;

        if let Some(child) = flow.step(top, candidate) {
            flow.enter(child.cluster);
            stack.push(child);
        }
    }

    flow.thread.scratch.reset();
    log::trace!(
        "portal {base}: {} of {} might-see clusters visible",
        flow.clustervis.count_ones(),
        state.nummightsee(base)
    );
    Ok(flow.clustervis)
}

impl<'g> Flow<'g, '_> {
    fn enter(&mut self, cluster: ClusterId) {
        self.thread.stats.chains += 1;
        self.on_chain.set(cluster.0, true);
        self.clustervis.set(cluster.0, true);
    }

    fn leave(&mut self, frame: Frame<'g>) {
        self.on_chain.set(frame.cluster.0, false);
        self.thread.scratch.give_set(frame.mightsee);
        for planes in frame.separators.into_iter().flatten() {
            if let Cow::Owned(planes) = planes {
                self.thread.scratch.give_planes(planes);
            }
        }
    }

    /// Try to continue the chain from `frame` out through `id`.
    fn step(&mut self, frame: &mut Frame<'g>, id: PortalId) -> Option<Frame<'g>> {
        let graph = self.graph;
        let state = self.state;
        let portal = graph.portal(id);
        let target_cluster = portal.cluster;

        // can't possibly see it
        if !frame.mightsee[target_cluster.0] || self.on_chain[target_cluster.0] {
            return None;
        }

        // if the portal can't see anything we haven't already seen, skip it
        let test = match state.finished_visbits(id) {
            Some(visbits) => {
                self.thread.stats.vistest += 1;
                visbits
            },
            None => {
                self.thread.stats.mighttest += 1;
                state.mightsee(id)
            },
        };
        let more = frame
            .mightsee
            .as_raw_slice()
            .iter()
            .zip(test.as_raw_slice())
            .zip(self.clustervis.as_raw_slice())
            .any(|((might, test), vis)| might & test & !vis != 0);
        if !more {
            self.thread.stats.mightseeupdate += 1;
            return None;
        }

        // can't go out a coplanar face
        if portal.plane.is_reverse_of(&frame.pass_plane) {
            return None;
        }
        self.thread.stats.portalcheck += 1;

        // clip any part of the target portal that is behind the base portal
        let base_plane = graph.portal(self.base).plane;
        let target = portal.original_winding().clip(&base_plane, false)?;

        if frame.pass.is_none() {
            // the second cluster can only be blocked if coplanar
            let source = frame.source.clone();
            return Some(self.child(frame, id, source, target, test));
        }

        // clip any part of the target portal that is behind the pass portal
        let mut target = target.clip(&frame.pass_plane, false)?;

        // keep only the part of the source behind the target portal
        let mut source = frame.source.clone().clip(&portal.plane.flipped(), false)?;

        for slot in 0..usize::from(self.level.min(2)) {
            self.ensure_separators(frame, slot);
            let planes = frame.separators[slot].as_deref().unwrap_or_default();
            target = self.clip_to_planes(target, &portal.sphere, planes, Clipping::Target)?;
        }

        if self.level > 2 {
            let pass = frame.pass.as_ref()?;
            let base_sphere = graph.portal(self.base).sphere;
            source = self.clip_source(source, &base_sphere, &target, pass, false)?;
            if self.level > 3 {
                source = self.clip_source(source, &base_sphere, pass, &target, true)?;
            }
        }

        self.thread.stats.portalpass += 1;
        Some(self.child(frame, id, source, target, test))
    }

    fn child(
        &mut self,
        frame: &Frame<'g>,
        id: PortalId,
        source: Winding<'g>,
        pass: Winding<'g>,
        test: &ClusterSet,
    ) -> Frame<'g> {
        let portal = self.graph.portal(id);
        let mut mightsee = self.thread.scratch.take_set(self.graph.num_clusters());
        for ((might, parent), test) in mightsee
            .as_raw_mut_slice()
            .iter_mut()
            .zip(frame.mightsee.as_raw_slice())
            .zip(test.as_raw_slice())
        {
            *might = parent & test;
        }

        Frame {
            cluster: portal.cluster,
            source,
            pass_portal: Some(id),
            pass: Some(pass),
            pass_plane: portal.plane,
            mightsee,
            separators: [None, None],
            next: 0,
        }
    }

    /// Build the separators for `slot` unless already cached on the frame.
    fn ensure_separators(&mut self, frame: &mut Frame<'g>, slot: usize) {
        if frame.separators[slot].is_some() {
            return;
        }
        let Some(pass) = frame.pass.as_ref() else {
            return;
        };

        let graph = self.graph;
        if self.use_passages && frame.source.is_original() && pass.is_original() {
            if let Some(exit) = frame.pass_portal {
                let owner = graph.portal(self.base).owner;
                if let Some(passage) = graph.cluster(owner).passage(self.base, exit) {
                    frame.separators[slot] = Some(Cow::Borrowed(passage.planes[slot].as_slice()));
                    return;
                }
            }
        }

        let mut planes = self.thread.scratch.take_planes();
        if slot == 0 {
            find_separators(frame.source.points(), pass.points(), false, &mut planes);
        } else {
            find_separators(pass.points(), frame.source.points(), true, &mut planes);
        }
        frame.separators[slot] = Some(Cow::Owned(planes));
    }

    /// Narrow the source to what can see through both `first` and `second`.
    fn clip_source(
        &mut self,
        source: Winding<'g>,
        sphere: &BoundingSphere,
        first: &Winding<'_>,
        second: &Winding<'_>,
        flip_clip: bool,
    ) -> Option<Winding<'g>> {
        let mut planes = self.thread.scratch.take_planes();
        find_separators(first.points(), second.points(), flip_clip, &mut planes);
        let clipped = self.clip_to_planes(source, sphere, &planes, Clipping::Source);
        self.thread.scratch.give_planes(planes);
        clipped
    }

    /// Clip `winding` to the front of every plane, using `sphere` (a bound
    /// of the unclipped winding) to settle planes it is entirely on one side of.
    fn clip_to_planes<'w>(
        &mut self,
        mut winding: Winding<'w>,
        sphere: &BoundingSphere,
        planes: &[Plane],
        clipping: Clipping,
    ) -> Option<Winding<'w>> {
        let stats = &mut self.thread.stats;
        for plane in planes {
            stats.portaltest += 1;
            match sphere.side(plane) {
                Side::Front => continue,
                Side::Back => {
                    match clipping {
                        Clipping::Target => stats.targetclipped += 1,
                        Clipping::Source => stats.sourceclipped += 1,
                    }
                    return None;
                },
                Side::On => {},
            }

            let (tested, trimmed, clipped) = match clipping {
                Clipping::Target => (
                    &mut stats.targettested,
                    &mut stats.targettrimmed,
                    &mut stats.targetclipped,
                ),
                Clipping::Source => (
                    &mut stats.sourcetested,
                    &mut stats.sourcetrimmed,
                    &mut stats.sourceclipped,
                ),
            };
            *tested += 1;
            winding = match winding.clip_exact(plane, false) {
                Clipped::Whole(w) => w,
                Clipped::Trimmed(w) => {
                    *trimmed += 1;
                    w
                },
                Clipped::Gone => {
                    *clipped += 1;
                    return None;
                },
            };
        }
        Some(winding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::portal_base;
    use crate::float_types::Real;
    use nalgebra::Point3;

    fn quad_at_x(x: Real, y0: Real, y1: Real) -> Vec<Point3<Real>> {
        vec![
            Point3::new(x, y0, 0.0),
            Point3::new(x, y1, 0.0),
            Point3::new(x, y1, 4.0),
            Point3::new(x, y0, 4.0),
        ]
    }

    fn state_for(graph: &PortalGraph) -> VisState {
        VisState::new(
            graph
                .portal_ids()
                .map(|id| portal_base(graph, id).mightsee)
                .collect(),
            false,
        )
    }

    fn flow_one(graph: &PortalGraph, state: &VisState, id: PortalId) -> ClusterSet {
        // claim portals until we get the one we want
        while let Some(claimed) = state.next_portal() {
            if claimed == id {
                break;
            }
        }
        let mut thread = ThreadData::new();
        portal_flow(graph, state, &VisOptions::default(), &mut thread, id).unwrap()
    }

    #[test]
    fn straight_corridor_is_fully_visible() {
        let mut graph = PortalGraph::new(4);
        let (a, _) = graph
            .add_portal(quad_at_x(4.0, 0.0, 4.0), ClusterId(0), ClusterId(1))
            .unwrap();
        graph.add_portal(quad_at_x(8.0, 0.0, 4.0), ClusterId(1), ClusterId(2)).unwrap();
        graph.add_portal(quad_at_x(12.0, 0.0, 4.0), ClusterId(2), ClusterId(3)).unwrap();

        let state = state_for(&graph);
        let vis = flow_one(&graph, &state, a);
        assert!(!vis[0]);
        assert!(vis[1] && vis[2] && vis[3]);
    }

    #[test]
    fn frames_are_returned_to_the_pool() {
        let mut graph = PortalGraph::new(3);
        let (a, _) = graph
            .add_portal(quad_at_x(4.0, 0.0, 4.0), ClusterId(0), ClusterId(1))
            .unwrap();
        graph.add_portal(quad_at_x(8.0, 0.0, 4.0), ClusterId(1), ClusterId(2)).unwrap();

        let state = state_for(&graph);
        while state.next_portal().is_some_and(|id| id != a) {}
        let mut thread = ThreadData::new();
        portal_flow(&graph, &state, &VisOptions::default(), &mut thread, a).unwrap();

        let (_, sets) = thread.scratch.pooled();
        assert_eq!(sets, 2);
        assert!(thread.stats.chains >= 2);
        assert!(thread.stats.portalcheck >= 1);
    }

    #[test]
    fn second_window_into_a_seen_cluster_is_skipped() {
        // 0 opens into 1 through two windows, 1 into 2 through one
        let mut graph = PortalGraph::new(3);
        graph.add_portal(quad_at_x(4.0, 0.0, 2.0), ClusterId(0), ClusterId(1)).unwrap();
        graph.add_portal(quad_at_x(4.0, 8.0, 10.0), ClusterId(0), ClusterId(1)).unwrap();
        let (_, back) = graph
            .add_portal(quad_at_x(8.0, 4.0, 6.0), ClusterId(1), ClusterId(2))
            .unwrap();

        let state = state_for(&graph);
        while state.next_portal().is_some_and(|id| id != back) {}
        let mut thread = ThreadData::new();
        let vis = portal_flow(&graph, &state, &VisOptions::default(), &mut thread, back).unwrap();

        // nothing has finished, so both windows back into 0 test their might-see
        assert_eq!(thread.stats.mighttest, 2);
        assert_eq!(thread.stats.vistest, 0);
        // the first reaches 0, the second has nothing new to offer
        assert_eq!(thread.stats.mightseeupdate, 1);
        assert!(vis[0] && vis[1] && !vis[2]);
    }

    #[test]
    fn unclaimed_portal_cannot_flow() {
        let mut graph = PortalGraph::new(2);
        let (a, _) = graph
            .add_portal(quad_at_x(4.0, 0.0, 4.0), ClusterId(0), ClusterId(1))
            .unwrap();
        let state = state_for(&graph);
        let mut thread = ThreadData::new();
        assert_eq!(
            portal_flow(&graph, &state, &VisOptions::default(), &mut thread, a),
            Err(VisError::Reflowed(a))
        );
    }
}
