//! The cluster/portal adjacency graph vis runs over
//!
//! Clusters and portals live in flat vectors and refer to each other through
//! [`ClusterId`] and [`PortalId`] index handles. Every physical opening is
//! stored as two directed portals, one looking out of each cluster.

use crate::errors::VisError;
use crate::float_types::{MAX_PORTALS_ON_CLUSTER, Real};
use crate::passage::Passage;
use crate::plane::Plane;
use crate::sphere::BoundingSphere;
use crate::winding::Winding;
use bitvec::prelude::*;
use hashbrown::HashMap;
use nalgebra::Point3;
use std::fmt;

/// One bit per cluster, laid out least-significant-bit first within each byte
/// so the raw bytes are directly a PVS row.
pub type ClusterSet = BitVec<u8, Lsb0>;

/// An all-clear set sized for `num_clusters`.
pub fn empty_set(num_clusters: usize) -> ClusterSet {
    bitvec![u8, Lsb0; 0; num_clusters]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(pub usize);

impl ClusterId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl PortalId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for PortalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directed portal: an opening seen from the cluster that owns it.
#[derive(Debug, Clone)]
pub struct Portal {
    /// Normal points into `cluster`
    pub plane: Plane,
    /// Cluster this portal bounds and looks out of
    pub owner: ClusterId,
    /// Neighbour the portal leads into
    pub cluster: ClusterId,
    pub sphere: BoundingSphere,
    pub winding: Winding<'static>,
}

impl Portal {
    /// The portal's own points, borrowed.
    pub fn original_winding(&self) -> Winding<'_> {
        Winding::borrowed(self.winding.points())
    }
}

/// A convex region of space.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    /// Portals looking out of this cluster
    pub portals: Vec<PortalId>,
    /// Precomputed separators for every (entry, exit) portal pair starting here
    pub passages: Vec<Passage>,
    passage_lookup: HashMap<(PortalId, PortalId), usize>,
    /// Offset of this cluster's row in the compressed PVS, once encoded
    pub visofs: Option<usize>,
}

impl Cluster {
    /// Passage leaving through `entry` and then out of the neighbour through `exit`.
    pub fn passage(&self, entry: PortalId, exit: PortalId) -> Option<&Passage> {
        self.passage_lookup
            .get(&(entry, exit))
            .map(|&i| &self.passages[i])
    }

    pub(crate) fn set_passages(&mut self, passages: Vec<Passage>) {
        self.passage_lookup = passages
            .iter()
            .enumerate()
            .map(|(i, p)| ((p.entry, p.exit), i))
            .collect();
        self.passages = passages;
    }
}

/// Clusters plus the directed portals between them.
#[derive(Debug, Clone, Default)]
pub struct PortalGraph {
    clusters: Vec<Cluster>,
    portals: Vec<Portal>,
}

impl PortalGraph {
    /// A graph of `num_clusters` clusters with no portals yet.
    pub fn new(num_clusters: usize) -> Self {
        PortalGraph {
            clusters: vec![Cluster::default(); num_clusters],
            portals: Vec::new(),
        }
    }

    /// Register one opening between `back` and `front`.
    ///
    /// The winding's right-hand normal must point into `front`. Two directed
    /// portals are created: one owned by `back` looking into `front` with the
    /// winding as given, and its mirror owned by `front` with the winding
    /// reversed and the plane flipped. Returns `(back → front, front → back)`.
    pub fn add_portal(
        &mut self,
        points: Vec<Point3<Real>>,
        back: ClusterId,
        front: ClusterId,
    ) -> Result<(PortalId, PortalId), VisError> {
        for cluster in [back, front] {
            if cluster.0 >= self.clusters.len() {
                return Err(VisError::ClusterOutOfRange {
                    cluster: cluster.0,
                    count: self.clusters.len(),
                });
            }
            if self.clusters[cluster.0].portals.len() >= MAX_PORTALS_ON_CLUSTER {
                return Err(VisError::TooManyPortalsOnCluster(cluster));
            }
        }

        let winding = Winding::new(points)?;
        let plane = winding
            .plane()
            .ok_or(VisError::DegenerateWinding(winding.len()))?;
        let sphere = winding.bounding_sphere();

        let reversed = winding.reversed();

        let forward = PortalId(self.portals.len());
        let backward = PortalId(self.portals.len() + 1);

        self.portals.push(Portal {
            plane,
            owner: back,
            cluster: front,
            sphere,
            winding,
        });
        self.portals.push(Portal {
            plane: plane.flipped(),
            owner: front,
            cluster: back,
            sphere,
            winding: reversed,
        });

        self.clusters[back.0].portals.push(forward);
        self.clusters[front.0].portals.push(backward);
        Ok((forward, backward))
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Number of directed portals (twice the number of openings).
    pub fn num_portals(&self) -> usize {
        self.portals.len()
    }

    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.0]
    }

    pub fn portal(&self, id: PortalId) -> &Portal {
        &self.portals[id.0]
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn portal_ids(&self) -> impl Iterator<Item = PortalId> + '_ {
        (0..self.portals.len()).map(PortalId)
    }

    pub(crate) fn clusters_mut(&mut self) -> &mut [Cluster] {
        &mut self.clusters
    }

    /// Record where a cluster's compressed row starts.
    pub fn set_vis_offset(&mut self, cluster: ClusterId, offset: usize) {
        self.clusters[cluster.0].visofs = Some(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn window() -> Vec<Point3<Real>> {
        vec![
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(4.0, 4.0, 4.0),
            Point3::new(4.0, 0.0, 4.0),
        ]
    }

    #[test]
    fn add_portal_creates_mirrored_pair() {
        let mut graph = PortalGraph::new(2);
        let (fwd, bwd) = graph.add_portal(window(), ClusterId(0), ClusterId(1)).unwrap();

        assert_eq!(graph.num_portals(), 2);
        let f = graph.portal(fwd);
        let b = graph.portal(bwd);
        assert_eq!((f.owner, f.cluster), (ClusterId(0), ClusterId(1)));
        assert_eq!((b.owner, b.cluster), (ClusterId(1), ClusterId(0)));
        assert!((f.plane.normal - Vector3::x()).norm() < 1e-9);
        assert!(f.plane.is_reverse_of(&b.plane));
        assert_eq!(graph.cluster(ClusterId(0)).portals, vec![fwd]);
        assert_eq!(graph.cluster(ClusterId(1)).portals, vec![bwd]);
    }

    #[test]
    fn add_portal_rejects_unknown_cluster() {
        let mut graph = PortalGraph::new(1);
        let err = graph.add_portal(window(), ClusterId(0), ClusterId(3)).unwrap_err();
        assert_eq!(err, VisError::ClusterOutOfRange { cluster: 3, count: 1 });
    }

    #[test]
    fn add_portal_rejects_collinear_winding() {
        let mut graph = PortalGraph::new(2);
        let line = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert_eq!(
            graph.add_portal(line, ClusterId(0), ClusterId(1)),
            Err(VisError::DegenerateWinding(3))
        );
    }
}
