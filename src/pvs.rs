//! Cluster-level PVS: aggregation of portal visbits and row compression
//!
//! A row holds one bit per cluster, least significant bit first, padded to a
//! whole byte. Rows are compressed with the zero-run scheme: non-zero bytes
//! are copied, and every run of zero bytes becomes a single zero followed by
//! the run length (at most 255, longer runs are split).

use crate::errors::VisError;
use crate::graph::{ClusterId, ClusterSet, PortalGraph, empty_set};
use crate::state::VisState;

/// Longest zero run a single count byte can express.
const MAX_RUN: usize = 255;

/// Aggregated and encoded visibility for every cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Pvs {
    /// Uncompressed row per cluster
    pub rows: Vec<ClusterSet>,
    /// Every compressed row, back to back
    pub data: Vec<u8>,
    /// Start of each cluster's row in `data`
    pub offsets: Vec<usize>,
    /// Length of an uncompressed row in bytes
    pub row_bytes: usize,
}

impl Pvs {
    /// The uncompressed row of `cluster`.
    pub fn row(&self, cluster: ClusterId) -> &ClusterSet {
        &self.rows[cluster.0]
    }

    /// The compressed bytes starting at `cluster`'s row. Trailing bytes belong
    /// to later rows; [`decompress_row`] stops once a row is complete.
    pub fn compressed(&self, cluster: ClusterId) -> &[u8] {
        &self.data[self.offsets[cluster.0]..]
    }

    /// Whether anything in `from` can see into `to`.
    pub fn can_see(&self, from: ClusterId, to: ClusterId) -> bool {
        self.rows[from.0][to.0]
    }
}

/// Bytes needed for one row over `num_clusters` clusters.
pub const fn row_bytes(num_clusters: usize) -> usize {
    num_clusters.div_ceil(8)
}

/// OR together the visbits of every portal bounding `cluster`.
///
/// Every portal must be `Done`. The cluster always sees itself.
pub fn cluster_row(
    graph: &PortalGraph,
    portal_vis: &[ClusterSet],
    cluster: ClusterId,
) -> ClusterSet {
    let mut row = empty_set(graph.num_clusters());
    for &portal in &graph.cluster(cluster).portals {
        let seen = portal_vis[portal.0].as_raw_slice();
        for (dst, src) in row.as_raw_mut_slice().iter_mut().zip(seen) {
            *dst |= src;
        }
    }

    if row[cluster.0] {
        log::warn!("cluster {cluster}: portals saw back into their own cluster");
    }
    row.set(cluster.0, true);
    row
}

/// Zero-run compress one row.
pub fn compress_row(row: &[u8], out: &mut Vec<u8>) {
    let mut j = 0;
    while j < row.len() {
        let byte = row[j];
        out.push(byte);
        j += 1;
        if byte != 0 {
            continue;
        }

        let mut run = 1;
        while j < row.len() && row[j] == 0 && run < MAX_RUN {
            run += 1;
            j += 1;
        }
        out.push(run as u8);
    }
}

/// Expand one compressed row of `row_bytes` bytes.
///
/// Stops as soon as the row is full, so `data` may continue into the next
/// row. A truncated input yields a short row.
pub fn decompress_row(data: &[u8], row_bytes: usize) -> Vec<u8> {
    let mut row = Vec::with_capacity(row_bytes);
    let mut bytes = data.iter().copied();
    while row.len() < row_bytes {
        let Some(byte) = bytes.next() else {
            break;
        };
        if byte != 0 {
            row.push(byte);
            continue;
        }

        let run = bytes.next().unwrap_or(0) as usize;
        let run = run.min(row_bytes - row.len());
        row.resize(row.len() + run, 0);
        if run == 0 {
            break;
        }
    }
    row
}

/// Build the PVS from finished portal visbits and record each cluster's
/// offset on the graph.
pub fn encode(graph: &mut PortalGraph, portal_vis: &[ClusterSet]) -> Pvs {
    let num_clusters = graph.num_clusters();
    let row_bytes = row_bytes(num_clusters);

    let mut rows = Vec::with_capacity(num_clusters);
    let mut data = Vec::new();
    let mut offsets = Vec::with_capacity(num_clusters);

    for c in 0..num_clusters {
        let cluster = ClusterId(c);
        let row = cluster_row(graph, portal_vis, cluster);

        let offset = data.len();
        compress_row(row.as_raw_slice(), &mut data);
        graph.set_vis_offset(cluster, offset);
        offsets.push(offset);
        rows.push(row);
    }

    Pvs {
        rows,
        data,
        offsets,
        row_bytes,
    }
}

/// Aggregate directly from run state, refusing while any portal is unfinished.
pub fn encode_state(
    graph: &mut PortalGraph,
    state: VisState,
) -> Result<(Vec<ClusterSet>, Pvs), VisError> {
    let portal_vis = state.into_visbits()?;
    let pvs = encode(graph, &portal_vis);
    Ok((portal_vis, pvs))
}
