//! Shared per-portal vis state and the claim lock around it
//!
//! Portal geometry lives in the immutable [`PortalGraph`](crate::graph::PortalGraph);
//! everything a run writes lives here. The might-see sets are filled in
//! before any flow starts and are read-only afterwards. Each portal's status
//! is a single atomic, and its exact visbits are published exactly once,
//! just before the status turns `Done`.
//!
//! Whether claims are serialized by a real lock is decided once, when the
//! state is built: a single worker claims without one.

use crate::errors::VisError;
use crate::graph::{ClusterSet, PortalId};
use crate::stats::VisStats;
use parking_lot::Mutex;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Where a portal is in its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VisStatus {
    None,
    Selected,
    Working,
    Done,
}

impl VisStatus {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => VisStatus::None,
            1 => VisStatus::Selected,
            2 => VisStatus::Working,
            _ => VisStatus::Done,
        }
    }
}

/// Lock-free status slot of one portal.
#[derive(Debug)]
struct StatusCell(AtomicU8);

impl StatusCell {
    const fn new() -> Self {
        StatusCell(AtomicU8::new(VisStatus::None as u8))
    }

    fn load(&self) -> VisStatus {
        VisStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, status: VisStatus) {
        self.0.store(status as u8, Ordering::Release);
    }

    /// Move `from` to `to`; false if the portal was elsewhere.
    fn advance(&self, from: VisStatus, to: VisStatus) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn into_inner(self) -> VisStatus {
        VisStatus::from_u8(self.0.into_inner())
    }
}

#[derive(Debug)]
struct PortalVis {
    status: StatusCell,
    mightsee: ClusterSet,
    nummightsee: usize,
    visbits: OnceLock<ClusterSet>,
    numcansee: AtomicUsize,
}

/// Mutable state of one vis run.
#[derive(Debug)]
pub struct VisState {
    portals: Vec<PortalVis>,
    /// Serializes claims; absent when a single worker runs the flow
    claim: Option<Mutex<()>>,
    stats: Mutex<VisStats>,
    done: AtomicUsize,
}

impl VisState {
    /// Fresh state for portals whose might-see sets are already known.
    ///
    /// `threaded` picks the locking once: with a single worker, claims skip
    /// the claim lock entirely.
    pub fn new(mightsee: Vec<ClusterSet>, threaded: bool) -> Self {
        let portals = mightsee
            .into_iter()
            .map(|set| PortalVis {
                status: StatusCell::new(),
                nummightsee: set.count_ones(),
                mightsee: set,
                visbits: OnceLock::new(),
                numcansee: AtomicUsize::new(0),
            })
            .collect();
        VisState {
            portals,
            claim: threaded.then(|| Mutex::new(())),
            stats: Mutex::new(VisStats::default()),
            done: AtomicUsize::new(0),
        }
    }

    pub fn num_portals(&self) -> usize {
        self.portals.len()
    }

    /// Whether claims go through a real lock.
    pub fn is_threaded(&self) -> bool {
        self.claim.is_some()
    }

    pub fn status(&self, id: PortalId) -> VisStatus {
        self.portals[id.0].status.load()
    }

    pub fn mightsee(&self, id: PortalId) -> &ClusterSet {
        &self.portals[id.0].mightsee
    }

    pub fn nummightsee(&self, id: PortalId) -> usize {
        self.portals[id.0].nummightsee
    }

    pub fn numcansee(&self, id: PortalId) -> usize {
        self.portals[id.0].numcansee.load(Ordering::Relaxed)
    }

    /// A portal's exact visbits, if its flow already finished.
    ///
    /// Another worker may finish the portal a moment later; missing that only
    /// costs a pruning opportunity.
    pub fn finished_visbits(&self, id: PortalId) -> Option<&ClusterSet> {
        let portal = &self.portals[id.0];
        if portal.status.load() == VisStatus::Done {
            portal.visbits.get()
        } else {
            None
        }
    }

    /// Claim the unprocessed portal that might see the fewest clusters.
    pub fn next_portal(&self) -> Option<PortalId> {
        let _claim = self.claim.as_ref().map(|lock| lock.lock());

        loop {
            let mut best: Option<(usize, usize)> = None;
            for (i, portal) in self.portals.iter().enumerate() {
                if portal.status.load() != VisStatus::None {
                    continue;
                }
                if best.is_none_or(|(_, min)| portal.nummightsee < min) {
                    best = Some((i, portal.nummightsee));
                }
            }

            let (i, _) = best?;
            if self.portals[i].status.advance(VisStatus::None, VisStatus::Selected) {
                return Some(PortalId(i));
            }
        }
    }

    /// Move a claimed portal into `Working`.
    pub fn begin_flow(&self, id: PortalId) -> Result<(), VisError> {
        if self.portals[id.0]
            .status
            .advance(VisStatus::Selected, VisStatus::Working)
        {
            Ok(())
        } else {
            Err(VisError::Reflowed(id))
        }
    }

    /// Publish a portal's visbits, mark it `Done`, and fold the worker's
    /// counters into the run total. Returns how many portals are done.
    pub fn finish(&self, id: PortalId, visbits: ClusterSet, stats: &mut VisStats) -> usize {
        let portal = &self.portals[id.0];
        portal
            .numcansee
            .store(visbits.count_ones(), Ordering::Relaxed);
        if portal.visbits.set(visbits).is_err() {
            log::warn!("portal {id} published its visbits twice");
        }
        portal.status.store(VisStatus::Done);

        *self.stats.lock() += stats.take();
        self.done.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Summed statistics of every finished portal.
    pub fn total_stats(&self) -> VisStats {
        *self.stats.lock()
    }

    /// Hand back every portal's visbits; fails if any flow is unfinished.
    pub fn into_visbits(self) -> Result<Vec<ClusterSet>, VisError> {
        self.portals
            .into_iter()
            .enumerate()
            .map(|(i, portal)| {
                let done = portal.status.into_inner() == VisStatus::Done;
                match portal.visbits.into_inner() {
                    Some(visbits) if done => Ok(visbits),
                    _ => Err(VisError::PortalNotDone(PortalId(i))),
                }
            })
            .collect()
    }
}
