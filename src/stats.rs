//! Counters collected by each worker and summed for reporting

use std::fmt;
use std::ops::AddAssign;

/// Per-thread flow statistics. None of these steer the algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisStats {
    /// portals tested against separators
    pub portaltest: usize,
    /// portals vis passed through
    pub portalpass: usize,
    /// portal checks
    pub portalcheck: usize,
    pub targettested: usize,
    pub targettrimmed: usize,
    pub targetclipped: usize,
    pub sourcetested: usize,
    pub sourcetrimmed: usize,
    pub sourceclipped: usize,
    /// visits to clusters
    pub chains: usize,
    /// masked tests against a candidate's might-see set
    pub mighttest: usize,
    /// masked tests against a finished candidate's visbits
    pub vistest: usize,
    /// candidates skipped because they could not add anything new
    pub mightseeupdate: usize,
}

impl VisStats {
    /// Return the counters and zero them.
    pub fn take(&mut self) -> VisStats {
        std::mem::take(self)
    }
}

impl AddAssign for VisStats {
    fn add_assign(&mut self, rhs: Self) {
        self.portaltest += rhs.portaltest;
        self.portalpass += rhs.portalpass;
        self.portalcheck += rhs.portalcheck;
        self.targettested += rhs.targettested;
        self.targettrimmed += rhs.targettrimmed;
        self.targetclipped += rhs.targetclipped;
        self.sourcetested += rhs.sourcetested;
        self.sourcetrimmed += rhs.sourcetrimmed;
        self.sourceclipped += rhs.sourceclipped;
        self.chains += rhs.chains;
        self.mighttest += rhs.mighttest;
        self.vistest += rhs.vistest;
        self.mightseeupdate += rhs.mightseeupdate;
    }
}

impl fmt::Display for VisStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "portalcheck: {} portaltest: {} portalpass: {}",
            self.portalcheck, self.portaltest, self.portalpass
        )?;
        writeln!(
            f,
            "target trimmed: {} clipped: {} tested: {}",
            self.targettrimmed, self.targetclipped, self.targettested
        )?;
        writeln!(
            f,
            "source trimmed: {} clipped: {} tested: {}",
            self.sourcetrimmed, self.sourceclipped, self.sourcetested
        )?;
        writeln!(f, "chains: {}", self.chains)?;
        write!(
            f,
            "mighttest: {} vistest: {} mightseeupdate: {}",
            self.mighttest, self.vistest, self.mightseeupdate
        )
    }
}
