//! Run configuration

/// How a vis run is carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisOptions {
    /// Worker threads. `1` runs everything on the calling thread.
    pub threads: usize,
    /// Separator passes per flow step, `0..=4`:
    /// 1 clips the target by source→pass separators, 2 adds pass→source,
    /// 3 clips the source by target→pass separators, 4 adds pass→target.
    pub level: u8,
    /// Skip the exact flow and publish the might-see approximation.
    pub fast: bool,
    /// Precompute passages and reuse them while windings are unclipped.
    pub use_passages: bool,
}

impl Default for VisOptions {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            level: 4,
            fast: false,
            use_passages: true,
        }
    }
}

impl VisOptions {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level.min(4);
        self
    }

    pub const fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub const fn with_passages(mut self, use_passages: bool) -> Self {
        self.use_passages = use_passages;
        self
    }
}
