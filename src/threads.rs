//! Worker scheduling
//!
//! The strategy is picked once per run: a single thread executes every job
//! inline on the caller, anything more gets a dedicated rayon pool. Every
//! parallel phase of a run goes through the same scheduler, so a serial run
//! never starts a thread.

use crate::errors::VisError;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How jobs are executed for one run.
pub enum Scheduler {
    /// Everything on the calling thread.
    Serial,
    /// A fixed pool of worker threads.
    #[cfg(feature = "parallel")]
    Pool(rayon::ThreadPool),
}

impl Scheduler {
    /// Pick the strategy for `threads` workers.
    pub fn new(threads: usize) -> Result<Self, VisError> {
        if threads <= 1 {
            return Ok(Scheduler::Serial);
        }
        Self::pooled(threads)
    }

    #[cfg(feature = "parallel")]
    fn pooled(threads: usize) -> Result<Self, VisError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("vis-worker-{i}"))
            .build()?;
        Ok(Scheduler::Pool(pool))
    }

    #[cfg(not(feature = "parallel"))]
    fn pooled(threads: usize) -> Result<Self, VisError> {
        log::warn!("{threads} threads requested but built without `parallel`, running serially");
        Ok(Scheduler::Serial)
    }

    /// Number of workers jobs will run on.
    pub fn threads(&self) -> usize {
        match self {
            Scheduler::Serial => 1,
            #[cfg(feature = "parallel")]
            Scheduler::Pool(pool) => pool.current_num_threads(),
        }
    }

    /// Evaluate `job` for every index in `0..count`, in index order.
    pub fn map<T, F>(&self, count: usize, job: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match self {
            Scheduler::Serial => (0..count).map(job).collect(),
            #[cfg(feature = "parallel")]
            Scheduler::Pool(pool) => pool.install(|| (0..count).into_par_iter().map(job).collect()),
        }
    }

    /// Run `worker` once on every thread; each call receives its thread index
    /// and loops over whatever work it can claim. The first error wins.
    pub fn broadcast<F>(&self, worker: F) -> Result<(), VisError>
    where
        F: Fn(usize) -> Result<(), VisError> + Sync,
    {
        match self {
            Scheduler::Serial => worker(0),
            #[cfg(feature = "parallel")]
            Scheduler::Pool(pool) => pool
                .broadcast(|ctx| worker(ctx.index()))
                .into_iter()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn single_thread_is_serial() {
        let scheduler = Scheduler::new(1).unwrap();
        assert!(matches!(scheduler, Scheduler::Serial));
        assert_eq!(scheduler.threads(), 1);
    }

    #[test]
    fn map_keeps_order() {
        for threads in [1, 4] {
            let scheduler = Scheduler::new(threads).unwrap();
            let squares = scheduler.map(10, |i| i * i);
            assert_eq!(squares, (0..10).map(|i| i * i).collect::<Vec<_>>());
        }
    }

    #[test]
    fn broadcast_drains_shared_queue() {
        for threads in [1, 3] {
            let scheduler = Scheduler::new(threads).unwrap();
            let next = AtomicUsize::new(0);
            let claimed = AtomicUsize::new(0);
            scheduler
                .broadcast(|_| {
                    while next.fetch_add(1, Ordering::Relaxed) < 100 {
                        claimed.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(())
                })
                .unwrap();
            assert_eq!(claimed.load(Ordering::Relaxed), 100);
        }
    }
}
