//! Kept in its own binary: the thread count it reads is process-wide.

#![cfg(target_os = "linux")]

mod support;

use portalvis::{ClusterId, VisOptions, calc_vis};

fn process_threads() -> usize {
    let status = std::fs::read_to_string("/proc/self/status").unwrap();
    status
        .lines()
        .find_map(|line| line.strip_prefix("Threads:"))
        .and_then(|count| count.trim().parse().ok())
        .unwrap()
}

#[test]
fn single_thread_run_spawns_no_threads() {
    support::init_logging();
    let before = process_threads();

    let mut graph = support::dogleg();
    let output = calc_vis(&mut graph, &VisOptions::default().with_threads(1)).unwrap();

    assert_eq!(process_threads(), before);
    assert!(graph.clusters().iter().any(|c| !c.passages.is_empty()));
    assert!(!output.cluster_sees(ClusterId(0), ClusterId(3)));
}
