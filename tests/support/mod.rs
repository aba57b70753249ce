//! Test support library
//! Builders for small hand-made levels.

#![allow(dead_code)]

use nalgebra::Point3;
use portalvis::{ClusterId, PortalGraph, float_types::Real};

/// Height of every window the helpers build.
pub const HEIGHT: Real = 4.0;

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A window in the plane `x`, spanning `y0..y1` and `0..HEIGHT` in z,
/// wound so its normal points along +x.
pub fn window_x(x: Real, y0: Real, y1: Real) -> Vec<Point3<Real>> {
    vec![
        Point3::new(x, y0, 0.0),
        Point3::new(x, y1, 0.0),
        Point3::new(x, y1, HEIGHT),
        Point3::new(x, y0, HEIGHT),
    ]
}

/// Box clusters laid side by side along +x, each `width` wide.
///
/// Cluster `i` is joined to cluster `i + 1` by one window at
/// `x = (i + 1) * width` spanning `windows[i]` in y.
pub fn corridor(width: Real, windows: &[(Real, Real)]) -> PortalGraph {
    let mut graph = PortalGraph::new(windows.len() + 1);
    for (i, &(y0, y1)) in windows.iter().enumerate() {
        let x = (i + 1) as Real * width;
        graph
            .add_portal(window_x(x, y0, y1), ClusterId(i), ClusterId(i + 1))
            .expect("corridor window");
    }
    graph
}

/// Four clusters where the last window is out of line with the first two:
/// 0 sees 1 and 2, but no line through windows 0|1 and 1|2 reaches 2|3.
pub fn dogleg() -> PortalGraph {
    corridor(4.0, &[(0.0, 2.0), (0.0, 2.0), (10.0, 12.0)])
}

/// Three clusters where both windows sit in the same wall of the middle one:
/// 0 and 2 lie side by side at x < 4, the middle cluster 1 spans x > 4.
pub fn u_turn() -> PortalGraph {
    let mut graph = PortalGraph::new(3);
    graph
        .add_portal(window_x(4.0, 0.0, 4.0), ClusterId(0), ClusterId(1))
        .expect("first window");
    graph
        .add_portal(window_x(4.0, 8.0, 12.0), ClusterId(2), ClusterId(1))
        .expect("second window");
    graph
}

/// Three clusters in a row where 0 opens into 1 through two windows,
/// `y = 0..2` and `y = 8..10` at `x = 4`, and 1 into 2 through one window
/// at `x = 8`, `y = 4..6`. Every cluster sees every other.
pub fn twin_windows() -> PortalGraph {
    let mut graph = PortalGraph::new(3);
    graph
        .add_portal(window_x(4.0, 0.0, 2.0), ClusterId(0), ClusterId(1))
        .expect("lower window");
    graph
        .add_portal(window_x(4.0, 8.0, 10.0), ClusterId(0), ClusterId(1))
        .expect("upper window");
    graph
        .add_portal(window_x(8.0, 4.0, 6.0), ClusterId(1), ClusterId(2))
        .expect("far window");
    graph
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}
