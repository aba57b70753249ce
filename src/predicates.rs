//! Geometric predicates shared by the base approximation and the exact flow

use crate::float_types::{ON_EPSILON, Real, SEPARATOR_EPSILON};
use crate::graph::Portal;
use crate::plane::{Plane, Side};
use nalgebra::Point3;

/// Could anything flowing out of `portal` ever reach `target`?
///
/// Visibility only moves from the back of a portal's plane toward its front,
/// so `target` must have something in front of `portal`, and `portal` must
/// have something behind `target`. Bounding spheres decide the easy cases;
/// a straddling sphere falls back to testing the winding's points.
pub fn portal_may_see(portal: &Portal, target: &Portal) -> bool {
    // the target is entirely behind the portal's plane
    let target_side = target.sphere.side(&portal.plane);
    if target_side == Side::Back {
        return false;
    }
    // the portal is entirely in front of the target's plane, so the target
    // faces against the flow
    let portal_side = portal.sphere.side(&target.plane);
    if portal_side == Side::Front {
        return false;
    }

    if target_side == Side::On
        && !target
            .winding
            .points()
            .iter()
            .any(|p| portal.plane.distance_to(p) > ON_EPSILON)
    {
        return false;
    }

    if portal_side == Side::On
        && !portal
            .winding
            .points()
            .iter()
            .any(|p| target.plane.distance_to(p) < -ON_EPSILON)
    {
        return false;
    }

    true
}

/// Collect the planes separating `source` from `pass`.
///
/// Each candidate runs through an edge of `source` and a point of `pass`. It
/// is kept when `source` lies behind it and all of `pass` lies on or in front
/// of it (with at least one point strictly in front), so any sight line
/// leaving `source` through `pass` ends up in front. With `flip_clip` the
/// roles of the two windings are swapped by the caller and the kept planes
/// are flipped, so in both cases the far side of the chain is the front.
pub fn find_separators(
    source: &[Point3<Real>],
    pass: &[Point3<Real>],
    flip_clip: bool,
    out: &mut Vec<Plane>,
) {
    let n = source.len();
    for i in 0..n {
        let l = (i + 1) % n;
        let edge = source[l] - source[i];

        for (j, pass_point) in pass.iter().enumerate() {
            let normal = edge.cross(&(pass_point - source[i]));
            let length = normal.norm_squared();
            // if points don't make a valid plane, skip it
            if length < SEPARATOR_EPSILON {
                continue;
            }
            let normal = normal / length.sqrt();
            let mut plane = Plane {
                normal,
                dist: pass_point.coords.dot(&normal),
            };

            // find out which side of the candidate the source lies on
            let source_side = source
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != i && k != l)
                .map(|(_, p)| plane.side_of(p))
                .find(|&side| side != Side::On);
            let flip = match source_side {
                Some(Side::Back) => false,
                Some(_) => true,
                // planar with the source
                None => continue,
            };
            if flip {
                plane.flip();
            }

            // every pass point must now be on the front
            let mut any_front = false;
            let mut separates = true;
            for (k, p) in pass.iter().enumerate() {
                if k == j {
                    continue;
                }
                match plane.side_of(p) {
                    Side::Back => {
                        separates = false;
                        break;
                    },
                    Side::Front => any_front = true,
                    Side::On => {},
                }
            }
            if !separates || !any_front {
                continue;
            }

            if flip_clip {
                plane.flip();
            }
            out.push(plane);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClusterId, PortalGraph};

    fn quad_at_x(x: Real, y0: Real, y1: Real) -> Vec<Point3<Real>> {
        vec![
            Point3::new(x, y0, 0.0),
            Point3::new(x, y1, 0.0),
            Point3::new(x, y1, 4.0),
            Point3::new(x, y0, 4.0),
        ]
    }

    #[test]
    fn facing_portals_may_see_each_other() {
        let mut graph = PortalGraph::new(3);
        let (a, a_back) = graph
            .add_portal(quad_at_x(4.0, 0.0, 4.0), ClusterId(0), ClusterId(1))
            .unwrap();
        let (b, b_back) = graph
            .add_portal(quad_at_x(8.0, 0.0, 4.0), ClusterId(1), ClusterId(2))
            .unwrap();

        assert!(portal_may_see(graph.portal(a), graph.portal(b)));
        assert!(portal_may_see(graph.portal(b_back), graph.portal(a_back)));
        // against the flow
        assert!(!portal_may_see(graph.portal(b), graph.portal(a)));
        assert!(!portal_may_see(graph.portal(a), graph.portal(b_back)));
        // the mirror lies on the portal's own plane
        assert!(!portal_may_see(graph.portal(a), graph.portal(a_back)));
    }

    fn floor_quad(x0: Real, x1: Real) -> Vec<Point3<Real>> {
        vec![
            Point3::new(x0, 0.0, 0.0),
            Point3::new(x1, 0.0, 0.0),
            Point3::new(x1, 4.0, 0.0),
            Point3::new(x0, 4.0, 0.0),
        ]
    }

    #[test]
    fn straddling_portal_needs_a_point_behind_the_target() {
        let mut graph = PortalGraph::new(6);
        // upward floor windows whose spheres both straddle the wall x = 8
        let (clear, _) = graph
            .add_portal(floor_quad(8.0, 12.0), ClusterId(0), ClusterId(1))
            .unwrap();
        let (behind, _) = graph
            .add_portal(floor_quad(6.0, 10.0), ClusterId(2), ClusterId(3))
            .unwrap();
        let (wall, _) = graph
            .add_portal(quad_at_x(8.0, 0.0, 4.0), ClusterId(4), ClusterId(5))
            .unwrap();

        let wall_plane = &graph.portal(wall).plane;
        assert_eq!(graph.portal(clear).sphere.side(wall_plane), Side::On);
        assert_eq!(graph.portal(behind).sphere.side(wall_plane), Side::On);

        // every point of `clear` is on or in front of the wall
        assert!(!portal_may_see(graph.portal(clear), graph.portal(wall)));
        // `behind` reaches back to x = 6
        assert!(portal_may_see(graph.portal(behind), graph.portal(wall)));
    }

    #[test]
    fn separators_put_source_behind_and_pass_in_front() {
        let source = quad_at_x(0.0, 0.0, 4.0);
        let pass = quad_at_x(4.0, 0.0, 4.0);
        let mut planes = Vec::new();
        find_separators(&source, &pass, false, &mut planes);
        assert!(!planes.is_empty());
        for plane in &planes {
            assert!(source.iter().all(|p| plane.distance_to(p) <= ON_EPSILON));
            assert!(pass.iter().all(|p| plane.distance_to(p) >= -ON_EPSILON));
        }

        let mut flipped = Vec::new();
        find_separators(&pass, &source, true, &mut flipped);
        assert!(!flipped.is_empty());
        for plane in &flipped {
            assert!(source.iter().all(|p| plane.distance_to(p) <= ON_EPSILON));
            assert!(pass.iter().all(|p| plane.distance_to(p) >= -ON_EPSILON));
        }
    }

    #[test]
    fn coplanar_windings_have_no_separators() {
        let source = quad_at_x(0.0, 0.0, 4.0);
        let pass = quad_at_x(0.0, 6.0, 8.0);
        let mut planes = Vec::new();
        find_separators(&source, &pass, false, &mut planes);
        assert!(planes.is_empty());
    }
}
