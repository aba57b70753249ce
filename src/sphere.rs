//! Bounding spheres for O(1) trivial rejection against planes

use crate::float_types::Real;
use crate::plane::{Plane, Side};
use nalgebra::Point3;

/// A conservative bound around a winding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<Real>,
    pub radius: Real,
}

impl BoundingSphere {
    /// Sphere centred on the average of `points`, reaching the farthest one.
    pub fn from_points(points: &[Point3<Real>]) -> Self {
        if points.is_empty() {
            return BoundingSphere {
                center: Point3::origin(),
                radius: 0.0,
            };
        }
        let center = Point3::from(
            points
                .iter()
                .fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords)
                / points.len() as Real,
        );
        let radius = points
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0, Real::max);
        BoundingSphere { center, radius }
    }

    /// Which side of `plane` the whole sphere lies on.
    ///
    /// `Side::On` means the sphere straddles the plane and the caller has to
    /// fall back to exact per-point tests.
    #[inline]
    pub fn side(&self, plane: &Plane) -> Side {
        sphere_side(self, plane)
    }
}

/// Front/back/straddle test of a sphere against a plane.
#[inline]
pub fn sphere_side(sphere: &BoundingSphere, plane: &Plane) -> Side {
    let d = plane.distance_to(&sphere.center);
    if d >= sphere.radius {
        Side::Front
    } else if d <= -sphere.radius {
        Side::Back
    } else {
        Side::On
    }
}
