//! Oriented planes used for portal orientation and as separating planes

use crate::float_types::{NORMAL_EPSILON, ON_EPSILON, Real};
use nalgebra::{Point3, Vector3};

/// Which side of a plane something lies on, with an `ON_EPSILON` dead zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    On,
}

/// A plane `normal · p = dist` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal vector of the plane
    pub normal: Vector3<Real>,
    /// Distance from origin along normal
    pub dist: Real,
}

impl Plane {
    /// Create a new plane from a normal vector (normalized here) and distance
    pub fn from_normal(normal: Vector3<Real>, dist: Real) -> Self {
        Plane {
            normal: normal.normalize(),
            dist,
        }
    }

    /// Create a plane from three points.
    /// The normal direction follows the right-hand rule: (p2-p1) × (p3-p1).
    /// Returns `None` for collinear points.
    pub fn from_points(p1: &Point3<Real>, p2: &Point3<Real>, p3: &Point3<Real>) -> Option<Self> {
        let normal = (p2 - p1).cross(&(p3 - p1));
        let length = normal.norm();
        if length < Real::EPSILON {
            return None;
        }
        let normal = normal / length;
        Some(Plane {
            normal,
            dist: normal.dot(&p1.coords),
        })
    }

    /// Plane of a convex polygon, oriented by its winding (right-hand rule).
    ///
    /// Uses Newell's method so a nearly collinear leading triple does not spoil
    /// the normal.
    pub fn from_winding_points(points: &[Point3<Real>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let normal = points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .fold(Vector3::zeros(), |acc, (curr, next)| {
                acc + curr.coords.cross(&next.coords)
            });
        let length = normal.norm();
        if length < Real::EPSILON {
            return None;
        }
        let normal = normal / length;
        let centroid = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / points.len() as Real;
        Some(Plane {
            normal,
            dist: normal.dot(&centroid),
        })
    }

    /// Get the plane normal
    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    /// Get the offset (distance from origin)
    pub const fn offset(&self) -> Real {
        self.dist
    }

    /// Flip the plane (reverse normal and distance)
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.dist = -self.dist;
    }

    /// Return a flipped copy of this plane
    pub fn flipped(&self) -> Self {
        Plane {
            normal: -self.normal,
            dist: -self.dist,
        }
    }

    /// Signed distance from `point` to the plane, positive in front.
    #[inline]
    pub fn distance_to(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.dist
    }

    /// Classify a point with the shared `ON_EPSILON` dead zone.
    #[inline]
    pub fn side_of(&self, point: &Point3<Real>) -> Side {
        side_of_distance(self.distance_to(point))
    }

    /// True when `other` faces the exact opposite way (same surface, reversed).
    pub fn is_reverse_of(&self, other: &Plane) -> bool {
        (self.normal + other.normal)
            .iter()
            .all(|c| c.abs() < NORMAL_EPSILON)
    }
}

/// Classify a signed distance with the shared `ON_EPSILON` dead zone.
#[inline]
pub fn side_of_distance(d: Real) -> Side {
    if d > ON_EPSILON {
        Side::Front
    } else if d < -ON_EPSILON {
        Side::Back
    } else {
        Side::On
    }
}
