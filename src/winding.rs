//! Convex polygon windings and the clip primitive everything else builds on
//!
//! A [`Winding`] either borrows its points from a portal (the portal's own,
//! immutable geometry) or owns a freshly clipped copy. Clipping a borrowed
//! winding that lies entirely in front of a plane hands the borrow straight
//! back, so unclipped portal geometry is never copied.

use crate::errors::VisError;
use crate::float_types::{MAX_POINTS_ON_WINDING, Real};
use crate::plane::{Plane, Side, side_of_distance};
use crate::sphere::BoundingSphere;
use nalgebra::Point3;
use std::borrow::Cow;

/// An ordered, coplanar, consistently wound set of points.
#[derive(Debug, Clone, PartialEq)]
pub struct Winding<'a> {
    points: Cow<'a, [Point3<Real>]>,
}

impl Winding<'static> {
    /// An empty owned winding with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Winding {
            points: Cow::Owned(Vec::with_capacity(capacity)),
        }
    }

    /// Owned winding from loader geometry, validating the point count.
    pub fn new(points: Vec<Point3<Real>>) -> Result<Self, VisError> {
        if points.len() > MAX_POINTS_ON_WINDING {
            return Err(VisError::TooManyPoints {
                count: points.len(),
                max: MAX_POINTS_ON_WINDING,
            });
        }
        if points.len() < 3 {
            return Err(VisError::DegenerateWinding(points.len()));
        }
        Ok(Winding {
            points: Cow::Owned(points),
        })
    }

    /// Append a point to an owned winding.
    pub fn push(&mut self, point: Point3<Real>) {
        self.points.to_mut().push(point);
    }
}

impl<'a> Winding<'a> {
    /// A winding aliasing a portal's points. It is never copied unless clipped.
    pub const fn borrowed(points: &'a [Point3<Real>]) -> Self {
        Winding {
            points: Cow::Borrowed(points),
        }
    }

    /// True when this winding is still the portal's own geometry.
    pub const fn is_original(&self) -> bool {
        matches!(self.points, Cow::Borrowed(_))
    }

    pub fn points(&self) -> &[Point3<Real>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Deep copy, always owned.
    pub fn to_owned_winding(&self) -> Winding<'static> {
        Winding {
            points: Cow::Owned(self.points.to_vec()),
        }
    }

    /// The same polygon wound the other way.
    pub fn reversed(&self) -> Winding<'static> {
        Winding {
            points: Cow::Owned(self.points.iter().rev().copied().collect()),
        }
    }

    /// Plane through the winding, normal by the right-hand rule.
    pub fn plane(&self) -> Option<Plane> {
        Plane::from_winding_points(&self.points)
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::from_points(&self.points)
    }

    /// Keep the part of the winding in front of `split`.
    ///
    /// Points within `ON_EPSILON` of the plane count as on it and are kept on
    /// both sides. Returns `None` when nothing remains in front, when the
    /// remainder has fewer than three points, or when the winding lies on the
    /// plane and `keep_on` is false. A winding with no point behind the plane
    /// is returned unchanged (still borrowed if it was borrowed).
    pub fn clip(self, split: &Plane, keep_on: bool) -> Option<Winding<'a>> {
        self.clip_exact(split, keep_on).into_winding()
    }

    /// [`clip`](Self::clip), reporting whether anything was cut away.
    pub fn clip_exact(self, split: &Plane, keep_on: bool) -> Clipped<'a> {
        let n = self.points.len();
        let dists: Vec<Real> = self.points.iter().map(|p| split.distance_to(p)).collect();
        let sides: Vec<Side> = dists.iter().map(|&d| side_of_distance(d)).collect();

        let front = sides.iter().filter(|&&s| s == Side::Front).count();
        let back = sides.iter().filter(|&&s| s == Side::Back).count();

        if keep_on && front == 0 && back == 0 {
            return Clipped::Whole(self);
        }
        if front == 0 {
            return Clipped::Gone;
        }
        if back == 0 {
            return Clipped::Whole(self);
        }

        let mut clipped = Vec::with_capacity(n + 4);
        for i in 0..n {
            let p1 = self.points[i];
            match sides[i] {
                Side::On => {
                    clipped.push(p1);
                    continue;
                },
                Side::Front => clipped.push(p1),
                Side::Back => {},
            }

            let j = (i + 1) % n;
            if sides[j] == Side::On || sides[j] == sides[i] {
                continue;
            }

            // generate a split point
            let p2 = self.points[j];
            let t = dists[i] / (dists[i] - dists[j]);
            let mut mid = Point3::origin();
            for k in 0..3 {
                // avoid round off error when possible
                mid[k] = if split.normal[k] == 1.0 {
                    split.dist
                } else if split.normal[k] == -1.0 {
                    -split.dist
                } else {
                    p1[k] + t * (p2[k] - p1[k])
                };
            }
            clipped.push(mid);
        }

        if clipped.len() < 3 {
            return Clipped::Gone;
        }
        Clipped::Trimmed(Winding {
            points: Cow::Owned(clipped),
        })
    }
}

/// Outcome of [`Winding::clip_exact`].
#[derive(Debug, Clone, PartialEq)]
pub enum Clipped<'a> {
    /// Nothing was behind the plane; the input comes back untouched
    Whole(Winding<'a>),
    /// Part of the winding was cut away
    Trimmed(Winding<'a>),
    /// Nothing usable is left
    Gone,
}

impl<'a> Clipped<'a> {
    pub fn into_winding(self) -> Option<Winding<'a>> {
        match self {
            Clipped::Whole(w) | Clipped::Trimmed(w) => Some(w),
            Clipped::Gone => None,
        }
    }
}
