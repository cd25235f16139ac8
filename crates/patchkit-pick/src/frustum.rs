//! Six-plane selection volumes.

use patchkit_math::{Plane, Point3, Transform};

/// A convex selection volume bounded by six planes with inward normals.
///
/// Plane order is near, far, right, top, left, bottom. A point is inside
/// when it lies in the closed inside half-space of every plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// The bounding planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Frustum through the eight corners of a marquee.
    ///
    /// Each quad is `[top_left, top_right, bottom_left, bottom_right]` as
    /// seen from the camera; `near` is the quad closest to the eye.
    /// Returns `None` when any face is degenerate.
    pub fn from_corners(near: &[Point3; 4], far: &[Point3; 4]) -> Option<Self> {
        let [tln, trn, bln, brn] = near;
        let [tlf, trf, blf, brf] = far;
        Some(Self {
            planes: [
                Plane::from_points(trn, brn, tln)?,
                Plane::from_points(brf, trf, blf)?,
                Plane::from_points(brn, trn, brf)?,
                Plane::from_points(trn, tln, trf)?,
                Plane::from_points(tln, bln, tlf)?,
                Plane::from_points(bln, brn, blf)?,
            ],
        })
    }

    /// Axis-aligned box `[min, max]` as a frustum.
    pub fn from_box(min: &Point3, max: &Point3) -> Self {
        Self {
            planes: [
                Plane::new(0.0, 0.0, -1.0, max.z),
                Plane::new(0.0, 0.0, 1.0, -min.z),
                Plane::new(-1.0, 0.0, 0.0, max.x),
                Plane::new(0.0, -1.0, 0.0, max.y),
                Plane::new(1.0, 0.0, 0.0, -min.x),
                Plane::new(0.0, 1.0, 0.0, -min.y),
            ],
        }
    }

    /// Pull the frustum into the local space of an object placed by `world`.
    ///
    /// Planes are multiplied by the transpose of `world`, which keeps every
    /// inside/outside sign exact for any affine matrix, singular or not.
    pub fn to_local(&self, world: &Transform) -> Self {
        Self {
            planes: self.planes.map(|p| world.plane_to_local(&p)),
        }
    }

    /// Whether `p` is inside all six half-spaces.
    #[inline]
    pub fn contains_point(&self, p: &Point3) -> bool {
        self.planes.iter().all(|plane| plane.contains(p))
    }
}
