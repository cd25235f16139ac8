//! Picking rays and ray-triangle intersection.

use patchkit_math::{Point3, Transform, Vec3};

/// Determinants below this are treated as a ray parallel to the triangle.
const PARALLEL_EPS: f64 = 1e-12;

/// A ray `origin + t * direction`.
///
/// The direction is kept as given, not normalized, so `t` is measured in
/// units of `direction`. A ray from the near to the far point of a pixel
/// has `t` in `[0, 1]` across the view volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Direction of the ray.
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Evaluate the ray at parameter `t`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction
    }

    /// The same ray expressed through `transform`.
    ///
    /// Affine maps preserve the parameter: `transformed(m).at(t) == m(at(t))`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            origin: transform.apply_point(&self.origin),
            direction: transform.apply_vec(&self.direction),
        }
    }

    /// Parameter of the point on the ray closest to `p`.
    pub fn param_of(&self, p: &Point3) -> f64 {
        let dd = self.direction.norm_squared();
        if dd == 0.0 {
            return 0.0;
        }
        self.direction.dot(&(p - self.origin)) / dd
    }

    /// Möller-Trumbore ray-triangle intersection.
    ///
    /// Returns the ray parameter of the hit when it is strictly positive.
    /// Both faces count.
    pub fn intersect_triangle(&self, v0: &Point3, v1: &Point3, v2: &Point3) -> Option<f64> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let h = self.direction.cross(&edge2);
        let a = edge1.dot(&h);
        if a.abs() < PARALLEL_EPS {
            return None;
        }

        let f = 1.0 / a;
        let s = self.origin - v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * self.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        (t > PARALLEL_EPS).then_some(t)
    }
}
