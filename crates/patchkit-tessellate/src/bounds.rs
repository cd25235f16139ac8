//! Bounding volumes kept alongside every mesh buffer.

use patchkit_math::{Point3, Vec3};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create a new AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// True until a point has been included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Expand to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Box around a set of points.
    pub fn from_points<I: IntoIterator<Item = Point3>>(points: I) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(&p);
        }
        aabb
    }

    /// Center of the box.
    pub fn center(&self) -> Point3 {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// Half of the diagonal.
    pub fn half_extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// A sphere enclosing a mesh, derived from its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center.
    pub center: Point3,
    /// Sphere radius.
    pub radius: f64,
}

impl BoundingSphere {
    /// Sphere through the box corners.
    pub fn from_box(aabb: &Aabb3) -> Self {
        if aabb.is_empty() {
            return Self {
                center: Point3::origin(),
                radius: 0.0,
            };
        }
        Self {
            center: aabb.center(),
            radius: aabb.half_extent().norm(),
        }
    }

    /// Whether the ray `origin + t * dir`, `t >= 0`, meets the sphere.
    ///
    /// `dir` need not be normalized. A ray starting inside always hits.
    pub fn hit_by_ray(&self, origin: &Point3, dir: &Vec3) -> bool {
        let oc = self.center - origin;
        let r2 = self.radius * self.radius;
        let dist2 = oc.norm_squared();
        if dist2 <= r2 {
            return true;
        }
        let dd = dir.norm_squared();
        if dd == 0.0 {
            return false;
        }
        let along = oc.dot(dir);
        if along < 0.0 {
            return false;
        }
        // Squared distance from the center to the closest point on the ray.
        dist2 - along * along / dd <= r2
    }
}

/// Box and sphere of one vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Axis-aligned box.
    pub aabb: Aabb3,
    /// Enclosing sphere.
    pub sphere: BoundingSphere,
}

impl Bounds {
    /// Bounds of a set of points.
    pub fn from_points<I: IntoIterator<Item = Point3>>(points: I) -> Self {
        let aabb = Aabb3::from_points(points);
        Self {
            aabb,
            sphere: BoundingSphere::from_box(&aabb),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::from_points(std::iter::empty::<Point3>())
    }
}
