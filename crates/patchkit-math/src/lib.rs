#![warn(missing_docs)]

//! Math types for the patchkit geometry kernel.
//!
//! Thin wrappers around nalgebra: points and vectors in model space,
//! homogeneous control-point coordinates, world transforms and the
//! half-space planes used by frustum selection.

use nalgebra::{Matrix4, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A homogeneous 4-vector. Control points store `(w*x, w*y, w*z, w)`.
pub type Vec4 = Vector4<f64>;

/// A 4x4 matrix.
pub type Mat4 = Matrix4<f64>;

/// A 4x4 affine transformation matrix, usually an entity's world matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Mat4,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }

    /// Wrap a raw matrix.
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Mat4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Mat4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Mat4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other), so `other` applies first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vec4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vec4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    /// Pull a world-space plane back into this transform's local space.
    ///
    /// A local point `x` maps to `M x` in world space, and
    /// `dot(p, M x) == dot(Mᵀ p, x)`, so the local plane is `Mᵀ p`. The
    /// result is not renormalized: signs are exact, distances are scaled.
    pub fn plane_to_local(&self, plane: &Plane) -> Plane {
        Plane {
            coeffs: self.matrix.transpose() * plane.coeffs,
        }
    }

    /// Express a world-space edit `delta` in this transform's local frame:
    /// `inverse(self) * delta * self`.
    pub fn conjugate(&self, delta: &Transform) -> Option<Self> {
        let inv = self.matrix.try_inverse()?;
        Some(Self {
            matrix: inv * delta.matrix * self.matrix,
        })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// A plane `a*x + b*y + c*z + d = 0`; the half-space `>= 0` is "inside".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Coefficients `(a, b, c, d)`.
    pub coeffs: Vec4,
}

impl Plane {
    /// Create a plane from raw coefficients.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            coeffs: Vec4::new(a, b, c, d),
        }
    }

    /// Plane through `point` with the given (not necessarily unit) normal.
    pub fn from_point_normal(point: &Point3, normal: &Vec3) -> Self {
        Self::new(normal.x, normal.y, normal.z, -normal.dot(&point.coords))
    }

    /// Plane through three points, normal `normalize((p2-p1) x (p3-p1))`.
    ///
    /// Returns `None` when the points are collinear.
    pub fn from_points(p1: &Point3, p2: &Point3, p3: &Point3) -> Option<Self> {
        let n = (p2 - p1).cross(&(p3 - p1));
        let len = n.norm();
        if len < 1e-300 || !len.is_finite() {
            return None;
        }
        Some(Self::from_point_normal(p1, &(n / len)))
    }

    /// Plane normal `(a, b, c)`.
    pub fn normal(&self) -> Vec3 {
        Vec3::new(self.coeffs.x, self.coeffs.y, self.coeffs.z)
    }

    /// Signed value `dot(coeffs, (p, 1))`.
    #[inline]
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.coeffs.x * p.x + self.coeffs.y * p.y + self.coeffs.z * p.z + self.coeffs.w
    }

    /// True when `p` lies in the closed inside half-space.
    #[inline]
    pub fn contains(&self, p: &Point3) -> bool {
        self.signed_distance(p) >= 0.0
    }
}
