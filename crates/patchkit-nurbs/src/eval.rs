//! Control points and point evaluation of curves, surfaces and cubic
//! Bezier patches.

use patchkit_math::{Point3, Transform, Vec4};

use crate::basis::{bernstein3, eval_basis, eval_basis_row};
use crate::knots::KnotVector;

// =============================================================================
// Control points
// =============================================================================

/// A weighted control point with its selection flag.
///
/// The position is stored pre-multiplied: `(w*x, w*y, w*z, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    /// Homogeneous position.
    pub position: Vec4,
    /// Selection state, written by the host's selection manager.
    pub selected: bool,
}

impl ControlPoint {
    /// Unselected control point at `p` with weight `w`.
    pub fn from_cartesian(p: Point3, w: f64) -> Self {
        Self {
            position: Vec4::new(p.x * w, p.y * w, p.z * w, w),
            selected: false,
        }
    }

    /// Unselected control point with weight 1.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::from_cartesian(Point3::new(x, y, z), 1.0)
    }

    /// NURBS weight.
    pub fn weight(&self) -> f64 {
        self.position.w
    }

    /// Cartesian position, `(x, y, z) / w`.
    ///
    /// A zero weight yields the raw `xyz` components.
    pub fn cartesian(&self) -> Point3 {
        let p = &self.position;
        if p.w == 0.0 {
            return Point3::new(p.x, p.y, p.z);
        }
        Point3::new(p.x / p.w, p.y / p.w, p.z / p.w)
    }

    /// Move to `p`, keeping the weight.
    pub fn set_cartesian(&mut self, p: Point3) {
        let w = self.position.w;
        self.position = Vec4::new(p.x * w, p.y * w, p.z * w, w);
    }

    /// Apply an affine transform to the cartesian position, keeping the weight.
    pub fn transform(&mut self, t: &Transform) {
        let p = t.apply_point(&self.cartesian());
        self.set_cartesian(p);
    }
}

fn project(sum: Vec4) -> Point3 {
    if sum.w == 0.0 {
        debug_assert!(false, "homogeneous weight sum is zero");
        return Point3::origin();
    }
    Point3::new(sum.x / sum.w, sum.y / sum.w, sum.z / sum.w)
}

// =============================================================================
// Evaluation traits
// =============================================================================

/// A curve that can be evaluated at a parameter.
pub trait ParametricCurve {
    /// Point at `u`. `u` must lie inside the clamped domain.
    fn eval(&self, u: f64) -> Point3;

    /// Parameter domain `(min, max)`.
    fn domain(&self) -> (f64, f64);
}

/// A surface that can be evaluated at a parameter pair.
pub trait ParametricSurface {
    /// Point at `(u, v)`. Parameters must lie inside the clamped domain.
    fn eval(&self, u: f64, v: f64) -> Point3;

    /// Parameter domains `((u_min, u_max), (v_min, v_max))`.
    fn domain(&self) -> ((f64, f64), (f64, f64));
}

// =============================================================================
// Views
// =============================================================================

/// A B-spline or NURBS curve borrowed from its owner.
#[derive(Debug, Clone, Copy)]
pub struct CurveView<'a> {
    degree: usize,
    points: &'a [ControlPoint],
    knots: &'a KnotVector,
}

impl<'a> CurveView<'a> {
    /// Borrow a curve. The knot vector must have been validated against
    /// `points.len()` and `degree`.
    pub fn new(degree: usize, points: &'a [ControlPoint], knots: &'a KnotVector) -> Self {
        debug_assert_eq!(knots.len(), points.len() + degree + 1);
        Self {
            degree,
            points,
            knots,
        }
    }

    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Control points.
    pub fn points(&self) -> &'a [ControlPoint] {
        self.points
    }

    /// Knot vector.
    pub fn knots(&self) -> &'a KnotVector {
        self.knots
    }
}

impl ParametricCurve for CurveView<'_> {
    fn eval(&self, u: f64) -> Point3 {
        let knots = self.knots.as_slice();
        let sum = self
            .points
            .iter()
            .enumerate()
            .fold(Vec4::zeros(), |acc, (i, cv)| {
                acc + cv.position * eval_basis(u, i, self.degree, knots)
            });
        project(sum)
    }

    fn domain(&self) -> (f64, f64) {
        self.knots.domain()
    }
}

/// A tensor-product B-spline or NURBS surface borrowed from its owner.
///
/// Control points are row-major: index `iv * num_u + iu`.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceView<'a> {
    degree_u: usize,
    degree_v: usize,
    num_u: usize,
    num_v: usize,
    points: &'a [ControlPoint],
    knots_u: &'a KnotVector,
    knots_v: &'a KnotVector,
}

impl<'a> SurfaceView<'a> {
    /// Borrow a surface. Knot vectors must have been validated against
    /// the grid dimensions and degrees.
    pub fn new(
        (degree_u, degree_v): (usize, usize),
        (num_u, num_v): (usize, usize),
        points: &'a [ControlPoint],
        knots_u: &'a KnotVector,
        knots_v: &'a KnotVector,
    ) -> Self {
        debug_assert_eq!(points.len(), num_u * num_v);
        debug_assert_eq!(knots_u.len(), num_u + degree_u + 1);
        debug_assert_eq!(knots_v.len(), num_v + degree_v + 1);
        Self {
            degree_u,
            degree_v,
            num_u,
            num_v,
            points,
            knots_u,
            knots_v,
        }
    }

    /// Degrees `(u, v)`.
    pub fn degrees(&self) -> (usize, usize) {
        (self.degree_u, self.degree_v)
    }

    /// Grid dimensions `(num_u, num_v)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.num_u, self.num_v)
    }

    /// Control points, row-major.
    pub fn points(&self) -> &'a [ControlPoint] {
        self.points
    }

    /// U knot vector.
    pub fn knots_u(&self) -> &'a KnotVector {
        self.knots_u
    }

    /// V knot vector.
    pub fn knots_v(&self) -> &'a KnotVector {
        self.knots_v
    }
}

impl ParametricSurface for SurfaceView<'_> {
    fn eval(&self, u: f64, v: f64) -> Point3 {
        let mut bu = Vec::with_capacity(self.num_u);
        let mut bv = Vec::with_capacity(self.num_v);
        eval_basis_row(u, self.num_u, self.degree_u, self.knots_u.as_slice(), &mut bu);
        eval_basis_row(v, self.num_v, self.degree_v, self.knots_v.as_slice(), &mut bv);

        let mut sum = Vec4::zeros();
        for (iv, &wv) in bv.iter().enumerate() {
            if wv == 0.0 {
                continue;
            }
            let row = &self.points[iv * self.num_u..(iv + 1) * self.num_u];
            for (cv, &wu) in row.iter().zip(&bu) {
                sum += cv.position * (wu * wv);
            }
        }
        project(sum)
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (self.knots_u.domain(), self.knots_v.domain())
    }
}

/// A bicubic Bezier patch over a 4x4 row-major control grid.
#[derive(Debug, Clone, Copy)]
pub struct BezierView<'a> {
    points: &'a [ControlPoint; 16],
}

impl<'a> BezierView<'a> {
    /// Borrow a 4x4 grid, index `iv * 4 + iu`.
    pub fn new(points: &'a [ControlPoint; 16]) -> Self {
        Self { points }
    }
}

impl ParametricSurface for BezierView<'_> {
    fn eval(&self, u: f64, v: f64) -> Point3 {
        let bu = bernstein3(u);
        let bv = bernstein3(v);
        let mut sum = Vec4::zeros();
        for (iv, wv) in bv.iter().enumerate() {
            for (iu, wu) in bu.iter().enumerate() {
                sum += self.points[iv * 4 + iu].position * (wu * wv);
            }
        }
        project(sum)
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        ((0.0, 1.0), (0.0, 1.0))
    }
}
