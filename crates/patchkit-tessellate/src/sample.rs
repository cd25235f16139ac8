//! Parameter sampling and finite-difference normals.

use patchkit_math::{Point3, Vec3};
use patchkit_nurbs::{KnotVector, ParametricSurface};

/// Normal used when the tangents are degenerate.
pub fn fallback_normal() -> Vec3 {
    Vec3::z()
}

/// Evenly spaced parameters along one direction, already clamped into the
/// evaluable range, plus the step used for finite differences.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleAxis {
    params: Vec<f64>,
    lo: f64,
    hi: f64,
    step: f64,
}

impl SampleAxis {
    /// `count` samples over a knot vector's domain, clamped to
    /// `[min, max - eps]` with `eps = knots.domain_epsilon(base_eps)`.
    pub fn over_knots(knots: &KnotVector, count: usize, base_eps: f64, step: f64) -> Self {
        let eps = knots.domain_epsilon(base_eps);
        let (lo, max) = knots.domain();
        Self {
            params: (0..count).map(|i| knots.sample_param(i, count, eps)).collect(),
            lo,
            hi: max - eps,
            step,
        }
    }

    /// `count` samples over `[0, 1]`, endpoints included.
    pub fn unit(count: usize, step: f64) -> Self {
        let params = (0..count)
            .map(|i| if count > 1 { i as f64 / (count - 1) as f64 } else { 0.0 })
            .collect();
        Self {
            params,
            lo: 0.0,
            hi: 1.0,
            step,
        }
    }

    /// Sample parameters.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Clamp an arbitrary parameter into the evaluable range.
    pub fn clamp(&self, t: f64) -> f64 {
        t.max(self.lo).min(self.hi)
    }

    /// Midpoint of segment `i`, between samples `i` and `i + 1`.
    pub fn midpoint(&self, i: usize) -> f64 {
        0.5 * (self.params[i] + self.params[i + 1])
    }

    /// Parameter pair for the difference at sample `i`: forward
    /// `(t, t + step)`, or backward `(t - step, t)` at the last sample.
    pub fn difference_pair(&self, i: usize) -> (f64, f64) {
        let t = self.params[i];
        if i + 1 == self.params.len() {
            (self.clamp(t - self.step), t)
        } else {
            (t, self.clamp(t + self.step))
        }
    }
}

/// Unit normal at sample `(iu, iv)` from forward/backward differences.
///
/// Falls back to `+Z` when the cross product vanishes relative to the
/// tangent lengths or is not finite, so collapsed edges never produce NaN.
/// The test is scale-free: tiny but valid surfaces keep their normals.
pub fn estimate_normal<S: ParametricSurface>(
    surface: &S,
    us: &SampleAxis,
    vs: &SampleAxis,
    iu: usize,
    iv: usize,
) -> Vec3 {
    let u = us.params()[iu];
    let v = vs.params()[iv];
    let (u0, u1) = us.difference_pair(iu);
    let (v0, v1) = vs.difference_pair(iv);
    let du = surface.eval(u1, v) - surface.eval(u0, v);
    let dv = surface.eval(u, v1) - surface.eval(u, v0);
    let n = du.cross(&dv);
    let len = n.norm();
    if !len.is_finite() || len <= f64::EPSILON * du.norm() * dv.norm() {
        return fallback_normal();
    }
    n / len
}

/// Map a unit normal to an RGB color, `(n + 1) / 2 * 255`.
pub fn normal_color(n: &Vec3) -> [u8; 4] {
    let c = |x: f64| ((x + 1.0) * 0.5 * 255.0).clamp(0.0, 255.0) as u8;
    [c(n.x), c(n.y), c(n.z), 255]
}

/// Narrow a point to the f32 vertex layout.
pub(crate) fn to_f32(p: &Point3) -> [f32; 3] {
    [p.x as f32, p.y as f32, p.z as f32]
}

/// Narrow a vector to the f32 vertex layout.
pub(crate) fn vec_to_f32(v: &Vec3) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchkit_nurbs::{BezierView, ControlPoint, SurfaceView};

    #[test]
    fn test_sample_count_and_clamp() {
        let kv = KnotVector::clamped_uniform(7, 3).unwrap();
        let axis = SampleAxis::over_knots(&kv, 5 * 4 + 1, 1e-4, 1e-4);
        assert_eq!(axis.len(), 21);
        assert_eq!(axis.params()[0], 0.0);
        assert_eq!(axis.params()[20], 4.0 - 1e-4);
        let (a, b) = axis.difference_pair(20);
        assert!((b - a - 1e-4).abs() < 1e-12);
    }

    #[test]
    fn test_unit_axis() {
        let axis = SampleAxis::unit(10, 1e-3);
        assert_eq!(axis.params()[9], 1.0);
        assert_eq!(axis.difference_pair(0), (0.0, 1e-3));
        assert!((axis.midpoint(0) - 1.0 / 18.0).abs() < 1e-15);
    }

    #[test]
    fn test_flat_patch_normal_is_up() {
        let mut grid = [ControlPoint::new(0.0, 0.0, 0.0); 16];
        for iv in 0..4 {
            for iu in 0..4 {
                grid[iv * 4 + iu] = ControlPoint::new(iu as f64, iv as f64, 2.0);
            }
        }
        let patch = BezierView::new(&grid);
        let axis = SampleAxis::unit(10, 1e-3);
        for &(iu, iv) in &[(0, 0), (4, 5), (9, 9), (9, 0)] {
            let n = estimate_normal(&patch, &axis, &axis, iu, iv);
            assert!((n - Vec3::z()).norm() < 1e-9, "{iu},{iv}: {n}");
        }
    }

    #[test]
    fn test_collapsed_row_uses_fallback() {
        let mut grid = [ControlPoint::new(0.0, 0.0, 0.0); 16];
        for iv in 1..4 {
            for iu in 0..4 {
                grid[iv * 4 + iu] = ControlPoint::new(iu as f64, iv as f64, iv as f64);
            }
        }
        let patch = BezierView::new(&grid);
        let axis = SampleAxis::unit(10, 1e-3);
        let n = estimate_normal(&patch, &axis, &axis, 3, 0);
        assert_eq!(n, fallback_normal());
        assert!(n.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_small_vertical_patch_keeps_normal() {
        let mut grid = [ControlPoint::new(0.0, 0.0, 0.0); 16];
        for iv in 0..4 {
            for iu in 0..4 {
                grid[iv * 4 + iu] = ControlPoint::new(iu as f64 * 3e-4, 0.0, iv as f64 * 3e-4);
            }
        }
        let patch = BezierView::new(&grid);
        let axis = SampleAxis::unit(10, 1e-3);
        for iv in 0..10 {
            for iu in 0..10 {
                let n = estimate_normal(&patch, &axis, &axis, iu, iv);
                assert!((n + Vec3::y()).norm() < 1e-9, "{iu},{iv}: {n}");
            }
        }
    }

    #[test]
    fn test_small_nurbs_surface_keeps_normal() {
        let s = 0.005;
        let points: Vec<ControlPoint> = (0..35)
            .map(|k| ControlPoint::new((k % 7) as f64 * s, 0.0, (k / 7) as f64 * s))
            .collect();
        let ku = KnotVector::clamped_uniform(7, 3).unwrap();
        let kv = KnotVector::clamped_uniform(5, 3).unwrap();
        let surface = SurfaceView::new((3, 3), (7, 5), &points, &ku, &kv);
        let us = SampleAxis::over_knots(&ku, 21, 1e-4, 1e-4);
        let vs = SampleAxis::over_knots(&kv, 11, 1e-4, 1e-4);
        for iv in 0..vs.len() {
            for iu in 0..us.len() {
                let n = estimate_normal(&surface, &us, &vs, iu, iv);
                assert!((n.y.abs() - 1.0).abs() < 1e-9, "{iu},{iv}: {n}");
            }
        }
    }

    #[test]
    fn test_normal_color() {
        assert_eq!(normal_color(&Vec3::z()), [127, 127, 255, 255]);
        assert_eq!(normal_color(&-Vec3::x()), [0, 127, 127, 255]);
    }
}
