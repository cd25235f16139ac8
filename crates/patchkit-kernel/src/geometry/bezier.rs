//! Bicubic Bezier patches.

use patchkit_math::Point3;
use patchkit_nurbs::{BezierView, ControlPoint};

/// Control points along each direction of a patch.
pub const BEZIER_ORDER: usize = 4;

/// A bicubic Bezier patch: a row-major 4x4 control net (`iv * 4 + iu`) with
/// the implicit cubic Bernstein basis.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierPatch {
    points: [ControlPoint; 16],
}

impl BezierPatch {
    /// Patch over the given net.
    pub fn new(points: [ControlPoint; 16]) -> Self {
        Self { points }
    }

    /// Patch from 16 cartesian positions, weight 1.
    pub fn from_positions(positions: [Point3; 16]) -> Self {
        Self {
            points: positions.map(|p| ControlPoint::from_cartesian(p, 1.0)),
        }
    }

    /// Flat square patch `[0, size]^2` at height `z`.
    pub fn flat(size: f64, z: f64) -> Self {
        let mut points = [ControlPoint::new(0.0, 0.0, z); 16];
        for iv in 0..BEZIER_ORDER {
            for iu in 0..BEZIER_ORDER {
                points[iv * BEZIER_ORDER + iu] =
                    ControlPoint::new(size * iu as f64 / 3.0, size * iv as f64 / 3.0, z);
            }
        }
        Self { points }
    }

    /// Control net.
    pub fn points(&self) -> &[ControlPoint; 16] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [ControlPoint; 16] {
        &mut self.points
    }

    /// Evaluator borrowing the net.
    pub fn view(&self) -> BezierView<'_> {
        BezierView::new(&self.points)
    }

    /// Reverse the U direction of every row.
    pub fn flip_u(&mut self) {
        for row in self.points.chunks_exact_mut(BEZIER_ORDER) {
            row.reverse();
        }
    }

    /// Mirror across the YZ plane. U is flipped so the surface keeps facing
    /// the same way relative to its new position.
    pub fn mirror_x(&mut self) {
        for cv in &mut self.points {
            cv.position.x = -cv.position.x;
        }
        self.flip_u();
    }

    /// Mirror across the XZ plane, flipping U.
    pub fn mirror_y(&mut self) {
        for cv in &mut self.points {
            cv.position.y = -cv.position.y;
        }
        self.flip_u();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchkit_nurbs::ParametricSurface;

    #[test]
    fn test_flat_patch_corners() {
        let patch = BezierPatch::flat(2.0, 1.5);
        let view = patch.view();
        let p = view.eval(1.0, 1.0);
        assert!((p.x - 2.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
        assert!((p.z - 1.5).abs() < 1e-12);
        let mid = view.eval(0.5, 0.5);
        assert!((mid.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_positions_has_unit_weights() {
        let mut positions = [Point3::origin(); 16];
        for (k, p) in positions.iter_mut().enumerate() {
            let (iu, iv) = (k % 4, k / 4);
            let inner = (1..3).contains(&iu) && (1..3).contains(&iv);
            *p = Point3::new(iu as f64, iv as f64, if inner { 1.0 } else { 0.0 });
        }
        let patch = BezierPatch::from_positions(positions);
        assert!(patch.points().iter().all(|cv| cv.weight() == 1.0));
        assert_eq!(patch.points()[5].cartesian(), Point3::new(1.0, 1.0, 1.0));
        // Bernstein weights of the inner 2x2 at the center: (3/8 + 3/8)^2.
        assert!((patch.view().eval(0.5, 0.5).z - 0.5625).abs() < 1e-12);
    }

    #[test]
    fn test_flip_u_reverses_rows() {
        let mut patch = BezierPatch::flat(3.0, 0.0);
        patch.flip_u();
        assert_eq!(patch.points()[0].cartesian(), Point3::new(3.0, 0.0, 0.0));
        assert_eq!(patch.points()[7].cartesian(), Point3::new(0.0, 1.0, 0.0));
        patch.flip_u();
        assert_eq!(patch, BezierPatch::flat(3.0, 0.0));
    }

    #[test]
    fn test_mirror_x_keeps_row_order_in_space() {
        let mut patch = BezierPatch::flat(3.0, 0.0);
        patch.mirror_x();
        // After mirroring x, the first point of a row is the one nearest the
        // old far edge: x = -3.
        assert_eq!(patch.points()[0].cartesian(), Point3::new(-3.0, 0.0, 0.0));
        assert_eq!(patch.points()[3].cartesian(), Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_mirror_y_keeps_weights() {
        let mut points = *BezierPatch::flat(1.0, 0.0).points();
        points[5] = ControlPoint::from_cartesian(Point3::new(0.3, 0.4, 1.0), 2.0);
        let mut patch = BezierPatch::new(points);
        patch.mirror_y();
        let moved = patch.points()[6];
        assert_eq!(moved.weight(), 2.0);
        assert!((moved.cartesian().y + 0.4).abs() < 1e-12);
    }
}
