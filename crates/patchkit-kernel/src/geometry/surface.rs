//! Tensor-product NURBS surfaces.

use patchkit_nurbs::{check_grid, ActiveSpans2d, ControlPoint, KnotVector, Result, SurfaceView};
use patchkit_tessellate::SampleAxis;

use crate::config::KernelConfig;

/// A NURBS surface over a row-major `num_u x num_v` control grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    degree_u: usize,
    degree_v: usize,
    num_u: usize,
    num_v: usize,
    points: Vec<ControlPoint>,
    knots_u: KnotVector,
    knots_v: KnotVector,
}

impl Surface {
    /// Validate and build a surface. `points[iv * num_u + iu]` is the
    /// control point in column `iu` of row `iv`.
    pub fn new(
        (degree_u, degree_v): (usize, usize),
        (num_u, num_v): (usize, usize),
        points: Vec<ControlPoint>,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
    ) -> Result<Self> {
        check_grid(num_u, num_v, points.len())?;
        Ok(Self {
            degree_u,
            degree_v,
            num_u,
            num_v,
            points,
            knots_u: KnotVector::new(knots_u, num_u, degree_u)?,
            knots_v: KnotVector::new(knots_v, num_v, degree_v)?,
        })
    }

    /// Surface with clamped uniform knot vectors in both directions.
    pub fn clamped(
        (degree_u, degree_v): (usize, usize),
        (num_u, num_v): (usize, usize),
        points: Vec<ControlPoint>,
    ) -> Result<Self> {
        check_grid(num_u, num_v, points.len())?;
        Ok(Self {
            degree_u,
            degree_v,
            num_u,
            num_v,
            points,
            knots_u: KnotVector::clamped_uniform(num_u, degree_u)?,
            knots_v: KnotVector::clamped_uniform(num_v, degree_v)?,
        })
    }

    /// Degrees `(u, v)`.
    pub fn degrees(&self) -> (usize, usize) {
        (self.degree_u, self.degree_v)
    }

    /// Grid size `(num_u, num_v)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.num_u, self.num_v)
    }

    /// Control grid.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [ControlPoint] {
        &mut self.points
    }

    /// U knot vector.
    pub fn knots_u(&self) -> &KnotVector {
        &self.knots_u
    }

    /// V knot vector.
    pub fn knots_v(&self) -> &KnotVector {
        &self.knots_v
    }

    /// Evaluator borrowing this surface.
    pub fn view(&self) -> SurfaceView<'_> {
        SurfaceView::new(
            (self.degree_u, self.degree_v),
            (self.num_u, self.num_v),
            &self.points,
            &self.knots_u,
            &self.knots_v,
        )
    }

    /// Knot-interval cells under the current selection.
    pub fn active_spans(&self) -> ActiveSpans2d {
        ActiveSpans2d::from_grid_selection(
            self.points.iter().map(|p| p.selected),
            self.num_u,
            self.degree_u,
            self.degree_v,
            self.knots_u.interval_count(),
            self.knots_v.interval_count(),
        )
    }

    /// Sample axes `(u, v)` for the configured density.
    pub fn sample_axes(&self, config: &KernelConfig) -> (SampleAxis, SampleAxis) {
        let axis = |knots: &KnotVector, points, degree| {
            SampleAxis::over_knots(
                knots,
                config.samples_for(points, degree),
                config.param_epsilon,
                config.normal_step,
            )
        };
        (
            axis(&self.knots_u, self.num_u, self.degree_u),
            axis(&self.knots_v, self.num_v, self.degree_v),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchkit_nurbs::NurbsError;

    fn grid(num_u: usize, num_v: usize) -> Vec<ControlPoint> {
        (0..num_u * num_v)
            .map(|k| ControlPoint::new((k % num_u) as f64, (k / num_u) as f64, 0.0))
            .collect()
    }

    #[test]
    fn test_grid_size_checked() {
        let err = Surface::clamped((3, 3), (4, 4), grid(4, 3)).unwrap_err();
        assert!(matches!(err, NurbsError::GridSize { num_u: 4, num_v: 4, actual: 12 }));
    }

    #[test]
    fn test_bad_v_knots() {
        let err = Surface::new(
            (1, 1),
            (2, 2),
            grid(2, 2),
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 1.0, 0.5, 1.0],
        )
        .unwrap_err();
        assert!(matches!(err, NurbsError::NonMonotonic { index: 2, .. }));
    }

    #[test]
    fn test_axes_follow_each_direction() {
        let surface = Surface::clamped((3, 2), (7, 5), grid(7, 5)).unwrap();
        let (us, vs) = surface.sample_axes(&KernelConfig::default());
        assert_eq!(us.len(), 5 * 4 + 1);
        assert_eq!(vs.len(), 5 * 3 + 1);
    }

    #[test]
    fn test_corner_selection_window() {
        let mut surface = Surface::clamped((1, 1), (3, 3), grid(3, 3)).unwrap();
        surface.points_mut()[4].selected = true;
        let spans = surface.active_spans();
        // Centre CV (1, 1) activates cells (1..=2) x (1..=2).
        assert!(spans.is_active(1, 1));
        assert!(spans.is_active(2, 2));
        assert!(!spans.is_active(0, 0));
        assert!(!spans.is_active(1, 3));
    }
}
