//! B-spline and NURBS curves.

use patchkit_nurbs::{ActiveSpans, ControlPoint, CurveView, KnotVector, Result};
use patchkit_tessellate::SampleAxis;

use crate::config::KernelConfig;

/// A NURBS curve: degree, control polygon and one knot vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    degree: usize,
    points: Vec<ControlPoint>,
    knots: KnotVector,
}

impl Curve {
    /// Validate and build a curve.
    pub fn new(degree: usize, points: Vec<ControlPoint>, knots: Vec<f64>) -> Result<Self> {
        let knots = KnotVector::new(knots, points.len(), degree)?;
        Ok(Self {
            degree,
            points,
            knots,
        })
    }

    /// Curve with a clamped uniform knot vector.
    pub fn clamped(degree: usize, points: Vec<ControlPoint>) -> Result<Self> {
        let knots = KnotVector::clamped_uniform(points.len(), degree)?;
        Ok(Self {
            degree,
            points,
            knots,
        })
    }

    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Control polygon.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [ControlPoint] {
        &mut self.points
    }

    /// Knot vector.
    pub fn knots(&self) -> &KnotVector {
        &self.knots
    }

    /// Evaluator borrowing this curve.
    pub fn view(&self) -> CurveView<'_> {
        CurveView::new(self.degree, &self.points, &self.knots)
    }

    /// Knot intervals under the current selection.
    pub fn active_spans(&self) -> ActiveSpans {
        ActiveSpans::from_selection(
            self.points.iter().map(|p| p.selected),
            self.degree,
            self.knots.interval_count(),
        )
    }

    /// Polyline parameters for the configured density.
    pub fn sample_axis(&self, config: &KernelConfig) -> SampleAxis {
        SampleAxis::over_knots(
            &self.knots,
            config.samples_for(self.points.len(), self.degree),
            config.param_epsilon,
            config.normal_step,
        )
    }
}
