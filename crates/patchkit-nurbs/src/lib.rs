#![warn(missing_docs)]

//! Bezier, B-spline and NURBS evaluation for the patchkit kernel.
//!
//! Provides the recursive Cox–de Boor basis, validated knot vectors,
//! active-span tracking for selection highlights, and point evaluators for
//! curves, tensor-product surfaces and bicubic Bezier patches.
//!
//! Evaluators borrow their control points and knots from the owning
//! geometry; nothing here allocates per call except the surface basis rows.

mod basis;
mod error;
mod eval;
mod knots;
mod spans;

pub use basis::{bernstein3, eval_basis, eval_basis_row};
pub use error::{NurbsError, Result};
pub use eval::{
    BezierView, ControlPoint, CurveView, ParametricCurve, ParametricSurface, SurfaceView,
};
pub use knots::KnotVector;
pub use spans::{ActiveSpans, ActiveSpans2d};

/// Check that a row-major grid holds exactly `num_u * num_v` points.
pub fn check_grid(num_u: usize, num_v: usize, actual: usize) -> Result<()> {
    if num_u.checked_mul(num_v) != Some(actual) {
        return Err(NurbsError::GridSize {
            num_u,
            num_v,
            actual,
        });
    }
    Ok(())
}
