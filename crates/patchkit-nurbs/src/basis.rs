//! Basis functions: recursive Cox–de Boor and closed-form cubic Bernstein.

/// `a / b`, or zero when `b` is zero.
///
/// Repeated knots make the Cox–de Boor weights `0/0`; those terms drop out.
#[inline]
fn safe_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

/// Evaluate the B-spline basis function `N_{i,degree}(t)` over `knots`.
///
/// Degree 0 is the indicator of the half-open interval
/// `[knots[i], knots[i+1])`; higher degrees blend two degree-`d-1` terms.
/// Requires `i + degree + 1 < knots.len()`.
pub fn eval_basis(t: f64, i: usize, degree: usize, knots: &[f64]) -> f64 {
    debug_assert!(i + degree + 1 < knots.len(), "basis index out of range");
    if degree == 0 {
        return if knots[i] <= t && t < knots[i + 1] {
            1.0
        } else {
            0.0
        };
    }
    let d = degree;
    let b0 = eval_basis(t, i, d - 1, knots);
    let b1 = eval_basis(t, i + 1, d - 1, knots);
    safe_div(b0 * (t - knots[i]), knots[i + d] - knots[i])
        + safe_div(b1 * (knots[i + d + 1] - t), knots[i + d + 1] - knots[i + 1])
}

/// Fill `out` with `N_{i,degree}(t)` for every control point index `i`.
///
/// `count` is the number of control points in this direction.
pub fn eval_basis_row(t: f64, count: usize, degree: usize, knots: &[f64], out: &mut Vec<f64>) {
    out.clear();
    out.extend((0..count).map(|i| eval_basis(t, i, degree, knots)));
}

/// Cubic Bernstein weights `[(1-t)³, 3t(1-t)², 3t²(1-t), t³]`.
#[inline]
pub fn bernstein3(t: f64) -> [f64; 4] {
    let it = 1.0 - t;
    [it * it * it, 3.0 * t * it * it, 3.0 * t * t * it, t * t * t]
}
