//! Construction errors for knot vectors and control grids.

use thiserror::Error;

/// Errors raised when building evaluable geometry from caller data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NurbsError {
    /// Knot count does not equal `control_points + degree + 1`.
    #[error("knot vector has {actual} values, expected {expected} ({points} points, degree {degree})")]
    KnotCount {
        /// Expected knot count.
        expected: usize,
        /// Actual knot count.
        actual: usize,
        /// Control point count in this direction.
        points: usize,
        /// Polynomial degree in this direction.
        degree: usize,
    },

    /// A knot value is smaller than its predecessor.
    #[error("knot vector decreases at index {index} ({previous} > {value})")]
    NonMonotonic {
        /// Index of the offending knot.
        index: usize,
        /// Value before it.
        previous: f64,
        /// Offending value.
        value: f64,
    },

    /// A knot value is NaN or infinite.
    #[error("knot {index} is not finite")]
    NonFiniteKnot {
        /// Index of the offending knot.
        index: usize,
    },

    /// The knot vector spans an empty parameter domain.
    #[error("knot vector has an empty domain [{0}, {0}]")]
    EmptyDomain(f64),

    /// Not enough control points for the requested degree.
    #[error("{points} control points cannot carry degree {degree}")]
    TooFewPoints {
        /// Control point count.
        points: usize,
        /// Requested degree.
        degree: usize,
    },

    /// Control grid size does not equal `num_u * num_v`.
    #[error("control grid has {actual} points, expected {num_u} x {num_v}")]
    GridSize {
        /// Points along u.
        num_u: usize,
        /// Points along v.
        num_v: usize,
        /// Actual point count.
        actual: usize,
    },
}

/// Result type for curve and surface construction.
pub type Result<T> = std::result::Result<T, NurbsError>;
