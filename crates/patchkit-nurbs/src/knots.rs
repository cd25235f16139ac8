//! Validated knot vectors and the parameter-domain helpers built on them.

use crate::error::{NurbsError, Result};

/// A non-decreasing knot sequence of length `points + degree + 1`.
///
/// Validated once at construction and immutable afterwards; evaluation
/// never re-checks it.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotVector {
    knots: Vec<f64>,
}

impl KnotVector {
    /// Validate `knots` for a direction with `points` control points of
    /// polynomial `degree`.
    pub fn new(knots: Vec<f64>, points: usize, degree: usize) -> Result<Self> {
        if points < degree + 1 {
            return Err(NurbsError::TooFewPoints { points, degree });
        }
        let expected = points + degree + 1;
        if knots.len() != expected {
            return Err(NurbsError::KnotCount {
                expected,
                actual: knots.len(),
                points,
                degree,
            });
        }
        for (index, &k) in knots.iter().enumerate() {
            if !k.is_finite() {
                return Err(NurbsError::NonFiniteKnot { index });
            }
        }
        for index in 1..knots.len() {
            if knots[index] < knots[index - 1] {
                return Err(NurbsError::NonMonotonic {
                    index,
                    previous: knots[index - 1],
                    value: knots[index],
                });
            }
        }
        let first = knots[0];
        if knots[knots.len() - 1] == first {
            return Err(NurbsError::EmptyDomain(first));
        }
        Ok(Self { knots })
    }

    /// Clamped knot vector with integer interior knots.
    ///
    /// `degree + 1` zeros, then `1, 2, ...`, then `degree + 1` copies of
    /// `points - degree`. With 4 points and degree 3 this is the Bezier
    /// vector `[0,0,0,0,1,1,1,1]`.
    pub fn clamped_uniform(points: usize, degree: usize) -> Result<Self> {
        if points < degree + 1 {
            return Err(NurbsError::TooFewPoints { points, degree });
        }
        let spans = points - degree;
        let mut knots = Vec::with_capacity(points + degree + 1);
        knots.extend(std::iter::repeat(0.0).take(degree + 1));
        knots.extend((1..spans).map(|k| k as f64));
        knots.extend(std::iter::repeat(spans as f64).take(degree + 1));
        Self::new(knots, points, degree)
    }

    /// Raw knot values.
    pub fn as_slice(&self) -> &[f64] {
        &self.knots
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    /// Always false; a validated vector has at least two knots.
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Number of knot intervals `[k_i, k_{i+1})`, including empty ones.
    pub fn interval_count(&self) -> usize {
        self.knots.len() - 1
    }

    /// Parameter domain `(knots[0], knots[last])`.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    /// Length of the shortest non-empty knot interval.
    pub fn shortest_span(&self) -> f64 {
        self.knots
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|&d| d > 0.0)
            .fold(f64::INFINITY, f64::min)
    }

    /// The clamping epsilon for this vector: `base`, reduced to half the
    /// shortest non-empty interval when that is smaller.
    pub fn domain_epsilon(&self, base: f64) -> f64 {
        base.min(0.5 * self.shortest_span())
    }

    /// Clamp `t` to `[min, max - eps]`.
    pub fn clamp_param(&self, t: f64, eps: f64) -> f64 {
        let (min, max) = self.domain();
        t.max(min).min(max - eps)
    }

    /// Sample `i` of `n` evenly spaced over the domain, then clamped.
    pub fn sample_param(&self, i: usize, n: usize, eps: f64) -> f64 {
        let (min, max) = self.domain();
        let t = if n > 1 {
            min + (max - min) * i as f64 / (n - 1) as f64
        } else {
            min
        };
        self.clamp_param(t, eps)
    }

    /// Distinct knot values in order (clamped duplicates collapsed).
    pub fn unique_values(&self) -> Vec<f64> {
        let mut out: Vec<f64> = Vec::with_capacity(self.knots.len());
        for &k in &self.knots {
            if out.last() != Some(&k) {
                out.push(k);
            }
        }
        out
    }

    /// Index of the non-empty interval `[k_i, k_{i+1})` containing `t`.
    ///
    /// Parameters at or beyond the domain end map to the last non-empty
    /// interval, parameters before the start to the first.
    pub fn interval_at(&self, t: f64) -> usize {
        let last = self.last_nonempty();
        if t >= self.knots[last + 1] {
            return last;
        }
        let first = self.first_nonempty();
        if t <= self.knots[first] {
            return first;
        }
        // Largest i with knots[i] <= t, so knots[i+1] > t and the interval is non-empty.
        let i = self.knots.partition_point(|&k| k <= t) - 1;
        i.min(last)
    }

    /// Non-empty intervals whose closed range `[k_i, k_{i+1}]` contains `t`.
    ///
    /// An interior knot touches the interval on each side of it.
    pub fn intervals_touching(&self, t: f64) -> impl Iterator<Item = usize> + '_ {
        self.knots
            .windows(2)
            .enumerate()
            .filter(move |(_, w)| w[0] < w[1] && w[0] <= t && t <= w[1])
            .map(|(i, _)| i)
    }

    fn first_nonempty(&self) -> usize {
        self.knots
            .windows(2)
            .position(|w| w[0] < w[1])
            .unwrap_or(0)
    }

    fn last_nonempty(&self) -> usize {
        self.knots
            .windows(2)
            .rposition(|w| w[0] < w[1])
            .unwrap_or(0)
    }
}
