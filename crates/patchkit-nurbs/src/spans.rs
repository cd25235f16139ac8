//! Knot intervals influenced by selected control points.
//!
//! Control point `i` of a degree-`d` direction only affects the intervals
//! `i..=i+d`, so those are the spans a wireframe highlights when it is
//! selected. Recomputed from the selection flags on every update pass.

/// Active knot intervals along one direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSpans {
    flags: Vec<bool>,
}

impl ActiveSpans {
    /// All intervals inactive.
    pub fn new(interval_count: usize) -> Self {
        Self {
            flags: vec![false; interval_count],
        }
    }

    /// Mark `degree + 1` intervals starting at each selected control point.
    pub fn from_selection<I>(selected: I, degree: usize, interval_count: usize) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut spans = Self::new(interval_count);
        for (i, sel) in selected.into_iter().enumerate() {
            if sel {
                spans.mark(i, degree);
            }
        }
        spans
    }

    fn mark(&mut self, start: usize, degree: usize) {
        let end = (start + degree + 1).min(self.flags.len());
        for flag in &mut self.flags[start.min(end)..end] {
            *flag = true;
        }
    }

    /// Whether interval `i` is active. Out-of-range intervals are not.
    pub fn is_active(&self, i: usize) -> bool {
        self.flags.get(i).copied().unwrap_or(false)
    }

    /// Whether any interval is active.
    pub fn any(&self) -> bool {
        self.flags.iter().any(|&f| f)
    }

    /// Deactivate every interval.
    pub fn clear(&mut self) {
        self.flags.fill(false);
    }

    /// Number of intervals tracked.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// True when no intervals are tracked.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Active knot-interval cells of a tensor-product surface.
///
/// Cell `(iv, iu)` is the product of V interval `iv` and U interval `iu`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSpans2d {
    intervals_u: usize,
    intervals_v: usize,
    flags: Vec<bool>,
}

impl ActiveSpans2d {
    /// All cells inactive.
    pub fn new(intervals_u: usize, intervals_v: usize) -> Self {
        Self {
            intervals_u,
            intervals_v,
            flags: vec![false; intervals_u * intervals_v],
        }
    }

    /// Mark the `(degree_v + 1) x (degree_u + 1)` window of cells starting
    /// at every selected control point of a row-major `num_u`-wide grid.
    pub fn from_grid_selection<I>(
        selected: I,
        num_u: usize,
        degree_u: usize,
        degree_v: usize,
        intervals_u: usize,
        intervals_v: usize,
    ) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut spans = Self::new(intervals_u, intervals_v);
        if num_u == 0 {
            return spans;
        }
        for (k, sel) in selected.into_iter().enumerate() {
            if !sel {
                continue;
            }
            let (iv, iu) = (k / num_u, k % num_u);
            for i in iv..(iv + degree_v + 1).min(intervals_v) {
                for j in iu..(iu + degree_u + 1).min(intervals_u) {
                    spans.flags[i * intervals_u + j] = true;
                }
            }
        }
        spans
    }

    /// Whether cell `(iv, iu)` is active. Out-of-range cells are not.
    pub fn is_active(&self, iv: usize, iu: usize) -> bool {
        if iv >= self.intervals_v || iu >= self.intervals_u {
            return false;
        }
        self.flags[iv * self.intervals_u + iu]
    }

    /// Whether any cell is active.
    pub fn any(&self) -> bool {
        self.flags.iter().any(|&f| f)
    }

    /// Deactivate every cell.
    pub fn clear(&mut self) {
        self.flags.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_cv_marks_degree_plus_one() {
        // 6 points, degree 3: 10 knots, 9 intervals.
        let mut sel = [false; 6];
        sel[2] = true;
        let spans = ActiveSpans::from_selection(sel, 3, 9);
        let active: Vec<usize> = (0..9).filter(|&i| spans.is_active(i)).collect();
        assert_eq!(active, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_last_cv_stays_in_range() {
        let mut sel = [false; 6];
        sel[5] = true;
        let spans = ActiveSpans::from_selection(sel, 3, 9);
        assert!(spans.is_active(8));
        assert!(!spans.is_active(9));
    }

    #[test]
    fn test_clear_deactivates_all() {
        let mut spans = ActiveSpans::from_selection([true, false, true], 2, 5);
        assert!(spans.any());
        spans.clear();
        assert!(!spans.any());
        assert_eq!(spans.len(), 5);
    }

    #[test]
    fn test_no_selection_no_spans() {
        let spans = ActiveSpans::from_selection([false; 4], 1, 5);
        assert!(!spans.any());
    }

    #[test]
    fn test_grid_window() {
        // 4x3 grid, degree 1x1: 5 u intervals, 4 v intervals.
        let mut sel = [false; 12];
        sel[4 + 1] = true; // iv = 1, iu = 1
        let spans = ActiveSpans2d::from_grid_selection(sel, 4, 1, 1, 5, 4);
        let mut active = Vec::new();
        for iv in 0..4 {
            for iu in 0..5 {
                if spans.is_active(iv, iu) {
                    active.push((iv, iu));
                }
            }
        }
        assert_eq!(active, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
        assert!(!spans.is_active(7, 0));
    }
}
