//! Sutherland-Hodgman clipping of small polygons against frustum planes.

use patchkit_math::{Plane, Point3};

use crate::frustum::Frustum;

/// Clip the closed polygon `input` against one plane, appending the part in
/// the inside half-space to `out`.
///
/// Crossing edges emit the interpolated crossing point; an edge whose end
/// is inside emits that end. A two-point input is treated as a segment
/// (both of its "edges" run along it).
pub fn clip_polygon(input: &[Point3], plane: &Plane, out: &mut Vec<Point3>) {
    let n = input.len();
    for i in 0..n {
        let a = &input[i];
        let b = &input[(i + 1) % n];
        let da = plane.signed_distance(a);
        let db = plane.signed_distance(b);
        if da * db < 0.0 {
            let t = da / (da - db);
            out.push(a + (b - a) * t);
        }
        if db >= 0.0 {
            out.push(*b);
        }
    }
}

/// Reusable scratch space for clipping many primitives against one frustum.
#[derive(Debug, Default)]
pub struct Clipper {
    front: Vec<Point3>,
    back: Vec<Point3>,
}

impl Clipper {
    /// Empty clipper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any part of the polygon (or segment) survives all six planes.
    pub fn intersects(&mut self, polygon: &[Point3], frustum: &Frustum) -> bool {
        self.front.clear();
        self.front.extend_from_slice(polygon);
        for plane in &frustum.planes {
            self.back.clear();
            clip_polygon(&self.front, plane, &mut self.back);
            if self.back.is_empty() {
                return false;
            }
            std::mem::swap(&mut self.front, &mut self.back);
        }
        true
    }

    /// Points left after the last successful [`intersects`](Self::intersects).
    pub fn result(&self) -> &[Point3] {
        &self.front
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> [Point3; 3] {
        [
            Point3::new(a.0, a.1, 0.0),
            Point3::new(b.0, b.1, 0.0),
            Point3::new(c.0, c.1, 0.0),
        ]
    }

    fn unit_box() -> Frustum {
        Frustum::from_box(&Point3::new(0.0, 0.0, -1.0), &Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_single_plane_cuts_corner() {
        // Keep x >= 0.5.
        let plane = Plane::new(1.0, 0.0, 0.0, -0.5);
        let t = tri((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        let mut out = Vec::new();
        clip_polygon(&t, &plane, &mut out);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|p| p.x >= 0.5 - 1e-12));
        assert!(out.iter().any(|p| (p.x - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_all_outside_is_empty() {
        let plane = Plane::new(1.0, 0.0, 0.0, -5.0);
        let t = tri((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        let mut out = Vec::new();
        clip_polygon(&t, &plane, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_triangle_spanning_box() {
        // No vertex inside, but the triangle covers the box.
        let t = tri((-5.0, -5.0), (10.0, -5.0), (-5.0, 10.0));
        let mut clipper = Clipper::new();
        assert!(clipper.intersects(&t, &unit_box()));
        assert!(clipper.result().len() >= 4);
        for p in clipper.result() {
            assert!(p.x > -1e-9 && p.x < 1.0 + 1e-9);
            assert!(p.y > -1e-9 && p.y < 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_triangle_beside_box() {
        let t = tri((2.0, 0.0), (3.0, 0.0), (2.0, 1.0));
        assert!(!Clipper::new().intersects(&t, &unit_box()));
    }

    #[test]
    fn test_segment_crossing_box() {
        let seg = [Point3::new(-1.0, 0.5, 0.0), Point3::new(2.0, 0.5, 0.0)];
        let mut clipper = Clipper::new();
        assert!(clipper.intersects(&seg, &unit_box()));
        let seg = [Point3::new(-1.0, 2.0, 0.0), Point3::new(2.0, 2.0, 0.0)];
        assert!(!clipper.intersects(&seg, &unit_box()));
    }
}
