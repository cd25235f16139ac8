//! Instanced control-point and knot markers.
//!
//! One instance per control point, drawn as a screen-aligned icon from an
//! atlas. Curves append a dot at each distinct interior knot.

use bytemuck::{Pod, Zeroable};
use patchkit_math::Point3;
use patchkit_nurbs::{ActiveSpans, ControlPoint, KnotVector, ParametricCurve};

use crate::buffer::GrowBuffer;

/// Per-instance marker data as uploaded to the GPU.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MarkerInstance {
    /// Position in `xyz`; `w` is 1 when selected or active.
    pub pos_sel: [f32; 4],
    /// Top-left corner of the icon in the atlas.
    pub icon_uv: [f32; 2],
}

/// Atlas icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIcon {
    /// First control point.
    Origin,
    /// Second control point, showing the U direction.
    UDirection,
    /// First point of the second row, showing the V direction.
    VDirection,
    /// Any other control point.
    Cross,
    /// Knot position or polygon vertex.
    Dot,
}

impl MarkerIcon {
    /// Atlas coordinates.
    pub fn uv(self) -> [f32; 2] {
        match self {
            MarkerIcon::Origin => [0.5, 0.0],
            MarkerIcon::UDirection => [0.0, 0.25],
            MarkerIcon::VDirection => [0.25, 0.25],
            MarkerIcon::Cross => [0.25, 0.0],
            MarkerIcon::Dot => [0.0, 0.0],
        }
    }

    /// Icon for control point `index` of a net with rows of `row_len`.
    pub fn for_control_point(index: usize, row_len: Option<usize>) -> Self {
        match index {
            0 => MarkerIcon::Origin,
            1 => MarkerIcon::UDirection,
            i if Some(i) == row_len => MarkerIcon::VDirection,
            _ => MarkerIcon::Cross,
        }
    }
}

/// A knot marker: its curve position and whether the span it starts is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnotMarker {
    /// Point on the curve at the knot value.
    pub position: Point3,
    /// Whether the interval starting at this knot is active.
    pub active: bool,
}

/// Markers at each distinct interior knot of a curve.
pub fn curve_knot_markers<C: ParametricCurve>(
    curve: &C,
    knots: &KnotVector,
    spans: &ActiveSpans,
) -> Vec<KnotMarker> {
    let (min, max) = knots.domain();
    knots
        .unique_values()
        .into_iter()
        .filter(|&k| k != min && k != max)
        .map(|k| KnotMarker {
            position: curve.eval(k),
            active: spans.is_active(knots.interval_at(k)),
        })
        .collect()
}

/// Instance buffer for one entity's markers.
#[derive(Debug, Clone, Default)]
pub struct MarkerBuffer {
    instances: GrowBuffer<MarkerInstance>,
    version: u64,
}

impl MarkerBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current instances.
    pub fn instances(&self) -> &[MarkerInstance] {
        self.instances.as_slice()
    }

    /// Instance bytes for upload.
    pub fn bytes(&self) -> &[u8] {
        self.instances.bytes()
    }

    /// Bumped on every write.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Rewrite every instance: control points first, then knot markers.
    ///
    /// `row_len` is the grid row length (for the V-direction icon), `None`
    /// for curves. `uniform` overrides the icon for every control point.
    pub fn write(
        &mut self,
        points: &[ControlPoint],
        row_len: Option<usize>,
        uniform: Option<MarkerIcon>,
        knots: &[KnotMarker],
    ) {
        self.instances.resize(points.len() + knots.len());
        let out = self.instances.as_mut_slice();
        for (i, cv) in points.iter().enumerate() {
            let p = cv.cartesian();
            let icon = uniform.unwrap_or_else(|| MarkerIcon::for_control_point(i, row_len));
            out[i] = MarkerInstance {
                pos_sel: [p.x as f32, p.y as f32, p.z as f32, flag(cv.selected)],
                icon_uv: icon.uv(),
            };
        }
        for (slot, k) in out[points.len()..].iter_mut().zip(knots) {
            *slot = MarkerInstance {
                pos_sel: [
                    k.position.x as f32,
                    k.position.y as f32,
                    k.position.z as f32,
                    flag(k.active),
                ],
                icon_uv: MarkerIcon::Dot.uv(),
            };
        }
        self.version += 1;
    }

    /// Rewrite only the selected/active flags.
    ///
    /// Knot flags follow the control-point flags in instance order.
    pub fn write_flags<I>(&mut self, points: &[ControlPoint], knot_flags: I)
    where
        I: IntoIterator<Item = bool>,
    {
        let out = self.instances.as_mut_slice();
        let flags = points.iter().map(|cv| cv.selected).chain(knot_flags);
        for (inst, sel) in out.iter_mut().zip(flags) {
            inst.pos_sel[3] = flag(sel);
        }
        self.version += 1;
    }
}

fn flag(on: bool) -> f32 {
    if on {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchkit_nurbs::CurveView;

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<MarkerInstance>(), 24);
    }

    #[test]
    fn test_grid_icons() {
        let points: Vec<ControlPoint> = (0..16).map(|k| ControlPoint::new(k as f64, 0.0, 0.0)).collect();
        let mut buf = MarkerBuffer::new();
        buf.write(&points, Some(4), None, &[]);
        let uv: Vec<[f32; 2]> = buf.instances().iter().map(|m| m.icon_uv).collect();
        assert_eq!(uv[0], [0.5, 0.0]);
        assert_eq!(uv[1], [0.0, 0.25]);
        assert_eq!(uv[4], [0.25, 0.25]);
        assert_eq!(uv[5], [0.25, 0.0]);
        assert_eq!(buf.bytes().len(), 16 * 24);
    }

    #[test]
    fn test_curve_knot_dots_follow_spans() {
        let mut points: Vec<ControlPoint> = (0..6).map(|k| ControlPoint::new(k as f64, 0.0, 0.0)).collect();
        points[5].selected = true;
        let knots = KnotVector::clamped_uniform(6, 3).unwrap();
        let curve = CurveView::new(3, &points, &knots);
        // CV 5 activates intervals 5..=8; interval 5 is [2, 3).
        let spans = ActiveSpans::from_selection(points.iter().map(|p| p.selected), 3, 9);
        let dots = curve_knot_markers(&curve, &knots, &spans);
        assert_eq!(dots.len(), 2);
        assert!(!dots[0].active);
        assert!(dots[1].active);

        let mut buf = MarkerBuffer::new();
        buf.write(&points, None, None, &dots);
        assert_eq!(buf.instances().len(), 8);
        assert_eq!(buf.instances()[5].pos_sel[3], 1.0);
        assert_eq!(buf.instances()[7].icon_uv, [0.0, 0.0]);
        assert_eq!(buf.instances()[7].pos_sel[3], 1.0);

        points[5].selected = false;
        let v = buf.version();
        buf.write_flags(&points, [false, false]);
        assert_eq!(buf.version(), v + 1);
        assert!(buf.instances().iter().all(|m| m.pos_sel[3] == 0.0));
    }
}
