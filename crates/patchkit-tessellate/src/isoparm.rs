//! Isoparametric curve networks for surface wireframes.
//!
//! One isocurve per distinct knot value in each direction. The vertex
//! buffer holds the `Iv` curves of constant `v` (each swept over the `Nu`
//! U samples) followed by the `Iu` curves of constant `u` (`Nv` samples
//! each).

use log::debug;
use patchkit_nurbs::{ActiveSpans2d, KnotVector, ParametricSurface};

use crate::buffer::{write_partitioned, Highlight, MeshBuffer, Primitive, Vertex};
use crate::error::Result;
use crate::sample::SampleAxis;

/// Where the isocurves of a surface sit and how densely they are sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoparmLayout {
    iso_u: Vec<f64>,
    iso_v: Vec<f64>,
    us: SampleAxis,
    vs: SampleAxis,
}

impl IsoparmLayout {
    /// Isocurves at the distinct values of both knot vectors, swept over
    /// the given sample axes.
    pub fn new(knots_u: &KnotVector, knots_v: &KnotVector, us: SampleAxis, vs: SampleAxis) -> Self {
        Self {
            iso_u: knots_u.unique_values(),
            iso_v: knots_v.unique_values(),
            us,
            vs,
        }
    }

    /// Total vertex count, `Iv * Nu + Iu * Nv`.
    pub fn vertex_count(&self) -> usize {
        self.iso_v.len() * self.us.len() + self.iso_u.len() * self.vs.len()
    }

    /// Total segment count.
    pub fn segment_count(&self) -> usize {
        self.iso_v.len() * self.us.len().saturating_sub(1)
            + self.iso_u.len() * self.vs.len().saturating_sub(1)
    }

    /// Distinct U knot values.
    pub fn iso_u(&self) -> &[f64] {
        &self.iso_u
    }

    /// Distinct V knot values.
    pub fn iso_v(&self) -> &[f64] {
        &self.iso_v
    }

    fn u_curves_base(&self) -> usize {
        self.iso_v.len() * self.us.len()
    }
}

/// Evaluate every isocurve sample.
pub fn write_isoparm_vertices<S: ParametricSurface>(
    mesh: &mut MeshBuffer,
    surface: &S,
    layout: &IsoparmLayout,
) -> Result<()> {
    let nu = layout.us.len();
    let nv = layout.vs.len();
    let base = layout.u_curves_base();
    mesh.write_vertices(layout.vertex_count(), |out| {
        for (k, &v) in layout.iso_v.iter().enumerate() {
            let v = layout.vs.clamp(v);
            for (iu, &u) in layout.us.params().iter().enumerate() {
                out[k * nu + iu] = Vertex::line_point(&surface.eval(u, v));
            }
        }
        for (k, &u) in layout.iso_u.iter().enumerate() {
            let u = layout.us.clamp(u);
            for (iv, &v) in layout.vs.params().iter().enumerate() {
                out[base + k * nv + iv] = Vertex::line_point(&surface.eval(u, v));
            }
        }
    })
}

/// Partition isocurve segments.
///
/// A segment is highlighted when an active cell lies at (a knot interval
/// touching the curve's fixed parameter) x (the interval containing the
/// segment's midpoint along the sweep).
pub fn partition_isoparms(
    mesh: &mut MeshBuffer,
    layout: &IsoparmLayout,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    spans: &ActiveSpans2d,
    highlight: Highlight,
) -> Result<()> {
    let nu = layout.us.len();
    let nv = layout.vs.len();
    let base = layout.u_curves_base();

    let v_curves = layout.iso_v.iter().enumerate().flat_map(move |(k, &v)| {
        let touching: Vec<usize> = knots_v.intervals_touching(v).collect();
        (0..nu.saturating_sub(1)).map(move |i| {
            let iu = knots_u.interval_at(layout.us.midpoint(i));
            let active = touching.iter().any(|&iv| spans.is_active(iv, iu));
            (k * nu + i, k * nu + i + 1, active)
        })
    });
    let u_curves = layout.iso_u.iter().enumerate().flat_map(move |(k, &u)| {
        let touching: Vec<usize> = knots_u.intervals_touching(u).collect();
        (0..nv.saturating_sub(1)).map(move |i| {
            let iv = knots_v.interval_at(layout.vs.midpoint(i));
            let active = touching.iter().any(|&iu| spans.is_active(iv, iu));
            (base + k * nv + i, base + k * nv + i + 1, active)
        })
    });

    write_partitioned(mesh, layout.segment_count(), v_curves.chain(u_curves), highlight)
}

/// Bring the isoparm network in `slot` up to date.
///
/// An absent buffer is built in full. Otherwise vertices are rewritten when
/// `positions` is set and the partition when `selection` is set.
#[allow(clippy::too_many_arguments)]
pub fn update_isoparms<S: ParametricSurface>(
    slot: &mut Option<MeshBuffer>,
    surface: &S,
    layout: &IsoparmLayout,
    knots: (&KnotVector, &KnotVector),
    spans: &ActiveSpans2d,
    positions: bool,
    selection: bool,
    highlight: Highlight,
) -> Result<()> {
    let (knots_u, knots_v) = knots;
    match slot {
        Some(mesh) if mesh.vertex_count() == layout.vertex_count() => {
            if positions {
                write_isoparm_vertices(mesh, surface, layout)?;
            }
            if selection {
                partition_isoparms(mesh, layout, knots_u, knots_v, spans, highlight)?;
            }
        }
        _ => {
            let mut mesh = MeshBuffer::new(Primitive::Lines);
            write_isoparm_vertices(&mut mesh, surface, layout)?;
            partition_isoparms(&mut mesh, layout, knots_u, knots_v, spans, highlight)?;
            debug!(
                "built isoparm network: {}x{} isocurves, {} vertices",
                layout.iso_u.len(),
                layout.iso_v.len(),
                layout.vertex_count()
            );
            *slot = Some(mesh);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MaterialId;
    use patchkit_nurbs::{ControlPoint, SurfaceView};

    const HL: Highlight = Highlight {
        normal: MaterialId(0),
        active: MaterialId(1),
    };

    struct Fixture {
        points: Vec<ControlPoint>,
        ku: KnotVector,
        kv: KnotVector,
    }

    /// 4x3 bilinear grid: U knots [0,0,1,2,3,3], V knots [0,0,1,2,2].
    fn fixture() -> Fixture {
        let points = (0..12)
            .map(|k| ControlPoint::new((k % 4) as f64, (k / 4) as f64, 0.0))
            .collect();
        Fixture {
            points,
            ku: KnotVector::clamped_uniform(4, 1).unwrap(),
            kv: KnotVector::clamped_uniform(3, 1).unwrap(),
        }
    }

    fn layout(f: &Fixture) -> IsoparmLayout {
        let us = SampleAxis::over_knots(&f.ku, 5 * 3 + 1, 1e-4, 1e-4);
        let vs = SampleAxis::over_knots(&f.kv, 5 * 2 + 1, 1e-4, 1e-4);
        IsoparmLayout::new(&f.ku, &f.kv, us, vs)
    }

    #[test]
    fn test_layout_counts() {
        let f = fixture();
        let l = layout(&f);
        assert_eq!(l.iso_u(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(l.iso_v(), &[0.0, 1.0, 2.0]);
        assert_eq!(l.vertex_count(), 3 * 16 + 4 * 11);
        assert_eq!(l.segment_count(), 3 * 15 + 4 * 10);
    }

    #[test]
    fn test_isocurves_lie_on_knot_lines() {
        let f = fixture();
        let l = layout(&f);
        let view = SurfaceView::new((1, 1), (4, 3), &f.points, &f.ku, &f.kv);
        let mut slot = None;
        let spans = ActiveSpans2d::new(5, 4);
        update_isoparms(&mut slot, &view, &l, (&f.ku, &f.kv), &spans, true, true, HL).unwrap();
        let mesh = slot.unwrap();
        // Second constant-v curve sits at v = 1, which is y = 1 on this grid.
        for i in 16..32 {
            assert!((mesh.vertices()[i].position[1] - 1.0).abs() < 1e-6);
        }
        // Last constant-u curve is clamped just inside u = 3.
        let last = &mesh.vertices()[48 + 3 * 11];
        assert!((last.position[0] - 3.0).abs() < 1e-3);
        assert_eq!(mesh.submeshes()[1].count, 0);
    }

    #[test]
    fn test_selected_corner_highlights_touching_segments() {
        let mut f = fixture();
        f.points[0].selected = true;
        let l = layout(&f);
        let view = SurfaceView::new((1, 1), (4, 3), &f.points, &f.ku, &f.kv);
        let spans = ActiveSpans2d::from_grid_selection(
            f.points.iter().map(|p| p.selected),
            4,
            1,
            1,
            f.ku.interval_count(),
            f.kv.interval_count(),
        );
        // CV (0,0) activates cells iv 0..=1 x iu 0..=1; the only non-empty
        // one is (1, 1): u in [0,1), v in [0,1).
        assert!(spans.is_active(1, 1));

        let mut slot = None;
        update_isoparms(&mut slot, &view, &l, (&f.ku, &f.kv), &spans, true, true, HL).unwrap();
        let mesh = slot.unwrap();
        // v = 0 and v = 1 curves: 5 segments each over u in [0,1].
        // u = 0 and u = 1 curves: 5 segments each over v in [0,1].
        assert_eq!(mesh.submeshes()[1].count, 2 * (5 * 4));
        for e in mesh.indices()[mesh.submeshes()[1].start..].chunks(2) {
            let a = mesh.vertices()[e[0] as usize].position;
            let b = mesh.vertices()[e[1] as usize].position;
            assert!(a[0] <= 1.0 + 1e-6 && b[0] <= 1.0 + 1e-6);
            assert!(a[1] <= 1.0 + 1e-6 && b[1] <= 1.0 + 1e-6);
        }
    }
}
