//! Curve polylines with span highlighting.

use log::debug;
use patchkit_nurbs::{ActiveSpans, KnotVector, ParametricCurve};

use crate::buffer::{write_partitioned, Highlight, MeshBuffer, Primitive, Vertex};
use crate::error::Result;
use crate::sample::SampleAxis;

/// Write the sampled curve as opaque black line vertices.
pub fn write_curve_vertices<C: ParametricCurve>(
    mesh: &mut MeshBuffer,
    curve: &C,
    axis: &SampleAxis,
) -> Result<()> {
    mesh.write_vertices(axis.len(), |out| {
        for (v, &u) in out.iter_mut().zip(axis.params()) {
            *v = Vertex::line_point(&curve.eval(u));
        }
    })
}

/// Partition polyline segments: a segment is highlighted when the knot
/// interval containing its parameter midpoint is active.
pub fn partition_curve(
    mesh: &mut MeshBuffer,
    axis: &SampleAxis,
    knots: &KnotVector,
    spans: &ActiveSpans,
    highlight: Highlight,
) -> Result<()> {
    let segments = axis.len().saturating_sub(1);
    let segs = (0..segments).map(|i| {
        let active = spans.is_active(knots.interval_at(axis.midpoint(i)));
        (i, i + 1, active)
    });
    write_partitioned(mesh, segments, segs, highlight)
}

/// Bring the curve polyline in `slot` up to date.
///
/// An absent buffer is built in full. Otherwise vertices are rewritten when
/// `positions` is set and the partition when `selection` is set.
#[allow(clippy::too_many_arguments)]
pub fn update_curve_wire<C: ParametricCurve>(
    slot: &mut Option<MeshBuffer>,
    curve: &C,
    axis: &SampleAxis,
    knots: &KnotVector,
    spans: &ActiveSpans,
    positions: bool,
    selection: bool,
    highlight: Highlight,
) -> Result<()> {
    match slot {
        Some(mesh) if mesh.vertex_count() == axis.len() => {
            if positions {
                write_curve_vertices(mesh, curve, axis)?;
            }
            if selection {
                partition_curve(mesh, axis, knots, spans, highlight)?;
            }
        }
        _ => {
            let mut mesh = MeshBuffer::new(Primitive::Lines);
            write_curve_vertices(&mut mesh, curve, axis)?;
            partition_curve(&mut mesh, axis, knots, spans, highlight)?;
            debug!("built curve polyline: {} samples", axis.len());
            *slot = Some(mesh);
        }
    }
    Ok(())
}
