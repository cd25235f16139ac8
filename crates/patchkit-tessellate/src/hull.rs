//! Control hull line meshes with selection-partitioned indices.

use log::debug;
use patchkit_nurbs::ControlPoint;

use crate::buffer::{write_partitioned, Highlight, MeshBuffer, Primitive, Vertex};
use crate::error::Result;

/// Connectivity of a control polygon or net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HullLayout {
    /// Sequential edges `(i, i + 1)`.
    Polyline,
    /// Row-major grid: edges along each U row, then along each V column.
    Grid {
        /// Points per row.
        num_u: usize,
        /// Number of rows.
        num_v: usize,
    },
}

impl HullLayout {
    /// Number of hull edges for `points` control points.
    pub fn edge_count(self, points: usize) -> usize {
        match self {
            HullLayout::Polyline => points.saturating_sub(1),
            HullLayout::Grid { num_u, num_v } => {
                num_u.saturating_sub(1) * num_v + num_v.saturating_sub(1) * num_u
            }
        }
    }

    /// Hull edges in write order.
    pub fn edges(self, points: usize) -> Box<dyn Iterator<Item = (usize, usize)>> {
        match self {
            HullLayout::Polyline => Box::new((1..points.max(1)).map(|i| (i - 1, i))),
            HullLayout::Grid { num_u, num_v } => {
                let rows = (0..num_v).flat_map(move |iv| {
                    (1..num_u).map(move |iu| (iv * num_u + iu - 1, iv * num_u + iu))
                });
                let cols = (0..num_u).flat_map(move |iu| {
                    (1..num_v).map(move |iv| ((iv - 1) * num_u + iu, iv * num_u + iu))
                });
                Box::new(rows.chain(cols))
            }
        }
    }
}

/// Write control point positions as opaque black line vertices.
pub fn write_hull_vertices(mesh: &mut MeshBuffer, points: &[ControlPoint]) -> Result<()> {
    mesh.write_vertices(points.len(), |out| {
        for (v, cv) in out.iter_mut().zip(points) {
            *v = Vertex::line_point(&cv.cartesian());
        }
    })
}

/// Partition hull edges: an edge with a selected endpoint goes to the
/// highlighted range.
pub fn partition_hull(
    mesh: &mut MeshBuffer,
    points: &[ControlPoint],
    layout: HullLayout,
    highlight: Highlight,
) -> Result<()> {
    let edges = layout
        .edges(points.len())
        .map(|(a, b)| (a, b, points[a].selected || points[b].selected));
    write_partitioned(mesh, layout.edge_count(points.len()), edges, highlight)
}

/// Bring the hull in `slot` up to date.
///
/// An absent buffer is built in full. Otherwise vertices are rewritten when
/// `positions` is set and the index partition when `selection` is set.
pub fn update_hull(
    slot: &mut Option<MeshBuffer>,
    points: &[ControlPoint],
    layout: HullLayout,
    positions: bool,
    selection: bool,
    highlight: Highlight,
) -> Result<()> {
    match slot {
        Some(mesh) if mesh.vertex_count() == points.len() => {
            if positions {
                write_hull_vertices(mesh, points)?;
            }
            if selection {
                partition_hull(mesh, points, layout, highlight)?;
            }
        }
        _ => {
            let mut mesh = MeshBuffer::new(Primitive::Lines);
            write_hull_vertices(&mut mesh, points)?;
            partition_hull(&mut mesh, points, layout, highlight)?;
            debug!(
                "built hull: {} points, {} edges",
                points.len(),
                layout.edge_count(points.len())
            );
            *slot = Some(mesh);
        }
    }
    Ok(())
}
