//! Shaded and wire meshes for polygon meshes.

use std::collections::HashSet;

use log::debug;
use patchkit_math::Vec3;
use patchkit_nurbs::ControlPoint;

use crate::buffer::{
    write_partitioned, Highlight, MaterialId, MeshBuffer, Primitive, Submesh, Vertex,
};
use crate::error::Result;
use crate::sample::to_f32;

/// A polygon corner: a position plus optional normal and texture
/// coordinate, each indexing its own pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Corner {
    /// Index into the vertex (control point) list.
    pub position: usize,
    /// Index into the normal pool.
    pub normal: Option<usize>,
    /// Index into the uv pool.
    pub uv: Option<usize>,
}

/// A planar polygon over the corner table.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Corner indices in winding order.
    pub corners: Vec<usize>,
    /// Material the polygon is drawn with.
    pub material: MaterialId,
}

/// Borrowed polygon mesh data.
#[derive(Debug, Clone, Copy)]
pub struct PolygonSource<'a> {
    /// Vertex positions.
    pub points: &'a [ControlPoint],
    /// Normal pool.
    pub normals: &'a [Vec3],
    /// Texture coordinate pool.
    pub uvs: &'a [[f32; 2]],
    /// Corner table; one shaded vertex per corner.
    pub corners: &'a [Corner],
    /// Polygons.
    pub polygons: &'a [Polygon],
}

impl PolygonSource<'_> {
    /// Triangles produced by fanning every polygon.
    pub fn triangle_count(&self) -> usize {
        self.polygons.iter().map(|p| p.corners.len().saturating_sub(2)).sum()
    }

    /// Distinct undirected edges between vertex positions, in first-seen order.
    pub fn unique_edges(&self) -> Vec<(usize, usize)> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for poly in self.polygons {
            let n = poly.corners.len();
            for j in 0..n {
                let a = self.corners[poly.corners[j]].position;
                let b = self.corners[poly.corners[(j + 1) % n]].position;
                let e = (a.min(b), a.max(b));
                if e.0 != e.1 && seen.insert(e) {
                    edges.push(e);
                }
            }
        }
        edges
    }
}

/// Write one white vertex per corner.
pub fn write_polygon_vertices(mesh: &mut MeshBuffer, src: &PolygonSource<'_>) -> Result<()> {
    mesh.write_vertices(src.corners.len(), |out| {
        for (v, c) in out.iter_mut().zip(src.corners) {
            *v = Vertex {
                position: to_f32(&src.points[c.position].cartesian()),
                color: [255, 255, 255, 255],
                normal: c.normal.map_or([0.0; 3], |i| {
                    let n = &src.normals[i];
                    [n.x as f32, n.y as f32, n.z as f32]
                }),
                uv: c.uv.map_or([0.0; 2], |i| src.uvs[i]),
            };
        }
    })
}

/// Fan-triangulate every polygon, one submesh per run of equal material.
pub fn write_polygon_triangles(mesh: &mut MeshBuffer, src: &PolygonSource<'_>) {
    let mut submeshes: Vec<Submesh> = Vec::new();
    mesh.write_indices(3 * src.triangle_count(), |out| {
        let mut k = 0;
        for poly in src.polygons {
            let tris = poly.corners.len().saturating_sub(2);
            if tris == 0 {
                continue;
            }
            match submeshes.last_mut() {
                Some(sm) if sm.material == poly.material => sm.count += 3 * tris,
                _ => submeshes.push(Submesh {
                    start: k,
                    count: 3 * tris,
                    material: poly.material,
                }),
            }
            let c = &poly.corners;
            for j in 2..c.len() {
                out[k..k + 3].copy_from_slice(&[c[0] as u16, c[j - 1] as u16, c[j] as u16]);
                k += 3;
            }
        }
    });
    mesh.set_submeshes(submeshes);
}

/// Bring the shaded polygon mesh up to date. Topology is built once.
pub fn update_polygon_mesh(slot: &mut Option<MeshBuffer>, src: &PolygonSource<'_>) -> Result<()> {
    match slot {
        Some(mesh) if mesh.vertex_count() == src.corners.len() => {
            write_polygon_vertices(mesh, src)?;
        }
        _ => {
            let mut mesh = MeshBuffer::new(Primitive::Triangles);
            write_polygon_vertices(&mut mesh, src)?;
            write_polygon_triangles(&mut mesh, src);
            debug!(
                "built polygon mesh: {} corners, {} triangles, {} submeshes",
                src.corners.len(),
                src.triangle_count(),
                mesh.submeshes().len()
            );
            *slot = Some(mesh);
        }
    }
    Ok(())
}

/// Bring the polygon wireframe up to date: one vertex per position, unique
/// edges partitioned by endpoint selection.
pub fn update_polygon_wire(
    slot: &mut Option<MeshBuffer>,
    src: &PolygonSource<'_>,
    positions: bool,
    selection: bool,
    highlight: Highlight,
) -> Result<()> {
    let write_positions = |mesh: &mut MeshBuffer| {
        mesh.write_vertices(src.points.len(), |out| {
            for (v, cv) in out.iter_mut().zip(src.points) {
                *v = Vertex::line_point(&cv.cartesian());
            }
        })
    };
    let partition = |mesh: &mut MeshBuffer| {
        let edges = src.unique_edges();
        let count = edges.len();
        let segs = edges
            .into_iter()
            .map(|(a, b)| (a, b, src.points[a].selected || src.points[b].selected));
        write_partitioned(mesh, count, segs, highlight)
    };

    match slot {
        Some(mesh) if mesh.vertex_count() == src.points.len() => {
            if positions {
                write_positions(mesh)?;
            }
            if selection {
                partition(mesh)?;
            }
        }
        _ => {
            let mut mesh = MeshBuffer::new(Primitive::Lines);
            write_positions(&mut mesh)?;
            partition(&mut mesh)?;
            *slot = Some(mesh);
        }
    }
    Ok(())
}
