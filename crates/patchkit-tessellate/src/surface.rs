//! Shaded triangle meshes for surfaces.

use log::debug;
use patchkit_nurbs::ParametricSurface;

use crate::buffer::{MaterialId, MeshBuffer, Primitive, Vertex};
use crate::error::Result;
use crate::hull::HullLayout;
use crate::sample::{estimate_normal, normal_color, to_f32, vec_to_f32, SampleAxis};

/// How shaded vertices are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadeColor {
    /// Opaque black; the material supplies the look.
    Black,
    /// Color encodes the normal, `(n + 1) / 2 * 255`.
    FromNormal,
}

/// Write the sampled grid of `surface` into `mesh`, row-major
/// (`iv * us.len() + iu`), with estimated normals.
pub fn write_surface_vertices<S: ParametricSurface>(
    mesh: &mut MeshBuffer,
    surface: &S,
    us: &SampleAxis,
    vs: &SampleAxis,
    color: ShadeColor,
) -> Result<()> {
    let nu = us.len();
    mesh.write_vertices(nu * vs.len(), |out| {
        for (iv, &v) in vs.params().iter().enumerate() {
            for (iu, &u) in us.params().iter().enumerate() {
                let p = surface.eval(u, v);
                let n = estimate_normal(surface, us, vs, iu, iv);
                out[iv * nu + iu] = Vertex {
                    position: to_f32(&p),
                    color: match color {
                        ShadeColor::Black => [0, 0, 0, 255],
                        ShadeColor::FromNormal => normal_color(&n),
                    },
                    normal: vec_to_f32(&n),
                    uv: [u as f32, v as f32],
                };
            }
        }
    })
}

/// Two triangles per grid cell of an `nu x nv` row-major vertex grid.
pub fn write_grid_triangles(mesh: &mut MeshBuffer, nu: usize, nv: usize) {
    let cells = nu.saturating_sub(1) * nv.saturating_sub(1);
    mesh.write_indices(6 * cells, |out| {
        let mut k = 0;
        for iv in 0..nv.saturating_sub(1) {
            for iu in 0..nu.saturating_sub(1) {
                let a = (iv * nu + iu) as u16;
                let b = ((iv + 1) * nu + iu) as u16;
                let c = (iv * nu + iu + 1) as u16;
                let d = ((iv + 1) * nu + iu + 1) as u16;
                out[k..k + 6].copy_from_slice(&[a, b, c, c, b, d]);
                k += 6;
            }
        }
    });
}

/// Bring the shaded mesh in `slot` up to date with `surface`.
///
/// An absent buffer (or one whose grid size changed) is built from
/// scratch with static grid topology; otherwise only the vertices are
/// rewritten in place. On error `slot` keeps its previous state.
pub fn update_surface_mesh<S: ParametricSurface>(
    slot: &mut Option<MeshBuffer>,
    surface: &S,
    us: &SampleAxis,
    vs: &SampleAxis,
    color: ShadeColor,
    material: MaterialId,
) -> Result<()> {
    let count = us.len() * vs.len();
    match slot {
        Some(mesh) if mesh.vertex_count() == count => {
            write_surface_vertices(mesh, surface, us, vs, color)?;
            debug!("patched shaded mesh in place: {count} vertices");
        }
        _ => {
            let mut mesh = MeshBuffer::new(Primitive::Triangles);
            write_surface_vertices(&mut mesh, surface, us, vs, color)?;
            write_grid_triangles(&mut mesh, us.len(), vs.len());
            mesh.set_single_submesh(material);
            debug!(
                "built shaded mesh: {count} vertices, {} triangles",
                mesh.index_count() / 3
            );
            *slot = Some(mesh);
        }
    }
    Ok(())
}

/// Bring a wire grid along every sample row and column of `shaded` up to
/// date. Vertices are the shaded ones with the color blacked out.
pub fn update_grid_wire(
    slot: &mut Option<MeshBuffer>,
    shaded: &MeshBuffer,
    nu: usize,
    nv: usize,
    material: MaterialId,
) -> Result<()> {
    let count = shaded.vertex_count();
    let copy = |mesh: &mut MeshBuffer| {
        mesh.write_vertices(count, |out| {
            for (v, src) in out.iter_mut().zip(shaded.vertices()) {
                *v = Vertex {
                    color: [0, 0, 0, src.color[3]],
                    ..*src
                };
            }
        })
    };
    match slot {
        Some(mesh) if mesh.vertex_count() == count => copy(mesh)?,
        _ => {
            let mut mesh = MeshBuffer::new(Primitive::Lines);
            copy(&mut mesh)?;
            let grid = HullLayout::Grid { num_u: nu, num_v: nv };
            mesh.write_indices(2 * grid.edge_count(count), |out| {
                for (k, (a, b)) in grid.edges(count).enumerate() {
                    out[2 * k] = a as u16;
                    out[2 * k + 1] = b as u16;
                }
            });
            mesh.set_single_submesh(material);
            debug!("built wire grid: {nu}x{nv}");
            *slot = Some(mesh);
        }
    }
    Ok(())
}
