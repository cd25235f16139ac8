#![warn(missing_docs)]

//! Mesh buffers, tessellation and wireframe builders for the patchkit kernel.
//!
//! Everything here writes into [`MeshBuffer`]s: versioned vertex/index
//! buffers with submesh ranges that a renderer uploads as-is.
//!
//! - Shaded surfaces: a fixed parameter grid, finite-difference normals.
//! - Curves: a sampled polyline whose segments highlight by knot span.
//! - Hulls: control-point connectivity split into normal and selected ranges.
//! - Isoparms: one isocurve per distinct knot in each direction.
//! - Markers: instanced icons for control points and knots.
//! - Polygon meshes: fan triangulation and a unique-edge wireframe.
//!
//! Builders take `&mut Option<MeshBuffer>`: an empty slot gets a new buffer
//! with its static topology, an existing one is patched in place.

mod bounds;
mod buffer;
mod curve;
mod error;
mod hull;
mod isoparm;
mod markers;
mod polygon;
mod sample;
mod surface;

pub use bounds::{Aabb3, BoundingSphere, Bounds};
pub use buffer::{
    write_partitioned, GrowBuffer, Highlight, MaterialId, MeshBuffer, PartitionWriter, Primitive,
    Submesh, Vertex, MAX_VERTICES,
};
pub use curve::{partition_curve, update_curve_wire, write_curve_vertices};
pub use error::{MeshError, Result};
pub use hull::{partition_hull, update_hull, write_hull_vertices, HullLayout};
pub use isoparm::{partition_isoparms, update_isoparms, write_isoparm_vertices, IsoparmLayout};
pub use markers::{curve_knot_markers, KnotMarker, MarkerBuffer, MarkerIcon, MarkerInstance};
pub use polygon::{
    update_polygon_mesh, update_polygon_wire, write_polygon_triangles, write_polygon_vertices,
    Corner, Polygon, PolygonSource,
};
pub use sample::{estimate_normal, fallback_normal, normal_color, SampleAxis};
pub use surface::{
    update_grid_wire, update_surface_mesh, write_grid_triangles, write_surface_vertices, ShadeColor,
};
