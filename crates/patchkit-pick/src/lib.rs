#![warn(missing_docs)]

//! Ray and frustum picking for the patchkit kernel.
//!
//! Queries run against the same [`MeshBuffer`](patchkit_tessellate::MeshBuffer)s
//! the renderer draws, in the mesh's local space: rays are pulled back
//! through the inverse world matrix, frustum planes through its transpose.

mod clip;
mod frustum;
mod mesh;
mod ray;

pub use clip::{clip_polygon, Clipper};
pub use frustum::Frustum;
pub use mesh::{frustum_pick_points, intersect_frustum, intersect_ray, RayPick};
pub use ray::Ray;
