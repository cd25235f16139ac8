#![warn(missing_docs)]

//! Interactive modeling kernel for Bezier patches, NURBS curves and
//! surfaces, and polygon meshes.
//!
//! A [`Scene`] owns entities by [`EntityId`]. Edits go through the scene
//! (or an [`Entity`]) and mark dirty flags; [`Scene::update_all`] brings
//! every render buffer up to date once per frame. Picks read the same
//! buffers, updating a dirty entity first.
//!
//! ```ignore
//! use patchkit_kernel::{BezierPatch, CvRef, Scene};
//! use patchkit_math::{Point3, Vec3};
//!
//! let mut scene = Scene::default();
//! let id = scene.insert("patch", BezierPatch::flat(1.0, 0.0));
//! scene.set_cv_selected(CvRef::new(id, 5), true)?;
//! scene.update_all()?;
//!
//! let hit = scene.ray_pick(&Point3::new(0.5, 0.4, 1.0), &Vec3::new(0.0, 0.0, -1.0))?;
//! ```

pub mod config;
pub mod dirty;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod scene;

pub use config::{KernelConfig, MaterialTable};
pub use dirty::{DirtyFlags, UpdatePhase};
pub use entity::Entity;
pub use error::{KernelError, Result};
pub use geometry::{BezierPatch, Curve, Geometry, PolygonMesh, Surface, BEZIER_ORDER};
pub use scene::{CvRef, EntityId, Node, Scene, SelectMode};

pub use patchkit_pick::Frustum;
