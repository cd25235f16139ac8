//! Error types for the kernel.

use patchkit_nurbs::NurbsError;
use patchkit_tessellate::MeshError;
use thiserror::Error;

use crate::scene::EntityId;

/// Errors surfaced by scene edits, update passes and picks.
#[derive(Error, Debug)]
pub enum KernelError {
    /// Geometry failed validation at construction.
    #[error("invalid geometry: {0}")]
    Geometry(#[from] NurbsError),

    /// A buffer could not be built.
    #[error("mesh update failed: {0}")]
    Mesh(#[from] MeshError),

    /// Configuration text is not valid TOML for [`KernelConfig`](crate::KernelConfig).
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration values are out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The entity handle no longer refers to a live entity.
    #[error("entity {0:?} is not in the scene")]
    StaleEntity(EntityId),

    /// A control point index past the end of its entity's list.
    #[error("control point {index} out of range ({count} control points)")]
    CvIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Control points on the entity.
        count: usize,
    },

    /// An edit needed the inverse of a singular world matrix.
    #[error("world matrix of entity {0:?} is not invertible")]
    SingularTransform(EntityId),

    /// Polygon mesh data references missing pool entries or has too few corners.
    #[error("invalid polygon mesh: {0}")]
    InvalidPolygon(String),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
