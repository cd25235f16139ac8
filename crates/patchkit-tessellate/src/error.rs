//! Errors raised while writing mesh buffers.

use thiserror::Error;

/// Errors from mesh construction and index partitioning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The buffer would need more vertices than 16-bit indices can address.
    #[error("mesh needs {count} vertices, 16-bit indices address at most {limit}")]
    TooManyVertices {
        /// Requested vertex count.
        count: usize,
        /// Addressable limit.
        limit: usize,
    },

    /// The normal and highlighted index ranges did not meet.
    #[error("index partition mismatch: front cursor at {front}, back cursor at {back}")]
    PartitionMismatch {
        /// Final front cursor.
        front: usize,
        /// Final back cursor.
        back: usize,
    },
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
