//! Versioned vertex/index buffers handed to the renderer.

use bytemuck::{Pod, Zeroable};
use patchkit_math::Point3;

use crate::bounds::Bounds;
use crate::error::{MeshError, Result};

/// Vertices addressable by 16-bit indices.
pub const MAX_VERTICES: usize = 1 << 16;

// =============================================================================
// Growable storage
// =============================================================================

/// Storage whose logical length can shrink and grow without giving memory
/// back; rewriting a buffer of the same size never reallocates.
#[derive(Debug, Clone)]
pub struct GrowBuffer<T> {
    items: Vec<T>,
    len: usize,
}

impl<T: Pod> GrowBuffer<T> {
    /// Empty buffer.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            len: 0,
        }
    }

    /// Set the logical length. New slots are zeroed; old contents of
    /// retained slots are kept.
    pub fn resize(&mut self, len: usize) {
        if len > self.items.len() {
            self.items.resize(len, T::zeroed());
        }
        self.len = len;
    }

    /// Logical contents.
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    /// Mutable logical contents.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items[..self.len]
    }

    /// Logical length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the logical length is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Initialized slots, including those past the logical length.
    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Raw bytes of the logical contents.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl<T: Pod> Default for GrowBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Vertex layout
// =============================================================================

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Model-space position.
    pub position: [f32; 3],
    /// RGBA color.
    pub color: [u8; 4],
    /// Unit normal, zero for line meshes.
    pub normal: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

impl Vertex {
    /// Opaque black vertex at `p` with no normal.
    pub fn line_point(p: &Point3) -> Self {
        Self {
            position: [p.x as f32, p.y as f32, p.z as f32],
            color: [0, 0, 0, 255],
            ..Self::default()
        }
    }

    /// Position widened to f64.
    pub fn point(&self) -> Point3 {
        Point3::new(
            self.position[0] as f64,
            self.position[1] as f64,
            self.position[2] as f64,
        )
    }
}

/// Primitive assembled from the index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Index triples.
    Triangles,
    /// Index pairs.
    Lines,
}

impl Primitive {
    /// Indices per primitive.
    pub fn arity(self) -> usize {
        match self {
            Primitive::Triangles => 3,
            Primitive::Lines => 2,
        }
    }
}

/// Renderer material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialId(pub u32);

/// A contiguous index range drawn with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submesh {
    /// First index.
    pub start: usize,
    /// Index count.
    pub count: usize,
    /// Material for this range.
    pub material: MaterialId,
}

/// Materials for the two halves of a partitioned line mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    /// Material for ordinary segments.
    pub normal: MaterialId,
    /// Material for highlighted segments.
    pub active: MaterialId,
}

// =============================================================================
// Mesh buffer
// =============================================================================

/// Vertex and index buffers plus submesh ranges and change counters.
///
/// Every vertex write recomputes the bounds and bumps `vertex_version`;
/// every index write bumps `index_version`. A renderer re-uploads a buffer
/// when its version differs from the one it last saw.
#[derive(Debug, Clone)]
pub struct MeshBuffer {
    primitive: Primitive,
    vertices: GrowBuffer<Vertex>,
    indices: GrowBuffer<u16>,
    submeshes: Vec<Submesh>,
    bounds: Bounds,
    vertex_version: u64,
    index_version: u64,
}

impl MeshBuffer {
    /// Empty buffer of the given primitive kind.
    pub fn new(primitive: Primitive) -> Self {
        Self {
            primitive,
            vertices: GrowBuffer::new(),
            indices: GrowBuffer::new(),
            submeshes: Vec::new(),
            bounds: Bounds::default(),
            vertex_version: 0,
            index_version: 0,
        }
    }

    /// Primitive kind.
    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    /// Vertices.
    pub fn vertices(&self) -> &[Vertex] {
        self.vertices.as_slice()
    }

    /// Indices.
    pub fn indices(&self) -> &[u16] {
        self.indices.as_slice()
    }

    /// Submesh ranges in draw order.
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    /// Bounds of the current vertices.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Bumped on every vertex write.
    pub fn vertex_version(&self) -> u64 {
        self.vertex_version
    }

    /// Bumped on every index write.
    pub fn index_version(&self) -> u64 {
        self.index_version
    }

    /// Vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        self.vertices.bytes()
    }

    /// Index bytes for upload.
    pub fn index_bytes(&self) -> &[u8] {
        self.indices.bytes()
    }

    /// Position of vertex `i`.
    pub fn position(&self, i: usize) -> Point3 {
        self.vertices.as_slice()[i].point()
    }

    /// Index groups of `primitive().arity()` indices each.
    pub fn primitives(&self) -> std::slice::ChunksExact<'_, u16> {
        self.indices.as_slice().chunks_exact(self.primitive.arity())
    }

    /// Resize to `count` vertices and let `fill` write them.
    ///
    /// Fails without touching the buffer when `count` exceeds what 16-bit
    /// indices can address.
    pub fn write_vertices<F>(&mut self, count: usize, fill: F) -> Result<()>
    where
        F: FnOnce(&mut [Vertex]),
    {
        if count > MAX_VERTICES {
            return Err(MeshError::TooManyVertices {
                count,
                limit: MAX_VERTICES,
            });
        }
        self.vertices.resize(count);
        fill(self.vertices.as_mut_slice());
        self.bounds = Bounds::from_points(self.vertices.as_slice().iter().map(Vertex::point));
        self.vertex_version += 1;
        Ok(())
    }

    /// Resize to `count` indices and let `fill` write them.
    pub fn write_indices<F, R>(&mut self, count: usize, fill: F) -> R
    where
        F: FnOnce(&mut [u16]) -> R,
    {
        self.indices.resize(count);
        let out = fill(self.indices.as_mut_slice());
        debug_assert!(
            self.indices.as_slice().iter().all(|&i| (i as usize) < self.vertices.len()),
            "index past vertex buffer"
        );
        self.index_version += 1;
        out
    }

    /// One submesh over the whole index buffer.
    pub fn set_single_submesh(&mut self, material: MaterialId) {
        self.submeshes.clear();
        self.submeshes.push(Submesh {
            start: 0,
            count: self.indices.len(),
            material,
        });
    }

    /// Replace the submesh list. Ranges must tile the index buffer in order.
    pub fn set_submeshes(&mut self, submeshes: Vec<Submesh>) {
        debug_assert_eq!(
            submeshes.iter().map(|s| s.count).sum::<usize>(),
            self.indices.len()
        );
        self.submeshes = submeshes;
    }

    /// Two submeshes split at `front`: `[0, front)` normal, `[front, len)`
    /// highlighted.
    pub fn split_at(&mut self, front: usize, highlight: Highlight) {
        let len = self.indices.len();
        debug_assert!(front <= len);
        self.submeshes.clear();
        self.submeshes.push(Submesh {
            start: 0,
            count: front,
            material: highlight.normal,
        });
        self.submeshes.push(Submesh {
            start: front,
            count: len - front,
            material: highlight.active,
        });
    }
}

// =============================================================================
// Partitioned index writing
// =============================================================================

/// Writes line segments into an index slice from both ends: ordinary
/// segments from the front, highlighted ones from the back.
pub struct PartitionWriter<'a> {
    out: &'a mut [u16],
    front: usize,
    back: usize,
    overflow: bool,
}

impl<'a> PartitionWriter<'a> {
    /// Writer over the full slice.
    pub fn new(out: &'a mut [u16]) -> Self {
        let back = out.len();
        Self {
            out,
            front: 0,
            back,
            overflow: false,
        }
    }

    /// Write segment `(a, b)` to the front, or to the back when highlighted.
    pub fn push(&mut self, a: usize, b: usize, highlighted: bool) {
        if self.back - self.front < 2 {
            self.overflow = true;
            return;
        }
        let at = if highlighted {
            self.back -= 2;
            self.back
        } else {
            self.front += 2;
            self.front - 2
        };
        self.out[at] = a as u16;
        self.out[at + 1] = b as u16;
    }

    /// Boundary between the two ranges. Fails unless the cursors met
    /// exactly with every segment written.
    pub fn finish(self) -> Result<usize> {
        if self.overflow || self.front != self.back {
            return Err(MeshError::PartitionMismatch {
                front: self.front,
                back: self.back,
            });
        }
        Ok(self.front)
    }
}

/// Fill `mesh` with `segments` partitioned by their highlight flag and set
/// the two submeshes. The segment count must be known up front.
///
/// On a count mismatch the indices and submeshes are emptied, so the mesh
/// never pairs a half-written index buffer with the previous split.
pub fn write_partitioned<I>(
    mesh: &mut MeshBuffer,
    segment_count: usize,
    segments: I,
    highlight: Highlight,
) -> Result<()>
where
    I: IntoIterator<Item = (usize, usize, bool)>,
{
    let written = mesh.write_indices(2 * segment_count, |out| {
        let mut writer = PartitionWriter::new(out);
        for (a, b, hl) in segments {
            writer.push(a, b, hl);
        }
        writer.finish()
    });
    match written {
        Ok(front) => {
            mesh.split_at(front, highlight);
            Ok(())
        }
        Err(e) => {
            mesh.write_indices(0, |_| ());
            mesh.set_submeshes(Vec::new());
            Err(e)
        }
    }
}
