//! Mesh construction: vertices, indices and the immutable build result.
//!
//! A [`MeshBuilder`] accumulates vertex and index data for one logical mesh
//! and snapshots it into a [`MeshData`]. The build result is what gets
//! validated and uploaded to the GPU (see `data_structures::model`).

use anyhow::{Result, ensure};

/// Trait for describing how a buffer's bytes map to shader inputs.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// One mesh vertex: position, normal and texture coordinate.
///
/// Stored interleaved in a single per-vertex buffer. Immutable once pushed
/// into a builder.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// How indices group into primitives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    LineList,
}

impl From<Topology> for wgpu::PrimitiveTopology {
    fn from(topology: Topology) -> Self {
        match topology {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
        }
    }
}

/// Accumulates vertices and indices for one mesh.
///
/// Builders are cheap value objects; several can coexist and be combined via
/// [`append`](Self::append). Indices are not bounds-checked at push time, the
/// check happens when the build result is uploaded.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl MeshBuilder {
    pub fn new(topology: Topology) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            topology,
        }
    }

    /// Append a vertex and return its assigned index (monotonic from 0).
    pub fn push_vertex(&mut self, vertex: MeshVertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        index
    }

    pub fn push_index(&mut self, index: u32) {
        self.indices.push(index);
    }

    pub fn push_indices(&mut self, indices: &[u32]) {
        self.indices.extend_from_slice(indices);
    }

    /// Copy another builder's vertex and index ranges into this one,
    /// rebasing the appended indices past the vertices already present.
    pub fn append(&mut self, other: &MeshBuilder) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| base + i));
    }

    /// Snapshot the accumulated data into an immutable build result.
    ///
    /// Pure: building twice without intervening mutation yields equal data.
    pub fn build(&self) -> MeshData {
        MeshData {
            vertices: self.vertices.clone(),
            indices: self.indices.clone(),
            topology: self.topology,
        }
    }
}

/// The immutable product of a [`MeshBuilder`], ready for GPU upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl MeshData {
    /// Check that every index refers to an existing vertex.
    ///
    /// Runs at the upload boundary so a stray index fails loudly instead of
    /// corrupting the draw.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices.len() as u32;
        for (position, &index) in self.indices.iter().enumerate() {
            ensure!(
                index < vertex_count,
                "index {} at position {} is out of range ({} vertices)",
                index,
                position,
                vertex_count
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(position: [f32; 3]) -> MeshVertex {
        MeshVertex {
            position,
            normal: [0.0, 0.0, 1.0],
            tex_coords: [0.0, 0.0],
        }
    }

    #[test]
    fn push_vertex_assigns_monotonic_indices() {
        let mut mb = MeshBuilder::default();
        assert_eq!(mb.push_vertex(vertex([0.0, 0.0, 0.0])), 0);
        assert_eq!(mb.push_vertex(vertex([1.0, 0.0, 0.0])), 1);
        assert_eq!(mb.push_vertex(vertex([0.0, 1.0, 0.0])), 2);
    }

    #[test]
    fn build_is_idempotent() {
        let mut mb = MeshBuilder::default();
        mb.push_vertex(vertex([0.0, 0.0, 0.0]));
        mb.push_vertex(vertex([1.0, 0.0, 0.0]));
        mb.push_vertex(vertex([0.0, 1.0, 0.0]));
        mb.push_indices(&[0, 1, 2]);
        assert_eq!(mb.build(), mb.build());
    }

    #[test]
    fn append_rebases_indices() {
        let mut a = MeshBuilder::default();
        a.push_vertex(vertex([0.0, 0.0, 0.0]));
        a.push_index(0);

        let mut b = MeshBuilder::default();
        b.push_vertex(vertex([1.0, 0.0, 0.0]));
        b.push_vertex(vertex([0.0, 1.0, 0.0]));
        b.push_indices(&[0, 1]);

        a.append(&b);
        assert_eq!(a.vertices.len(), 3);
        assert_eq!(a.indices, vec![0, 1, 2]);
        assert!(a.build().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mut mb = MeshBuilder::default();
        mb.push_vertex(vertex([0.0, 0.0, 0.0]));
        mb.push_index(1);
        assert!(mb.build().validate().is_err());
    }

    #[test]
    fn validate_accepts_empty_mesh() {
        let mb = MeshBuilder::default();
        assert!(mb.build().validate().is_ok());
    }

    #[test]
    fn topology_maps_onto_the_gpu_primitive() {
        assert_eq!(
            wgpu::PrimitiveTopology::from(Topology::TriangleList),
            wgpu::PrimitiveTopology::TriangleList
        );
        assert_eq!(
            wgpu::PrimitiveTopology::from(Topology::LineList),
            wgpu::PrimitiveTopology::LineList
        );
    }
}
