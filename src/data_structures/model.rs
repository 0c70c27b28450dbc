//! GPU-resident meshes and the drawable model.
//!
//! [`GpuMesh`] owns the four buffers produced by the one-shot upload of a
//! mesh build result plus its instance set. [`Model`] bundles a mesh with a
//! render pipeline, a texture and the Phong material parameters, and issues
//! the per-frame instanced draw.

use std::ops::Range;

use anyhow::Result;
use bytemuck::Zeroable;
use cgmath::{Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        mesh::{MeshData, Topology},
        texture::Texture,
    },
    pipelines,
};

/// GPU buffers for one mesh: interleaved vertex data, indices and the two
/// per-instance attribute streams (colors, transforms).
///
/// The upload is one-shot: any change to vertices, indices or instances means
/// rebuilding the whole resource. All buffers are released together when the
/// mesh is dropped.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub color_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub instance_count: u32,
    pub topology: Topology,
}

impl GpuMesh {
    /// Transfer a build result and its instance set into GPU buffers.
    ///
    /// The mesh is validated first; an index past the vertex count fails the
    /// upload instead of corrupting the draw.
    pub fn upload(device: &wgpu::Device, mesh: &MeshData, instances: &[Instance]) -> Result<Self> {
        mesh.validate()?;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let colors = instances.iter().map(Instance::color_raw).collect::<Vec<_>>();
        let color_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Color Buffer"),
            contents: bytemuck::cast_slice(&colors),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let transforms = instances.iter().map(Instance::to_raw).collect::<Vec<_>>();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Transform Buffer"),
            contents: bytemuck::cast_slice(&transforms),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            vertex_buffer,
            index_buffer,
            color_buffer,
            instance_buffer,
            index_count: mesh.indices.len() as u32,
            instance_count: instances.len() as u32,
            topology: mesh.topology,
        })
    }

    /// The instance range a draw call covers: the full population when
    /// instancing is on, only instance 0 otherwise.
    pub fn draw_range(&self, instanced: bool) -> Range<u32> {
        draw_range(self.instance_count, instanced)
    }

    /// Bind the four buffers and issue the indexed, instanced draw.
    ///
    /// A mesh with nothing to draw no-ops rather than faulting.
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, instanced: bool) {
        if self.index_count == 0 || self.instance_count == 0 {
            return;
        }
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.color_buffer.slice(..));
        render_pass.set_vertex_buffer(2, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, self.draw_range(instanced));
    }
}

/// The instance range for a draw over `instance_count` uploaded instances.
fn draw_range(instance_count: u32, instanced: bool) -> Range<u32> {
    if instanced {
        0..instance_count
    } else {
        0..instance_count.min(1)
    }
}

/**
 * Uniform block shared by the model and wireframe shaders. vec3 fields carry
 * explicit padding to satisfy the 16 byte uniform alignment rules.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    proj: [[f32; 4]; 4],
    model_view: [[f32; 4]; 4],
    color: [f32; 3],
    _padding: u32,
    light_color: [f32; 3],
    _padding2: u32,
    specular_color: [f32; 3],
    shininess: f32,
    use_texture: u32,
    use_instance_colors: u32,
    _padding3: [u32; 2],
}

/// One drawable unit: a GPU mesh, its pipeline, a texture and the material
/// and light parameters pushed as uniforms each frame.
pub struct Model {
    pub mesh: GpuMesh,
    pub pipeline: wgpu::RenderPipeline,
    pub model_transform: Matrix4<f32>,
    pub color: Vector3<f32>,
    pub light_color: Vector3<f32>,
    pub specular_color: Vector3<f32>,
    pub shininess: f32,
    pub use_texture: bool,
    pub use_instance_colors: bool,
    pub draw_instances: bool,
    uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
}

impl Model {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        mesh: GpuMesh,
        texture: &Texture,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Uniform Buffer"),
            contents: bytemuck::cast_slice(&[ModelUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = pipelines::model::uniform_layout(device);
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("model_uniform_bind_group"),
        });

        let texture_layout = pipelines::model::texture_layout(device);
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(
                        texture.sampler.as_ref().expect("model texture has a sampler"),
                    ),
                },
            ],
            label: Some("model_texture_bind_group"),
        });

        let pipeline = pipelines::model::mk_model_pipeline(device, config);

        Self {
            mesh,
            pipeline,
            model_transform: Matrix4::identity(),
            color: Vector3::new(0.8, 1.0, 1.0),
            light_color: Vector3::new(0.8, 0.5, 1.0),
            specular_color: Vector3::new(1.0, 1.0, 1.0),
            shininess: 20.0,
            use_texture: false,
            use_instance_colors: false,
            draw_instances: false,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group,
        }
    }

    /// Push all scalar/vector/matrix uniforms for this frame.
    pub fn update(&self, queue: &wgpu::Queue, view: Matrix4<f32>, proj: Matrix4<f32>) {
        let uniform = ModelUniform {
            proj: proj.into(),
            model_view: (view * self.model_transform).into(),
            color: self.color.into(),
            _padding: 0,
            light_color: self.light_color.into(),
            _padding2: 0,
            specular_color: self.specular_color.into(),
            shininess: self.shininess,
            use_texture: self.use_texture as u32,
            use_instance_colors: self.use_instance_colors as u32,
            _padding3: [0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Bind the pipeline and groups and submit the instanced draw.
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &self.texture_bind_group, &[]);
        self.mesh.draw(render_pass, self.draw_instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instanced_draw_covers_the_population() {
        assert_eq!(draw_range(100, true), 0..100);
    }

    #[test]
    fn non_instanced_draw_covers_only_the_identity_instance() {
        assert_eq!(draw_range(100, false), 0..1);
    }

    #[test]
    fn empty_instance_set_draws_nothing_either_way() {
        assert_eq!(draw_range(0, true), 0..0);
        assert_eq!(draw_range(0, false), 0..0);
    }

    #[test]
    fn uniform_block_size_is_a_multiple_of_sixteen() {
        assert_eq!(std::mem::size_of::<ModelUniform>() % 16, 0);
    }
}
