use crate::{
    data_structures::{
        instance::{InstanceColorRaw, InstanceRaw},
        mesh::{MeshVertex, Topology, Vertex},
        texture::Texture,
    },
    pipelines::model::{mk_render_pipeline, uniform_layout},
};

/// Line-list pipeline for bounding-box wireframes.
///
/// Shares the model's uniform bind group, the boxes flat-shade with the
/// material color under the same view/projection.
pub fn mk_wireframe_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Wireframe Pipeline Layout"),
        bind_group_layouts: &[&uniform_layout(device)],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Wireframe Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("wireframe_shader.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        &[
            MeshVertex::desc(),
            InstanceColorRaw::desc(),
            InstanceRaw::desc(),
        ],
        shader,
        Topology::LineList.into(),
        None,
    )
}
