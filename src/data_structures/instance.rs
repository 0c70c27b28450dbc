//! Per-instance data: transforms, colors and the scatter generator.
//!
//! Instanced drawing reuses one vertex/index buffer across many copies of a
//! mesh, varying only these per-instance attributes at an instance step rate.

use cgmath::{InnerSpace, Matrix4, Rad, SquareMatrix, Vector3};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::data_structures::mesh::Vertex;

/// Color assigned to instance 0, the originally authored placement.
pub const DEFAULT_INSTANCE_COLOR: Vector3<f32> = Vector3::new(0.8, 1.0, 1.0);

/// One placed copy of a base mesh: a world transform and a color.
#[derive(Clone, Debug)]
pub struct Instance {
    pub transform: Matrix4<f32>,
    pub color: Vector3<f32>,
}

impl Instance {
    /// The identity placement with the default color.
    pub fn identity() -> Self {
        Self {
            transform: Matrix4::identity(),
            color: DEFAULT_INSTANCE_COLOR,
        }
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.transform.into(),
        }
    }

    pub fn color_raw(&self) -> InstanceColorRaw {
        InstanceColorRaw {
            color: self.color.into(),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::identity()
    }
}

/// Placement policy for the generated population.
///
/// Instance 0 is always the identity; the remaining `instance_count - 1`
/// placements sit on a ring of `ring_radius` with a per-instance displacement
/// in `[-displacement_bound, displacement_bound)` applied on every axis, a
/// uniform scale in `[0, scale_range)` and a random rotation about
/// `rotation_axis`.
#[derive(Clone, Debug)]
pub struct ScatterConfig {
    pub instance_count: usize,
    pub ring_radius: f32,
    pub displacement_bound: f32,
    pub scale_range: f32,
    pub rotation_axis: Vector3<f32>,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            instance_count: 100,
            ring_radius: 70.0,
            displacement_bound: 20.0,
            scale_range: 0.8,
            rotation_axis: Vector3::new(0.4, 0.5, 0.6),
        }
    }
}

/// Generate the ordered instance population for one base mesh.
///
/// Deterministic for a given seed. Index 0 is always the unmodified base
/// placement; consumers rely on it to render a single non-instanced fallback.
pub fn scatter(config: &ScatterConfig, seed: u64) -> Vec<Instance> {
    let mut rng = StdRng::seed_from_u64(seed);
    let axis = config.rotation_axis.normalize();

    let mut instances = Vec::with_capacity(config.instance_count.max(1));
    instances.push(Instance::identity());

    for i in 0..config.instance_count.saturating_sub(1) {
        // Ring placement with a shared jitter on every axis. The y term uses
        // tan rather than sin, stretching the ring into two vertical lobes.
        let angle = i as f32 / 50.0 * 360.0;
        // A zero bound means no jitter; rand panics on empty ranges.
        let displacement = if config.displacement_bound > 0.0 {
            rng.gen_range(-config.displacement_bound..config.displacement_bound)
        } else {
            0.0
        };
        let position = Vector3::new(
            angle.sin() * config.ring_radius + displacement,
            angle.tan() * config.ring_radius + displacement,
            angle.cos() * config.ring_radius + displacement,
        );

        let scale = if config.scale_range > 0.0 {
            rng.gen_range(0.0..config.scale_range)
        } else {
            0.0
        };
        let rotation = rng.gen_range(0.0..360.0);

        let transform = Matrix4::from_translation(position)
            * Matrix4::from_scale(scale)
            * Matrix4::from_axis_angle(axis, Rad(rotation));

        let color = Vector3::new(rng.r#gen::<f32>(), rng.r#gen::<f32>(), rng.r#gen::<f32>());
        instances.push(Instance { transform, color });
    }

    instances
}

/// Raw per-instance transform as stored on the GPU: a mat4 spread over four
/// vec4 attribute slots.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
}

impl Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Advance once per drawn instance, not once per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up four vertex slots, one per column.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Raw per-instance color, in its own buffer at an instance step rate.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceColorRaw {
    color: [f32; 3],
}

impl Vertex for InstanceColorRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceColorRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::SquareMatrix;

    use super::*;

    #[test]
    fn population_has_exactly_the_configured_length() {
        let config = ScatterConfig::default();
        assert_eq!(scatter(&config, 7).len(), 100);

        let small = ScatterConfig {
            instance_count: 5,
            ..Default::default()
        };
        assert_eq!(scatter(&small, 7).len(), 5);
    }

    #[test]
    fn instance_zero_is_always_the_identity() {
        for seed in [0, 1, 42, u64::MAX] {
            let instances = scatter(&ScatterConfig::default(), seed);
            assert_eq!(instances[0].transform, Matrix4::identity());
            assert_eq!(instances[0].color, DEFAULT_INSTANCE_COLOR);
        }
    }

    #[test]
    fn same_seed_reproduces_the_population() {
        let config = ScatterConfig::default();
        let a = scatter(&config, 99);
        let b = scatter(&config, 99);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.transform, y.transform);
            assert_eq!(x.color, y.color);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let config = ScatterConfig::default();
        let a = scatter(&config, 1);
        let b = scatter(&config, 2);
        assert!(a[1].transform != b[1].transform || a[1].color != b[1].color);
    }

    #[test]
    fn zero_jitter_and_zero_scale_configs_are_valid() {
        let config = ScatterConfig {
            displacement_bound: 0.0,
            scale_range: 0.0,
            ..Default::default()
        };
        let instances = scatter(&config, 7);
        assert_eq!(instances.len(), 100);
        assert_eq!(instances[0].transform, Matrix4::identity());
    }

    #[test]
    fn generated_colors_are_unit_interval() {
        for instance in scatter(&ScatterConfig::default(), 3).iter().skip(1) {
            for channel in [instance.color.x, instance.color.y, instance.color.z] {
                assert!((0.0..1.0).contains(&channel));
            }
        }
    }
}
