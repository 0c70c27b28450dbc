//! GPU upload tests against a headless device. These need a working adapter,
//! so they are gated behind the `integration-tests` feature like the rest of
//! the device-backed tests.
#![cfg(feature = "integration-tests")]

use swarmview::data_structures::{
    bounds::instance_aabbs,
    instance::{Instance, ScatterConfig, scatter},
    mesh::{MeshBuilder, MeshVertex, Topology},
    model::GpuMesh,
    shapes,
};
use tokio::runtime::Runtime;

fn create_device() -> (wgpu::Device, wgpu::Queue) {
    let runtime = Runtime::new().expect("tokio runtime");
    runtime.block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .expect("no adapter available for integration tests");
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("device request failed")
    })
}

#[test]
fn should_upload_a_scattered_sphere() {
    let (device, _queue) = create_device();
    let mesh = shapes::sphere(1.0, 10, 10).build();
    let instances = scatter(&ScatterConfig::default(), 7);

    let gpu_mesh = GpuMesh::upload(&device, &mesh, &instances).expect("upload");
    assert_eq!(gpu_mesh.instance_count, 100);
    assert_eq!(gpu_mesh.index_count, mesh.indices.len() as u32);
    assert_eq!(gpu_mesh.topology, Topology::TriangleList);
}

#[test]
fn should_reject_an_out_of_bounds_index_at_upload() {
    let (device, _queue) = create_device();
    let mut builder = MeshBuilder::default();
    builder.push_vertex(MeshVertex {
        position: [0.0; 3],
        normal: [0.0, 1.0, 0.0],
        tex_coords: [0.0; 2],
    });
    builder.push_indices(&[0, 1, 2]);
    let mesh = builder.build();

    assert!(GpuMesh::upload(&device, &mesh, &[Instance::identity()]).is_err());
}

#[test]
fn should_upload_one_wireframe_box_per_instance() {
    let (device, _queue) = create_device();
    let mesh = shapes::sphere(1.0, 4, 4).build();
    let instances = scatter(&ScatterConfig::default(), 11);

    let boxes = instance_aabbs(&mesh, &instances)
        .iter()
        .map(|aabb| GpuMesh::upload(&device, &aabb.wireframe().build(), &[Instance::identity()]))
        .collect::<Result<Vec<_>, _>>()
        .expect("box upload");

    assert_eq!(boxes.len(), instances.len());
    for bbox in &boxes {
        assert_eq!(bbox.index_count, 24);
        assert_eq!(bbox.instance_count, 1);
        assert_eq!(bbox.topology, Topology::LineList);
    }
}
