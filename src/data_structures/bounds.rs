//! World-space axis-aligned bounding boxes and their wireframe proxies.

use cgmath::{Matrix4, Vector3};

use crate::data_structures::{
    instance::Instance,
    mesh::{MeshBuilder, MeshData, MeshVertex, Topology},
};

/// An axis-aligned bounding box: component-wise min and max corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    /// Enclose a set of points. Returns `None` for an empty set, there is no
    /// meaningful seed value to start the scan from.
    pub fn from_points(points: impl IntoIterator<Item = Vector3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for p in points {
            aabb.min.x = aabb.min.x.min(p.x);
            aabb.min.y = aabb.min.y.min(p.y);
            aabb.min.z = aabb.min.z.min(p.z);
            aabb.max.x = aabb.max.x.max(p.x);
            aabb.max.y = aabb.max.y.max(p.y);
            aabb.max.z = aabb.max.z.max(p.z);
        }
        Some(aabb)
    }

    /// The box enclosing one instance's transformed copy of the base mesh.
    ///
    /// Every vertex position goes through the instance transform as a
    /// homogeneous point (w = 1) before the min/max scan.
    pub fn of_instance(mesh: &MeshData, transform: &Matrix4<f32>) -> Option<Self> {
        Self::from_points(mesh.vertices.iter().map(|v| {
            let p = transform * Vector3::from(v.position).extend(1.0);
            p.truncate()
        }))
    }

    pub fn contains(&self, p: Vector3<f32>) -> bool {
        self.min.x <= p.x
            && self.min.y <= p.y
            && self.min.z <= p.z
            && p.x <= self.max.x
            && p.y <= self.max.y
            && p.z <= self.max.z
    }

    /// Build the renderable wireframe proxy: 8 corners, 12 edges, line-list
    /// topology. Never shaded or filled.
    pub fn wireframe(&self) -> MeshBuilder {
        let (min, max) = (self.min, self.max);
        let mut mb = MeshBuilder::new(Topology::LineList);

        for corner in [
            [max.x, max.y, max.z],
            [max.x, max.y, min.z],
            [max.x, min.y, max.z],
            [max.x, min.y, min.z],
            [min.x, max.y, max.z],
            [min.x, max.y, min.z],
            [min.x, min.y, max.z],
            [min.x, min.y, min.z],
        ] {
            mb.push_vertex(MeshVertex {
                position: corner,
                normal: [0.0, 0.0, 0.0],
                tex_coords: [0.0, 0.0],
            });
        }

        mb.push_indices(&[
            0, 1, 0, 2, 0, 4, //
            1, 3, 1, 5, 2, 3, //
            2, 6, 3, 7, 4, 5, //
            4, 6, 5, 7, 6, 7,
        ]);

        mb
    }
}

/// One world-space box per instance, in instance order.
///
/// An empty mesh (or instance set) yields no boxes; callers must treat that
/// as a no-op rather than an error. Cost is O(vertices x instances), which is
/// fine at viewer scale.
pub fn instance_aabbs(mesh: &MeshData, instances: &[Instance]) -> Vec<Aabb> {
    instances
        .iter()
        .filter_map(|instance| Aabb::of_instance(mesh, &instance.transform))
        .collect()
}

#[cfg(test)]
mod tests {
    use cgmath::SquareMatrix;

    use super::*;
    use crate::data_structures::{instance::ScatterConfig, instance::scatter, shapes};

    fn tetrahedron() -> MeshData {
        let mut mb = MeshBuilder::default();
        for position in [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ] {
            mb.push_vertex(MeshVertex {
                position,
                normal: [0.0, 0.0, 1.0],
                tex_coords: [0.0, 0.0],
            });
        }
        mb.build()
    }

    #[test]
    fn identity_instance_box_matches_the_mesh() {
        let aabb = Aabb::of_instance(&tetrahedron(), &Matrix4::identity()).unwrap();
        assert_eq!(aabb.min, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn translation_shifts_the_box() {
        let transform = Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0));
        let aabb = Aabb::of_instance(&tetrahedron(), &transform).unwrap();
        assert_eq!(aabb.min, Vector3::new(5.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vector3::new(6.0, 1.0, 1.0));
    }

    #[test]
    fn one_box_per_instance_each_enclosing_its_vertices() {
        let mesh = shapes::sphere(1.0, 4, 4).build();
        let instances = scatter(&ScatterConfig::default(), 11);
        let aabbs = instance_aabbs(&mesh, &instances);
        assert_eq!(aabbs.len(), instances.len());

        for (aabb, instance) in aabbs.iter().zip(&instances) {
            assert!(aabb.min.x <= aabb.max.x);
            assert!(aabb.min.y <= aabb.max.y);
            assert!(aabb.min.z <= aabb.max.z);
            for v in &mesh.vertices {
                let p = (instance.transform * Vector3::from(v.position).extend(1.0)).truncate();
                assert!(aabb.contains(p));
            }
        }
    }

    #[test]
    fn empty_mesh_produces_no_boxes() {
        let empty = MeshBuilder::default().build();
        let instances = scatter(&ScatterConfig::default(), 1);
        assert!(instance_aabbs(&empty, &instances).is_empty());
        assert!(instance_aabbs(&empty, &[]).is_empty());
    }

    #[test]
    fn wireframe_proxy_is_a_valid_line_mesh() {
        let aabb = Aabb {
            min: Vector3::new(-1.0, -2.0, -3.0),
            max: Vector3::new(1.0, 2.0, 3.0),
        };
        let mesh = aabb.wireframe().build();
        assert_eq!(mesh.topology, Topology::LineList);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices.len(), 24);
        assert!(mesh.validate().is_ok());
    }
}
