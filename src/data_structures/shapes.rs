//! Procedural shape generators.
//!
//! Pure functions sweeping a parametrized surface over stacks and slices,
//! with closed-form normals and normalized parametric UVs. Bad parameters are
//! programmer errors and assert.

use std::f32::consts::PI;

use crate::data_structures::mesh::{MeshBuilder, MeshVertex, Topology};

/// A UV sphere. `slices` and `stacks` must be 2 or more.
///
/// Produces `(slices * 2 + 1) * (stacks + 1)` vertices.
pub fn sphere(radius: f32, slices: u32, stacks: u32) -> MeshBuilder {
    assert!(slices >= 2 && stacks >= 2 && radius > 0.0);

    let slices2 = slices * 2;
    let (sin_phi, cos_phi) = phi_tables(slices2);

    let mut mb = MeshBuilder::new(Topology::TriangleList);
    for i in 0..=stacks {
        let theta = PI * i as f32 / stacks as f32;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for j in 0..=slices2 as usize {
            let normal = [
                sin_theta * cos_phi[j],
                sin_theta * sin_phi[j],
                cos_theta,
            ];
            mb.push_vertex(MeshVertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                normal,
                tex_coords: [j as f32 / slices2 as f32, i as f32 / stacks as f32],
            });
        }
    }

    for i in 0..stacks {
        for j in 0..slices2 {
            let i0 = i * (slices2 + 1);
            let i1 = (i + 1) * (slices2 + 1);
            let (j0, j1) = (j, j + 1);
            mb.push_indices(&[i0 + j0, i1 + j0, i1 + j1]);
            mb.push_indices(&[i0 + j0, i1 + j1, i0 + j1]);
        }
    }

    mb
}

/// A cylinder (or truncated cone) along +z with optional end caps.
///
/// Caps are only emitted where the corresponding radius is nonzero, so a true
/// cone is `cylinder(base, 0.0, height, slices)`. One of the radii may be
/// zero, not both.
pub fn cylinder(base_radius: f32, top_radius: f32, height: f32, slices: u32) -> MeshBuilder {
    assert!(slices >= 2 && (base_radius > 0.0 || top_radius > 0.0) && height > 0.0);

    let slices2 = slices * 2;
    let (sin_phi, cos_phi) = phi_tables(slices2);

    let mut mb = MeshBuilder::new(Topology::TriangleList);

    // Slant angle for the side normals.
    // TODO: this atan-based angle does not match the usual cone slant-normal
    // derivation; compare shading against a reference before changing it.
    let slant = PI / 2.0 * ((base_radius - top_radius) / height).atan();
    let sin_slant = slant.sin();
    let cos_slant = slant.cos();

    for i in 0..2u32 {
        let t = i as f32;
        let z = height * t;
        let width = base_radius + (top_radius - base_radius) * t;

        for j in 0..=slices2 as usize {
            mb.push_vertex(MeshVertex {
                position: [width * cos_phi[j], width * sin_phi[j], z],
                normal: [cos_slant * cos_phi[j], cos_slant * sin_phi[j], sin_slant],
                tex_coords: [j as f32 / slices2 as f32, t],
            });
        }
    }

    // body
    for j in 0..slices2 {
        let (i0, i1) = (0, slices2 + 1);
        let (j0, j1) = (j, j + 1);
        if base_radius > 0.0 {
            mb.push_indices(&[i0 + j0, i0 + j1, i1 + j1]);
        }
        if top_radius > 0.0 {
            mb.push_indices(&[i0 + j0, i1 + j1, i1 + j0]);
        }
    }

    // end caps as triangle fans
    if base_radius > 0.0 {
        cap(&mut mb, base_radius, 0.0, [0.0, 0.0, -1.0], &sin_phi, &cos_phi, true);
    }
    if top_radius > 0.0 {
        cap(&mut mb, top_radius, height, [0.0, 0.0, 1.0], &sin_phi, &cos_phi, false);
    }

    mb
}

/// A cone: a cylinder whose top radius is zero.
pub fn cone(base_radius: f32, height: f32, slices: u32) -> MeshBuilder {
    cylinder(base_radius, 0.0, height, slices)
}

fn cap(
    mb: &mut MeshBuilder,
    radius: f32,
    z: f32,
    normal: [f32; 3],
    sin_phi: &[f32],
    cos_phi: &[f32],
    flip: bool,
) {
    let slices2 = sin_phi.len() as u32 - 1;
    let center = mb.push_vertex(MeshVertex {
        position: [0.0, 0.0, z],
        normal,
        tex_coords: [0.5, 0.5],
    });
    for j in 0..=slices2 as usize {
        mb.push_vertex(MeshVertex {
            position: [radius * cos_phi[j], radius * sin_phi[j], z],
            normal,
            tex_coords: [0.5 + cos_phi[j] / 2.0, 0.5 + sin_phi[j] / 2.0],
        });
    }
    for j in 0..=slices2 {
        let a = (center + 1) + (j + 1) % slices2;
        let b = (center + 1) + j % slices2;
        if flip {
            mb.push_indices(&[center, a, b]);
        } else {
            mb.push_indices(&[center, b, a]);
        }
    }
}

fn phi_tables(slices2: u32) -> (Vec<f32>, Vec<f32>) {
    let mut sin_phi = Vec::with_capacity(slices2 as usize + 1);
    let mut cos_phi = Vec::with_capacity(slices2 as usize + 1);
    for j in 0..=slices2 {
        let phi = 2.0 * PI * j as f32 / slices2 as f32;
        sin_phi.push(phi.sin());
        cos_phi.push(phi.cos());
    }
    (sin_phi, cos_phi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertex_count_and_index_bounds() {
        let mb = sphere(1.0, 4, 4);
        assert_eq!(mb.vertices.len(), (4 * 2 + 1) * (4 + 1));
        let count = mb.vertices.len() as u32;
        assert!(mb.indices.iter().all(|&i| i < count));
        assert!(mb.build().validate().is_ok());
    }

    #[test]
    fn sphere_vertices_lie_on_the_radius() {
        let mb = sphere(2.0, 6, 5);
        for v in &mb.vertices {
            let r = (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2)).sqrt();
            assert!((r - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn cylinder_indices_in_bounds() {
        let mb = cylinder(1.0, 0.5, 2.0, 8);
        assert!(mb.build().validate().is_ok());
    }

    #[test]
    fn cone_has_only_one_cap() {
        let full = cylinder(1.0, 1.0, 1.0, 8).indices.len();
        let cone = cone(1.0, 1.0, 8).indices.len();
        assert!(cone < full);
        assert!(super::cone(1.0, 1.0, 8).build().validate().is_ok());
    }

    #[test]
    #[should_panic]
    fn sphere_rejects_too_few_slices() {
        sphere(1.0, 1, 4);
    }

    #[test]
    #[should_panic]
    fn cylinder_rejects_two_zero_radii() {
        cylinder(0.0, 0.0, 1.0, 8);
    }
}
