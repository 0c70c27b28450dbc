//! Loading of meshes and textures from external files.
//!
//! All paths are resolved relative to the `assets/` directory next to the
//! executable. Loaders are async so model and texture loading can be joined
//! during startup.

use std::io::{BufReader, Cursor};

use anyhow::Context as _;

use crate::data_structures::mesh::{MeshBuilder, MeshData, MeshVertex};

pub mod texture;

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    // TODO: pass env for absolute path from lib caller
    let path = std::path::Path::new("./").join("assets").join(file_name);
    let txt = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    // TODO: pass env for absolute path from lib caller
    let path = std::path::Path::new("./").join("assets").join(file_name);
    let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    Ok(data)
}

/// Load a Wavefront OBJ file and merge all of its sub-meshes into a single
/// triangle mesh.
///
/// Missing normals or texture coordinates are filled with zeroes; the v axis
/// of texture coordinates is flipped to match the texture origin convention.
pub async fn load_model_obj(file_name: &str) -> anyhow::Result<MeshData> {
    let obj_text: String = load_string(file_name).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, _materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            match load_string(&p).await {
                Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                Err(_) => {
                    log::warn!("material library {p} referenced by {file_name} not found");
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        },
    )
    .await?;

    let mut builder = MeshBuilder::default();
    for m in &models {
        let mesh = &m.mesh;
        let mut part = MeshBuilder::default();
        for i in 0..mesh.positions.len() / 3 {
            part.push_vertex(MeshVertex {
                position: [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
                normal: [
                    *mesh.normals.get(i * 3).unwrap_or(&0.0),
                    *mesh.normals.get(i * 3 + 1).unwrap_or(&0.0),
                    *mesh.normals.get(i * 3 + 2).unwrap_or(&0.0),
                ],
                tex_coords: [
                    *mesh.texcoords.get(i * 2).unwrap_or(&0.0),
                    1.0 - *mesh.texcoords.get(i * 2 + 1).unwrap_or(&0.0),
                ],
            });
        }
        part.push_indices(&mesh.indices);
        builder.append(&part);
    }

    let mesh = builder.build();
    mesh.validate()?;
    log::info!(
        "loaded {} with {} vertices, {} indices",
        file_name,
        mesh.vertices.len(),
        mesh.indices.len()
    );
    Ok(mesh)
}
