//! Viewer data structures: meshes, shapes, instances, bounds and textures.
//!
//! - `mesh` contains the mesh builder and its immutable build result
//! - `shapes` contains the procedural sphere/cylinder/cone generators
//! - `instance` holds per-instance transform/color data and the scatter generator
//! - `bounds` computes per-instance world-space AABBs and wireframe proxies
//! - `model` owns uploaded GPU meshes and the drawable model
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod bounds;
pub mod instance;
pub mod mesh;
pub mod model;
pub mod shapes;
pub mod texture;
