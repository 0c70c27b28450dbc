//! swarmview
//!
//! An interactive viewer for instanced meshes. A single mesh (a built-in
//! sphere or a loaded OBJ) is scattered a hundred times along a deterministic
//! ring, uploaded once with per-instance transforms and colours, and rendered
//! with a Phong-lit instanced pipeline. Per-instance bounding boxes can be
//! overlaid as wireframes and the material toggles are driven from a small
//! on-screen panel.
//!
//! High-level modules
//! - `camera`: orbit camera and the perspective projection
//! - `context`: central GPU and window context that owns device/queue/surface
//! - `data_structures`: meshes, shapes, instances, bounds, the drawable model
//! - `pipelines`: render pipelines (instanced model, wireframe, panel)
//! - `resources`: helpers to load OBJ models and textures from assets
//! - `viewer`: the scene, input handling and the main event loop
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod resources;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
