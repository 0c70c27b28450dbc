//! Render pipeline definitions: the instanced model pipeline, the wireframe
//! bounding-box pipeline and the 2D panel overlay pipeline.

pub mod model;
pub mod panel;
pub mod wireframe;
