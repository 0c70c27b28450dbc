//! Orbit camera and perspective projection.
//!
//! The camera orbits the origin: scroll controls the distance, dragging the
//! pointer maps its position against the window center onto yaw and pitch.
//! Matrices are derived on the CPU each frame and pushed through the model
//! uniforms.

use std::f32::consts::TAU;

use cgmath::{Matrix4, Rad, Vector3};

/// wgpu clip space covers z in 0..1 where OpenGL-style projections emit
/// -1..1, so every projection matrix gets remapped through this.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Orbital camera state: distance from the origin plus pitch and yaw.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl OrbitCamera {
    pub const MAX_DISTANCE: f32 = 200.0;

    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(0.0, 0.0, -self.distance))
            * Matrix4::from_angle_x(Rad(self.pitch))
            * Matrix4::from_angle_y(Rad(self.yaw))
    }

    /// Scroll moves the camera: scrolling down backs away, scrolling up
    /// closes in, one unit per line, clamped to `0..=MAX_DISTANCE`.
    pub fn handle_scroll(&mut self, delta: f32) {
        self.distance = if delta < 0.0 {
            self.distance + 1.0
        } else {
            self.distance - 1.0
        };
        self.distance = self.distance.clamp(0.0, Self::MAX_DISTANCE);
    }

    /// Map an absolute cursor position onto yaw/pitch: the window center is
    /// neutral, each edge is a full turn.
    pub fn handle_drag(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let xmid = width / 2.0;
        let ymid = height / 2.0;
        if xmid > 0.0 && ymid > 0.0 {
            self.yaw = (x - xmid) * (TAU / xmid);
            self.pitch = (y - ymid) * (TAU / ymid);
        }
    }
}

/// Perspective projection, resized with the surface.
#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: Rad<f32>, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::SquareMatrix;

    use super::*;

    #[test]
    fn scroll_clamps_the_distance() {
        let mut camera = OrbitCamera::new(0.5);
        camera.handle_scroll(1.0);
        assert_eq!(camera.distance, 0.0);
        camera.handle_scroll(1.0);
        assert_eq!(camera.distance, 0.0);

        camera.distance = OrbitCamera::MAX_DISTANCE - 0.5;
        camera.handle_scroll(-1.0);
        assert_eq!(camera.distance, OrbitCamera::MAX_DISTANCE);
    }

    #[test]
    fn dragging_to_the_center_is_neutral() {
        let mut camera = OrbitCamera::new(20.0);
        camera.handle_drag(500.0, 350.0, 1000.0, 700.0);
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.pitch, 0.0);
    }

    #[test]
    fn view_matrix_at_zero_distance_and_angles_is_identity() {
        let camera = OrbitCamera {
            distance: 0.0,
            pitch: 0.0,
            yaw: 0.0,
        };
        assert_eq!(camera.view_matrix(), Matrix4::identity());
    }
}
