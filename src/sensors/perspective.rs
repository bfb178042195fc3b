// Copyright @yucwang 2026

use crate::core::sensor::Sensor;
use crate::math::constants::{Float, Vector2f, Vector3f};

pub struct PerspectiveCamera {
    origin: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov_y: Float,
    aspect: Float,
    near_clip: Float,
    far_clip: Float,
    shutter_open: Float,
    shutter_open_time: Float,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(Vector3f::zeros(),
                  Vector3f::new(0.0, 0.0, -1.0),
                  Vector3f::new(0.0, 1.0, 0.0),
                  std::f32::consts::FRAC_PI_2,
                  1.0,
                  1e-2,
                  1e4)
    }
}

impl PerspectiveCamera {
    pub fn new(origin: Vector3f,
               target: Vector3f,
               up: Vector3f,
               fov_y_radians: Float,
               aspect: Float,
               near_clip: Float,
               far_clip: Float) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward).normalize();

        Self {
            origin,
            forward,
            right,
            up,
            tan_half_fov_y: (0.5 * fov_y_radians).tan(),
            aspect,
            near_clip,
            far_clip,
            shutter_open: 0.0,
            shutter_open_time: 0.0,
        }
    }

    pub fn with_shutter(mut self, shutter_open: Float, shutter_open_time: Float) -> Self {
        self.shutter_open = shutter_open;
        self.shutter_open_time = shutter_open_time.max(0.0);
        self
    }
}

impl Sensor for PerspectiveCamera {
    fn shutter_open(&self) -> Float {
        self.shutter_open
    }

    fn shutter_open_time(&self) -> Float {
        self.shutter_open_time
    }

    fn project(&self, p: &Vector3f) -> Option<Vector2f> {
        let d = p - self.origin;
        let z = d.dot(&self.forward);
        if z < self.near_clip || z > self.far_clip {
            return None;
        }

        let px = d.dot(&self.right) / (z * self.aspect * self.tan_half_fov_y);
        let py = d.dot(&self.up) / (z * self.tan_half_fov_y);
        if px.abs() > 1.0 || py.abs() > 1.0 {
            return None;
        }
        Some(Vector2f::new(0.5 * (px + 1.0), 0.5 * (1.0 - py)))
    }

    fn describe(&self) -> String {
        format!("PerspectiveCamera\n  origin: {:?}\n  forward: {:?}\n  shutter: [{}, {}]",
                self.origin, self.forward, self.shutter_open, self.shutter_open + self.shutter_open_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perspective_camera_center_projection() {
        let cam = PerspectiveCamera::default();

        let uv = cam.project(&Vector3f::new(0.0, 0.0, -5.0)).expect("point should be in view");
        assert!((uv.x - 0.5).abs() < 1e-6);
        assert!((uv.y - 0.5).abs() < 1e-6);

        assert!(cam.project(&Vector3f::new(0.0, 0.0, 5.0)).is_none());
        assert!(cam.project(&Vector3f::new(10.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn test_shutter_time_sampling() {
        let cam = PerspectiveCamera::default();
        assert!(!cam.needs_time_sample());

        let cam = PerspectiveCamera::default().with_shutter(1.0, 0.5);
        assert!(cam.needs_time_sample());
        assert!((cam.sample_time(0.5) - 1.25).abs() < 1e-6);
    }
}
