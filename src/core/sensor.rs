// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f};

pub trait Sensor: Send + Sync {
    fn shutter_open(&self) -> Float;
    fn shutter_open_time(&self) -> Float;

    fn needs_time_sample(&self) -> bool {
        self.shutter_open_time() > 0.0
    }

    fn sample_time(&self, u: Float) -> Float {
        self.shutter_open() + u * self.shutter_open_time()
    }

    /// Normalised film coordinates of a world-space point, if it is in view.
    fn project(&self, p: &Vector3f) -> Option<Vector2f>;

    fn describe(&self) -> String {
        String::from("Sensor")
    }
}
