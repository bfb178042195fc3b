// Copyright @yucwang 2026

use crate::core::computation_node::{ComputationNode, generate_node_id};
use crate::core::emitter::{Emitter, EmitterFlag, PositionSampleRecord};
use crate::core::medium::Medium;
use crate::math::constants::{PI, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::sample_uniform_sphere;
use std::sync::Arc;

/// Isotropic point light.
pub struct PointEmitter {
    id: String,
    position: Vector3f,
    intensity: RGBSpectrum,
    medium: Option<Arc<dyn Medium>>,
}

impl PointEmitter {
    pub fn new(position: Vector3f, intensity: RGBSpectrum) -> Self {
        Self { id: generate_node_id("PointEmitter"), position, intensity, medium: None }
    }

    pub fn with_medium(mut self, medium: Option<Arc<dyn Medium>>) -> Self {
        self.medium = medium;
        self
    }
}

impl ComputationNode for PointEmitter {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("PointEmitter [id={}, position={:?}]", self.id, self.position)
    }
}

impl Emitter for PointEmitter {
    fn get_flag(&self) -> EmitterFlag {
        EmitterFlag::DELTA_POSITION
    }

    fn power(&self) -> RGBSpectrum {
        self.intensity * (4.0 * PI)
    }

    fn medium(&self) -> Option<Arc<dyn Medium>> {
        self.medium.clone()
    }

    fn sample_position(&self, p_rec: &mut PositionSampleRecord, _u: &Vector2f) -> RGBSpectrum {
        p_rec.p = self.position;
        p_rec.n = Vector3f::zeros();
        p_rec.pdf = 1.0;
        self.power()
    }

    fn sample_direction(&self, _p_rec: &PositionSampleRecord, u: &Vector2f) -> (Vector3f, RGBSpectrum) {
        (sample_uniform_sphere(u), RGBSpectrum::splat(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_ray_starts_at_light() {
        let light = PointEmitter::new(Vector3f::new(1.0, 2.0, 3.0), RGBSpectrum::splat(1.0));
        let (ray, power) = light.sample_ray(&Vector2f::new(0.1, 0.2), &Vector2f::new(0.3, 0.4), 0.5);
        assert_eq!(ray.origin(), Vector3f::new(1.0, 2.0, 3.0));
        assert!((ray.dir().norm() - 1.0).abs() < 1e-5);
        assert_eq!(ray.time, 0.5);
        assert!((power[0] - 4.0 * PI).abs() < 1e-4);
        assert!(light.get_flag().contains(EmitterFlag::DELTA_POSITION));
    }
}
