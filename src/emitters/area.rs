// Copyright @yucwang 2026

use crate::core::computation_node::{ComputationNode, generate_node_id};
use crate::core::emitter::{Emitter, EmitterFlag, PositionSampleRecord};
use crate::core::medium::Medium;
use crate::core::shape::Shape;
use crate::math::constants::{PI, Vector2f, Vector3f};
use crate::math::frame::Frame;
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::sample_cosine_hemisphere;
use std::sync::Arc;

/// Diffuse emission from one side of a shape.
pub struct AreaEmitter {
    id: String,
    shape: Arc<dyn Shape>,
    radiance: RGBSpectrum,
    medium: Option<Arc<dyn Medium>>,
}

impl AreaEmitter {
    pub fn from_shape(shape: Arc<dyn Shape>, radiance: RGBSpectrum) -> Self {
        Self { id: generate_node_id("AreaEmitter"), shape, radiance, medium: None }
    }

    pub fn with_medium(mut self, medium: Option<Arc<dyn Medium>>) -> Self {
        self.medium = medium;
        self
    }
}

impl ComputationNode for AreaEmitter {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("AreaEmitter [id={}, shape={}]", self.id, self.shape.id())
    }
}

impl Emitter for AreaEmitter {
    fn get_flag(&self) -> EmitterFlag {
        EmitterFlag::SURFACE
    }

    fn power(&self) -> RGBSpectrum {
        self.radiance * (PI * self.shape.surface_area())
    }

    fn medium(&self) -> Option<Arc<dyn Medium>> {
        self.medium.clone()
    }

    fn sample_position(&self, p_rec: &mut PositionSampleRecord, u: &Vector2f) -> RGBSpectrum {
        let sample = self.shape.sample(u);
        p_rec.p = sample.intersection().p();
        p_rec.n = sample.intersection().geo_normal();
        p_rec.pdf = sample.pdf();
        if p_rec.pdf <= 0.0 {
            return RGBSpectrum::default();
        }
        self.radiance * (PI / p_rec.pdf)
    }

    fn sample_direction(&self, p_rec: &PositionSampleRecord, u: &Vector2f) -> (Vector3f, RGBSpectrum) {
        let local_dir = sample_cosine_hemisphere(u);
        let frame = Frame::from_normal(&p_rec.n);
        (frame.to_world(&local_dir), RGBSpectrum::splat(1.0))
    }
}
