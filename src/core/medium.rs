// Copyright @yucwang 2026

use crate::core::phase::PhaseFunction;
use crate::core::sampler::Sampler;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;

/// A scattering event sampled inside a medium.
#[derive(Debug, Clone, PartialEq)]
pub struct MediumSampleRecord {
    pub t: Float,
    pub p: Vector3f,
    pub time: Float,
    pub sigma_s: RGBSpectrum,
    pub transmittance: RGBSpectrum,
    pub pdf_success: Float,
}

/// Outcome of a distance sample along `[min_t, max_t]` of a ray.
#[derive(Debug, Clone, PartialEq)]
pub enum MediumSample {
    Interaction(MediumSampleRecord),
    /// No collision before `max_t`; carries what the surface branch needs to
    /// compensate for the missed collision.
    Passed {
        transmittance: RGBSpectrum,
        pdf_failure: Float,
    },
}

pub trait Medium: Send + Sync {
    fn sigma_t(&self, p_world: Vector3f) -> RGBSpectrum;
    fn albedo(&self, p_world: Vector3f) -> RGBSpectrum;

    fn sigma_s(&self, p_world: Vector3f) -> RGBSpectrum {
        self.sigma_t(p_world) * self.albedo(p_world)
    }

    fn phase_function(&self) -> &dyn PhaseFunction;

    fn sample_distance(&self, ray: &Ray3f, sampler: &mut dyn Sampler) -> MediumSample;
}
