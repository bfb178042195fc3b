// Copyright @yucwang 2026

use crate::core::phase::{PhaseFunction, PhaseFunctionSampleRecord};
use crate::core::sampler::Sampler;
use crate::math::constants::Float;
use crate::math::warp::{sample_uniform_sphere, sample_uniform_sphere_pdf};

#[derive(Debug, Clone, Copy, Default)]
pub struct IsotropicPhaseFunction;

impl PhaseFunction for IsotropicPhaseFunction {
    fn sample(&self, record: &mut PhaseFunctionSampleRecord, sampler: &mut dyn Sampler) -> Float {
        record.wo = sample_uniform_sphere(&sampler.next_2d());
        1.0
    }

    fn eval(&self, _record: &PhaseFunctionSampleRecord) -> Float {
        sample_uniform_sphere_pdf()
    }

    fn pdf(&self, _record: &PhaseFunctionSampleRecord) -> Float {
        sample_uniform_sphere_pdf()
    }
}
