// Copyright @yucwang 2026

use crate::core::sampler::Sampler;
use crate::math::constants::{Float, Vector3f};

/// Directions are in world space; `wi` points back along the incoming path.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseFunctionSampleRecord {
    pub wi: Vector3f,
    pub wo: Vector3f,
}

impl PhaseFunctionSampleRecord {
    pub fn new(wi: Vector3f) -> Self {
        Self { wi, wo: Vector3f::zeros() }
    }

    pub fn reversed(&self) -> Self {
        Self { wi: self.wo, wo: self.wi }
    }
}

pub trait PhaseFunction: Send + Sync {
    /// Samples `wo` and returns `eval / pdf`.
    fn sample(&self, record: &mut PhaseFunctionSampleRecord, sampler: &mut dyn Sampler) -> Float;
    fn eval(&self, record: &PhaseFunctionSampleRecord) -> Float;
    fn pdf(&self, record: &PhaseFunctionSampleRecord) -> Float;
}
