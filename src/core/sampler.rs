// Copyright @yucwang 2026

use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector2f};

/// Source of sample values for one particle at a time.
///
/// `set_sample_index` must fully determine the sequence that follows, so a
/// particle's walk depends only on its index and not on which worker runs it.
pub trait Sampler: Send + Sync {
    fn clone_box(&self) -> Box<dyn Sampler>;
    fn set_sample_index(&mut self, index: u64);
    fn next_1d(&mut self) -> Float;
    fn next_2d(&mut self) -> Vector2f {
        let u = self.next_1d();
        let v = self.next_1d();
        Vector2f::new(u, v)
    }
}

#[derive(Debug, Clone)]
pub struct IndependentSampler {
    seed: u64,
    rng: LcgRng,
}

impl IndependentSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed, rng: LcgRng::with_stream(seed, 0) }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Sampler for IndependentSampler {
    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }

    fn set_sample_index(&mut self, index: u64) {
        self.rng = LcgRng::with_stream(self.seed, index);
    }

    fn next_1d(&mut self) -> Float {
        self.rng.next_f32()
    }
}
