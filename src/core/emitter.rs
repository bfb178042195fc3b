// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::medium::Medium;
use crate::math::constants::{EPSILON, Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterFlag(u8);

impl EmitterFlag {
    pub const NONE: Self = Self(0);
    pub const DIRECTION: Self = Self(1 << 0);
    pub const SURFACE: Self = Self(1 << 1);
    pub const DELTA_POSITION: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }
}

impl std::ops::BitOr for EmitterFlag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// A sampled position on an emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSampleRecord {
    pub p: Vector3f,
    pub n: Vector3f,
    pub time: Float,
    pub pdf: Float,
    /// Index of the emitter within the scene; set by `Scene` sampling.
    pub emitter: Option<usize>,
}

impl PositionSampleRecord {
    pub fn new(time: Float) -> Self {
        Self {
            p: Vector3f::zeros(),
            n: Vector3f::zeros(),
            time,
            pdf: 0.0,
            emitter: None,
        }
    }
}

pub trait Emitter: ComputationNode + Send + Sync {
    fn get_flag(&self) -> EmitterFlag;

    /// Total emitted power, used to build the emitter selection distribution.
    fn power(&self) -> RGBSpectrum;

    fn medium(&self) -> Option<Arc<dyn Medium>>;

    fn needs_direction_sample(&self) -> bool {
        true
    }

    /// Fills the position part of `p_rec` and returns the emitted power
    /// divided by the position density.
    fn sample_position(&self, p_rec: &mut PositionSampleRecord, u: &Vector2f) -> RGBSpectrum;

    /// Samples a departure direction and returns it with its directional weight.
    fn sample_direction(&self, p_rec: &PositionSampleRecord, u: &Vector2f) -> (Vector3f, RGBSpectrum);

    /// Joint position and direction sample.
    fn sample_ray(&self, u_pos: &Vector2f, u_dir: &Vector2f, time: Float) -> (Ray3f, RGBSpectrum) {
        let mut p_rec = PositionSampleRecord::new(time);
        let mut power = self.sample_position(&mut p_rec, u_pos);
        let u_dir = if self.needs_direction_sample() { *u_dir } else { Vector2f::new(0.5, 0.5) };
        let (direction, weight) = self.sample_direction(&p_rec, &u_dir);
        power *= weight;
        (Ray3f::new(p_rec.p, direction, Some(EPSILON), None).with_time(time), power)
    }
}
