// Copyright @yucwang 2023

use crate::core::interaction::SurfaceIntersection;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;

// Definitions of types used in BSDF sampling and eval
// processes
pub type BSDFValue = RGBSpectrum;

/// Set of scattering components, either offered by a BSDF or picked by a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BSDFComponent(u32);

impl BSDFComponent {
    pub const NONE: Self = Self(0);
    pub const NULL: Self = Self(1 << 0);
    pub const DIFFUSE_REFLECTION: Self = Self(1 << 1);
    pub const DELTA_REFLECTION: Self = Self(1 << 2);
    pub const DELTA_TRANSMISSION: Self = Self(1 << 3);

    pub const DELTA: Self = Self(Self::NULL.0 | Self::DELTA_REFLECTION.0 | Self::DELTA_TRANSMISSION.0);
    pub const SMOOTH: Self = Self::DIFFUSE_REFLECTION;

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for BSDFComponent {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Density measure used by `eval` and `pdf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    SolidAngle,
    Discrete,
}

/// Directions are expressed in the local shading frame; `wi` points back
/// along the path the particle arrived from.
#[derive(Debug, Clone, PartialEq)]
pub struct BSDFSampleRecord {
    pub wi: Vector3f,
    pub wo: Vector3f,
    pub pdf: Float,
    pub uv: Vector2f,
    pub sampled_type: BSDFComponent,
}

impl Default for BSDFSampleRecord {
    fn default() -> Self {
        Self {
            wi: Vector3f::zeros(),
            wo: Vector3f::zeros(),
            pdf: 0.0,
            uv: Vector2f::new(0.0, 0.0),
            sampled_type: BSDFComponent::NONE,
        }
    }
}

impl BSDFSampleRecord {
    pub fn new(its: &SurfaceIntersection, wi_world: &Vector3f) -> Self {
        Self {
            wi: its.to_local(wi_world),
            uv: its.uv(),
            ..Self::default()
        }
    }

    /// The same record with `wi` and `wo` exchanged, used to query the
    /// reverse direction of a sampled scattering event.
    pub fn reversed(&self) -> Self {
        Self {
            wi: self.wo,
            wo: self.wi,
            ..self.clone()
        }
    }

    pub fn measure(&self) -> Measure {
        if self.sampled_type.contains(BSDFComponent::DELTA) {
            Measure::Discrete
        } else {
            Measure::SolidAngle
        }
    }
}

pub trait BSDF: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn flags(&self) -> BSDFComponent;

    fn is_null(&self) -> bool {
        self.flags() == BSDFComponent::NULL
    }

    /// Samples `wo`, fills `pdf` and `sampled_type`, and returns
    /// `f * |cos(wo)| / pdf`, or zero when the sample is invalid.
    fn sample(&self, record: &mut BSDFSampleRecord, u: &Vector2f) -> BSDFValue;

    /// Returns `f * |cos(wo)|` for the directions in `record`.
    fn eval(&self, record: &BSDFSampleRecord, measure: Measure) -> BSDFValue;

    fn pdf(&self, record: &BSDFSampleRecord, measure: Measure) -> Float;
}
