// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFComponent, BSDFSampleRecord, BSDFValue, Measure, BSDF};
use crate::core::computation_node::{ComputationNode, generate_node_id};
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::frame::Frame;
use crate::math::spectrum::RGBSpectrum;

/// Perfectly specular reflector.
pub struct MirrorBSDF {
    id: String,
    reflectance: RGBSpectrum,
}

impl MirrorBSDF {
    pub fn new(reflectance: RGBSpectrum) -> Self {
        Self {
            id: generate_node_id("MirrorBSDF"),
            reflectance,
        }
    }
}

impl ComputationNode for MirrorBSDF {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("MirrorBSDF [id={}]", self.id)
    }
}

fn reflect(wi: &Vector3f) -> Vector3f {
    Vector3f::new(-wi.x, -wi.y, wi.z)
}

fn is_reflection(record: &BSDFSampleRecord) -> bool {
    (reflect(&record.wi) - record.wo).norm() < 1e-4
}

impl BSDF for MirrorBSDF {
    fn flags(&self) -> BSDFComponent {
        BSDFComponent::DELTA_REFLECTION
    }

    fn sample(&self, record: &mut BSDFSampleRecord, _u: &Vector2f) -> BSDFValue {
        if Frame::cos_theta(&record.wi) == 0.0 {
            return RGBSpectrum::default();
        }
        record.wo = reflect(&record.wi);
        record.pdf = 1.0;
        record.sampled_type = BSDFComponent::DELTA_REFLECTION;
        self.reflectance
    }

    fn eval(&self, record: &BSDFSampleRecord, measure: Measure) -> BSDFValue {
        if measure != Measure::Discrete || !is_reflection(record) {
            return RGBSpectrum::default();
        }
        self.reflectance
    }

    fn pdf(&self, record: &BSDFSampleRecord, measure: Measure) -> Float {
        if measure != Measure::Discrete || !is_reflection(record) {
            return 0.0;
        }
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_reflects() {
        let bsdf = MirrorBSDF::new(RGBSpectrum::splat(0.9));
        let mut record = BSDFSampleRecord::default();
        record.wi = Vector3f::new(0.6, 0.0, 0.8);
        let weight = bsdf.sample(&mut record, &Vector2f::new(0.1, 0.1));
        assert_eq!(weight, RGBSpectrum::splat(0.9));
        assert!((record.wo - Vector3f::new(-0.6, 0.0, 0.8)).norm() < 1e-6);
        assert_eq!(record.measure(), Measure::Discrete);
        assert_eq!(bsdf.pdf(&record.reversed(), Measure::Discrete), 1.0);
        assert_eq!(bsdf.pdf(&record, Measure::SolidAngle), 0.0);
    }
}
