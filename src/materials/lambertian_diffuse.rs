// Copyright @yucwang 2023

use crate::core::bsdf::{BSDFComponent, BSDFSampleRecord, BSDFValue, Measure, BSDF};
use crate::core::computation_node::{ComputationNode, generate_node_id};
use crate::math::constants::{ Float, INV_PI, Vector2f };
use crate::math::frame::Frame;
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{ sample_cosine_hemisphere, sample_cosine_hemisphere_pdf };

/// Two-sided Lambertian reflector.
pub struct LambertianDiffuseBSDF {
    id: String,
    color: RGBSpectrum
}

impl ComputationNode for LambertianDiffuseBSDF {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("LambertianDiffuseBSDF [id={}, reflectance={:?}]", self.id, self.color)
    }
}

impl BSDF for LambertianDiffuseBSDF {
    fn flags(&self) -> BSDFComponent {
        BSDFComponent::DIFFUSE_REFLECTION
    }

    fn sample(&self, record: &mut BSDFSampleRecord, u: &Vector2f) -> BSDFValue {
        let cos_wi = Frame::cos_theta(&record.wi);
        if cos_wi == 0.0 {
            return RGBSpectrum::default();
        }

        record.wo = sample_cosine_hemisphere(u);
        if cos_wi < 0.0 {
            record.wo.z *= -1.0;
        }
        record.sampled_type = BSDFComponent::DIFFUSE_REFLECTION;
        record.pdf = sample_cosine_hemisphere_pdf(Frame::cos_theta(&record.wo).abs());
        if record.pdf <= 0.0 {
            return RGBSpectrum::default();
        }

        self.color
    }

    fn eval(&self, record: &BSDFSampleRecord, measure: Measure) -> BSDFValue {
        if measure != Measure::SolidAngle || !same_hemisphere(record) {
            return RGBSpectrum::default();
        }

        self.color * (INV_PI * Frame::cos_theta(&record.wo).abs())
    }

    fn pdf(&self, record: &BSDFSampleRecord, measure: Measure) -> Float {
        if measure != Measure::SolidAngle || !same_hemisphere(record) {
            return 0.0;
        }

        sample_cosine_hemisphere_pdf(Frame::cos_theta(&record.wo).abs())
    }
}

impl LambertianDiffuseBSDF {
    pub fn new(rgb: RGBSpectrum) -> Self {
        Self {
            id: generate_node_id("LambertianDiffuseBSDF"),
            color: rgb,
        }
    }
}

fn same_hemisphere(record: &BSDFSampleRecord) -> bool {
    Frame::cos_theta(&record.wi) * Frame::cos_theta(&record.wo) > 0.0
}
