// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFComponent, BSDFSampleRecord, BSDFValue, Measure, BSDF};
use crate::core::computation_node::{ComputationNode, generate_node_id};
use crate::math::constants::{Float, Vector2f};
use crate::math::spectrum::RGBSpectrum;

/// Index-matched boundary: the particle passes straight through.
pub struct NullBSDF {
    id: String,
}

impl NullBSDF {
    pub fn new(id: Option<String>) -> Self {
        Self {
            id: id.unwrap_or_else(|| generate_node_id("NullBSDF")),
        }
    }
}

impl ComputationNode for NullBSDF {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("NullBSDF [id={}]", self.id)
    }
}

fn is_pass_through(record: &BSDFSampleRecord) -> bool {
    (record.wo + record.wi).norm() <= 1e-6
}

impl BSDF for NullBSDF {
    fn flags(&self) -> BSDFComponent {
        BSDFComponent::NULL
    }

    fn sample(&self, record: &mut BSDFSampleRecord, _u: &Vector2f) -> BSDFValue {
        record.wo = -record.wi;
        record.pdf = 1.0;
        record.sampled_type = BSDFComponent::NULL;
        RGBSpectrum::splat(1.0)
    }

    fn eval(&self, record: &BSDFSampleRecord, measure: Measure) -> BSDFValue {
        if measure != Measure::Discrete || !is_pass_through(record) {
            return RGBSpectrum::default();
        }
        RGBSpectrum::splat(1.0)
    }

    fn pdf(&self, record: &BSDFSampleRecord, measure: Measure) -> Float {
        if measure != Measure::Discrete || !is_pass_through(record) {
            return 0.0;
        }
        1.0
    }
}
