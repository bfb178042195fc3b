// Copyright @yucwang 2026

use crate::core::medium::{Medium, MediumSample, MediumSampleRecord};
use crate::core::phase::PhaseFunction;
use crate::core::sampler::Sampler;
use crate::media::isotropic::IsotropicPhaseFunction;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, Spectrum};
use std::sync::Arc;

/// Medium with constant coefficients. Distances are sampled from the
/// extinction of one colour channel picked uniformly at random, and the
/// densities reported are averaged over the three channels.
pub struct HomogeneousMedium {
    sigma_t: RGBSpectrum,
    albedo: RGBSpectrum,
    scale: Float,
    phase: Arc<dyn PhaseFunction>,
}

impl HomogeneousMedium {
    pub fn new(sigma_t: RGBSpectrum, albedo: RGBSpectrum) -> Self {
        Self {
            sigma_t,
            albedo: clamp_spectrum(albedo),
            scale: 1.0,
            phase: Arc::new(IsotropicPhaseFunction),
        }
    }

    pub fn with_scale(mut self, scale: Float) -> Self {
        self.scale = scale;
        self
    }

    fn extinction(&self) -> RGBSpectrum {
        self.sigma_t * self.scale
    }
}

impl Medium for HomogeneousMedium {
    fn sigma_t(&self, _p_world: Vector3f) -> RGBSpectrum {
        self.extinction()
    }

    fn albedo(&self, _p_world: Vector3f) -> RGBSpectrum {
        self.albedo
    }

    fn phase_function(&self) -> &dyn PhaseFunction {
        self.phase.as_ref()
    }

    fn sample_distance(&self, ray: &Ray3f, sampler: &mut dyn Sampler) -> MediumSample {
        let sigma_t = self.extinction();
        let mut u = sampler.next_1d() * 3.0;
        let channel = (u as usize).min(2);
        u -= channel as Float;

        let density = sigma_t[channel];
        let sampled = if density > 0.0 {
            -(1.0 - u).ln() / density
        } else {
            std::f32::INFINITY
        };
        let dist_surf = ray.max_t - ray.min_t;

        if sampled < dist_surf {
            let t = ray.min_t + sampled;
            let p = ray.at(t);
            let transmittance = (sigma_t * -sampled).exp();
            let pdf_success = (sigma_t * transmittance).average();
            if pdf_success <= 0.0 {
                return MediumSample::Passed {
                    transmittance: RGBSpectrum::default(),
                    pdf_failure: 0.0,
                };
            }
            MediumSample::Interaction(MediumSampleRecord {
                t,
                p,
                time: ray.time,
                sigma_s: self.sigma_s(p),
                transmittance,
                pdf_success,
            })
        } else if !dist_surf.is_finite() {
            MediumSample::Passed {
                transmittance: RGBSpectrum::default(),
                pdf_failure: 0.0,
            }
        } else {
            let transmittance = (sigma_t * -dist_surf).exp();
            MediumSample::Passed {
                transmittance,
                pdf_failure: transmittance.average(),
            }
        }
    }
}

fn clamp_spectrum(value: RGBSpectrum) -> RGBSpectrum {
    RGBSpectrum::new(
        value[0].clamp(0.0, 1.0),
        value[1].clamp(0.0, 1.0),
        value[2].clamp(0.0, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::IndependentSampler;

    fn ray(length: Float) -> Ray3f {
        Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), Some(0.0), Some(length))
    }

    #[test]
    fn test_scatter_weight_is_albedo() {
        let medium = HomogeneousMedium::new(RGBSpectrum::splat(2.0), RGBSpectrum::splat(0.6));
        let mut sampler = IndependentSampler::new(1);
        let mut interactions = 0;
        for index in 0..256 {
            sampler.set_sample_index(index);
            if let MediumSample::Interaction(rec) = medium.sample_distance(&ray(std::f32::INFINITY), &mut sampler) {
                let weight = rec.sigma_s * rec.transmittance / rec.pdf_success;
                assert!((weight[0] - 0.6).abs() < 1e-3);
                assert!(rec.t >= 0.0);
                interactions += 1;
            }
        }
        assert_eq!(interactions, 256);
    }

    #[test]
    fn test_vacuum_never_scatters() {
        let medium = HomogeneousMedium::new(RGBSpectrum::default(), RGBSpectrum::splat(1.0));
        let mut sampler = IndependentSampler::new(3);
        match medium.sample_distance(&ray(5.0), &mut sampler) {
            MediumSample::Passed { transmittance, pdf_failure } => {
                assert_eq!(transmittance, RGBSpectrum::splat(1.0));
                assert_eq!(pdf_failure, 1.0);
            }
            MediumSample::Interaction(_) => panic!("vacuum should not scatter"),
        }
    }

    #[test]
    fn test_surface_weight_is_one_for_grey_medium() {
        let medium = HomogeneousMedium::new(RGBSpectrum::splat(0.5), RGBSpectrum::splat(1.0));
        let mut sampler = IndependentSampler::new(5);
        for index in 0..64 {
            sampler.set_sample_index(index);
            if let MediumSample::Passed { transmittance, pdf_failure } = medium.sample_distance(&ray(0.1), &mut sampler) {
                assert!((transmittance[0] / pdf_failure - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_escape_through_transparent_channel_has_no_weight() {
        let medium = HomogeneousMedium::new(RGBSpectrum::new(1.0, 0.0, 1.0), RGBSpectrum::splat(0.5));
        let mut sampler = IndependentSampler::new(9);
        let mut passed = 0;
        for index in 0..128 {
            sampler.set_sample_index(index);
            if let MediumSample::Passed { transmittance, pdf_failure } = medium.sample_distance(&ray(std::f32::INFINITY), &mut sampler) {
                assert_eq!(transmittance, RGBSpectrum::default());
                assert_eq!(pdf_failure, 0.0);
                passed += 1;
            }
        }
        assert!(passed > 0);
    }
}
