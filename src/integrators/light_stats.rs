// Copyright @yucwang 2026

use crate::core::bsdf::BSDFComponent;
use crate::core::emitter::PositionSampleRecord;
use crate::core::medium::Medium;
use crate::core::particle_handler::{MediumInteractionEvent, ParticleHandler, SurfaceInteractionEvent};
use crate::core::sensor::Sensor;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::{RGBSpectrum, Spectrum};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightStats {
    pub particles: u64,
    pub surface_interactions: u64,
    pub medium_interactions: u64,
    pub null_interactions: u64,
    /// Interactions projecting onto the sensor's image plane.
    pub visible_interactions: u64,
    /// Interaction count per depth; index 0 is unused.
    pub depth_histogram: Vec<u64>,
    /// Sum of throughput times power over all scattering interactions.
    pub deposited_power: RGBSpectrum,
    pub emitted_power: RGBSpectrum,
}

impl LightStats {
    pub fn interactions(&self) -> u64 {
        self.surface_interactions + self.medium_interactions
    }

    pub fn mean_depth(&self) -> Float {
        let total = self.depth_histogram.iter().sum::<u64>();
        if total == 0 {
            return 0.0;
        }
        let weighted: u64 = self.depth_histogram.iter().enumerate()
            .map(|(depth, count)| depth as u64 * count)
            .sum();
        weighted as Float / total as Float
    }

    pub fn merge(&mut self, other: &LightStats) {
        self.particles += other.particles;
        self.surface_interactions += other.surface_interactions;
        self.medium_interactions += other.medium_interactions;
        self.null_interactions += other.null_interactions;
        self.visible_interactions += other.visible_interactions;
        if self.depth_histogram.len() < other.depth_histogram.len() {
            self.depth_histogram.resize(other.depth_histogram.len(), 0);
        }
        for (slot, count) in self.depth_histogram.iter_mut().zip(other.depth_histogram.iter()) {
            *slot += count;
        }
        self.deposited_power += other.deposited_power;
        self.emitted_power += other.emitted_power;
    }

    fn record_depth(&mut self, depth: i32) {
        let depth = depth.max(0) as usize;
        if self.depth_histogram.len() <= depth {
            self.depth_histogram.resize(depth + 1, 0);
        }
        self.depth_histogram[depth] += 1;
    }
}

/// Trace-mode handler that tallies what particles do in the scene.
pub struct LightStatistics {
    sensor: Option<Arc<dyn Sensor>>,
    stats: LightStats,
}

impl LightStatistics {
    pub fn new(sensor: Option<Arc<dyn Sensor>>) -> Self {
        Self { sensor, stats: LightStats::default() }
    }

    pub fn stats(&self) -> &LightStats {
        &self.stats
    }

    fn is_visible(&self, p: &Vector3f) -> bool {
        self.sensor.as_ref().map_or(false, |sensor| sensor.project(p).is_some())
    }
}

impl ParticleHandler for LightStatistics {
    type Output = LightStats;

    fn handle_emission(&mut self, _p_rec: &PositionSampleRecord, _medium: Option<&dyn Medium>, weight: &RGBSpectrum) {
        self.stats.particles += 1;
        self.stats.emitted_power += *weight;
    }

    fn handle_new_particle(&mut self) {
        self.stats.particles += 1;
    }

    fn handle_surface_interaction(&mut self, event: &SurfaceInteractionEvent) {
        if event.bsdf_record.sampled_type.contains(BSDFComponent::NULL) {
            self.stats.null_interactions += 1;
            return;
        }
        self.stats.surface_interactions += 1;
        self.stats.record_depth(event.depth);
        if event.weight.is_valid() {
            self.stats.deposited_power += event.weight;
        }
        if self.is_visible(&event.its.p()) {
            self.stats.visible_interactions += 1;
        }
    }

    fn handle_medium_interaction(&mut self, event: &MediumInteractionEvent) {
        self.stats.medium_interactions += 1;
        self.stats.record_depth(event.depth);
        if event.weight.is_valid() {
            self.stats.deposited_power += event.weight;
        }
        if self.is_visible(&event.record.p) {
            self.stats.visible_interactions += 1;
        }
    }

    fn take_output(&mut self) -> LightStats {
        std::mem::take(&mut self.stats)
    }

    fn result_count(output: &LightStats) -> u64 {
        output.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle_process::{ParticleMode, ParticleProcess};
    use crate::core::particle_tracer::TracerConfig;
    use crate::core::resources::Resources;
    use crate::core::sampler::IndependentSampler;
    use crate::core::scene::{Scene, SceneObject};
    use crate::emitters::point::PointEmitter;
    use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
    use crate::materials::null::NullBSDF;
    use crate::media::homogeneous_medium::HomogeneousMedium;
    use crate::renderers::scheduler::Scheduler;
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::shapes::sphere::Sphere;
    use indicatif::ProgressBar;
    use std::sync::atomic::AtomicBool;

    fn run(scene: Scene, config: TracerConfig, work_count: u64) -> LightStats {
        let sensor: Arc<dyn Sensor> = Arc::new(PerspectiveCamera::new(
            Vector3f::new(0.0, 0.0, 0.5), Vector3f::new(0.0, 0.0, -1.0), Vector3f::new(0.0, 1.0, 0.0),
            std::f32::consts::FRAC_PI_2, 1.0, 1e-2, 1e3));
        let resources = Resources::for_particle_tracing(Arc::new(scene), Box::new(IndependentSampler::new(2)), sensor.clone());
        let scheduler = Scheduler::new(Some(3));
        let process = ParticleProcess::new(ParticleMode::Trace, work_count, 0, 3, "stats")
            .with_progress_bar(ProgressBar::hidden());

        let mut total = LightStats::default();
        scheduler.run(&process, config, &resources,
                      |_| LightStatistics::new(Some(sensor.clone())),
                      |stats| total.merge(&stats),
                      &AtomicBool::new(false)).expect("run");
        total
    }

    fn closed_sphere() -> Scene {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::zeros(), 1.0)),
                                          Arc::new(LambertianDiffuseBSDF::new(RGBSpectrum::splat(0.5)))));
        scene.add_emitter(Arc::new(PointEmitter::new(Vector3f::zeros(), RGBSpectrum::splat(1.0))));
        scene
    }

    #[test]
    fn test_totals_agree_with_work_count() {
        let stats = run(closed_sphere(), TracerConfig::new(4, 10, false).unwrap(), 600);
        assert_eq!(stats.particles, 600);
        assert_eq!(stats.surface_interactions, 2400);
        assert_eq!(stats.depth_histogram, vec![0, 600, 600, 600, 600]);
        assert_eq!(stats.medium_interactions, 0);
        assert!((stats.mean_depth() - 2.5).abs() < 1e-6);
        assert!(stats.visible_interactions > 0 && stats.visible_interactions < stats.surface_interactions);
    }

    #[test]
    fn test_emission_mode_counts_emitted_power() {
        let stats = run(closed_sphere(), TracerConfig::new(1, 10, true).unwrap(), 50);
        assert_eq!(stats.particles, 50);
        let expected = 50.0 * 4.0 * std::f32::consts::PI;
        assert!((stats.emitted_power[1] - expected).abs() < 1e-2 * expected);
    }

    #[test]
    fn test_null_boundaries_and_media_are_separated() {
        let medium: Arc<dyn Medium> = Arc::new(HomogeneousMedium::new(RGBSpectrum::splat(2.0), RGBSpectrum::splat(0.5)));
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::zeros(), 1.0)), Arc::new(NullBSDF::new(None)))
            .with_interior_medium(Some(medium.clone())));
        scene.add_emitter(Arc::new(PointEmitter::new(Vector3f::zeros(), RGBSpectrum::splat(1.0)).with_medium(Some(medium))));

        let stats = run(scene, TracerConfig::default(), 400);
        assert_eq!(stats.particles, 400);
        assert_eq!(stats.surface_interactions, 0);
        assert!(stats.medium_interactions > 0);
        assert!(stats.null_interactions > 0 && stats.null_interactions <= 400);
        assert_eq!(stats.depth_histogram.iter().sum::<u64>(), stats.interactions());
    }

    #[test]
    fn test_merge_extends_histogram() {
        let mut a = LightStats { particles: 1, depth_histogram: vec![0, 2], ..Default::default() };
        let b = LightStats { particles: 2, depth_histogram: vec![0, 1, 4, 1], ..Default::default() };
        a.merge(&b);
        assert_eq!(a.particles, 3);
        assert_eq!(a.depth_histogram, vec![0, 3, 4, 1]);
    }
}
