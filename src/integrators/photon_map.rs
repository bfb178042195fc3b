// Copyright @yucwang 2026

use crate::core::bsdf::BSDFComponent;
use crate::core::emitter::PositionSampleRecord;
use crate::core::error::Result;
use crate::core::medium::Medium;
use crate::core::particle_handler::{MediumInteractionEvent, ParticleHandler, SurfaceInteractionEvent};
use crate::core::particle_process::{ParticleMode, ParticleProcess};
use crate::core::particle_tracer::TracerConfig;
use crate::core::resources::Resources;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::renderers::scheduler::Scheduler;
use std::sync::atomic::{AtomicBool, Ordering};

/// A stored light-packet hit. `direction` points back along the incoming
/// path; `normal` is zero for volume photons.
#[derive(Debug, Clone, PartialEq)]
pub struct Photon {
    pub position: Vector3f,
    pub direction: Vector3f,
    pub normal: Vector3f,
    pub power: RGBSpectrum,
    pub depth: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotonBatch {
    pub surface: Vec<Photon>,
    pub volume: Vec<Photon>,
    pub particles: u64,
}

impl PhotonBatch {
    pub fn len(&self) -> usize {
        self.surface.len() + self.volume.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surface.is_empty() && self.volume.is_empty()
    }

    pub fn append(&mut self, mut other: PhotonBatch) {
        self.surface.append(&mut other.surface);
        self.volume.append(&mut other.volume);
        self.particles += other.particles;
    }
}

/// Records photons at non-specular surfaces and inside media.
pub struct PhotonGatherer {
    min_depth: i32,
    batch: PhotonBatch,
}

impl PhotonGatherer {
    /// Interactions with a depth below `min_depth` are not stored.
    pub fn new(min_depth: i32) -> Self {
        Self { min_depth, batch: PhotonBatch::default() }
    }
}

impl ParticleHandler for PhotonGatherer {
    type Output = PhotonBatch;

    fn handle_emission(&mut self, _p_rec: &PositionSampleRecord, _medium: Option<&dyn Medium>, _weight: &RGBSpectrum) {
        self.batch.particles += 1;
    }

    fn handle_new_particle(&mut self) {
        self.batch.particles += 1;
    }

    fn handle_surface_interaction(&mut self, event: &SurfaceInteractionEvent) {
        if event.depth < self.min_depth || !event.its.bsdf().flags().contains(BSDFComponent::SMOOTH) {
            return;
        }
        self.batch.surface.push(Photon {
            position: event.its.p(),
            direction: event.wi,
            normal: event.its.sh_normal(),
            power: event.weight,
            depth: event.depth,
        });
    }

    fn handle_medium_interaction(&mut self, event: &MediumInteractionEvent) {
        if event.depth < self.min_depth {
            return;
        }
        self.batch.volume.push(Photon {
            position: event.record.p,
            direction: event.wi,
            normal: Vector3f::zeros(),
            power: event.weight,
            depth: event.depth,
        });
    }

    fn take_output(&mut self) -> PhotonBatch {
        std::mem::take(&mut self.batch)
    }

    fn result_count(output: &PhotonBatch) -> u64 {
        output.len() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotonGatherSettings {
    pub photon_count: u64,
    pub min_depth: i32,
    pub granularity: u64,
    /// Gathering is abandoned when this many particles were emitted
    /// without storing a single photon.
    pub particle_limit: u64,
}

impl Default for PhotonGatherSettings {
    fn default() -> Self {
        Self { photon_count: 100_000, min_depth: 1, granularity: 0, particle_limit: 1_000_000 }
    }
}

/// Photons of a gathering run, with power already divided by the number
/// of emitted particles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotonMap {
    pub surface: Vec<Photon>,
    pub volume: Vec<Photon>,
    pub particles: u64,
}

impl PhotonMap {
    pub fn len(&self) -> usize {
        self.surface.len() + self.volume.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_power(&self) -> RGBSpectrum {
        self.surface.iter().chain(self.volume.iter())
            .fold(RGBSpectrum::default(), |acc, photon| acc + photon.power)
    }
}

/// Traces particles until `settings.photon_count` photons are stored.
/// Raises `stop` and returns what was gathered if the particle limit is hit
/// with an empty map.
pub fn gather_photons(scheduler: &Scheduler,
                      resources: &Resources,
                      config: TracerConfig,
                      settings: &PhotonGatherSettings,
                      stop: &AtomicBool) -> Result<PhotonMap> {
    let process = ParticleProcess::new(ParticleMode::Gather,
                                       settings.photon_count,
                                       settings.granularity,
                                       scheduler.worker_count(),
                                       "Gathering photons");

    let mut gathered = PhotonBatch::default();
    let min_depth = settings.min_depth;
    scheduler.run(&process, config, resources,
                  |_| PhotonGatherer::new(min_depth),
                  |batch| {
                      gathered.append(batch);
                      if gathered.is_empty() && gathered.particles >= settings.particle_limit
                          && !stop.load(Ordering::Relaxed) {
                          log::warn!("no photons stored after {} particles; does the scene contain \
                                      non-specular surfaces or media?", gathered.particles);
                          stop.store(true, Ordering::Relaxed);
                      }
                  },
                  stop)?;

    let scale = if gathered.particles > 0 { 1.0 / gathered.particles as Float } else { 0.0 };
    for photon in gathered.surface.iter_mut().chain(gathered.volume.iter_mut()) {
        photon.power *= scale;
    }

    log::info!("gathered {} surface and {} volume photons from {} particles",
               gathered.surface.len(), gathered.volume.len(), gathered.particles);

    Ok(PhotonMap {
        surface: gathered.surface,
        volume: gathered.volume,
        particles: gathered.particles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bsdf::BSDF;
    use crate::core::particle_tracer::ParticleTracer;
    use crate::core::range::WorkRange;
    use crate::core::sampler::IndependentSampler;
    use crate::core::scene::{Scene, SceneObject};
    use crate::emitters::point::PointEmitter;
    use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
    use crate::materials::mirror::MirrorBSDF;
    use crate::materials::null::NullBSDF;
    use crate::math::constants::PI;
    use crate::media::homogeneous_medium::HomogeneousMedium;
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::shapes::sphere::Sphere;
    use std::sync::Arc;

    fn closed_sphere(material: Arc<dyn BSDF>) -> Resources {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::zeros(), 1.0)), material));
        scene.add_emitter(Arc::new(PointEmitter::new(Vector3f::zeros(), RGBSpectrum::splat(1.0))));
        Resources::for_particle_tracing(Arc::new(scene),
                                        Box::new(IndependentSampler::new(11)),
                                        Arc::new(PerspectiveCamera::default()))
    }

    #[test]
    fn test_gathering_reaches_target_and_conserves_energy() {
        let resources = closed_sphere(Arc::new(LambertianDiffuseBSDF::new(RGBSpectrum::splat(0.5))));
        let settings = PhotonGatherSettings { photon_count: 20_000, granularity: 200, ..Default::default() };
        let stop = AtomicBool::new(false);
        let map = gather_photons(&Scheduler::new(Some(4)), &resources, TracerConfig::default(), &settings, &stop)
            .expect("gather");

        assert!(map.len() as u64 >= settings.photon_count);
        assert!(map.volume.is_empty());
        assert!(!stop.load(Ordering::Relaxed));
        assert!(map.surface.iter().all(|p| (p.position.norm() - 1.0).abs() < 1e-3 && p.depth >= 1));

        // Each particle deposits 4*pi on the first hit, then half as much per bounce on average.
        let expected = 8.0 * PI;
        let total = map.total_power();
        assert!((total[0] - expected).abs() < 0.05 * expected, "total power {:?}", total);
    }

    #[test]
    fn test_min_depth_skips_direct_hits() {
        let resources = closed_sphere(Arc::new(LambertianDiffuseBSDF::new(RGBSpectrum::splat(0.5))));
        let mut tracer = ParticleTracer::new(
            TracerConfig::new(3, 10, false).unwrap(), PhotonGatherer::new(2));
        tracer.prepare(&resources).unwrap();
        tracer.process(&WorkRange::new(0, 99), &AtomicBool::new(false)).unwrap();

        let batch = tracer.handler_mut().take_output();
        assert_eq!(batch.particles, 100);
        assert_eq!(batch.surface.len(), 200);
        assert!(batch.surface.iter().all(|p| p.depth == 2 || p.depth == 3));
        assert!(tracer.handler_mut().take_output().is_empty());
    }

    #[test]
    fn test_specular_scene_aborts_at_particle_limit() {
        let resources = closed_sphere(Arc::new(MirrorBSDF::new(RGBSpectrum::splat(0.5))));
        let settings = PhotonGatherSettings { photon_count: 100, granularity: 50, particle_limit: 500, ..Default::default() };
        let stop = AtomicBool::new(false);
        let map = gather_photons(&Scheduler::new(Some(2)), &resources, TracerConfig::default(), &settings, &stop)
            .expect("gather");

        assert!(map.is_empty());
        assert!(map.particles >= 500);
        assert!(stop.load(Ordering::Relaxed));
    }

    #[test]
    fn test_volume_photons_in_medium() {
        let medium: Arc<dyn Medium> = Arc::new(HomogeneousMedium::new(RGBSpectrum::splat(3.0), RGBSpectrum::splat(0.7)));
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::zeros(), 1.0)), Arc::new(NullBSDF::new(None)))
            .with_interior_medium(Some(medium.clone())));
        scene.add_emitter(Arc::new(PointEmitter::new(Vector3f::zeros(), RGBSpectrum::splat(1.0)).with_medium(Some(medium))));
        let resources = Resources::for_particle_tracing(Arc::new(scene),
                                                        Box::new(IndependentSampler::new(5)),
                                                        Arc::new(PerspectiveCamera::default()));

        let settings = PhotonGatherSettings { photon_count: 1000, granularity: 100, ..Default::default() };
        let map = gather_photons(&Scheduler::new(Some(2)), &resources, TracerConfig::default(), &settings,
                                 &AtomicBool::new(false)).expect("gather");

        // The null boundary has no smooth component, so only volume photons are stored.
        assert!(map.surface.is_empty());
        assert!(map.volume.len() >= 1000);
        assert!(map.volume.iter().all(|p| p.position.norm() <= 1.0 + 1e-4 && p.normal == Vector3f::zeros()));
    }
}
