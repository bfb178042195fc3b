// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFComponent, BSDFSampleRecord};
use crate::core::emitter::PositionSampleRecord;
use crate::core::error::{Result, TracerError};
use crate::core::interaction::SurfaceIntersection;
use crate::core::medium::{Medium, MediumSample, MediumSampleRecord};
use crate::core::particle_handler::{
    MediumInteractionEvent, ParticleHandler, PathHistory, PathVertexRecord, SurfaceInteractionEvent,
};
use crate::core::phase::PhaseFunctionSampleRecord;
use crate::core::range::WorkRange;
use crate::core::resources::{Resources, SAMPLER_RESOURCE, SCENE_RESOURCE, SENSOR_RESOURCE};
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::constants::{EPSILON, Float, Vector2f};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, Spectrum};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const MAX_SURVIVAL_PROBABILITY: Float = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracerConfig {
    /// Maximum number of bounces; `-1` means unlimited.
    pub max_depth: i32,
    /// Depth from which Russian roulette is applied.
    pub rr_depth: i32,
    /// Sample emitter position and direction separately and report the
    /// position through `handle_emission`.
    pub emission_events: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self { max_depth: -1, rr_depth: 5, emission_events: false }
    }
}

impl TracerConfig {
    pub fn new(max_depth: i32, rr_depth: i32, emission_events: bool) -> Result<Self> {
        let config = Self { max_depth, rr_depth, emission_events };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth < -1 {
            return Err(TracerError::Malformed(format!("max_depth must be >= -1, got {}", self.max_depth)));
        }
        if self.rr_depth < 1 {
            return Err(TracerError::Malformed(format!("rr_depth must be >= 1, got {}", self.rr_depth)));
        }
        Ok(())
    }

    pub fn serialize<W: Write>(&self, stream: &mut W) -> Result<()> {
        stream.write_i32::<BigEndian>(self.max_depth)?;
        stream.write_i32::<BigEndian>(self.rr_depth)?;
        stream.write_u8(self.emission_events as u8)?;
        Ok(())
    }

    pub fn deserialize<R: Read>(stream: &mut R) -> Result<Self> {
        let max_depth = stream.read_i32::<BigEndian>()?;
        let rr_depth = stream.read_i32::<BigEndian>()?;
        let emission_events = match stream.read_u8()? {
            0 => false,
            1 => true,
            other => return Err(TracerError::Malformed(format!("invalid boolean byte {:#04x}", other))),
        };
        Self::new(max_depth, rr_depth, emission_events)
    }
}

struct WorkerState {
    scene: Scene,
    sampler: Box<dyn Sampler>,
    sensor: Arc<dyn Sensor>,
}

/// Per-worker particle simulator. Each worker owns one tracer, prepares it
/// once, and then feeds it any number of work ranges.
pub struct ParticleTracer<H: ParticleHandler> {
    config: TracerConfig,
    handler: H,
    state: Option<WorkerState>,
}

impl<H: ParticleHandler> ParticleTracer<H> {
    pub fn new(config: TracerConfig, handler: H) -> Self {
        Self { config, handler, state: None }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn is_prepared(&self) -> bool {
        self.state.is_some()
    }

    /// Takes a private copy of the shared scene with this worker's sensor
    /// swapped in, and a private sampler.
    pub fn prepare(&mut self, resources: &Resources) -> Result<()> {
        let shared = resources.scene(SCENE_RESOURCE)?;
        let sampler = resources.sampler(SAMPLER_RESOURCE)?;
        let sensor = resources.sensor(SENSOR_RESOURCE)?;

        let mut scene = shared.as_ref().clone();
        if let Some(previous) = shared.sensor() {
            scene.remove_sensor(previous);
        }
        scene.add_sensor(sensor.clone());
        scene.set_sensor(sensor.clone());
        scene.initialize_bidirectional();

        log::debug!("particle tracer prepared: {:?}, {} objects, {} emitters, sensor: {}",
                    self.config, scene.len(), scene.emitters().len(), sensor.describe());

        self.state = Some(WorkerState { scene, sampler, sensor });
        Ok(())
    }

    /// Traces every particle of `range` in order. `stop` is checked before
    /// each particle; a set flag ends the range early without error.
    pub fn process(&mut self, range: &WorkRange, stop: &AtomicBool) -> Result<()> {
        let Self { config, handler, state } = self;
        let WorkerState { scene, sampler, sensor } = state.as_mut().ok_or(TracerError::NotPrepared)?;

        for index in range.indices() {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            trace_particle(config, scene, sensor.as_ref(), sampler.as_mut(), handler, index);
        }
        Ok(())
    }
}

/// Transient state of one particle's walk.
struct ParticlePath {
    ray: Ray3f,
    power: RGBSpectrum,
    throughput: RGBSpectrum,
    depth: i32,
    null_interactions: i32,
    delta: bool,
    medium: Option<Arc<dyn Medium>>,
    history: PathHistory,
}

impl ParticlePath {
    fn new(ray: Ray3f, power: RGBSpectrum, medium: Option<Arc<dyn Medium>>) -> Self {
        Self {
            ray,
            power,
            throughput: RGBSpectrum::splat(1.0),
            depth: 1,
            null_interactions: 0,
            delta: false,
            medium,
            history: PathHistory::new(),
        }
    }

    fn is_alive(&self, max_depth: i32) -> bool {
        !self.throughput.is_black() && (max_depth < 0 || self.depth <= max_depth)
    }

    fn scatter_in_medium<H: ParticleHandler>(&mut self,
                                             medium: &Arc<dyn Medium>,
                                             m_rec: &MediumSampleRecord,
                                             sampler: &mut dyn Sampler,
                                             handler: &mut H) -> PathVertexRecord {
        let wi = -self.ray.dir();
        self.throughput *= m_rec.sigma_s * m_rec.transmittance / m_rec.pdf_success;

        handler.handle_medium_interaction(&MediumInteractionEvent {
            depth: self.depth,
            null_interactions: self.null_interactions,
            delta: self.delta,
            record: m_rec,
            medium: medium.as_ref(),
            wi,
            weight: self.throughput * self.power,
            history: &self.history,
        });

        let phase = medium.phase_function();
        let mut p_rec = PhaseFunctionSampleRecord::new(wi);
        self.throughput *= phase.sample(&mut p_rec, sampler);
        self.delta = false;

        let reverse = p_rec.reversed();
        let vertex = PathVertexRecord {
            pdf: phase.pdf(&p_rec),
            inv_pdf: phase.pdf(&reverse),
            inv_eval: RGBSpectrum::splat(phase.eval(&reverse)),
        };

        self.ray = Ray3f::new(m_rec.p, p_rec.wo, Some(0.0), None).with_time(self.ray.time);
        vertex
    }

    /// Returns `None` when the particle is absorbed or rejected here.
    fn scatter_at_surface<H: ParticleHandler>(&mut self,
                                              its: &SurfaceIntersection,
                                              transmission: Option<(RGBSpectrum, Float)>,
                                              sampler: &mut dyn Sampler,
                                              handler: &mut H) -> Option<PathVertexRecord> {
        if let Some((transmittance, pdf_failure)) = transmission {
            if pdf_failure <= 0.0 {
                return None;
            }
            self.throughput *= transmittance / pdf_failure;
        }

        let bsdf = its.bsdf();
        let wi = -self.ray.dir();
        let mut b_rec = BSDFSampleRecord::new(its, &wi);
        let bsdf_weight = bsdf.sample(&mut b_rec, &sampler.next_2d());

        handler.handle_surface_interaction(&SurfaceInteractionEvent {
            depth: self.depth,
            null_interactions: self.null_interactions,
            delta: self.delta,
            its,
            bsdf_record: &b_rec,
            medium: self.medium.as_deref(),
            weight: self.throughput * self.power,
            throughput: self.throughput,
            wi,
            history: &self.history,
        });

        if bsdf_weight.is_black() {
            return None;
        }

        let measure = b_rec.measure();
        let reverse = b_rec.reversed();
        let vertex = PathVertexRecord {
            pdf: bsdf.pdf(&b_rec, measure),
            inv_pdf: bsdf.pdf(&reverse, measure),
            inv_eval: bsdf.eval(&reverse, measure),
        };

        // Shading and geometric normals must agree on both sides, or energy leaks.
        let wo = its.to_world(&b_rec.wo);
        let wi_dot_geo_n = its.geo_normal().dot(&wi);
        let wo_dot_geo_n = its.geo_normal().dot(&wo);
        if wi_dot_geo_n * Frame::cos_theta(&b_rec.wi) <= 0.0
            || wo_dot_geo_n * Frame::cos_theta(&b_rec.wo) <= 0.0 {
            return None;
        }

        self.throughput *= bsdf_weight;
        if its.is_medium_transition() {
            self.medium = its.target_medium(wo_dot_geo_n);
        }

        if b_rec.sampled_type.contains(BSDFComponent::NULL) {
            self.null_interactions += 1;
        } else {
            self.delta = b_rec.sampled_type.contains(BSDFComponent::DELTA);
        }

        self.ray = Ray3f::new(its.p(), wo, Some(EPSILON), None).with_time(self.ray.time);
        Some(vertex)
    }

    /// Advances the depth and, past `rr_depth`, plays Russian roulette.
    /// Returns the survival probability applied, or `None` if terminated.
    fn russian_roulette(&mut self, rr_depth: i32, sampler: &mut dyn Sampler) -> Option<Float> {
        let depth = self.depth;
        self.depth += 1;
        if depth < rr_depth {
            return Some(1.0);
        }

        let q = self.throughput.max_value().min(MAX_SURVIVAL_PROBABILITY);
        if sampler.next_1d() >= q {
            return None;
        }
        self.throughput /= q;
        Some(q)
    }
}

fn emit_particle<H: ParticleHandler>(config: &TracerConfig,
                                     scene: &Scene,
                                     sampler: &mut dyn Sampler,
                                     handler: &mut H,
                                     time: Float) -> Option<ParticlePath> {
    if config.emission_events {
        let mut p_rec = PositionSampleRecord::new(time);
        let mut power = scene.sample_emitter_position(&mut p_rec, &sampler.next_2d());
        let emitter = scene.emitter(p_rec.emitter?)?;
        let medium = emitter.medium();

        handler.handle_emission(&p_rec, medium.as_deref(), &power);

        let u = if emitter.needs_direction_sample() {
            sampler.next_2d()
        } else {
            Vector2f::new(0.5, 0.5)
        };
        let (direction, weight) = emitter.sample_direction(&p_rec, &u);
        power *= weight;

        let ray = Ray3f::new(p_rec.p, direction, Some(EPSILON), None).with_time(time);
        Some(ParticlePath::new(ray, power, medium))
    } else {
        let u_pos = sampler.next_2d();
        let u_dir = sampler.next_2d();
        let sample = scene.sample_emitter_ray(&u_pos, &u_dir, time)?;
        let medium = scene.emitter(sample.emitter).and_then(|emitter| emitter.medium());

        handler.handle_new_particle();

        Some(ParticlePath::new(sample.ray, sample.power, medium))
    }
}

fn trace_particle<H: ParticleHandler>(config: &TracerConfig,
                                      scene: &Scene,
                                      sensor: &dyn Sensor,
                                      sampler: &mut dyn Sampler,
                                      handler: &mut H,
                                      index: u64) {
    sampler.set_sample_index(index);

    let time = if sensor.needs_time_sample() {
        sensor.sample_time(sampler.next_1d())
    } else {
        sensor.shutter_open() + 0.5 * sensor.shutter_open_time()
    };

    let mut path = match emit_particle(config, scene, sampler, handler, time) {
        Some(path) => path,
        None => return,
    };
    if path.power.is_black() || !path.power.is_valid() {
        return;
    }

    while path.is_alive(config.max_depth) {
        let its = scene.ray_intersection(&path.ray);
        let its_t = its.as_ref().map_or(std::f32::INFINITY, |hit| hit.t());

        let mut transmission = None;
        let mut vertex = None;
        if let Some(medium) = path.medium.clone() {
            match medium.sample_distance(&path.ray.segment(0.0, its_t), sampler) {
                MediumSample::Interaction(m_rec) => {
                    vertex = Some(path.scatter_in_medium(&medium, &m_rec, sampler, handler));
                }
                MediumSample::Passed { transmittance, pdf_failure } => {
                    transmission = Some((transmittance, pdf_failure));
                }
            }
        }

        let mut vertex = match vertex {
            Some(vertex) => vertex,
            None => {
                // Escaped the scene.
                let its = match its {
                    Some(its) => its,
                    None => break,
                };
                match path.scatter_at_surface(&its, transmission, sampler, handler) {
                    Some(vertex) => vertex,
                    None => break,
                }
            }
        };

        if !path.throughput.is_valid() {
            log::trace!("particle {} dropped: invalid throughput {:?}", index, path.throughput);
            break;
        }

        match path.russian_roulette(config.rr_depth, sampler) {
            Some(q) => {
                vertex.pdf *= q;
                path.history.push(vertex);
            }
            None => break,
        }
    }
}
