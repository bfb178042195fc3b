// Copyright @yucwang 2026

use crate::core::bsdf::BSDF;
use crate::core::emitter::{Emitter, PositionSampleRecord};
use crate::core::interaction::SurfaceIntersection;
use crate::core::medium::Medium;
use crate::core::sensor::Sensor;
use crate::core::shape::Shape;
use crate::emitters::area::AreaEmitter;
use crate::math::constants::{ Float, Vector2f };
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, Spectrum};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub material: Arc<dyn BSDF>,
    pub emission: RGBSpectrum,
    pub name: Option<String>,
    pub interior_medium: Option<Arc<dyn Medium>>,
    pub exterior_medium: Option<Arc<dyn Medium>>,
}

impl SceneObject {
    pub fn new(shape: Arc<dyn Shape>, material: Arc<dyn BSDF>) -> Self {
        Self { shape, material, emission: RGBSpectrum::default(), name: None,
               interior_medium: None, exterior_medium: None }
    }

    pub fn with_emission(mut self, emission: RGBSpectrum) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_interior_medium(mut self, medium: Option<Arc<dyn Medium>>) -> Self {
        self.interior_medium = medium;
        self
    }

    pub fn with_exterior_medium(mut self, medium: Option<Arc<dyn Medium>>) -> Self {
        self.exterior_medium = medium;
        self
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }
}

/// Joint emitter ray sample.
pub struct EmitterRaySample {
    pub ray: Ray3f,
    pub power: RGBSpectrum,
    pub emitter: usize,
}

/// Scene description. Cloning is shallow: geometry, materials and media are
/// shared, while the sensor list and sampling tables belong to the clone.
#[derive(Clone)]
pub struct Scene {
    objects: Vec<SceneObject>,
    sensors: Vec<Arc<dyn Sensor>>,
    active_sensor: Option<usize>,
    emitters: Vec<Arc<dyn Emitter>>,
    media: HashMap<String, Arc<dyn Medium>>,
    emitter_cdf: Vec<Float>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            sensors: Vec::new(),
            active_sensor: None,
            emitters: Vec::new(),
            media: HashMap::new(),
            emitter_cdf: Vec::new(),
        }
    }

    pub fn add_object(&mut self, object: SceneObject) {
        let emitter = if !object.emission.is_black() {
            Some(AreaEmitter::from_shape(object.shape.clone(), object.emission)
                .with_medium(object.exterior_medium.clone()))
        } else {
            None
        };
        self.objects.push(object);
        if let Some(emitter) = emitter {
            self.add_emitter(Arc::new(emitter));
        }
    }

    pub fn objects(&self) -> &Vec<SceneObject> {
        &self.objects
    }

    pub fn add_emitter(&mut self, emitter: Arc<dyn Emitter>) {
        self.emitters.push(emitter);
        self.emitter_cdf.clear();
    }

    pub fn emitters(&self) -> &Vec<Arc<dyn Emitter>> {
        &self.emitters
    }

    pub fn emitter(&self, index: usize) -> Option<&Arc<dyn Emitter>> {
        self.emitters.get(index)
    }

    pub fn add_medium(&mut self, id: String, medium: Arc<dyn Medium>) {
        self.media.insert(id, medium);
    }

    pub fn medium(&self, id: &str) -> Option<Arc<dyn Medium>> {
        self.media.get(id).cloned()
    }

    pub fn sensors(&self) -> &Vec<Arc<dyn Sensor>> {
        &self.sensors
    }

    pub fn add_sensor(&mut self, sensor: Arc<dyn Sensor>) {
        self.sensors.push(sensor);
        if self.active_sensor.is_none() {
            self.active_sensor = Some(self.sensors.len() - 1);
        }
    }

    /// Removes `sensor` (compared by identity). Returns whether it was present.
    pub fn remove_sensor(&mut self, sensor: &Arc<dyn Sensor>) -> bool {
        let position = self.sensors.iter().position(|s| same_sensor(s, sensor));
        match position {
            Some(index) => {
                self.sensors.remove(index);
                self.active_sensor = match self.active_sensor {
                    Some(active) if active == index => None,
                    Some(active) if active > index => Some(active - 1),
                    other => other,
                };
                true
            }
            None => false,
        }
    }

    /// Makes `sensor` the active one, adding it first if necessary.
    pub fn set_sensor(&mut self, sensor: Arc<dyn Sensor>) {
        match self.sensors.iter().position(|s| same_sensor(s, &sensor)) {
            Some(index) => self.active_sensor = Some(index),
            None => {
                self.sensors.push(sensor);
                self.active_sensor = Some(self.sensors.len() - 1);
            }
        }
    }

    pub fn sensor(&self) -> Option<&Arc<dyn Sensor>> {
        self.active_sensor.and_then(|index| self.sensors.get(index))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Prepares the scene for particle emission: builds the emitter
    /// selection distribution, proportional to emitted power.
    pub fn initialize_bidirectional(&mut self) {
        let weights: Vec<Float> = self.emitters.iter()
            .map(|emitter| emitter.power().average().max(0.0))
            .collect();
        let total: Float = weights.iter().sum();

        self.emitter_cdf.clear();
        let mut acc = 0.0;
        for (idx, weight) in weights.iter().enumerate() {
            acc += if total > 0.0 { weight / total } else { 1.0 / weights.len() as Float };
            self.emitter_cdf.push(acc);
            log::debug!("emitter {} [{}]: selection cdf {}", idx, self.emitters[idx].to_string(), acc);
        }
        if let Some(last) = self.emitter_cdf.last_mut() {
            *last = 1.0;
        }
    }

    pub fn is_bidirectional_initialized(&self) -> bool {
        !self.emitters.is_empty() && self.emitter_cdf.len() == self.emitters.len()
    }

    /// Picks an emitter with `u` and returns (index, pmf, `u` rescaled to `[0, 1)`).
    fn select_emitter(&self, u: Float) -> Option<(usize, Float, Float)> {
        if self.emitters.is_empty() {
            return None;
        }
        if !self.is_bidirectional_initialized() {
            let count = self.emitters.len() as Float;
            let index = ((u * count) as usize).min(self.emitters.len() - 1);
            return Some((index, 1.0 / count, (u * count - index as Float).min(0.99999994)));
        }

        let index = self.emitter_cdf.iter()
            .position(|&c| u < c)
            .unwrap_or(self.emitter_cdf.len() - 1);
        let lower = if index == 0 { 0.0 } else { self.emitter_cdf[index - 1] };
        let pmf = self.emitter_cdf[index] - lower;
        if pmf <= 0.0 {
            return None;
        }
        Some((index, pmf, ((u - lower) / pmf).max(0.0).min(0.99999994)))
    }

    /// Samples a position on an emitter and returns the emitted power
    /// divided by the joint selection and position density.
    pub fn sample_emitter_position(&self, p_rec: &mut PositionSampleRecord, u: &Vector2f) -> RGBSpectrum {
        let (index, pmf, u_x) = match self.select_emitter(u.x) {
            Some(selected) => selected,
            None => return RGBSpectrum::default(),
        };
        let emitter = &self.emitters[index];
        let power = emitter.sample_position(p_rec, &Vector2f::new(u_x, u.y));
        p_rec.emitter = Some(index);
        p_rec.pdf *= pmf;
        power / pmf
    }

    pub fn sample_emitter_ray(&self, u_pos: &Vector2f, u_dir: &Vector2f, time: Float) -> Option<EmitterRaySample> {
        let (index, pmf, u_x) = self.select_emitter(u_pos.x)?;
        let emitter = &self.emitters[index];
        let (ray, power) = emitter.sample_ray(&Vector2f::new(u_x, u_pos.y), u_dir, time);
        Some(EmitterRaySample { ray, power: power / pmf, emitter: index })
    }

    pub fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let mut closest: Option<(usize, SurfaceIntersection)> = None;
        let mut max_t = ray.max_t;
        for (idx, object) in self.objects.iter().enumerate() {
            let segment = ray.segment(ray.min_t, max_t);
            if let Some(hit) = object.shape.ray_intersection(&segment) {
                max_t = hit.t();
                closest = Some((idx, hit));
            }
        }

        closest.map(|(idx, hit)| {
            let object = &self.objects[idx];
            hit.with_material(object.material.clone())
                .with_media(object.interior_medium.clone(), object.exterior_medium.clone())
                .with_object_index(Some(idx))
        })
    }
}

fn same_sensor(a: &Arc<dyn Sensor>, b: &Arc<dyn Sensor>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitters::point::PointEmitter;
    use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::shapes::rectangle::Rectangle;
    use crate::math::constants::Vector3f;

    fn plane_at(z: Float) -> Arc<dyn Shape> {
        Arc::new(Rectangle::new(
            Vector3f::new(0.0, 0.0, z),
            Vector3f::new(1.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
        ))
    }

    fn diffuse() -> Arc<dyn BSDF> {
        Arc::new(LambertianDiffuseBSDF::new(RGBSpectrum::splat(0.5)))
    }

    #[test]
    fn test_scene_ray_intersection_closest_hit() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(plane_at(5.0), diffuse()));
        scene.add_object(SceneObject::new(plane_at(2.0), diffuse()));
        scene.add_object(SceneObject::new(plane_at(10.0), diffuse()));

        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = scene.ray_intersection(&ray).expect("expected intersection");

        assert!((hit.t() - 2.0).abs() < 1e-5);
        assert_eq!(hit.object_index(), Some(1));
    }

    #[test]
    fn test_ray_misses_empty_scene() {
        let scene = Scene::new();
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(scene.ray_intersection(&ray).is_none());
    }

    #[test]
    fn test_sensor_swap() {
        let mut scene = Scene::new();
        let a: Arc<dyn Sensor> = Arc::new(PerspectiveCamera::default());
        let b: Arc<dyn Sensor> = Arc::new(PerspectiveCamera::default());
        scene.add_sensor(a.clone());
        assert!(same_sensor(scene.sensor().unwrap(), &a));

        let mut clone = scene.clone();
        assert!(clone.remove_sensor(&a));
        assert!(clone.sensor().is_none());
        clone.add_sensor(b.clone());
        clone.set_sensor(b.clone());
        assert!(same_sensor(clone.sensor().unwrap(), &b));
        assert_eq!(clone.sensors().len(), 1);

        // The source scene keeps its own sensor.
        assert!(same_sensor(scene.sensor().unwrap(), &a));
    }

    #[test]
    fn test_emitter_selection_follows_power() {
        let mut scene = Scene::new();
        scene.add_emitter(Arc::new(PointEmitter::new(Vector3f::zeros(), RGBSpectrum::splat(1.0))));
        scene.add_emitter(Arc::new(PointEmitter::new(Vector3f::new(1.0, 0.0, 0.0), RGBSpectrum::splat(3.0))));
        scene.initialize_bidirectional();
        assert!(scene.is_bidirectional_initialized());

        let mut p_rec = PositionSampleRecord::new(0.0);
        let power = scene.sample_emitter_position(&mut p_rec, &Vector2f::new(0.1, 0.5));
        assert_eq!(p_rec.emitter, Some(0));
        // Each emitter contributes total power / selection probability.
        let total = PointEmitter::new(Vector3f::zeros(), RGBSpectrum::splat(4.0)).power();
        assert!((power[0] - total[0]).abs() < 1e-2 * total[0]);

        let mut p_rec = PositionSampleRecord::new(0.0);
        scene.sample_emitter_position(&mut p_rec, &Vector2f::new(0.9, 0.5));
        assert_eq!(p_rec.emitter, Some(1));
    }

    #[test]
    fn test_no_emitters_yields_no_ray() {
        let mut scene = Scene::new();
        scene.initialize_bidirectional();
        assert!(scene.sample_emitter_ray(&Vector2f::new(0.5, 0.5), &Vector2f::new(0.5, 0.5), 0.0).is_none());
    }
}
