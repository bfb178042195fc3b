// Copyright @yucwang 2026

use crate::core::error::{Result, TracerError};
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use std::collections::HashMap;
use std::sync::Arc;

pub const SCENE_RESOURCE: &str = "scene";
pub const SAMPLER_RESOURCE: &str = "sampler";
pub const SENSOR_RESOURCE: &str = "sensor";

pub enum Resource {
    Scene(Arc<Scene>),
    Sampler(Box<dyn Sampler>),
    Sensor(Arc<dyn Sensor>),
}

impl Resource {
    fn kind(&self) -> &'static str {
        match self {
            Resource::Scene(_) => "scene",
            Resource::Sampler(_) => "sampler",
            Resource::Sensor(_) => "sensor",
        }
    }
}

/// Named resources bound by the scheduler and shared by all workers.
#[derive(Default)]
pub struct Resources {
    entries: HashMap<String, Resource>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the three resources a particle tracer needs under their usual names.
    pub fn for_particle_tracing(scene: Arc<Scene>, sampler: Box<dyn Sampler>, sensor: Arc<dyn Sensor>) -> Self {
        let mut resources = Self::new();
        resources.bind(SCENE_RESOURCE, Resource::Scene(scene));
        resources.bind(SAMPLER_RESOURCE, Resource::Sampler(sampler));
        resources.bind(SENSOR_RESOURCE, Resource::Sensor(sensor));
        resources
    }

    pub fn bind(&mut self, name: &str, resource: Resource) {
        log::debug!("binding {} resource '{}'", resource.kind(), name);
        self.entries.insert(name.to_string(), resource);
    }

    pub fn unbind(&mut self, name: &str) -> Option<Resource> {
        self.entries.remove(name)
    }

    fn get(&self, name: &str) -> Result<&Resource> {
        self.entries.get(name).ok_or_else(|| TracerError::MissingResource(name.to_string()))
    }

    pub fn scene(&self, name: &str) -> Result<Arc<Scene>> {
        match self.get(name)? {
            Resource::Scene(scene) => Ok(scene.clone()),
            _ => Err(TracerError::ResourceType { name: name.to_string(), expected: "scene" }),
        }
    }

    /// Returns a private copy of the sampler bound under `name`.
    pub fn sampler(&self, name: &str) -> Result<Box<dyn Sampler>> {
        match self.get(name)? {
            Resource::Sampler(sampler) => Ok(sampler.clone_box()),
            _ => Err(TracerError::ResourceType { name: name.to_string(), expected: "sampler" }),
        }
    }

    pub fn sensor(&self, name: &str) -> Result<Arc<dyn Sensor>> {
        match self.get(name)? {
            Resource::Sensor(sensor) => Ok(sensor.clone()),
            _ => Err(TracerError::ResourceType { name: name.to_string(), expected: "sensor" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::IndependentSampler;
    use crate::sensors::perspective::PerspectiveCamera;

    #[test]
    fn test_lookup_by_name_and_type() {
        let resources = Resources::for_particle_tracing(
            Arc::new(Scene::new()),
            Box::new(IndependentSampler::new(0)),
            Arc::new(PerspectiveCamera::default()),
        );
        assert!(resources.scene(SCENE_RESOURCE).is_ok());
        assert!(resources.sampler(SAMPLER_RESOURCE).is_ok());
        assert!(resources.sensor(SENSOR_RESOURCE).is_ok());

        match resources.scene(SENSOR_RESOURCE) {
            Err(TracerError::ResourceType { name, expected }) => {
                assert_eq!(name, "sensor");
                assert_eq!(expected, "scene");
            }
            _ => panic!("expected a type mismatch"),
        }
        assert!(matches!(resources.sensor("film"), Err(TracerError::MissingResource(_))));
    }
}
