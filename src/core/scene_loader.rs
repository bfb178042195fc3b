// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::bsdf::BSDF;
use crate::core::medium::Medium;
use crate::core::particle_tracer::TracerConfig;
use crate::core::scene::{Scene, SceneObject};
use crate::core::sensor::Sensor;
use crate::core::shape::Shape;
use crate::emitters::point::PointEmitter;
use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
use crate::materials::mirror::MirrorBSDF;
use crate::materials::null::NullBSDF;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::media::homogeneous_medium::HomogeneousMedium;
use crate::sensors::perspective::PerspectiveCamera;
use crate::shapes::rectangle::Rectangle;
use crate::shapes::sphere::Sphere;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SceneLoadError {
    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed scene: {0}")]
    Parse(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Settings of the `<integrator type="ptracer">` block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorSettings {
    pub config: TracerConfig,
    /// Zero selects the automatic granularity.
    pub granularity: u64,
    pub work_count: u64,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self { config: TracerConfig::default(), granularity: 0, work_count: 100_000 }
    }
}

pub struct SceneLoadResult {
    pub scene: Scene,
    pub sensor: Option<Arc<dyn Sensor>>,
    pub integrator: IntegratorSettings,
}

pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneLoadError> {
    let result = load_scene_with_settings(path)?;
    Ok(result.scene)
}

pub fn load_scene_with_settings<P: AsRef<Path>>(path: P) -> Result<SceneLoadResult, SceneLoadError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    parse_scene(&xml)
}

pub fn parse_scene(xml: &str) -> Result<SceneLoadResult, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut builder = SceneBuilder::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                if is_plugin(e.name().as_ref()) {
                    builder.open_plugin(&e)?;
                } else {
                    builder.add_property(&e)?;
                }
            }
            Ok(Event::Empty(e)) => {
                if is_plugin(e.name().as_ref()) {
                    builder.open_plugin(&e)?;
                    builder.close_plugin()?;
                } else {
                    builder.add_property(&e)?;
                }
            }
            Ok(Event::End(e)) => {
                if is_plugin(e.name().as_ref()) {
                    builder.close_plugin()?;
                }
            }
            Err(e) => {
                return Err(SceneLoadError::Parse(e.to_string()));
            }
            _ => {}
        }

        buf.clear();
    }

    builder.finish()
}

fn is_plugin(name: &[u8]) -> bool {
    matches!(name, b"integrator" | b"sensor" | b"medium" | b"bsdf" | b"emitter" | b"shape")
}

/// A plugin element whose closing tag has not been seen yet.
struct PluginNode {
    tag: String,
    plugin_type: String,
    id: Option<String>,
    props: HashMap<String, String>,
    refs: Vec<(Option<String>, String)>,
    bsdf: Option<Arc<dyn BSDF>>,
    emission: Option<RGBSpectrum>,
}

impl PluginNode {
    fn raw(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(|s| s.as_str())
    }

    fn float(&self, name: &str, default: Float) -> Result<Float, SceneLoadError> {
        self.raw(name).map_or(Ok(default), parse_float)
    }

    fn integer<T: FromStr>(&self, name: &str, default: T) -> Result<T, SceneLoadError> {
        match self.raw(name) {
            Some(value) => value.trim().parse::<T>()
                .map_err(|_| SceneLoadError::Parse(format!("invalid integer for {}: {}", name, value))),
            None => Ok(default),
        }
    }

    fn boolean(&self, name: &str, default: bool) -> Result<bool, SceneLoadError> {
        match self.raw(name) {
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(value) => Err(SceneLoadError::Parse(format!("invalid boolean for {}: {}", name, value))),
            None => Ok(default),
        }
    }

    fn vector(&self, name: &str, default: Vector3f) -> Result<Vector3f, SceneLoadError> {
        self.raw(name).map_or(Ok(default), parse_vec3)
    }

    fn spectrum(&self, name: &str, default: RGBSpectrum) -> Result<RGBSpectrum, SceneLoadError> {
        self.raw(name).map_or(Ok(default), parse_spectrum)
    }

    fn reference(&self, name: Option<&str>) -> Option<&str> {
        self.refs.iter()
            .find(|(ref_name, _)| ref_name.as_deref() == name)
            .map(|(_, id)| id.as_str())
    }
}

struct SceneBuilder {
    defaults: HashMap<String, String>,
    scene: Scene,
    sensor: Option<Arc<dyn Sensor>>,
    integrator: IntegratorSettings,
    bsdfs: HashMap<String, Arc<dyn BSDF>>,
    stack: Vec<PluginNode>,
}

impl SceneBuilder {
    fn new() -> Self {
        Self {
            defaults: HashMap::new(),
            scene: Scene::new(),
            sensor: None,
            integrator: IntegratorSettings::default(),
            bsdfs: HashMap::new(),
            stack: Vec::new(),
        }
    }

    fn attributes(&self, e: &BytesStart) -> Result<HashMap<String, String>, SceneLoadError> {
        let mut out = HashMap::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| SceneLoadError::Parse(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(|err| SceneLoadError::Parse(err.to_string()))?;
            out.insert(key, resolve_value(&value, &self.defaults));
        }
        Ok(out)
    }

    fn open_plugin(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let mut attrs = self.attributes(e)?;
        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let plugin_type = attrs.remove("type").ok_or(SceneLoadError::MissingField("plugin.type"))?;
        self.stack.push(PluginNode {
            tag,
            plugin_type,
            id: attrs.remove("id"),
            props: HashMap::new(),
            refs: Vec::new(),
            bsdf: None,
            emission: None,
        });
        Ok(())
    }

    fn add_property(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let mut attrs = self.attributes(e)?;
        match e.name().as_ref() {
            b"scene" | b"transform" => Ok(()),
            b"default" => {
                let name = attrs.remove("name").ok_or(SceneLoadError::MissingField("default.name"))?;
                let value = attrs.remove("value").ok_or(SceneLoadError::MissingField("default.value"))?;
                self.defaults.insert(name, value);
                Ok(())
            }
            b"lookat" => {
                let node = self.current("lookat")?;
                for key in &["origin", "target", "up"] {
                    if let Some(value) = attrs.remove(*key) {
                        node.props.insert(format!("lookat.{}", key), value);
                    }
                }
                Ok(())
            }
            b"ref" => {
                let id = attrs.remove("id").ok_or(SceneLoadError::MissingField("ref.id"))?;
                let name = attrs.remove("name");
                self.current("ref")?.refs.push((name, id));
                Ok(())
            }
            b"float" | b"integer" | b"boolean" | b"rgb" | b"point" | b"vector" | b"string" => {
                let name = attrs.remove("name").ok_or(SceneLoadError::MissingField("property.name"))?;
                let value = attrs.remove("value").ok_or(SceneLoadError::MissingField("property.value"))?;
                self.current("property")?.props.insert(name, value);
                Ok(())
            }
            other => {
                log::warn!("ignoring unknown scene element <{}>", String::from_utf8_lossy(other));
                Ok(())
            }
        }
    }

    fn current(&mut self, what: &str) -> Result<&mut PluginNode, SceneLoadError> {
        self.stack.last_mut()
            .ok_or_else(|| SceneLoadError::Parse(format!("{} outside of a plugin element", what)))
    }

    fn close_plugin(&mut self) -> Result<(), SceneLoadError> {
        let node = self.stack.pop()
            .ok_or_else(|| SceneLoadError::Parse("unbalanced closing tag".to_string()))?;

        match node.tag.as_str() {
            "integrator" => self.build_integrator(&node),
            "sensor" => self.build_sensor(&node),
            "medium" => self.build_medium(&node),
            "bsdf" => {
                let bsdf = build_bsdf(&node)?;
                match self.stack.last_mut() {
                    Some(parent) if parent.tag == "shape" => {
                        parent.bsdf = Some(bsdf);
                    }
                    _ => {
                        let id = node.id.clone().ok_or(SceneLoadError::MissingField("bsdf.id"))?;
                        self.bsdfs.insert(id, bsdf);
                    }
                }
                Ok(())
            }
            "emitter" => self.build_emitter(&node),
            "shape" => self.build_shape(&node),
            _ => Ok(()),
        }
    }

    fn build_integrator(&mut self, node: &PluginNode) -> Result<(), SceneLoadError> {
        if node.plugin_type != "ptracer" {
            return Err(SceneLoadError::Parse(format!("unsupported integrator: {}", node.plugin_type)));
        }
        let defaults = IntegratorSettings::default();
        let config = TracerConfig::new(
            node.integer("maxDepth", defaults.config.max_depth)?,
            node.integer("rrDepth", defaults.config.rr_depth)?,
            node.boolean("emissionEvents", defaults.config.emission_events)?,
        ).map_err(|e| SceneLoadError::Parse(e.to_string()))?;

        self.integrator = IntegratorSettings {
            config,
            granularity: node.integer("granularity", defaults.granularity)?,
            work_count: node.integer("workCount", defaults.work_count)?,
        };
        Ok(())
    }

    fn build_sensor(&mut self, node: &PluginNode) -> Result<(), SceneLoadError> {
        if node.plugin_type != "perspective" {
            return Err(SceneLoadError::Parse(format!("unsupported sensor: {}", node.plugin_type)));
        }
        let origin = node.vector("lookat.origin", Vector3f::zeros())?;
        let target = node.vector("lookat.target", Vector3f::new(0.0, 0.0, -1.0))?;
        let up = node.vector("lookat.up", Vector3f::new(0.0, 1.0, 0.0))?;
        let fov_deg = node.float("fov", 45.0)?;
        let shutter_open = node.float("shutterOpen", 0.0)?;
        let shutter_close = node.float("shutterClose", shutter_open)?;
        if shutter_close < shutter_open {
            return Err(SceneLoadError::Parse("shutterClose precedes shutterOpen".to_string()));
        }

        let camera = PerspectiveCamera::new(
            origin,
            target,
            up,
            fov_deg * std::f32::consts::PI / 180.0,
            node.float("aspect", 1.0)?,
            node.float("near_clip", 1e-2)?,
            node.float("far_clip", 1e4)?,
        ).with_shutter(shutter_open, shutter_close - shutter_open);

        let sensor: Arc<dyn Sensor> = Arc::new(camera);
        self.scene.add_sensor(sensor.clone());
        if self.sensor.is_none() {
            self.sensor = Some(sensor);
        }
        Ok(())
    }

    fn build_medium(&mut self, node: &PluginNode) -> Result<(), SceneLoadError> {
        if node.plugin_type != "homogeneous" {
            return Err(SceneLoadError::Parse(format!("unsupported medium: {}", node.plugin_type)));
        }
        let id = node.id.clone().ok_or(SceneLoadError::MissingField("medium.id"))?;
        let medium = HomogeneousMedium::new(
            node.spectrum("sigma_t", RGBSpectrum::splat(1.0))?,
            node.spectrum("albedo", RGBSpectrum::splat(0.8))?,
        ).with_scale(node.float("scale", 1.0)?);
        self.scene.add_medium(id, Arc::new(medium));
        Ok(())
    }

    fn medium_ref(&self, node: &PluginNode, name: &str) -> Result<Option<Arc<dyn Medium>>, SceneLoadError> {
        match node.reference(Some(name)) {
            Some(id) => self.scene.medium(id)
                .map(Some)
                .ok_or_else(|| SceneLoadError::Parse(format!("unknown medium ref: {}", id))),
            None => Ok(None),
        }
    }

    fn build_emitter(&mut self, node: &PluginNode) -> Result<(), SceneLoadError> {
        match node.plugin_type.as_str() {
            "point" => {
                let emitter = PointEmitter::new(
                    node.vector("position", Vector3f::zeros())?,
                    node.spectrum("intensity", RGBSpectrum::splat(1.0))?,
                ).with_medium(self.medium_ref(node, "medium")?);
                self.scene.add_emitter(Arc::new(emitter));
                Ok(())
            }
            "area" => {
                let radiance = node.spectrum("radiance", RGBSpectrum::splat(1.0))?;
                match self.stack.last_mut() {
                    Some(parent) if parent.tag == "shape" => {
                        parent.emission = Some(radiance);
                        Ok(())
                    }
                    _ => Err(SceneLoadError::Parse("area emitter must be nested in a shape".to_string())),
                }
            }
            other => Err(SceneLoadError::Parse(format!("unsupported emitter: {}", other))),
        }
    }

    fn build_shape(&mut self, node: &PluginNode) -> Result<(), SceneLoadError> {
        let shape: Arc<dyn Shape> = match node.plugin_type.as_str() {
            "rectangle" => Arc::new(Rectangle::new(
                node.vector("center", Vector3f::zeros())?,
                node.vector("dp_du", Vector3f::new(1.0, 0.0, 0.0))?,
                node.vector("dp_dv", Vector3f::new(0.0, 1.0, 0.0))?,
            )),
            "sphere" => Arc::new(Sphere::new(
                node.vector("center", Vector3f::zeros())?,
                node.float("radius", 1.0)?,
            ).with_flipped_normals(node.boolean("flipNormals", false)?)),
            other => return Err(SceneLoadError::Parse(format!("unsupported shape: {}", other))),
        };

        let material = match (&node.bsdf, node.reference(None).or_else(|| node.reference(Some("bsdf")))) {
            (Some(bsdf), _) => bsdf.clone(),
            (None, Some(id)) => self.bsdfs.get(id)
                .ok_or_else(|| SceneLoadError::Parse(format!("missing bsdf ref: {}", id)))?
                .clone(),
            (None, None) => Arc::new(LambertianDiffuseBSDF::new(RGBSpectrum::splat(0.5))),
        };

        let mut object = SceneObject::new(shape, material)
            .with_interior_medium(self.medium_ref(node, "interior")?)
            .with_exterior_medium(self.medium_ref(node, "exterior")?);
        if let Some(id) = node.id.clone() {
            object = object.with_name(id);
        }
        if let Some(radiance) = node.emission {
            object = object.with_emission(radiance);
        }
        self.scene.add_object(object);
        Ok(())
    }

    fn finish(self) -> Result<SceneLoadResult, SceneLoadError> {
        if let Some(node) = self.stack.last() {
            return Err(SceneLoadError::Parse(format!("unclosed <{}> element", node.tag)));
        }
        log::info!("loaded scene: {} objects, {} emitters, {} sensors",
                   self.scene.len(), self.scene.emitters().len(), self.scene.sensors().len());
        Ok(SceneLoadResult {
            scene: self.scene,
            sensor: self.sensor,
            integrator: self.integrator,
        })
    }
}

fn build_bsdf(node: &PluginNode) -> Result<Arc<dyn BSDF>, SceneLoadError> {
    match node.plugin_type.as_str() {
        "diffuse" => Ok(Arc::new(LambertianDiffuseBSDF::new(
            node.spectrum("reflectance", RGBSpectrum::splat(0.5))?))),
        "mirror" => Ok(Arc::new(MirrorBSDF::new(
            node.spectrum("specularReflectance", RGBSpectrum::splat(1.0))?))),
        "null" => Ok(Arc::new(NullBSDF::new(node.id.clone()))),
        other => Err(SceneLoadError::Parse(format!("unsupported bsdf: {}", other))),
    }
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| SceneLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let mut parts = value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty());
    let x = parts.next().ok_or_else(|| SceneLoadError::Parse("invalid vec3".to_string()))?;
    let y = parts.next().ok_or_else(|| SceneLoadError::Parse("invalid vec3".to_string()))?;
    let z = parts.next().ok_or_else(|| SceneLoadError::Parse("invalid vec3".to_string()))?;
    Ok(Vector3f::new(parse_float(x)?, parse_float(y)?, parse_float(z)?))
}

/// Accepts either `r, g, b` or a single grey value.
fn parse_spectrum(value: &str) -> Result<RGBSpectrum, SceneLoadError> {
    if value.contains(',') {
        let v = parse_vec3(value)?;
        Ok(RGBSpectrum::new(v.x, v.y, v.z))
    } else {
        Ok(RGBSpectrum::splat(parse_float(value)?))
    }
}
