// Copyright @yucwang 2023

use crate::core::bsdf::BSDF;
use crate::core::medium::Medium;
use crate::materials::null::NullBSDF;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::frame::Frame;
use std::sync::Arc;

#[derive(Clone)]
pub struct SurfaceIntersection {
    p: Vector3f,
    geo_normal: Vector3f,
    sh_frame: Frame,
    uv: Vector2f,
    t: Float,
    material: Option<Arc<dyn BSDF>>,
    interior: Option<Arc<dyn Medium>>,
    exterior: Option<Arc<dyn Medium>>,
    object_index: Option<usize>,
}

#[derive(Clone)]
pub struct SurfaceSampleRecord {
    intersection: SurfaceIntersection,
    pdf: Float,
}

impl SurfaceIntersection {
    pub fn new(new_p: Vector3f,
               new_geo_normal: Vector3f,
               new_sh_normal: Vector3f,
               new_uv: Vector2f,
               new_t: Float) -> Self {
        Self { p: new_p, geo_normal: new_geo_normal, sh_frame: Frame::from_normal(&new_sh_normal),
               uv: new_uv, t: new_t, material: None, interior: None, exterior: None,
               object_index: None }
    }

    pub fn t(&self) -> Float {
        self.t
    }

    pub fn p(&self) -> Vector3f {
        self.p
    }

    pub fn uv(&self) -> Vector2f {
        self.uv
    }

    pub fn geo_normal(&self) -> Vector3f {
        self.geo_normal
    }

    pub fn sh_normal(&self) -> Vector3f {
        self.sh_frame.z
    }

    pub fn sh_frame(&self) -> &Frame {
        &self.sh_frame
    }

    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        self.sh_frame.to_local(v)
    }

    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.sh_frame.to_world(v)
    }

    pub fn object_index(&self) -> Option<usize> {
        self.object_index
    }

    pub fn with_object_index(mut self, object_index: Option<usize>) -> Self {
        self.object_index = object_index;
        self
    }

    pub fn with_material(mut self, new_material: Arc<dyn BSDF>) -> Self {
        self.material = Some(new_material);
        self
    }

    pub fn with_media(mut self, interior: Option<Arc<dyn Medium>>, exterior: Option<Arc<dyn Medium>>) -> Self {
        self.interior = interior;
        self.exterior = exterior;
        self
    }

    /// Surfaces without an assigned material behave as index-matched boundaries.
    pub fn bsdf(&self) -> Arc<dyn BSDF> {
        match &self.material {
            Some(material) => material.clone(),
            None => Arc::new(NullBSDF::new(None)),
        }
    }

    pub fn is_medium_transition(&self) -> bool {
        self.interior.is_some() || self.exterior.is_some()
    }

    /// Medium on the side of the surface that a direction with the given
    /// cosine against the geometric normal points into.
    pub fn target_medium(&self, cos_theta: Float) -> Option<Arc<dyn Medium>> {
        if cos_theta > 0.0 {
            self.exterior.clone()
        } else {
            self.interior.clone()
        }
    }
}

impl SurfaceSampleRecord {
    pub fn new(new_intersection: SurfaceIntersection,
               new_pdf: Float) -> Self {
        Self { intersection: new_intersection, pdf: new_pdf }
    }

    pub fn intersection(&self) -> &SurfaceIntersection {
        &self.intersection
    }

    pub fn pdf(&self) -> Float {
        self.pdf
    }

    pub fn set_pdf(&mut self, pdf: Float) {
        self.pdf = pdf;
    }
}
