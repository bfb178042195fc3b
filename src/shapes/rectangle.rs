// Copyright @yucwang 2026

use crate::core::computation_node::{ComputationNode, generate_node_id};
use crate::core::interaction::{SurfaceIntersection, SurfaceSampleRecord};
use crate::core::shape::Shape;
use crate::math::constants::{EPSILON, Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

/// Parallelogram `center + s * dp_du + t * dp_dv` for `s, t` in `[-1, 1]`.
pub struct Rectangle {
    id: String,
    center: Vector3f,
    normal: Vector3f,
    sh_normal: Option<Vector3f>,
    dp_du: Vector3f,
    dp_dv: Vector3f,
    area: Float,
    inv_area: Float,
}

impl Rectangle {
    pub fn new(center: Vector3f, dp_du: Vector3f, dp_dv: Vector3f) -> Self {
        let cross = dp_du.cross(&dp_dv);
        let area = 4.0 * cross.norm();
        let inv_area = if area > 0.0 { 1.0 / area } else { 0.0 };
        let normal = if cross.norm() > 0.0 {
            cross.normalize()
        } else {
            Vector3f::new(0.0, 0.0, 1.0)
        };

        Self { id: generate_node_id("Rectangle"), center, normal, sh_normal: None,
               dp_du, dp_dv, area, inv_area }
    }

    /// Overrides the interpolated shading normal reported at every hit.
    pub fn with_shading_normal(mut self, sh_normal: Vector3f) -> Self {
        self.sh_normal = Some(sh_normal.normalize());
        self
    }

    pub fn normal(&self) -> Vector3f {
        self.normal
    }

    fn local_coordinates(&self, p: &Vector3f) -> (Float, Float) {
        let d = p - self.center;
        let uu = self.dp_du.dot(&self.dp_du);
        let uv = self.dp_du.dot(&self.dp_dv);
        let vv = self.dp_dv.dot(&self.dp_dv);
        let du = d.dot(&self.dp_du);
        let dv = d.dot(&self.dp_dv);
        let det = uu * vv - uv * uv;
        if det == 0.0 {
            return (Float::MAX, Float::MAX);
        }
        ((vv * du - uv * dv) / det, (uu * dv - uv * du) / det)
    }

    fn make_intersection(&self, p: Vector3f, s: Float, t: Float, dist: Float) -> SurfaceIntersection {
        let uv = Vector2f::new(0.5 * (s + 1.0), 0.5 * (t + 1.0));
        SurfaceIntersection::new(p, self.normal, self.sh_normal.unwrap_or(self.normal), uv, dist)
    }
}

impl ComputationNode for Rectangle {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("Rectangle [id={}, center={:?}, area={}]", self.id, self.center, self.area)
    }
}

impl Shape for Rectangle {
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let denom = self.normal.dot(&ray.dir());
        if denom.abs() < EPSILON * EPSILON {
            return None;
        }

        let t = (self.center - ray.origin()).dot(&self.normal) / denom;
        if !ray.test_segment(t) {
            return None;
        }

        let p = ray.at(t);
        let (s, v) = self.local_coordinates(&p);
        if s.abs() > 1.0 || v.abs() > 1.0 {
            return None;
        }

        Some(self.make_intersection(p, s, v, t))
    }

    fn sample(&self, u: &Vector2f) -> SurfaceSampleRecord {
        let s = 2.0 * u.x - 1.0;
        let t = 2.0 * u.y - 1.0;
        let p = self.center + self.dp_du * s + self.dp_dv * t;
        SurfaceSampleRecord::new(self.make_intersection(p, s, t, 0.0), self.inv_area)
    }

    fn surface_area(&self) -> Float {
        self.area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Rectangle {
        Rectangle::new(Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), Vector3f::new(0.0, 1.0, 0.0))
    }

    #[test]
    fn test_hit_and_miss() {
        let rect = unit_square();
        let hit = rect.ray_intersection(&Ray3f::new(Vector3f::new(0.5, -0.5, 2.0), Vector3f::new(0.0, 0.0, -1.0), None, None))
            .expect("expected hit");
        assert!((hit.t() - 2.0).abs() < 1e-5);
        assert!((hit.geo_normal() - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-6);

        let miss = rect.ray_intersection(&Ray3f::new(Vector3f::new(1.5, 0.0, 2.0), Vector3f::new(0.0, 0.0, -1.0), None, None));
        assert!(miss.is_none());
        let behind = rect.ray_intersection(&Ray3f::new(Vector3f::new(0.0, 0.0, 2.0), Vector3f::new(0.0, 0.0, 1.0), None, None));
        assert!(behind.is_none());
    }

    #[test]
    fn test_area_and_sample() {
        let rect = Rectangle::new(Vector3f::new(0.0, 0.0, 1.0), Vector3f::new(2.0, 0.0, 0.0), Vector3f::new(0.0, 0.5, 0.0));
        assert!((rect.surface_area() - 4.0).abs() < 1e-6);
        let sample = rect.sample(&Vector2f::new(1.0, 0.0));
        assert!((sample.intersection().p() - Vector3f::new(2.0, -0.5, 1.0)).norm() < 1e-6);
        assert!((sample.pdf() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_shading_normal_override() {
        let rect = unit_square().with_shading_normal(Vector3f::new(0.0, 0.0, -1.0));
        let hit = rect.ray_intersection(&Ray3f::new(Vector3f::new(0.0, 0.0, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, None))
            .expect("expected hit");
        assert!(hit.sh_normal().dot(&hit.geo_normal()) < 0.0);
    }
}
