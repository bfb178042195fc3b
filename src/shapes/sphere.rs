// Copyright @yucwang 2026

use crate::core::computation_node::{ComputationNode, generate_node_id};
use crate::core::interaction::{SurfaceIntersection, SurfaceSampleRecord};
use crate::core::shape::Shape;
use crate::math::constants::{Float, PI, INV_PI, Vector2f, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::warp::sample_uniform_sphere;

pub struct Sphere {
    id: String,
    center: Vector3f,
    radius: Float,
    flip_normals: bool,
}

impl Sphere {
    pub fn new(center: Vector3f, radius: Float) -> Self {
        Self { id: generate_node_id("Sphere"), center, radius, flip_normals: false }
    }

    /// Makes normals point inwards, e.g. for an enclosing environment shell.
    pub fn with_flipped_normals(mut self, flip: bool) -> Self {
        self.flip_normals = flip;
        self
    }

    fn make_intersection(&self, p: Vector3f, t: Float) -> SurfaceIntersection {
        let mut n = (p - self.center) / self.radius;
        if self.flip_normals {
            n = -n;
        }
        let phi = n.y.atan2(n.x);
        let uv = Vector2f::new(0.5 * (phi * INV_PI + 1.0), n.z.max(-1.0).min(1.0).acos() * INV_PI);
        SurfaceIntersection::new(p, n, n, uv, t)
    }
}

impl ComputationNode for Sphere {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("Sphere [id={}, center={:?}, radius={}]", self.id, self.center, self.radius)
    }
}

impl Shape for Sphere {
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let o = ray.origin() - self.center;
        let d = ray.dir();
        let b = o.dot(&d);
        let c = o.dot(&o) - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }

        let sqrt_disc = disc.sqrt();
        let t_near = -b - sqrt_disc;
        let t_far = -b + sqrt_disc;
        let t = if ray.test_segment(t_near) {
            t_near
        } else if ray.test_segment(t_far) {
            t_far
        } else {
            return None;
        };

        Some(self.make_intersection(ray.at(t), t))
    }

    fn sample(&self, u: &Vector2f) -> SurfaceSampleRecord {
        let p = self.center + sample_uniform_sphere(u) * self.radius;
        SurfaceSampleRecord::new(self.make_intersection(p, 0.0), 1.0 / self.surface_area())
    }

    fn surface_area(&self) -> Float {
        4.0 * PI * self.radius * self.radius
    }
}
