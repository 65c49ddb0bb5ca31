//! Sphere primitive centered at the local origin.

use crate::shape::{Shape, ShapeHit};
use prism_math::{Aabb, Ray, Vec3};

/// A sphere of the given radius centered at the local origin.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(0.0),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Shape for Sphere {
    fn intersect(&self, ray: &Ray, hit: &mut ShapeHit) -> bool {
        // Direction is unit length, so a = 1.
        let b = ray.origin.dot(ray.direction);
        let c = ray.origin.length_squared() - self.radius * self.radius;

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrtd = discriminant.sqrt();
        let near = -b - sqrtd;
        let far = -b + sqrtd;

        // Take the nearest acceptable root; the far one when starting inside.
        let t = if hit.accepts(ray, near) {
            near
        } else if hit.accepts(ray, far) {
            far
        } else {
            return false;
        };

        hit.distance = t;
        hit.triangle = None;
        true
    }

    fn normal_at(&self, point: Vec3, _triangle: Option<u32>) -> Vec3 {
        point.try_normalize().unwrap_or(Vec3::Y)
    }

    fn bounds(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        Aabb::from_points(-r, r)
    }

    fn name(&self) -> &'static str {
        "sphere"
    }
}
