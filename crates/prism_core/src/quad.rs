//! Finite plane lying in the local XZ plane, facing +Y.

use crate::shape::{Shape, ShapeHit};
use prism_math::{Aabb, Ray, Vec3};

/// Rays with |D·n| below this are considered parallel to the plane.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Half thickness of the bounds, so the box is never flat.
const BOUNDS_THICKNESS: f32 = 0.01;

/// A `width × depth` rectangle centered at the local origin.
#[derive(Debug, Clone, Copy)]
pub struct Quad {
    width: f32,
    depth: f32,
}

impl Quad {
    pub fn new(width: f32, depth: f32) -> Self {
        Self {
            width: width.abs(),
            depth: depth.abs(),
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.depth)
    }
}

impl Default for Quad {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl Shape for Quad {
    fn intersect(&self, ray: &Ray, hit: &mut ShapeHit) -> bool {
        let denom = ray.direction.y;
        if denom.abs() < PARALLEL_EPSILON {
            return false;
        }

        let t = -ray.origin.y / denom;
        if !hit.accepts(ray, t) {
            return false;
        }

        let p = ray.at(t);
        if p.x.abs() > self.width * 0.5 || p.z.abs() > self.depth * 0.5 {
            return false;
        }

        hit.distance = t;
        hit.triangle = None;
        true
    }

    fn normal_at(&self, _point: Vec3, _triangle: Option<u32>) -> Vec3 {
        Vec3::Y
    }

    fn bounds(&self) -> Aabb {
        let half = Vec3::new(self.width * 0.5, BOUNDS_THICKNESS, self.depth * 0.5);
        Aabb::from_points(-half, half)
    }

    fn name(&self) -> &'static str {
        "quad"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_hit_from_above() {
        let quad = Quad::new(4.0, 2.0);
        let ray = Ray::new(Vec3::new(1.5, 3.0, 0.5), Vec3::NEG_Y);
        let mut hit = ShapeHit::default();

        assert!(quad.intersect(&ray, &mut hit));
        assert!((hit.distance - 3.0).abs() < 1e-5);
        assert_eq!(quad.normal_at(ray.at(hit.distance), None), Vec3::Y);
    }

    #[test]
    fn test_quad_hit_from_below() {
        let quad = Quad::new(1.0, 1.0);
        let ray = Ray::new(Vec3::new(0.0, -2.0, 0.0), Vec3::Y);
        let mut hit = ShapeHit::default();
        assert!(quad.intersect(&ray, &mut hit));
    }

    #[test]
    fn test_quad_outside_footprint() {
        let quad = Quad::new(4.0, 2.0);
        let ray = Ray::new(Vec3::new(0.0, 3.0, 1.5), Vec3::NEG_Y);
        let mut hit = ShapeHit::default();
        assert!(!quad.intersect(&ray, &mut hit));
    }

    #[test]
    fn test_quad_parallel_ray() {
        let quad = Quad::new(4.0, 4.0);
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        let mut hit = ShapeHit::default();
        assert!(!quad.intersect(&ray, &mut hit));
    }

    #[test]
    fn test_quad_bounds_not_flat() {
        let b = Quad::new(2.0, 2.0).bounds();
        assert!(b.y.size() > 0.0);
        assert!((b.x.size() - 2.0).abs() < 1e-5);
    }
}
