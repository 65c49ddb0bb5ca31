//! Axis-aligned box primitive centered at the local origin.

use crate::shape::{Shape, ShapeHit};
use prism_math::{Aabb, Ray, Vec3};

/// Directions with a component below this are treated as parallel to that slab.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A box with the given half extents, centered at the local origin.
#[derive(Debug, Clone, Copy)]
pub struct Cuboid {
    half_extents: Vec3,
}

impl Cuboid {
    pub fn new(half_extents: Vec3) -> Self {
        Self {
            half_extents: half_extents.abs(),
        }
    }

    /// Box spanning `size` along each axis.
    pub fn from_size(size: Vec3) -> Self {
        Self::new(size * 0.5)
    }

    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }
}

impl Default for Cuboid {
    fn default() -> Self {
        Self::new(Vec3::splat(0.5))
    }
}

impl Shape for Cuboid {
    fn intersect(&self, ray: &Ray, hit: &mut ShapeHit) -> bool {
        let h = self.half_extents;
        let mut enter = f32::NEG_INFINITY;
        let mut exit = f32::INFINITY;

        for axis in 0..3 {
            let o = ray.origin[axis];
            let d = ray.direction[axis];

            if d.abs() < PARALLEL_EPSILON {
                if o.abs() > h[axis] {
                    return false;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (-h[axis] - o) * inv;
            let mut t1 = (h[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            enter = enter.max(t0);
            exit = exit.min(t1);
            if enter > exit {
                return false;
            }
        }

        let t = if hit.accepts(ray, enter) {
            enter
        } else if hit.accepts(ray, exit) {
            exit
        } else {
            return false;
        };

        hit.distance = t;
        hit.triangle = None;
        true
    }

    fn normal_at(&self, point: Vec3, _triangle: Option<u32>) -> Vec3 {
        // The face is the axis where the point sits closest to the extent.
        let q = point / self.half_extents.max(Vec3::splat(f32::MIN_POSITIVE));
        let a = q.abs();
        if a.x >= a.y && a.x >= a.z {
            Vec3::new(q.x.signum(), 0.0, 0.0)
        } else if a.y >= a.z {
            Vec3::new(0.0, q.y.signum(), 0.0)
        } else {
            Vec3::new(0.0, 0.0, q.z.signum())
        }
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_points(-self.half_extents, self.half_extents)
    }

    fn name(&self) -> &'static str {
        "cuboid"
    }
}
