//! Shape trait and the local-space hit record.

use prism_math::{Aabb, Interval, Ray, Vec3};

/// Roots at or below this distance are rejected to avoid self-intersection.
pub const HIT_EPSILON: f32 = 1e-4;

/// Result of a local-space intersection test.
///
/// `distance` is both input and output: it enters as the current nearest
/// distance and only shrinks when a nearer hit is accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    pub distance: f32,
    /// Triangle index for mesh shapes
    pub triangle: Option<u32>,
}

impl ShapeHit {
    /// A record that accepts any hit nearer than `bound`.
    pub fn within(bound: f32) -> Self {
        Self {
            distance: bound,
            triangle: None,
        }
    }

    /// True if `t` is a valid improvement for `ray`.
    #[inline]
    pub fn accepts(&self, ray: &Ray, t: f32) -> bool {
        Interval::new(HIT_EPSILON, self.distance).surrounds(t)
            && Interval::new(ray.t_min, ray.t_max).contains(t)
    }
}

impl Default for ShapeHit {
    fn default() -> Self {
        Self::within(f32::INFINITY)
    }
}

/// Geometry that can be intersected in its own local frame.
pub trait Shape: Send + Sync {
    /// Test the ray against the shape.
    ///
    /// On a hit nearer than `hit.distance` and inside the ray's range, shrinks
    /// `hit.distance` (and sets the triangle index for meshes) and returns true.
    fn intersect(&self, ray: &Ray, hit: &mut ShapeHit) -> bool;

    /// Outward unit normal at a surface point.
    fn normal_at(&self, point: Vec3, triangle: Option<u32>) -> Vec3;

    /// Local-space bounds.
    fn bounds(&self) -> Aabb;

    /// Short type name, used in logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_respects_epsilon_range_and_best() {
        let open = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = ShapeHit::within(5.0);
        assert!(!hit.accepts(&open, HIT_EPSILON));
        assert!(hit.accepts(&open, 2.0 * HIT_EPSILON));
        assert!(hit.accepts(&open, 4.9));
        assert!(!hit.accepts(&open, 5.0));

        let clipped = open.with_range(1.0, 3.0);
        assert!(!hit.accepts(&clipped, 0.5));
        assert!(hit.accepts(&clipped, 1.0));
        assert!(hit.accepts(&clipped, 3.0));
        assert!(!hit.accepts(&clipped, 3.5));
    }
}
