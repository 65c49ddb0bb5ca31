use crate::Vec3;

/// A ray in 3D space with a normalized direction and a parametric clip range.
///
/// Points along the ray are `origin + t * direction` for `t` in `[t_min, t_max]`.
/// During traversal `t_max` acts as the shrinking upper bound of the nearest hit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    /// Create a ray over `[0, +inf)`.
    ///
    /// The direction is normalized. A zero or non-finite direction falls back
    /// to `-Z` instead of leaking NaN into intersection tests.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Z),
            t_min: 0.0,
            t_max: f32::INFINITY,
        }
    }

    /// Set the parametric clip range.
    pub fn with_range(mut self, t_min: f32, t_max: f32) -> Self {
        self.t_min = t_min;
        self.t_max = t_max.max(t_min);
        self
    }

    /// Get the point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// True if `t` lies inside `[t_min, t_max]`.
    #[inline]
    pub fn in_range(&self, t: f32) -> bool {
        self.t_min <= t && t <= self.t_max
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!((ray.direction - Vec3::new(0.0, 0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_direction_falls_back() {
        let ray = Ray::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(ray.direction, Vec3::NEG_Z);

        let ray = Ray::new(Vec3::ONE, Vec3::new(f32::NAN, 0.0, 1.0));
        assert!(ray.direction.is_finite());
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_range_never_inverts() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X).with_range(2.0, 1.0);
        assert!(ray.t_min <= ray.t_max);
        assert!(ray.in_range(2.0));
        assert!(!ray.in_range(2.5));
    }
}
