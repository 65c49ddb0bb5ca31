use crate::{Interval, Ray, Vec3};

/// Minimum extent of any axis of a non-empty box.
const MIN_EXTENT: f32 = 0.0001;

/// Axis-aligned box, one [`Interval`] per axis.
///
/// Non-empty boxes are never flat: thin axes are padded to a minimum extent
/// so slab tests against planar shapes still succeed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Box from per-axis extents.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Box spanned by two opposite corners, in either order.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self::new(
            Interval::new(a.x.min(b.x), a.x.max(b.x)),
            Interval::new(a.y.min(b.y), a.y.max(b.y)),
            Interval::new(a.z.min(b.z), a.z.max(b.z)),
        )
    }

    /// Create the tightest AABB around a set of points. Empty input gives [`Aabb::EMPTY`].
    pub fn from_point_cloud<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(p);
            max = max.max(p);
        }
        if min.x > max.x {
            return Self::EMPTY;
        }
        Self::from_points(min, max)
    }

    /// Hull of two boxes.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Grow the box so it contains `p`.
    pub fn grow(&self, p: Vec3) -> Self {
        Self {
            x: self.x.include(p.x),
            y: self.y.include(p.y),
            z: self.z.include(p.z),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Extent along axis `n` (0 = X, 1 = Y, 2 = Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// All eight corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min(), self.max());
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    /// Axis with the largest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Total surface area, zero for empty boxes.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.max() - self.min();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Where `p` sits inside the box, per axis: 0 at the min corner, 1 at the max.
    ///
    /// Flat axes map to 0.
    pub fn offset(&self, p: Vec3) -> Vec3 {
        let extent = self.max() - self.min();
        let rel = p - self.min();
        Vec3::select(extent.cmpgt(Vec3::ZERO), rel / extent, Vec3::ZERO)
    }

    /// Slab test against a ray given as origin and reciprocal direction.
    ///
    /// Returns the parametric entry distance clipped to `[t_min, t_max]`, or
    /// `None` if the ray misses the box inside that range.
    #[inline]
    pub fn entry_distance(&self, origin: Vec3, inv_dir: Vec3, t_min: f32, t_max: f32) -> Option<f32> {
        let mut near = t_min;
        let mut far = t_max;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let inv = inv_dir[axis];
            let mut t0 = (slab.min - origin[axis]) * inv;
            let mut t1 = (slab.max - origin[axis]) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            near = t0.max(near);
            far = t1.min(far);
            if far < near {
                return None;
            }
        }

        Some(near)
    }

    /// True if the ray crosses the box inside its clip range.
    pub fn hit(&self, ray: &Ray) -> bool {
        self.entry_distance(ray.origin, ray.direction.recip(), ray.t_min, ray.t_max)
            .is_some()
    }

    fn pad_to_minimums(&mut self) {
        if !self.x.is_empty() && self.x.size() < MIN_EXTENT {
            self.x = self.x.expand(MIN_EXTENT);
        }
        if !self.y.is_empty() && self.y.size() < MIN_EXTENT {
            self.y = self.y.expand(MIN_EXTENT);
        }
        if !self.z.is_empty() && self.z.size() < MIN_EXTENT {
            self.z = self.z.expand(MIN_EXTENT);
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_from_points_any_order() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(aabb.min(), Vec3::ZERO);
        assert_eq!(aabb.max(), Vec3::splat(10.0));
    }

    #[test]
    fn test_flat_axis_is_padded() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0));
        assert!(aabb.y.size() > 0.0);
        assert!(aabb.surface_area() > 0.0);
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = unit_box();

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(aabb.hit(&ray));

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::NEG_Z);
        assert!(!aabb.hit(&ray));

        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(!aabb.hit(&ray));
    }

    #[test]
    fn test_entry_distance() {
        let aabb = unit_box();
        let origin = Vec3::new(0.0, 0.0, -5.0);
        let inv = Vec3::Z.recip();

        let t = aabb.entry_distance(origin, inv, 0.0, 100.0).unwrap();
        assert!((t - 4.0).abs() < 1e-5);

        // Range ends before the box.
        assert!(aabb.entry_distance(origin, inv, 0.0, 3.0).is_none());

        // Origin inside the box enters at t_min.
        let inside = aabb.entry_distance(Vec3::ZERO, inv, 0.5, 100.0).unwrap();
        assert_eq!(inside, 0.5);
    }

    #[test]
    fn test_axis_parallel_ray_outside_slab_misses() {
        let aabb = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 2.0, -5.0), Vec3::Z);
        assert!(!aabb.hit(&ray));
    }

    #[test]
    fn test_surface_area() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert!((aabb.surface_area() - 22.0).abs() < 1e-5);
        assert_eq!(aabb.centroid(), Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(aabb.offset(Vec3::new(0.5, 1.0, 3.0)), Vec3::new(0.5, 0.5, 1.0));
        assert_eq!(Aabb::EMPTY.surface_area(), 0.0);
    }

    #[test]
    fn test_point_cloud() {
        let aabb = Aabb::from_point_cloud([Vec3::X, Vec3::NEG_Y, Vec3::new(0.0, 0.0, 2.0)]);
        assert_eq!(aabb.min(), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(aabb.max(), Vec3::new(1.0, 0.0, 2.0));
        assert!(Aabb::from_point_cloud(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_aabb_longest_axis() {
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0)).longest_axis(), 0);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0)).longest_axis(), 1);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0)).longest_axis(), 2);
    }
}
