//! Intersection record for world-space ray casts.

use prism_core::ActorId;
use prism_math::Vec3;

/// Nearest hit found by a scene query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// World-space distance from the ray origin
    pub distance: f32,
    pub actor: ActorId,
    /// Triangle index for mesh actors
    pub triangle: Option<u32>,
    /// World-space hit point
    pub point: Vec3,
    /// Outward world-space geometric normal (unit length)
    pub normal: Vec3,
}

impl Intersection {
    /// Shading normal for a ray travelling along `direction`.
    ///
    /// Returns the normal flipped to face the incoming ray, and whether the
    /// ray enters the surface. The entering flag comes from the unflipped
    /// normal and is what refraction bookkeeping must use.
    pub fn facing(&self, direction: Vec3) -> (Vec3, bool) {
        let entering = self.normal.dot(direction) < 0.0;
        let normal = if entering { self.normal } else { -self.normal };
        (normal, entering)
    }
}
