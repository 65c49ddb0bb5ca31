//! Transformable actors: a shape placed in the world with a material.
//!
//! Rays are moved into the shape's local frame with the inverse transform,
//! intersected there, and the hit distance is measured again in world space.

use std::fmt;
use std::sync::Arc;

use prism_math::{Aabb, Mat3, Mat4, Mat4Ext, Ray, Vec3};

use crate::material::Material;
use crate::shape::{Shape, ShapeHit};

/// A shape with a material and a local-to-world transform.
pub struct Actor {
    name: String,
    shape: Box<dyn Shape>,
    material: Arc<Material>,
    transform: Mat4,
    inverse: Mat4,
    normal_matrix: Mat3,
    world_bounds: Aabb,
    visible: bool,
}

impl Actor {
    pub fn new(name: impl Into<String>, shape: impl Shape + 'static, material: Arc<Material>) -> Self {
        Self::from_boxed(name, Box::new(shape), material)
    }

    pub fn from_boxed(name: impl Into<String>, shape: Box<dyn Shape>, material: Arc<Material>) -> Self {
        let world_bounds = shape.bounds();
        Self {
            name: name.into(),
            shape,
            material,
            transform: Mat4::IDENTITY,
            inverse: Mat4::IDENTITY,
            normal_matrix: Mat3::IDENTITY,
            world_bounds,
            visible: true,
        }
    }

    /// Builder variant of [`Actor::set_transform`].
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.set_transform(transform);
        self
    }

    /// Set the local-to-world transform.
    ///
    /// The inverse, normal matrix and world bounds are derived here. A singular
    /// transform is replaced by identity.
    pub fn set_transform(&mut self, transform: Mat4) {
        let (transform, inverse) = match transform.try_inverse() {
            Some(inverse) => (transform, inverse),
            None => {
                log::warn!("Actor '{}': singular transform replaced by identity", self.name);
                (Mat4::IDENTITY, Mat4::IDENTITY)
            }
        };

        self.transform = transform;
        self.inverse = inverse;
        self.normal_matrix = Mat3::from_mat4(inverse).transpose();
        self.world_bounds = transform.transform_aabb(&self.shape.bounds());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = material;
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn inverse_transform(&self) -> Mat4 {
        self.inverse
    }

    pub fn normal_matrix(&self) -> Mat3 {
        self.normal_matrix
    }

    /// Local bounds carried through the transform.
    pub fn world_bounds(&self) -> Aabb {
        self.world_bounds
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Intersect a world-space ray.
    ///
    /// Returns the hit with its distance in world units if it lies in the
    /// ray's range and is nearer than `best`.
    pub fn intersect(&self, ray: &Ray, best: f32) -> Option<ShapeHit> {
        let local_direction = self.inverse.transform_vector3(ray.direction);
        let scale = local_direction.length();
        if !(scale.is_finite() && scale > f32::MIN_POSITIVE) {
            return None;
        }

        // World distances map to local ones by the length of the local direction.
        let local = Ray::new(self.inverse.transform_point3(ray.origin), local_direction)
            .with_range(ray.t_min * scale, ray.t_max.min(best) * scale);

        let mut hit = ShapeHit::within(f32::INFINITY);
        if !self.shape.intersect(&local, &mut hit) {
            return None;
        }

        let world_point = self.transform.transform_point3(local.at(hit.distance));
        let to_point = world_point - ray.origin;
        if to_point.dot(ray.direction) < 0.0 {
            return None;
        }

        let distance = to_point.length();
        if distance <= ray.t_min || distance > ray.t_max || distance >= best {
            return None;
        }

        Some(ShapeHit {
            distance,
            triangle: hit.triangle,
        })
    }

    /// World-space unit normal at a world-space surface point.
    pub fn normal_at(&self, world_point: Vec3, triangle: Option<u32>) -> Vec3 {
        let local = self.shape.normal_at(self.inverse.transform_point3(world_point), triangle);
        (self.normal_matrix * local).try_normalize().unwrap_or(local)
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("shape", &self.shape.name())
            .field("visible", &self.visible)
            .field("world_bounds", &self.world_bounds)
            .finish()
    }
}
