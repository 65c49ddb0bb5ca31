//! Prism Core - scene description for the Whitted ray tracer.
//!
//! This crate provides:
//!
//! - **Shapes**: `Sphere`, `Cuboid`, `Quad`, `TriangleMesh`, all behind the `Shape` trait
//! - **Scene types**: `Actor`, `Material`, `Light`, `Scene`
//! - **Acceleration**: a flat SAH `Bvh` used for both scenes and meshes
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use prism_core::{Actor, Light, Material, Scene, Sphere};
//!
//! let mut scene = Scene::new("demo");
//! let red = Arc::new(Material::matte(Color::new(0.8, 0.1, 0.1)));
//! scene.add_actor(Actor::new("ball", Sphere::new(1.0), red));
//! scene.add_light(Light::point(Vec3::new(0.0, 5.0, 0.0), Color::ONE));
//! ```

pub mod actor;
pub mod bvh;
pub mod cuboid;
pub mod light;
pub mod material;
pub mod mesh;
pub mod quad;
pub mod scene;
pub mod shape;
pub mod sphere;

// Re-export commonly used types
pub use actor::Actor;
pub use bvh::{Bvh, BvhNode};
pub use cuboid::Cuboid;
pub use light::{Falloff, Light, LightKind, LightSample};
pub use material::{is_non_black, Brdf, Color, Material, DIELECTRIC_F0};
pub use mesh::TriangleMesh;
pub use quad::Quad;
pub use scene::{ActorId, Scene};
pub use shape::{Shape, ShapeHit, HIT_EPSILON};
pub use sphere::Sphere;
