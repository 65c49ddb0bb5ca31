//! Prism math types.
//!
//! Re-exports glam and adds the ray tracing primitives shared by every
//! other crate: rays with clip ranges, intervals, bounding boxes, transform
//! helpers and the camera.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod camera;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use camera::{Camera, ProjectionType};
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Mat4Ext;
