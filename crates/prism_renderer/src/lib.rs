//! Prism Renderer - Whitted-style CPU ray tracing
//!
//! Recursive ray tracer over a `prism_core` scene: direct lighting with
//! shadow rays, mirror reflection and refraction through nested media.
//! Primary rays can be adaptively supersampled, and frames are rendered in
//! parallel row bands with cooperative cancellation.

mod accel;
mod adaptive;
pub mod brdf;
mod config;
mod dispatch;
mod error;
mod hit;
mod image;
mod ior;
mod renderer;
mod sampler;
mod tracer;

pub use accel::SceneBvh;
pub use adaptive::AdaptiveSampler;
pub use brdf::BrdfTerms;
pub use config::{RenderConfig, ShadowPolicy, MAX_RECURSION_LEVEL, MAX_SUBDIVISION_LEVEL, MIN_WEIGHT_FLOOR};
pub use dispatch::{generate_bands, Band};
pub use error::{ConfigError, ImageError};
pub use hit::Intersection;
pub use image::{ImageBuffer, Rgba8};
pub use ior::IorStack;
pub use renderer::{RayTracer, RenderOutcome, RenderStats};
pub use sampler::ViewMapper;
pub use tracer::{TraceStats, Tracer, RT_EPSILON};

/// Re-export the scene and math types the renderer API speaks in
pub use prism_core::{ActorId, Color, Scene};
pub use prism_math::{Camera, ProjectionType, Ray, Vec3};
