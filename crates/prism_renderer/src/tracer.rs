//! Whitted recursion: direct lighting, shadows, reflection and refraction.

use prism_core::{is_non_black, Actor, Brdf, Color, Scene};
use prism_math::Ray;

use crate::accel::SceneBvh;
use crate::brdf::{self, BrdfTerms};
use crate::config::{RenderConfig, ShadowPolicy};
use crate::hit::Intersection;
use crate::ior::IorStack;
use crate::sampler::ViewMapper;

/// Offset applied to secondary ray origins against self-intersection.
pub const RT_EPSILON: f32 = 1e-4;

/// Ray counters for one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    /// Primary and secondary rays traced
    pub rays: u64,
    /// Rays that hit an actor
    pub hits: u64,
    pub shadow_rays: u64,
}

impl std::ops::AddAssign for TraceStats {
    fn add_assign(&mut self, other: Self) {
        self.rays += other.rays;
        self.hits += other.hits;
        self.shadow_rays += other.shadow_rays;
    }
}

/// Per-worker shading state over a read-only scene and BVH.
pub struct Tracer<'a> {
    scene: &'a Scene,
    bvh: &'a SceneBvh,
    config: &'a RenderConfig,
    stats: TraceStats,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, bvh: &'a SceneBvh, config: &'a RenderConfig) -> Self {
        Self {
            scene,
            bvh,
            config,
            stats: TraceStats::default(),
        }
    }

    pub fn stats(&self) -> TraceStats {
        self.stats
    }

    /// Unclamped colour seen along a primary ray.
    pub fn trace_primary(&mut self, ray: &Ray) -> Color {
        self.trace(ray, 0, 1.0, IorStack::new(self.config.scene_ior))
    }

    /// Final pixel colour through image coordinates `(x, y)`, clamped to `[0, 1]`.
    pub fn shoot(&mut self, mapper: &ViewMapper, x: f32, y: f32) -> Color {
        let ray = mapper.pixel_ray(x, y);
        self.trace_primary(&ray).clamp(Color::ZERO, Color::ONE)
    }

    /// Colour along `ray` at recursion `level`.
    ///
    /// `weight` is the product of the reflective and refractive factors along
    /// the path so far; `media` the stack of media the ray travels through.
    pub fn trace(&mut self, ray: &Ray, level: u32, weight: f32, media: IorStack) -> Color {
        if level > self.config.max_recursion_level {
            return Color::ZERO;
        }

        self.stats.rays += 1;
        let Some(hit) = self.bvh.nearest(self.scene, ray) else {
            return self.scene.background();
        };
        self.stats.hits += 1;

        self.shade(ray, &hit, level, weight, media)
    }

    fn shade(&mut self, ray: &Ray, hit: &Intersection, level: u32, weight: f32, media: IorStack) -> Color {
        let Some(actor) = self.scene.actor(hit.actor) else {
            return self.scene.background();
        };
        let material = actor.material();
        let (n, entering) = hit.facing(ray.direction);
        let p = hit.point;

        let mut color = self.scene.ambient() * material.ambient;

        let r = brdf::reflect(ray.direction, n);
        let v = -ray.direction;
        let shadow_origin = p + n * RT_EPSILON;

        for light in self.scene.lights() {
            let Some(sample) = light.light_vector(p) else {
                continue;
            };
            let l = sample.direction;
            let n_dot_l = n.dot(l);
            if n_dot_l <= 0.0 {
                continue;
            }

            let shadow = Ray::new(shadow_origin, l).with_range(0.0, sample.distance);
            if self.shadowed(&shadow) {
                continue;
            }

            let terms: BrdfTerms = match material.model {
                Brdf::Phong => brdf::phong(material, n_dot_l, r.dot(l)),
                Brdf::CookTorrance => brdf::cook_torrance(material, n, v, l),
            };
            color += light.light_color(sample.distance) * sample.intensity * terms.total();
        }

        if level >= self.config.max_recursion_level {
            return color;
        }

        if is_non_black(material.reflectance) {
            let w = weight * material.reflectance.max_element();
            if w > self.config.min_weight {
                let reflected = Ray::new(p + r * RT_EPSILON, r);
                color += material.reflectance * self.trace(&reflected, level + 1, w, media);
            }
        }

        if is_non_black(material.transparency) {
            let w = weight * material.transparency.max_element();
            if w > self.config.min_weight {
                let (n1, n2, next) = if entering {
                    (media.current(), material.ior, media.enter(material.ior))
                } else {
                    (material.ior, media.outside_of(material.ior), media.exit(material.ior))
                };

                // None on total internal reflection: only the mirror branch contributes.
                if let Some(t) = brdf::refract(ray.direction, n, n1 / n2) {
                    let refracted = Ray::new(p + t * RT_EPSILON, t);
                    color += material.transparency * self.trace(&refracted, level + 1, w, next);
                }
            }
        }

        color
    }

    fn shadowed(&mut self, ray: &Ray) -> bool {
        self.stats.shadow_rays += 1;
        match self.config.shadow_policy {
            ShadowPolicy::SkipTransparent => self.bvh.occluded(self.scene, ray, is_opaque),
            ShadowPolicy::AllOpaque => self.bvh.occluded(self.scene, ray, |_| true),
        }
    }
}

fn is_opaque(actor: &Actor) -> bool {
    !actor.material().is_transparent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{Falloff, Light, Material, Quad, Sphere};
    use prism_math::{Mat4, Vec3};
    use std::sync::Arc;

    fn lit_sphere(material: Material) -> Scene {
        let mut scene = Scene::new("sphere");
        scene.set_ambient(Color::ZERO);
        scene.add_actor(Actor::new("ball", Sphere::new(1.0), Arc::new(material)));
        scene.add_light(Light::point(Vec3::new(0.0, 0.0, 10.0), Color::ONE));
        scene
    }

    fn trace(scene: &Scene, config: &RenderConfig, ray: &Ray) -> (Color, TraceStats) {
        let bvh = SceneBvh::build(scene);
        let mut tracer = Tracer::new(scene, &bvh, config);
        let color = tracer.trace_primary(ray);
        (color, tracer.stats())
    }

    #[test]
    fn test_miss_returns_background() {
        let mut scene = lit_sphere(Material::default());
        scene.set_background(Color::new(0.2, 0.4, 0.6));
        let ray = Ray::new(Vec3::new(0.0, 5.0, 5.0), Vec3::NEG_Z);

        let (color, stats) = trace(&scene, &RenderConfig::default(), &ray);
        assert_eq!(color, Color::new(0.2, 0.4, 0.6));
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_head_on_diffuse() {
        let scene = lit_sphere(Material::matte(Color::splat(0.5)));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        let (color, stats) = trace(&scene, &RenderConfig::default(), &ray);
        assert!((color - Color::splat(0.5)).length() < 1e-4, "{color}");
        assert_eq!(stats.shadow_rays, 1);
    }

    #[test]
    fn test_light_behind_surface_contributes_nothing() {
        let mut scene = lit_sphere(Material::matte(Color::ONE));
        scene.lights_mut()[0].position = Vec3::new(0.0, 0.0, -10.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        let (color, stats) = trace(&scene, &RenderConfig::default(), &ray);
        assert_eq!(color, Color::ZERO);
        assert_eq!(stats.shadow_rays, 0);
    }

    #[test]
    fn test_transparent_occluder_policy() {
        let mut scene = Scene::new("shadow");
        scene.set_ambient(Color::ZERO);
        scene.add_actor(
            Actor::new("floor", Quad::new(10.0, 10.0), Arc::new(Material::matte(Color::ONE))),
        );
        let pane = Material::matte(Color::ONE).with_transparency(Color::ONE, 1.0);
        scene.add_actor(
            Actor::new("pane", Quad::new(4.0, 4.0), Arc::new(pane))
                .with_transform(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))),
        );
        scene.add_light(Light::point(Vec3::new(0.0, 5.0, 0.0), Color::ONE).with_falloff(Falloff::Constant));

        // Reach the floor from the side, under the pane.
        let ray = Ray::new(Vec3::new(3.0, 1.0, 0.0), Vec3::new(-3.0, -1.0, 0.0));
        let config = RenderConfig::default().with_max_recursion_level(0);

        let (lit, _) = trace(&scene, &config, &ray);
        assert!(lit.x > 0.0);

        let opaque = config.clone().with_shadow_policy(ShadowPolicy::AllOpaque);
        let (dark, _) = trace(&scene, &opaque, &ray);
        assert_eq!(dark, Color::ZERO);
    }

    #[test]
    fn test_mirror_sees_background() {
        let mut scene = Scene::new("mirror");
        scene.set_ambient(Color::ZERO);
        scene.set_background(Color::new(0.0, 0.0, 1.0));
        scene.add_actor(Actor::new("mirror", Quad::new(10.0, 10.0), Arc::new(Material::mirror(Color::ONE))));

        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        let (color, stats) = trace(&scene, &RenderConfig::default(), &ray);
        assert!((color - Color::new(0.0, 0.0, 1.0)).length() < 1e-5, "{color}");
        assert_eq!(stats.rays, 2);

        let direct_only = RenderConfig::default().with_max_recursion_level(0);
        let (color, stats) = trace(&scene, &direct_only, &ray);
        assert_eq!(color, Color::ZERO);
        assert_eq!(stats.rays, 1);
    }

    #[test]
    fn test_low_weight_stops_recursion() {
        let mut scene = Scene::new("dim mirror");
        scene.add_actor(Actor::new(
            "mirror",
            Quad::new(10.0, 10.0),
            Arc::new(Material::matte(Color::ZERO).with_reflectance(Color::splat(0.01))),
        ));
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        let config = RenderConfig::default().with_min_weight(0.05);

        let (_, stats) = trace(&scene, &config, &ray);
        assert_eq!(stats.rays, 1);
    }

    #[test]
    fn test_glass_sphere_passes_background_through() {
        let mut scene = Scene::new("glass");
        scene.set_ambient(Color::ZERO);
        scene.set_background(Color::ONE);
        let glass = Material::matte(Color::ZERO).with_transparency(Color::ONE, 1.5);
        scene.add_actor(Actor::new("ball", Sphere::new(1.0), Arc::new(glass)));

        // Straight through the centre: no bending, two interfaces.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let (color, stats) = trace(&scene, &RenderConfig::default(), &ray);
        assert!((color - Color::ONE).length() < 1e-4, "{color}");
        assert_eq!(stats.rays, 3);
    }
}
