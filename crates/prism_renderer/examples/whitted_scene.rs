//! Renders a small Whitted test scene to `whitted_scene.png`.
//!
//! Usage: `cargo run --release --example whitted_scene [config.json]`

use std::sync::Arc;

use anyhow::{Context, Result};
use prism_core::{Actor, Color, Cuboid, Falloff, Light, Material, Quad, Scene, Sphere, TriangleMesh};
use prism_math::{Camera, Mat4, Quat, Vec3};
use prism_renderer::{RayTracer, RenderConfig};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const OUTPUT: &str = "whitted_scene.png";

fn build_scene() -> Scene {
    let mut scene = Scene::new("whitted");
    scene.set_background(Color::new(0.05, 0.07, 0.12));
    scene.set_ambient(Color::splat(0.3));

    let floor = Material::phong(Color::new(0.6, 0.6, 0.55), Color::splat(0.1), 16.0);
    scene.add_actor(Actor::new("floor", Quad::new(20.0, 20.0), Arc::new(floor)));

    scene.add_actor(
        Actor::new("glass ball", Sphere::new(1.0), Arc::new(Material::glass(1.5)))
            .with_transform(Mat4::from_translation(Vec3::new(-1.5, 1.0, 0.5))),
    );

    scene.add_actor(
        Actor::new("gold ball", Sphere::new(0.8), Arc::new(Material::gold(0.25)))
            .with_transform(Mat4::from_translation(Vec3::new(1.6, 0.8, 0.0))),
    );

    let mirror = Material::mirror(Color::splat(0.9));
    scene.add_actor(
        Actor::new("mirror", Cuboid::from_size(Vec3::new(4.0, 2.5, 0.1)), Arc::new(mirror)).with_transform(
            Mat4::from_rotation_translation(Quat::from_rotation_y(0.3), Vec3::new(0.0, 1.25, -3.0)),
        ),
    );

    let red = Material::dielectric(Color::new(0.8, 0.15, 0.1), 0.4);
    scene.add_actor(
        Actor::new("crate", TriangleMesh::cuboid(Vec3::splat(0.8)), Arc::new(red)).with_transform(
            Mat4::from_scale_rotation_translation(
                Vec3::ONE,
                Quat::from_rotation_y(0.7),
                Vec3::new(0.2, 0.4, 2.0),
            ),
        ),
    );

    scene.add_light(
        Light::point(Vec3::new(-4.0, 6.0, 5.0), Color::splat(40.0))
            .with_name("key")
            .with_falloff(Falloff::Quadratic),
    );
    scene.add_light(Light::directional(Vec3::new(0.5, -1.0, -0.3), Color::splat(0.3)).with_name("fill"));

    scene
}

fn load_config() -> Result<RenderConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            let config = RenderConfig::from_json(&json).with_context(|| format!("parsing {path}"))?;
            log::info!("Loaded render config from {path}");
            Ok(config)
        }
        None => Ok(RenderConfig::default().with_adaptive(2, 0.05).with_jitter(1)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = load_config()?;
    let scene = build_scene();

    let mut camera = Camera::new(Vec3::new(0.0, 2.5, 8.0), Vec3::new(0.0, 0.8, 0.0), WIDTH as f32 / HEIGHT as f32);
    camera.set_view_angle(40.0);
    camera.set_clipping_planes(0.1, 100.0);

    let mut tracer = RayTracer::new(config);
    tracer.update(&scene);
    let image = tracer.render_image(&scene, &camera, WIDTH, HEIGHT);

    image::save_buffer(OUTPUT, &image.to_rgba8(), WIDTH, HEIGHT, image::ColorType::Rgba8)
        .with_context(|| format!("writing {OUTPUT}"))?;
    log::info!("Wrote {OUTPUT}");

    Ok(())
}
