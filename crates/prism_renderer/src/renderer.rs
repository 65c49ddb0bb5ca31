//! Ray tracer facade: owns the configuration and the scene BVH.

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use prism_core::{ActorId, Scene};
use prism_math::Camera;

use crate::accel::SceneBvh;
use crate::config::RenderConfig;
use crate::dispatch::FrameJob;
use crate::image::ImageBuffer;
use crate::sampler::ViewMapper;

/// Summary of a completed render.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderStats {
    pub rays: u64,
    pub hits: u64,
    pub shadow_rays: u64,
    pub elapsed: Duration,
    /// Number of row bands the image was split into
    pub bands: usize,
}

/// How a render ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderOutcome {
    /// The image was fully written.
    Completed(RenderStats),
    /// The cancel flag was raised; the image was left untouched.
    Cancelled,
}

impl RenderOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Whitted ray tracer.
///
/// The BVH is rebuilt lazily whenever the scene version differs from the one
/// it was built from, so callers only need to call [`RayTracer::update`]
/// when they want to pay the build cost up front.
#[derive(Debug, Default)]
pub struct RayTracer {
    config: RenderConfig,
    bvh: Option<SceneBvh>,
}

impl RayTracer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config: config.sanitized(),
            bvh: None,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config.sanitized();
    }

    /// Rebuild the BVH from the scene's current actors.
    pub fn update(&mut self, scene: &Scene) {
        self.bvh = Some(SceneBvh::build(scene));
    }

    /// BVH for the scene, rebuilt if missing or stale.
    fn bvh_for(&mut self, scene: &Scene) -> &SceneBvh {
        let stale = self.bvh.as_ref().map_or(true, |bvh| bvh.is_stale(scene));
        if stale {
            self.update(scene);
        }
        self.bvh.get_or_insert_with(|| SceneBvh::build(scene))
    }

    /// Render into `image`, sized by the image itself.
    ///
    /// The image is only written when the whole frame completes; raising
    /// `cancel` stops workers at their next scanline and leaves it untouched.
    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        image: &mut ImageBuffer,
        cancel: &AtomicBool,
    ) -> RenderOutcome {
        let start = Instant::now();
        let (width, height) = (image.width(), image.height());
        let config = self.config.clone();
        let bvh = self.bvh_for(scene);
        let mapper = ViewMapper::new(camera, width, height);

        let job = FrameJob {
            scene,
            bvh,
            config: &config,
            mapper: &mapper,
            width,
            height,
        };
        let Some(frame) = job.run(cancel) else {
            log::info!("Render of {width}x{height} cancelled after {:.2?}", start.elapsed());
            return RenderOutcome::Cancelled;
        };

        if let Err(e) = image.replace(frame.pixels) {
            // Sizes come from the image itself, so this only fires on a logic error.
            log::warn!("Discarding frame: {e}");
            return RenderOutcome::Cancelled;
        }

        let stats = RenderStats {
            rays: frame.stats.rays,
            hits: frame.stats.hits,
            shadow_rays: frame.stats.shadow_rays,
            elapsed: start.elapsed(),
            bands: frame.bands,
        };
        log::info!(
            "Rendered {}x{} in {:.2?}: {} rays ({} hits), {} shadow rays, {} bands",
            width,
            height,
            stats.elapsed,
            stats.rays,
            stats.hits,
            stats.shadow_rays,
            stats.bands
        );
        RenderOutcome::Completed(stats)
    }

    /// Render a fresh `width × height` image, never cancelled.
    pub fn render_image(&mut self, scene: &Scene, camera: &Camera, width: u32, height: u32) -> ImageBuffer {
        let mut image = ImageBuffer::new(width, height);
        let cancel = AtomicBool::new(false);
        self.render(scene, camera, &mut image, &cancel);
        image
    }

    /// Actor visible through the centre of pixel `(x, y)` of a
    /// `width × height` view, if any.
    pub fn select_actor(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    ) -> Option<ActorId> {
        if x >= width || y >= height {
            return None;
        }
        let ray = ViewMapper::new(camera, width, height).pixel_center_ray(x, y);
        let hit = self.bvh_for(scene).nearest(scene, &ray)?;
        log::debug!("Picked actor {:?} at pixel ({x}, {y})", hit.actor);
        Some(hit.actor)
    }
}
