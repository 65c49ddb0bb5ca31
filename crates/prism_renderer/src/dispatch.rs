//! Row-band parallel dispatch.
//!
//! The image is split into one contiguous band of rows per worker. Each band
//! renders into its own slice of a scratch framebuffer with its own tracer
//! and sampler, so workers share nothing mutable.

use std::sync::atomic::{AtomicBool, Ordering};

use prism_core::{Color, Scene};
use rayon::prelude::*;

use crate::accel::SceneBvh;
use crate::adaptive::AdaptiveSampler;
use crate::config::RenderConfig;
use crate::sampler::ViewMapper;
use crate::tracer::{TraceStats, Tracer};

/// A contiguous range of image rows rendered by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    /// Index of this band, top to bottom
    pub index: usize,
    pub first_row: u32,
    pub rows: u32,
}

impl Band {
    pub fn new(index: usize, first_row: u32, rows: u32) -> Self {
        Self { index, first_row, rows }
    }

    /// One past the last row.
    pub fn end_row(&self) -> u32 {
        self.first_row + self.rows
    }
}

/// Split `height` rows into at most `workers` bands of equal height (the
/// last one may be shorter).
pub fn generate_bands(height: u32, workers: usize) -> Vec<Band> {
    if height == 0 {
        return Vec::new();
    }
    let rows = rows_per_band(height, workers);
    (0..height)
        .step_by(rows as usize)
        .enumerate()
        .map(|(index, first_row)| Band::new(index, first_row, rows.min(height - first_row)))
        .collect()
}

fn rows_per_band(height: u32, workers: usize) -> u32 {
    let workers = u32::try_from(workers.max(1)).unwrap_or(u32::MAX);
    height.div_ceil(workers).max(1)
}

/// A finished, uncancelled frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: Vec<Color>,
    pub stats: TraceStats,
    pub bands: usize,
}

/// Everything a band needs, shared read-only between workers.
pub struct FrameJob<'a> {
    pub scene: &'a Scene,
    pub bvh: &'a SceneBvh,
    pub config: &'a RenderConfig,
    pub mapper: &'a ViewMapper,
    pub width: u32,
    pub height: u32,
}

impl FrameJob<'_> {
    /// Render every band in parallel.
    ///
    /// Returns `None` if `cancel` was raised before the frame finished.
    pub fn run(&self, cancel: &AtomicBool) -> Option<Frame> {
        match self.config.threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| self.run_bands(threads, cancel)),
                Err(e) => {
                    log::warn!("Failed to build a {threads}-thread pool ({e}), using the global pool");
                    self.run_bands(rayon::current_num_threads(), cancel)
                }
            },
            None => self.run_bands(rayon::current_num_threads(), cancel),
        }
    }

    fn run_bands(&self, workers: usize, cancel: &AtomicBool) -> Option<Frame> {
        let width = self.width as usize;
        let mut pixels = vec![Color::ZERO; width * self.height as usize];
        if pixels.is_empty() {
            return Some(Frame {
                pixels,
                stats: TraceStats::default(),
                bands: 0,
            });
        }

        let bands = generate_bands(self.height, workers);
        let chunk = rows_per_band(self.height, workers) as usize * width;

        let results: Vec<Option<TraceStats>> = pixels
            .par_chunks_mut(chunk)
            .zip(bands.par_iter())
            .map(|(out, band)| self.render_band(band, out, cancel))
            .collect();

        if cancel.load(Ordering::Relaxed) {
            return None;
        }

        let mut stats = TraceStats::default();
        for band_stats in results {
            stats += band_stats?;
        }
        Some(Frame {
            pixels,
            stats,
            bands: bands.len(),
        })
    }

    fn render_band(&self, band: &Band, out: &mut [Color], cancel: &AtomicBool) -> Option<TraceStats> {
        let mut tracer = Tracer::new(self.scene, self.bvh, self.config);
        let width = self.width as usize;
        let level = self.config.max_subdivision_level;

        if level == 0 {
            for (row, y) in out.chunks_mut(width).zip(band.first_row..) {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                for (pixel, x) in row.iter_mut().zip(0u32..) {
                    *pixel = tracer.shoot(self.mapper, x as f32 + 0.5, y as f32 + 0.5);
                }
            }
        } else {
            let jitter = self.config.use_jitter.then_some(self.config.jitter_seed);
            let mut sampler = AdaptiveSampler::new(self.width, level, self.config.adaptive_threshold, jitter);
            let mut shoot = |x: f32, y: f32| tracer.shoot(self.mapper, x, y);

            for (row, y) in out.chunks_mut(width).zip(band.first_row..) {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                sampler.start_row();
                for (pixel, x) in row.iter_mut().zip(0u32..) {
                    *pixel = sampler.pixel(x, y, &mut shoot);
                }
            }
        }

        let stats = tracer.stats();
        log::debug!(
            "Band {} (rows {}..{}): {} rays, {} shadow rays",
            band.index,
            band.first_row,
            band.end_row(),
            stats.rays,
            stats.shadow_rays
        );
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{Actor, Light, Material, Sphere};
    use prism_math::{Camera, Vec3};
    use std::sync::Arc;

    #[test]
    fn test_bands_cover_image() {
        for (height, workers) in [(100, 8), (7, 3), (3, 8), (1, 1), (64, 1)] {
            let bands = generate_bands(height, workers);
            assert!(bands.len() <= workers);
            assert_eq!(bands[0].first_row, 0);
            assert_eq!(bands.last().unwrap().end_row(), height);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].end_row(), pair[1].first_row);
            }
            let total: u32 = bands.iter().map(|b| b.rows).sum();
            assert_eq!(total, height);
        }
    }

    #[test]
    fn test_no_rows_no_bands() {
        assert!(generate_bands(0, 4).is_empty());
    }

    fn scene() -> Scene {
        let mut scene = Scene::new("dispatch");
        scene.add_actor(Actor::new("ball", Sphere::new(1.0), Arc::new(Material::matte(Color::ONE))));
        scene.add_light(Light::point(Vec3::new(2.0, 4.0, 6.0), Color::ONE));
        scene
    }

    fn render(config: &RenderConfig, cancel: &AtomicBool) -> Option<Frame> {
        let scene = scene();
        let bvh = SceneBvh::build(&scene);
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0);
        let mapper = ViewMapper::new(&camera, 24, 17);
        FrameJob {
            scene: &scene,
            bvh: &bvh,
            config,
            mapper: &mapper,
            width: 24,
            height: 17,
        }
        .run(cancel)
    }

    #[test]
    fn test_thread_count_does_not_change_image() {
        let cancel = AtomicBool::new(false);
        let one = render(&RenderConfig::default().with_threads(1), &cancel).unwrap();
        let four = render(&RenderConfig::default().with_threads(4), &cancel).unwrap();

        assert_eq!(one.pixels, four.pixels);
        assert_eq!(one.stats, four.stats);
        assert_eq!(one.bands, 1);
        assert_eq!(four.bands, 4);
        // Matte only: one primary ray per pixel.
        assert_eq!(one.stats.rays, 24 * 17);
    }

    #[test]
    fn test_jittered_frame_does_not_depend_on_band_split() {
        let cancel = AtomicBool::new(false);
        let config = RenderConfig::default().with_adaptive(2, 0.05).with_jitter(7);
        let one = render(&config.clone().with_threads(1), &cancel).unwrap();
        let four = render(&config.with_threads(4), &cancel).unwrap();

        assert_eq!(four.bands, 4);
        let differing = one.pixels.iter().zip(&four.pixels).filter(|(a, b)| a != b).count();
        assert_eq!(differing, 0);
    }

    #[test]
    fn test_adaptive_frame_is_bounded() {
        let cancel = AtomicBool::new(false);
        let config = RenderConfig::default().with_adaptive(2, 0.05).with_jitter(7).with_threads(3);
        let frame = render(&config, &cancel).unwrap();

        assert_eq!(frame.pixels.len(), 24 * 17);
        assert!(frame
            .pixels
            .iter()
            .all(|p| p.min_element() >= 0.0 && p.max_element() <= 1.0));
    }

    #[test]
    fn test_cancelled_frame_is_dropped() {
        let cancel = AtomicBool::new(true);
        assert!(render(&RenderConfig::default(), &cancel).is_none());
    }
}
