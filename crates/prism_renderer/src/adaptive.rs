//! Adaptive supersampling with corner sharing.
//!
//! Each pixel is a grid of `steps × steps` cells (`steps = 2^level`). Samples
//! are taken at grid points and cached: a window holds the current pixel's
//! `(steps + 1)²` points and a line buffer holds the bottom edge of the
//! previous row, so points shared with the left and upper neighbours are
//! never traced twice. A cell is split into quadrants only while its corners
//! deviate from their mean by more than the threshold.

use prism_core::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maximum corner jitter in pixels.
const JITTER: f32 = 0.125;

#[derive(Debug, Clone, Copy, Default)]
struct GridPoint {
    color: Color,
    cooked: bool,
}

/// Per-worker adaptive sampler state.
///
/// Pixels must be visited left to right within a row and rows top to bottom,
/// calling [`AdaptiveSampler::start_row`] before each row.
#[derive(Debug, Clone)]
pub struct AdaptiveSampler {
    steps: usize,
    threshold: f32,
    jitter: Option<u64>,
    line: Vec<GridPoint>,
    window: Vec<GridPoint>,
}

impl AdaptiveSampler {
    /// Sampler for rows of `width` pixels subdivided up to `level` times.
    ///
    /// With a jitter seed, pixel corners are displaced by up to 1/8 pixel.
    /// The offset depends only on the seed and the corner's image position,
    /// so samplers covering different rows agree on shared corners. Inner
    /// grid points are never jittered.
    pub fn new(width: u32, level: u32, threshold: f32, jitter: Option<u64>) -> Self {
        let steps = 1usize << level;
        Self {
            steps,
            threshold,
            jitter,
            line: vec![GridPoint::default(); width as usize * steps + 1],
            window: vec![GridPoint::default(); (steps + 1) * (steps + 1)],
        }
    }

    /// Prepare for a new row: nothing is known left of its first pixel.
    pub fn start_row(&mut self) {
        for wy in 0..=self.steps {
            let k = self.index(0, wy);
            self.window[k].cooked = false;
        }
    }

    /// Colour of pixel `(i, j)`.
    ///
    /// `shoot(x, y)` traces a ray through image coordinates `(x, y)`.
    pub fn pixel<F>(&mut self, i: u32, j: u32, shoot: &mut F) -> Color
    where
        F: FnMut(f32, f32) -> Color,
    {
        let steps = self.steps;
        let base = i as usize * steps;

        // Top edge from the previous row. Past the first pixel the top-left
        // point already came over from the left neighbour, and its line slot
        // now holds that neighbour's bottom-right point.
        let first = if i == 0 { 0 } else { 1 };
        for wx in first..=steps {
            if let Some(&p) = self.line.get(base + wx) {
                let k = self.index(wx, 0);
                self.window[k] = p;
            }
        }
        for wy in 1..=steps {
            for wx in 1..=steps {
                let k = self.index(wx, wy);
                self.window[k].cooked = false;
            }
        }

        let color = self.adapt(0, 0, steps, (i, j), shoot);

        // Bottom edge feeds the next row, right edge the next pixel.
        for wx in 0..=steps {
            let p = self.window[self.index(wx, steps)];
            if let Some(slot) = self.line.get_mut(base + wx) {
                *slot = p;
            }
        }
        for wy in 0..=steps {
            let (left, right) = (self.index(0, wy), self.index(steps, wy));
            self.window[left] = self.window[right];
        }

        color
    }

    fn adapt<F>(&mut self, i: usize, j: usize, step: usize, pixel: (u32, u32), shoot: &mut F) -> Color
    where
        F: FnMut(f32, f32) -> Color,
    {
        let corners = [(i, j), (i + step, j), (i, j + step), (i + step, j + step)];
        let colors = corners.map(|(wi, wj)| self.sample(wi, wj, pixel, &mut *shoot));

        // Paired sums keep the mean of identical corners exact.
        let mean = ((colors[0] + colors[1]) + (colors[2] + colors[3])) * 0.25;
        if step <= 1 {
            return mean;
        }

        let subdivide = colors
            .iter()
            .any(|&c| (c - mean).abs().max_element() > self.threshold);
        if !subdivide {
            return mean;
        }

        let half = step / 2;
        let c0 = self.adapt(i, j, half, pixel, shoot);
        let c1 = self.adapt(i + half, j, half, pixel, shoot);
        let c2 = self.adapt(i, j + half, half, pixel, shoot);
        let c3 = self.adapt(i + half, j + half, half, pixel, shoot);
        ((c0 + c1) + (c2 + c3)) * 0.25
    }

    fn sample<F>(&mut self, wi: usize, wj: usize, pixel: (u32, u32), shoot: &mut F) -> Color
    where
        F: FnMut(f32, f32) -> Color,
    {
        let k = self.index(wi, wj);
        if self.window[k].cooked {
            return self.window[k].color;
        }

        let (x, y) = pixel;
        let inv_steps = 1.0 / self.steps as f32;
        let mut sx = x as f32 + wi as f32 * inv_steps;
        let mut sy = y as f32 + wj as f32 * inv_steps;

        let is_pixel_corner = (wi == 0 || wi == self.steps) && (wj == 0 || wj == self.steps);
        if let (true, Some(seed)) = (is_pixel_corner, self.jitter) {
            let corner = (x + (wi / self.steps) as u32, y + (wj / self.steps) as u32);
            let (dx, dy) = corner_jitter(seed, corner);
            sx += dx;
            sy += dy;
        }

        let color = shoot(sx, sy);
        self.window[k] = GridPoint { color, cooked: true };
        color
    }

    #[inline]
    fn index(&self, wx: usize, wy: usize) -> usize {
        wy * (self.steps + 1) + wx
    }
}

/// Offset of the pixel corner at image position `corner`.
fn corner_jitter(seed: u64, corner: (u32, u32)) -> (f32, f32) {
    let key = seed ^ ((u64::from(corner.0) << 32) | u64::from(corner.1)).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = StdRng::seed_from_u64(key);
    (rng.gen_range(-JITTER..JITTER), rng.gen_range(-JITTER..JITTER))
}
