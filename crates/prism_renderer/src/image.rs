//! Float framebuffer and 8-bit packing.

use bytemuck::{Pod, Zeroable};
use prism_core::Color;

use crate::error::ImageError;

/// Packed 8-bit RGBA pixel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    /// Clamp a linear colour to `[0, 1]` and quantise it, opaque alpha.
    pub fn from_color(color: Color) -> Self {
        let c = color.clamp(Color::ZERO, Color::ONE) * 255.0 + 0.5;
        Self {
            r: c.x as u8,
            g: c.y as u8,
            b: c.z as u8,
            a: 255,
        }
    }
}

/// Row-major image of linear float colours, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Write one pixel; out-of-range coordinates are ignored.
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Overwrite scanline `y`.
    pub fn set_row(&mut self, y: u32, row: &[Color]) -> Result<(), ImageError> {
        if y >= self.height {
            return Err(ImageError::RowOutOfRange {
                row: y,
                height: self.height,
            });
        }
        let width = self.width as usize;
        if row.len() != width {
            return Err(ImageError::SizeMismatch {
                expected: width,
                actual: row.len(),
            });
        }
        let start = y as usize * width;
        self.pixels[start..start + width].copy_from_slice(row);
        Ok(())
    }

    /// Replace every pixel at once.
    pub fn replace(&mut self, pixels: Vec<Color>) -> Result<(), ImageError> {
        if pixels.len() != self.pixels.len() {
            return Err(ImageError::SizeMismatch {
                expected: self.pixels.len(),
                actual: pixels.len(),
            });
        }
        self.pixels = pixels;
        Ok(())
    }

    /// Raise every channel to `1 / gamma`. Explicit post-step; rendering
    /// never applies it.
    pub fn apply_gamma(&mut self, gamma: f32) {
        if gamma <= 0.0 || gamma == 1.0 {
            return;
        }
        let inv = 1.0 / gamma;
        for p in &mut self.pixels {
            *p = p.max(Color::ZERO).powf(inv);
        }
    }

    pub fn to_rgba8_pixels(&self) -> Vec<Rgba8> {
        self.pixels.iter().map(|&c| Rgba8::from_color(c)).collect()
    }

    /// Clamped RGBA bytes, four per pixel.
    pub fn to_rgba8(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.to_rgba8_pixels()).to_vec()
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }
}
