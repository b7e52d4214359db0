use std::mem;
use std::path::Path;

use image::{GrayImage, Luma, RgbaImage};
use tracing::debug;

use crate::error::{Error, Result};
use crate::math::Vec3f;

/// Depth value of a pixel nothing has been drawn to.
pub const DEPTH_CLEARED: i32 = i32::MIN;

/// Struct, representing one rgba8 pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        return Color { r, g, b, a: 255 };
    }

    /// Opaque color from float channels in `[0, 255]`, clamped.
    /// Returns `None` if any channel is not finite.
    pub fn from_rgb_f32(v: Vec3f) -> Option<Color> {
        if !v.is_finite() {
            return None;
        }
        let channel = |c: f32| c.round().clamp(0.0, 255.0) as u8;
        return Some(Color::rgb(channel(v.x), channel(v.y), channel(v.z)));
    }

    /// Packs into a u32 whose little-endian bytes are `r, g, b, a`.
    pub const fn pack(self) -> u32 {
        return (self.a as u32) << 24 | (self.b as u32) << 16 | (self.g as u32) << 8 | self.r as u32;
    }

    pub const fn unpack(pixel: u32) -> Color {
        let [r, g, b, a] = pixel.to_le_bytes();
        return Color { r, g, b, a };
    }
}

/// Output surface: a packed RGBA color buffer plus an integer depth buffer.
///
/// Drawing coordinates have (0, 0) in the bottom left. The color buffer is
/// stored top-down, so rows are flipped on write. The depth buffer is stored
/// bottom-up and holds the largest (nearest) depth written so far.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    color: Vec<u32>,
    depth: Vec<i32>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Result<FrameBuffer> {
        let mut frame = FrameBuffer::default();
        frame.resize(width, height)?;
        return Ok(frame);
    }

    /// Reallocates both buffers for a new size and clears them. Returns `false`
    /// without touching anything if the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool> {
        if width == self.width && height == self.height && self.color.len() == self.pixel_count() {
            return Ok(false);
        }
        let pixels = width as usize * height as usize;
        let allocation_error = |_| Error::Allocation { width, height };

        let mut color: Vec<u32> = Vec::new();
        color.try_reserve_exact(pixels).map_err(allocation_error)?;
        color.resize(pixels, 0);
        let mut depth: Vec<i32> = Vec::new();
        depth.try_reserve_exact(pixels).map_err(allocation_error)?;
        depth.resize(pixels, DEPTH_CLEARED);

        // Old buffers are dropped here, after the new ones exist.
        drop(mem::replace(&mut self.color, color));
        drop(mem::replace(&mut self.depth, depth));
        self.width = width;
        self.height = height;
        debug!(width, height, "Reallocated frame buffer");
        return Ok(true);
    }

    /// Sets all pixels to transparent black and resets the depth buffer.
    pub fn clear(&mut self) {
        self.color.fill(0);
        self.depth.fill(DEPTH_CLEARED);
    }

    pub fn width(&self) -> u32 {
        return self.width;
    }

    pub fn height(&self) -> u32 {
        return self.height;
    }

    fn pixel_count(&self) -> usize {
        return self.width as usize * self.height as usize;
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        return x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32;
    }

    /// Packed pixels, row-major and top-down, ready for presentation.
    pub fn pixels(&self) -> &[u32] {
        return &self.color;
    }

    /// Pixel at drawing coordinates (bottom-left origin).
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let index = x as usize + (self.height as i32 - 1 - y) as usize * self.width as usize;
        return Some(self.color[index]);
    }

    /// Depth at drawing coordinates (bottom-left origin).
    pub fn depth(&self, x: i32, y: i32) -> Option<i32> {
        if !self.in_bounds(x, y) {
            return None;
        }
        return Some(self.depth[x as usize + y as usize * self.width as usize]);
    }

    /// Sets a pixel at drawing coordinates. Writes outside the surface are dropped.
    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: u32) {
        if !self.in_bounds(x, y) {
            return;
        }
        // Forcing (0, 0) to be in the bottom left here by inverting y.
        let index = x as usize + (self.height as i32 - 1 - y) as usize * self.width as usize;
        self.color[index] = pixel;
    }

    /// Draws a line between (x0, y0) and (x1, y1) with Bresenham's algorithm.
    /// Ignores the depth buffer. Only the part of the line over the surface is
    /// walked, so far off-screen endpoints cost no more than visible ones.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, pixel: u32) {
        let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
        // Stepping along the longer axis keeps the line gap-free.
        let steep = (x1 - x0).abs() < (y1 - y0).abs();
        if steep {
            mem::swap(&mut x0, &mut y0);
            mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            mem::swap(&mut x0, &mut x1);
            mem::swap(&mut y0, &mut y1);
        }
        let (major_len, minor_len) = if steep {
            (self.height as i64, self.width as i64)
        } else {
            (self.width as i64, self.height as i64)
        };

        let first = x0.max(0);
        let last = x1.min(major_len - 1);
        if first > last {
            return;
        }

        let dx = x1 - x0;
        let d_error2 = 2 * (y1 - y0).abs();
        let y_step = if y1 > y0 { 1 } else { -1 };
        let (mut y, mut error2) = bresenham_state(first - x0, dx, d_error2, y0, y_step);
        for x in first..=last {
            if (0..minor_len).contains(&y) {
                if steep {
                    self.set_pixel(y as i32, x as i32, pixel);
                } else {
                    self.set_pixel(x as i32, y as i32, pixel);
                }
            }
            error2 += d_error2;
            if error2 > dx {
                y += y_step;
                error2 -= 2 * dx;
            }
        }
    }

    /// Mutable depth and color rows for drawing rows `y_min..=y_max`.
    ///
    /// The depth slice is bottom-up (first chunk is `y_min`); the color slice
    /// is top-down (first chunk is `y_max`).
    pub(crate) fn rows_mut(&mut self, y_min: u32, y_max: u32) -> (&mut [i32], &mut [u32]) {
        let w = self.width as usize;
        let (y_min, y_max) = (y_min as usize, y_max as usize);
        let h = self.height as usize;
        let depth = &mut self.depth[y_min * w..(y_max + 1) * w];
        let color = &mut self.color[(h - 1 - y_max) * w..(h - y_min) * w];
        return (depth, color);
    }

    /// Color buffer as RGBA8 bytes, top-down.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        return self.color.iter().flat_map(|pixel| pixel.to_le_bytes()).collect();
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        for (pixel, packed) in image.pixels_mut().zip(&self.color) {
            pixel.0 = packed.to_le_bytes();
        }
        return image;
    }

    /// Grey-scale view of the depth buffer, top-down. The written depth range
    /// is stretched over 1..=255 (nearer is brighter); untouched pixels are 0.
    pub fn depth_image(&self) -> GrayImage {
        let written = self.depth.iter().copied().filter(|&z| z != DEPTH_CLEARED);
        let (z_min, z_max) =
            written.fold((i32::MAX, i32::MIN), |(lo, hi), z| (lo.min(z), hi.max(z)));
        let scale = (z_max as f64 - z_min as f64).max(1.0);

        let mut image = GrayImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let z = self.depth[(x + y * self.width) as usize];
                let value = if z == DEPTH_CLEARED {
                    0
                } else {
                    1 + ((z as f64 - z_min as f64) / scale * 254.0).round() as u8
                };
                image.put_pixel(x, self.height - 1 - y, Luma([value]));
            }
        }
        return image;
    }

    /// Writes the color buffer to an image file; the format follows the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_rgba_image().save(path)?;
        return Ok(());
    }
}

/// Minor-axis position and error term of Bresenham's walk after `steps`
/// unit steps along the major axis.
fn bresenham_state(steps: i64, dx: i64, d_error2: i64, y0: i64, y_step: i64) -> (i64, i64) {
    if steps == 0 {
        return (y0, 0);
    }
    let accumulated = steps as i128 * d_error2 as i128;
    let two_dx = 2 * dx as i128;
    // The walk keeps the error term in (-dx, dx], which fixes the row count.
    let rows = -(dx as i128 - accumulated).div_euclid(two_dx);
    let error2 = accumulated - two_dx * rows;
    return (y0 + y_step * rows as i64, error2 as i64);
}
