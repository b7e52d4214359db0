use std::path::Path;

use image::RgbaImage;
use tracing::info;

use crate::error::{Error, Result};
use crate::math::{Vec2f, Vec3f};

/// Decoded RGBA8 texture, top-left origin. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Texture {
    /// Takes ownership of a `width * height * 4` byte buffer.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Texture> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(Error::TextureSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        return Ok(Texture { width, height, data });
    }

    /// Decodes an image file (TGA, PNG, JPEG, ...) with the `image` crate.
    pub fn open(path: impl AsRef<Path>) -> Result<Texture> {
        let path = path.as_ref();
        let decoded = image::open(path)?.to_rgba8();
        let texture = Texture::from(decoded);
        info!(
            path = %path.display(),
            width = texture.width,
            height = texture.height,
            "Loaded texture"
        );
        return Ok(texture);
    }

    /// Single-color texture.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Texture> {
        let pixels = width as usize * height as usize;
        return Texture::new(width, height, rgba.repeat(pixels));
    }

    pub fn width(&self) -> u32 {
        return self.width;
    }

    pub fn height(&self) -> u32 {
        return self.height;
    }

    pub fn data(&self) -> &[u8] {
        return &self.data;
    }

    /// Nearest-neighbor lookup at integer texel coordinates with V growing upward:
    /// row `height - y` of the stored image is read. Coordinates outside the
    /// texture are clamped to the border texel.
    pub fn sample_rgba(&self, x: i32, y: i32) -> [u8; 4] {
        let flipped_y = self.height as i32 - y;
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = flipped_y.clamp(0, self.height as i32 - 1) as usize;
        let index = 4 * (x + y * self.width as usize);
        return [
            self.data[index],
            self.data[index + 1],
            self.data[index + 2],
            self.data[index + 3],
        ];
    }

    /// RGB at integer texel coordinates, each channel in `[0, 255]`.
    pub fn sample(&self, x: i32, y: i32) -> Vec3f {
        let [r, g, b, _] = self.sample_rgba(x, y);
        return Vec3f::new(r as f32, g as f32, b as f32);
    }

    /// RGB at a normalized texture coordinate, rounded to the nearest texel.
    pub fn sample_uv(&self, uv: Vec2f) -> Vec3f {
        let x = (uv.u() * self.width as f32).round();
        let y = (uv.v() * self.height as f32).round();
        // Saturating casts keep NaN and huge coordinates inside i32 before clamping.
        return self.sample(x as i32, y as i32);
    }
}

impl From<RgbaImage> for Texture {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        return Texture {
            width,
            height,
            data: image.into_raw(),
        };
    }
}
