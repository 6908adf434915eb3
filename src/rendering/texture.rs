/// RGBA8 texture with nearest-neighbour sampling.
/// Textures are immutable after construction and shared between
/// materials through `Arc`.
use crate::error::TextureError;
use glam::{Vec2, Vec3};

#[derive(Clone, Debug)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

impl Texture {
    /// Build a texture from row-major RGBA8 pixels.
    pub fn new(width: usize, height: usize, pixels: Vec<[u8; 4]>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroDimension { width, height });
        }
        let expected = width * height;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Two-color checkerboard with `cells` squares per side.
    pub fn checkerboard(size: usize, cells: usize, c1: [u8; 4], c2: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let mut pixels = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                let color_idx = (x / cell + y / cell) % 2;
                pixels.push(if color_idx == 0 { c1 } else { c2 });
            }
        }

        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Nearest texel at normalized `uv`, clamped to [0,1].
    /// v = 0 is the top row.
    #[inline]
    pub fn sample(&self, uv: Vec2) -> [u8; 4] {
        let u = uv.x.clamp(0.0, 1.0);
        let v = uv.y.clamp(0.0, 1.0);
        // NaN falls through clamp; `as usize` maps it to 0
        let x = ((u * self.width as f32) as usize).min(self.width - 1);
        let y = ((v * self.height as f32) as usize).min(self.height - 1);
        self.pixels[y * self.width + x]
    }

    /// `sample` converted to a [0,1] RGB color.
    #[inline]
    pub fn sample_rgb(&self, uv: Vec2) -> Vec3 {
        let [r, g, b, _] = self.sample(uv);
        Vec3::new(r as f32, g as f32, b as f32) * (1.0 / 255.0)
    }
}
