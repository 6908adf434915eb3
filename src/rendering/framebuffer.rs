/// Framebuffer for software rendering
/// Stores color and depth information
///
/// Depth holds 1/w of the nearest fragment so far. It clears to 0.0
/// (infinitely far) and a fragment passes when its 1/w is strictly
/// greater than the stored value.
use std::marker::PhantomData;

/// Depth value after `clear`: nothing drawn yet.
pub const CLEARED_DEPTH: f32 = 0.0;

/// View into a rectangular tile of the framebuffer.
/// Tiles partition both X and Y; every pixel belongs to exactly one tile
/// returned by `Framebuffer::split_into_tiles`, so tiles can be filled in
/// parallel. Internally they hold raw pointers into the backing buffers;
/// the lifetime ties them to the mutable borrow of the framebuffer.
pub struct FrameTile<'a> {
    pub width: usize,
    pub x0: usize,
    pub y0: usize,
    pub tile_width: usize,
    pub tile_height: usize,
    color_ptr: *mut u32,
    depth_ptr: *mut f32,
    _buffers: PhantomData<&'a mut [u32]>,
}

// Safety: a tile only touches pixels inside its own rectangle (every
// access below is bounds-checked against it) and the rectangles produced
// by `split_into_tiles` are disjoint.
unsafe impl Send for FrameTile<'_> {}
unsafe impl Sync for FrameTile<'_> {}

impl FrameTile<'_> {
    /// Pixel rectangle covered by this tile: (x0, y0, x1, y1), exclusive max.
    #[inline]
    pub fn rect(&self) -> (usize, usize, usize, usize) {
        (
            self.x0,
            self.y0,
            self.x0 + self.tile_width,
            self.y0 + self.tile_height,
        )
    }

    #[inline]
    fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0
            && x < self.x0 + self.tile_width
            && y >= self.y0
            && y < self.y0 + self.tile_height
    }

    /// Depth-test global pixel (x, y) against `inv_w`. On pass the depth is
    /// updated and the linear index for `write_color` is returned. Pixels
    /// outside this tile never pass.
    #[inline]
    pub fn test_and_set_depth(&mut self, x: usize, y: usize, inv_w: f32) -> Option<usize> {
        if !self.contains(x, y) {
            return None;
        }
        let index = y * self.width + x;
        // Safety: (x, y) lies inside this tile, which is inside the buffer
        // and not aliased by any other tile.
        let stored = unsafe { &mut *self.depth_ptr.add(index) };
        if inv_w > *stored {
            *stored = inv_w;
            Some(index)
        } else {
            None
        }
    }

    /// Write a color at an index previously returned by `test_and_set_depth`.
    #[inline]
    pub fn write_color(&mut self, index: usize, color: u32) {
        let (x, y) = (index % self.width, index / self.width);
        if self.contains(x, y) {
            // Safety: same rectangle check as above.
            unsafe {
                *self.color_ptr.add(index) = color;
            }
        }
    }
}

pub struct Framebuffer {
    // Hot data: used for every bounds check and index calculation
    pub width: usize,
    pub height: usize,
    pub color_buffer: Vec<u32>, // ARGB format
    pub depth_buffer: Vec<f32>, // 1/w, larger is closer
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let pixel_count = width * height;
        Self {
            width,
            height,
            color_buffer: vec![0; pixel_count],
            depth_buffer: vec![CLEARED_DEPTH; pixel_count],
        }
    }

    /// Clear color and depth buffers
    pub fn clear(&mut self, clear_color: u32) {
        self.color_buffer.fill(clear_color);
        self.depth_buffer.fill(CLEARED_DEPTH);
    }

    /// Set pixel without depth test (debug lines, overlays)
    #[inline]
    pub fn set_pixel_no_depth(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            let index = y * self.width + x;
            self.color_buffer[index] = color;
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.color_buffer[y * self.width + x])
    }

    #[inline]
    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.depth_buffer[y * self.width + x])
    }

    /// Get color buffer as slice
    pub fn color_buffer_slice(&self) -> &[u32] {
        &self.color_buffer
    }

    /// Resize framebuffer
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let pixel_count = width * height;
        self.color_buffer.resize(pixel_count, 0);
        self.depth_buffer.resize(pixel_count, CLEARED_DEPTH);
    }

    /// Split the framebuffer into square tiles, row-major. Edge tiles are
    /// cropped to the buffer. Each tile owns a disjoint rectangle of
    /// pixels, making them suitable for parallel processing without overlap.
    pub fn split_into_tiles(&mut self, tile_size: usize) -> Vec<FrameTile<'_>> {
        let tile_size = tile_size.max(1);
        let width = self.width;
        let height = self.height;

        let color_ptr = self.color_buffer.as_mut_ptr();
        let depth_ptr = self.depth_buffer.as_mut_ptr();

        let mut tiles = Vec::with_capacity(width.div_ceil(tile_size) * height.div_ceil(tile_size));

        let mut y0 = 0usize;
        while y0 < height {
            let h = (height - y0).min(tile_size);
            let mut x0 = 0usize;
            while x0 < width {
                let w = (width - x0).min(tile_size);
                tiles.push(FrameTile {
                    width,
                    x0,
                    y0,
                    tile_width: w,
                    tile_height: h,
                    color_ptr,
                    depth_ptr,
                    _buffers: PhantomData,
                });
                x0 += tile_size;
            }
            y0 += tile_size;
        }

        tiles
    }
}
