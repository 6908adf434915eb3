/// Tile binning storage
///
/// Each worker owns one `TrianglePool` and one `TileBins`. Bins store pool
/// indices rather than triangles, so a triangle overlapping many tiles is
/// stored once. A tile's full triangle set is the union of every worker's
/// bin at that index.
use super::clipping::ShadedVertex;
use glam::Vec2;

/// One post-clip triangle and the draw command it came from.
#[derive(Copy, Clone, Debug)]
pub struct TriangleRef {
    pub vertices: [ShadedVertex; 3],
    /// Index into the frame's draw command list.
    pub command: u32,
}

/// Fixed-capacity per-worker triangle storage, reset every frame.
/// Overflow drops the triangle and counts it.
#[derive(Debug)]
pub struct TrianglePool {
    triangles: Vec<TriangleRef>,
    capacity: usize,
    dropped: usize,
}

impl TrianglePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            triangles: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Forget the previous frame's triangles; allocations are kept.
    pub fn reset(&mut self, capacity: usize) {
        self.triangles.clear();
        self.capacity = capacity;
        self.dropped = 0;
    }

    /// Store `tri` and return its index, or `None` when the pool is full.
    #[inline]
    pub fn push(&mut self, tri: TriangleRef) -> Option<u32> {
        if self.triangles.len() >= self.capacity {
            self.dropped += 1;
            return None;
        }
        self.triangles.push(tri);
        Some((self.triangles.len() - 1) as u32)
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&TriangleRef> {
        self.triangles.get(index as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Triangles refused since the last reset.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Screen tiling of one framebuffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub width: usize,
    pub height: usize,
    pub tile_size: usize,
    pub tiles_x: usize,
    pub tiles_y: usize,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, tile_size: usize) -> Self {
        let tile_size = tile_size.max(1);
        Self {
            width,
            height,
            tile_size,
            tiles_x: width.div_ceil(tile_size),
            tiles_y: height.div_ceil(tile_size),
        }
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tiles_x * self.tiles_y
    }

    /// Row-major, matching `Framebuffer::split_into_tiles`.
    #[inline]
    pub fn tile_index(&self, tx: usize, ty: usize) -> usize {
        ty * self.tiles_x + tx
    }

    /// NDC to pixel coordinates; NDC +y is screen up, pixel +y is down.
    #[inline]
    pub fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
        )
    }

    /// Inclusive tile range (tx0, ty0, tx1, ty1) overlapped by an NDC box,
    /// after clamping it to [-1, 1]. `None` when nothing overlaps.
    pub fn tile_range(&self, ndc_min: Vec2, ndc_max: Vec2) -> Option<(usize, usize, usize, usize)> {
        if self.tile_count() == 0
            || ndc_max.x < -1.0
            || ndc_max.y < -1.0
            || ndc_min.x > 1.0
            || ndc_min.y > 1.0
            || !(ndc_min.is_finite() && ndc_max.is_finite())
        {
            return None;
        }
        let min = ndc_min.clamp(Vec2::NEG_ONE, Vec2::ONE);
        let max = ndc_max.clamp(Vec2::NEG_ONE, Vec2::ONE);

        // Y flips: the NDC max becomes the screen min
        let top_left = self.ndc_to_screen(Vec2::new(min.x, max.y));
        let bottom_right = self.ndc_to_screen(Vec2::new(max.x, min.y));

        let to_tile = |v: f32, tiles: usize| ((v.max(0.0) as usize) / self.tile_size).min(tiles - 1);
        Some((
            to_tile(top_left.x, self.tiles_x),
            to_tile(top_left.y, self.tiles_y),
            to_tile(bottom_right.x, self.tiles_x),
            to_tile(bottom_right.y, self.tiles_y),
        ))
    }
}

/// Per-worker, per-tile lists of pool indices.
#[derive(Debug, Default)]
pub struct TileBins {
    bins: Vec<Vec<u32>>,
}

impl TileBins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty every bin and make sure there is one per tile. Bin allocations
    /// survive across frames.
    pub fn reset(&mut self, tile_count: usize) {
        for bin in &mut self.bins {
            bin.clear();
        }
        if self.bins.len() < tile_count {
            self.bins.resize_with(tile_count, Vec::new);
        } else {
            self.bins.truncate(tile_count);
        }
    }

    #[inline]
    pub fn push(&mut self, tile: usize, triangle: u32) {
        if let Some(bin) = self.bins.get_mut(tile) {
            bin.push(triangle);
        }
    }

    #[inline]
    pub fn bin(&self, tile: usize) -> &[u32] {
        self.bins.get(tile).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_refs(&self) -> usize {
        self.bins.iter().map(Vec::len).sum()
    }
}
