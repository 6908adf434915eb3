/// Approximate edge anti-aliasing (FXAA-like post filter)
///
/// Works purely on the finished color buffer: pixels whose 4-neighbour
/// luma contrast beats an adaptive threshold are blended with the
/// neighbour across the edge. The blend grows with local contrast and
/// with closeness to the end of the edge span. Border pixels are copied
/// unchanged.
use super::framebuffer::Framebuffer;
use crate::math::unpack_color;
use rayon::prelude::*;

/// Contrast below this is never treated as an edge (dark regions).
pub const EDGE_THRESHOLD_MIN: f32 = 0.0312;
/// Contrast must also exceed this fraction of the local maximum luma.
pub const EDGE_THRESHOLD: f32 = 0.125;
/// Pixels walked in each direction along an edge.
pub const MAX_SEARCH_STEPS: usize = 8;
const SUBPIXEL_QUALITY: f32 = 0.75;
/// Lower bound on the luma step that ends an edge walk.
const MIN_GRADIENT: f32 = 1.0 / 512.0;

#[inline]
pub fn luma(color: u32) -> f32 {
    let c = unpack_color(color);
    c.x * 0.299 + c.y * 0.587 + c.z * 0.114
}

/// Scratch buffers for the filter, kept across frames.
#[derive(Debug, Default)]
pub struct EdgeFilter {
    luma: Vec<f32>,
    output: Vec<u32>,
}

impl EdgeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter the framebuffer's color buffer in place. Returns the number
    /// of pixels that were blended.
    pub fn apply(&mut self, fb: &mut Framebuffer) -> usize {
        let (width, height) = (fb.width, fb.height);
        let pixel_count = width * height;
        if width == 0 || height == 0 {
            return 0;
        }

        self.luma.resize(pixel_count, 0.0);
        self.output.resize(pixel_count, 0);
        self.luma
            .par_chunks_mut(width)
            .zip(fb.color_buffer.par_chunks(width))
            .for_each(|(luma_row, color_row)| {
                for (l, &c) in luma_row.iter_mut().zip(color_row) {
                    *l = luma(c);
                }
            });

        let image = Image {
            width,
            height,
            color: &fb.color_buffer,
            luma: &self.luma,
        };
        let blended: usize = self
            .output
            .par_chunks_mut(width)
            .enumerate()
            .map(|(y, row)| {
                let mut count = 0;
                for (x, out) in row.iter_mut().enumerate() {
                    let source = image.color[y * width + x];
                    *out = match image.filter_pixel(x, y) {
                        Some(color) => {
                            count += 1;
                            color
                        }
                        None => source,
                    };
                }
                count
            })
            .sum();

        std::mem::swap(&mut fb.color_buffer, &mut self.output);
        blended
    }
}

struct Image<'a> {
    width: usize,
    height: usize,
    color: &'a [u32],
    luma: &'a [f32],
}

impl Image<'_> {
    #[inline]
    fn luma_at(&self, x: usize, y: usize) -> f32 {
        self.luma[y * self.width + x]
    }

    /// Blended color for an edge pixel, `None` to keep the source.
    fn filter_pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x == 0 || y == 0 || x + 1 >= self.width || y + 1 >= self.height {
            return None;
        }

        let center = self.luma_at(x, y);
        let north = self.luma_at(x, y - 1);
        let south = self.luma_at(x, y + 1);
        let west = self.luma_at(x - 1, y);
        let east = self.luma_at(x + 1, y);

        let max = center.max(north).max(south).max(west).max(east);
        let min = center.min(north).min(south).min(west).min(east);
        let range = max - min;
        if range < EDGE_THRESHOLD_MIN.max(max * EDGE_THRESHOLD) {
            return None;
        }

        // A horizontal edge separates rows: luma changes along y
        let horizontal = (north + south - 2.0 * center).abs() >= (west + east - 2.0 * center).abs();
        let (neg_luma, pos_luma) = if horizontal { (north, south) } else { (west, east) };
        let toward_pos = (pos_luma - center).abs() >= (neg_luma - center).abs();
        let (nx, ny) = match (horizontal, toward_pos) {
            (true, false) => (x, y - 1),
            (true, true) => (x, y + 1),
            (false, false) => (x - 1, y),
            (false, true) => (x + 1, y),
        };

        let edge_blend = self.edge_blend(x, y, nx, ny, horizontal);

        let average = 0.25 * (north + south + west + east);
        let contrast = ((average - center).abs() / range).clamp(0.0, 1.0);
        let smooth = contrast * contrast * (3.0 - 2.0 * contrast);
        let subpixel_blend = smooth * smooth * SUBPIXEL_QUALITY;

        let blend = edge_blend.max(subpixel_blend);
        if blend <= 0.0 {
            return None;
        }
        Some(mix(self.color[y * self.width + x], self.color[ny * self.width + nx], blend))
    }

    /// Blend from the pixel's position along its edge span: 0.5 at the
    /// span ends, falling toward 0 in the middle of a long run.
    fn edge_blend(&self, x: usize, y: usize, nx: usize, ny: usize, horizontal: bool) -> f32 {
        let center = self.luma_at(x, y);
        let across = self.luma_at(nx, ny);
        let edge_luma = 0.5 * (center + across);
        let gradient = (0.25 * (across - center).abs()).max(MIN_GRADIENT);
        let (neg_steps, pos_steps) = self.edge_extent(x, y, nx, ny, horizontal, edge_luma, gradient);
        let span = (neg_steps + pos_steps + 1) as f32;
        0.5 - neg_steps.min(pos_steps) as f32 / span
    }

    /// Steps along the edge in the negative and positive direction before
    /// the pair luma departs from `edge_luma` by more than `gradient`.
    #[allow(clippy::too_many_arguments)]
    fn edge_extent(
        &self,
        x: usize,
        y: usize,
        nx: usize,
        ny: usize,
        horizontal: bool,
        edge_luma: f32,
        gradient: f32,
    ) -> (usize, usize) {
        let walk = |forward: bool| {
            let mut steps = 0;
            for step in 1..=MAX_SEARCH_STEPS {
                let offset = |coord: usize, limit: usize| {
                    if forward {
                        (coord + step < limit).then_some(coord + step)
                    } else {
                        coord.checked_sub(step)
                    }
                };
                let (a, b) = if horizontal {
                    match offset(x, self.width) {
                        Some(sx) => ((sx, y), (sx, ny)),
                        None => break,
                    }
                } else {
                    match offset(y, self.height) {
                        Some(sy) => ((x, sy), (nx, sy)),
                        None => break,
                    }
                };
                let pair = 0.5 * (self.luma_at(a.0, a.1) + self.luma_at(b.0, b.1));
                if (pair - edge_luma).abs() >= gradient {
                    break;
                }
                steps = step;
            }
            steps
        };
        (walk(false), walk(true))
    }
}

/// Per-channel lerp of two ARGB colors; the result is opaque.
#[inline]
fn mix(a: u32, b: u32, t: f32) -> u32 {
    let channel = |shift: u32| {
        let ca = ((a >> shift) & 0xFF) as f32;
        let cb = ((b >> shift) & 0xFF) as f32;
        ((ca + (cb - ca) * t).round() as u32).min(255) << shift
    };
    0xFF00_0000 | channel(16) | channel(8) | channel(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: u32 = 0xFF00_0000;
    const WHITE: u32 = 0xFFFF_FFFF;

    #[test]
    fn flat_image_is_untouched() {
        let mut fb = Framebuffer::new(16, 16);
        fb.clear(0xFF80_4020);
        let before = fb.color_buffer.clone();
        assert_eq!(EdgeFilter::new().apply(&mut fb), 0);
        assert_eq!(fb.color_buffer, before);
    }

    #[test]
    fn vertical_edge_is_softened() {
        let mut fb = Framebuffer::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                fb.set_pixel_no_depth(x, y, if x < 8 { BLACK } else { WHITE });
            }
        }
        let blended = EdgeFilter::new().apply(&mut fb);
        assert!(blended > 0);

        let left = fb.pixel(7, 8).unwrap() & 0xFF;
        let right = fb.pixel(8, 8).unwrap() & 0xFF;
        assert!(left > 0 || right < 255, "edge pixels should blend");
        // Far from the edge nothing changes
        assert_eq!(fb.pixel(2, 8), Some(BLACK));
        assert_eq!(fb.pixel(13, 8), Some(WHITE));
    }

    #[test]
    fn border_pixels_pass_through() {
        let mut fb = Framebuffer::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                fb.set_pixel_no_depth(x, y, if (x + y) % 2 == 0 { BLACK } else { WHITE });
            }
        }
        let before = fb.color_buffer.clone();
        EdgeFilter::new().apply(&mut fb);
        for x in 0..8 {
            assert_eq!(fb.pixel(x, 0), Some(before[x]));
            assert_eq!(fb.pixel(x, 7), Some(before[7 * 8 + x]));
        }
        for y in 0..8 {
            assert_eq!(fb.pixel(0, y), Some(before[y * 8]));
            assert_eq!(fb.pixel(7, y), Some(before[y * 8 + 7]));
        }
    }

    #[test]
    fn equal_luma_neighbour_walks_the_full_run() {
        let (width, height) = (24, 5);
        let color = vec![0xFF80_8080; width * height];
        let luma: Vec<f32> = color.iter().map(|&c| luma(c)).collect();
        let image = Image {
            width,
            height,
            color: &color,
            luma: &luma,
        };
        // Zero contrast across the edge must not stop the walk on its first step
        let (neg, pos) = (MAX_SEARCH_STEPS, MAX_SEARCH_STEPS);
        let expected = 0.5 - neg.min(pos) as f32 / (neg + pos + 1) as f32;
        let blend = image.edge_blend(12, 2, 12, 3, true);
        assert!((blend - expected).abs() < 1e-6, "blend {blend}");
    }

    #[test]
    fn mix_interpolates_channels() {
        assert_eq!(mix(BLACK, WHITE, 0.0), BLACK);
        assert_eq!(mix(BLACK, WHITE, 1.0), WHITE);
        assert_eq!(mix(BLACK, WHITE, 0.5), 0xFF80_8080);
    }
}
