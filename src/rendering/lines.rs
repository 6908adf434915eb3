/// Line drawing for wireframe and debug overlays.
/// Lines are drawn after the fill pass, single-threaded, with no depth test.
use super::bins::TileGrid;
use super::framebuffer::Framebuffer;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Endpoints with clip w below this are too close to (or behind) the eye
/// to project; the whole line is skipped.
pub const LINE_MIN_W: f32 = 0.001;

/// A line segment in clip space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClipLine {
    pub from: Vec4,
    pub to: Vec4,
    pub color: u32,
}

impl ClipLine {
    /// Project a world-space segment.
    #[inline]
    pub fn from_world(view_proj: &Mat4, from: Vec3, to: Vec3, color: u32) -> Self {
        Self {
            from: *view_proj * from.extend(1.0),
            to: *view_proj * to.extend(1.0),
            color,
        }
    }
}

/// Project and draw one line. Returns false when it was rejected.
pub fn draw_clip_line(fb: &mut Framebuffer, grid: &TileGrid, line: &ClipLine) -> bool {
    if line.from.w < LINE_MIN_W || line.to.w < LINE_MIN_W {
        return false;
    }
    let a = grid.ndc_to_screen(line.from.truncate().truncate() / line.from.w);
    let b = grid.ndc_to_screen(line.to.truncate().truncate() / line.to.w);

    let max = Vec2::new(fb.width as f32 - 1.0, fb.height as f32 - 1.0);
    let Some((a, b)) = clip_segment_to_rect(a, b, Vec2::ZERO, max) else {
        return false;
    };
    draw_line(
        fb,
        a.x.round() as i32,
        a.y.round() as i32,
        b.x.round() as i32,
        b.y.round() as i32,
        line.color,
    );
    true
}

/// Liang-Barsky clip of segment a-b to the rectangle [min, max].
fn clip_segment_to_rect(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> Option<(Vec2, Vec2)> {
    if !(a.is_finite() && b.is_finite()) || max.x < min.x || max.y < min.y {
        return None;
    }
    let d = b - a;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a + d * t0, a + d * t1))
}

/// Bresenham; every pixel is bounds-checked by the framebuffer.
pub fn draw_line(fb: &mut Framebuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        if x >= 0 && y >= 0 {
            fb.set_pixel_no_depth(x as usize, y as usize, color);
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: u32 = 0xFFFF_FFFF;

    fn lit_pixels(fb: &Framebuffer) -> usize {
        fb.color_buffer.iter().filter(|&&c| c == WHITE).count()
    }

    #[test]
    fn horizontal_line_covers_every_column() {
        let mut fb = Framebuffer::new(16, 16);
        draw_line(&mut fb, 2, 5, 12, 5, WHITE);
        assert_eq!(lit_pixels(&fb), 11);
        assert_eq!(fb.pixel(7, 5), Some(WHITE));
    }

    #[test]
    fn off_screen_endpoints_are_clipped() {
        let mut fb = Framebuffer::new(16, 16);
        let grid = TileGrid::new(16, 16, 16);
        let line = ClipLine {
            from: Vec4::new(-50.0, 0.0, 0.0, 1.0),
            to: Vec4::new(50.0, 0.0, 0.0, 1.0),
            color: WHITE,
        };
        assert!(draw_clip_line(&mut fb, &grid, &line));
        assert_eq!(lit_pixels(&fb), 16);
    }

    #[test]
    fn endpoint_behind_eye_rejects_line() {
        let mut fb = Framebuffer::new(16, 16);
        let grid = TileGrid::new(16, 16, 16);
        let line = ClipLine {
            from: Vec4::new(0.0, 0.0, 0.0, 1.0),
            to: Vec4::new(0.1, 0.1, 0.0, 0.0005),
            color: WHITE,
        };
        assert!(!draw_clip_line(&mut fb, &grid, &line));
        assert_eq!(lit_pixels(&fb), 0);
    }
}
