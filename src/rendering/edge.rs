/// Fixed-point edge-function triangle walker
///
/// Vertices are snapped to 16 fractional bits. Edge values are products of
/// two such numbers (32 fractional bits) held in i64 and stepped by exact
/// integer increments per pixel and per row, so coverage and barycentric
/// weights do not depend on where a scan starts.
use glam::Vec2;

pub const SUBPIXEL_BITS: u32 = 16;
pub const SUBPIXEL_ONE: i64 = 1 << SUBPIXEL_BITS;
const HALF_PIXEL: i64 = SUBPIXEL_ONE / 2;

/// Screen coordinates are clamped to this many pixels either side of the
/// origin. Every sample lies inside the clamped bounding box, so each edge
/// product stays below 2^60. Framebuffers wider or taller than this are
/// not supported.
pub const MAX_COORDINATE: f32 = (1 << 13) as f32;

#[inline]
pub fn to_fixed(v: f32) -> i64 {
    (v.clamp(-MAX_COORDINATE, MAX_COORDINATE) * SUBPIXEL_ONE as f32).round() as i64
}

#[derive(Copy, Clone, Debug)]
struct Edge {
    /// Change per +1 pixel in x.
    step_x: i64,
    /// Change per +1 pixel in y.
    step_y: i64,
    ax: i64,
    ay: i64,
    dx: i64,
    dy: i64,
}

impl Edge {
    fn new(a: (i64, i64), b: (i64, i64)) -> Self {
        let dx = b.0 - a.0;
        let dy = b.1 - a.1;
        Self {
            step_x: -dy * SUBPIXEL_ONE,
            step_y: dx * SUBPIXEL_ONE,
            ax: a.0,
            ay: a.1,
            dx,
            dy,
        }
    }

    /// cross(b - a, p - a) at a fixed-point sample position.
    #[inline]
    fn eval(&self, px: i64, py: i64) -> i64 {
        self.dx * (py - self.ay) - self.dy * (px - self.ax)
    }
}

/// Triangle set up for scanning, with the winding normalized so that
/// covered pixels have all three edge values >= 0.
#[derive(Clone, Debug)]
pub struct EdgeTriangle {
    edges: [Edge; 3],
    /// Maps the normalized vertex order back to the caller's order.
    order: [usize; 3],
    inv_area: f64,
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl EdgeTriangle {
    /// `None` for triangles with zero fixed-point area.
    pub fn new(screen: [Vec2; 3]) -> Option<Self> {
        let mut v = screen.map(|p| (to_fixed(p.x), to_fixed(p.y)));
        let mut order = [0, 1, 2];

        let area = Edge::new(v[0], v[1]).eval(v[2].0, v[2].1);
        if area == 0 {
            return None;
        }
        if area < 0 {
            v.swap(1, 2);
            order.swap(1, 2);
        }

        // Edge i is opposite vertex i
        let edges = [
            Edge::new(v[1], v[2]),
            Edge::new(v[2], v[0]),
            Edge::new(v[0], v[1]),
        ];

        let xs = [v[0].0, v[1].0, v[2].0];
        let ys = [v[0].1, v[1].1, v[2].1];
        Some(Self {
            edges,
            order,
            inv_area: 1.0 / area.unsigned_abs() as f64,
            min_x: xs.iter().copied().min().unwrap_or(0),
            min_y: ys.iter().copied().min().unwrap_or(0),
            max_x: xs.iter().copied().max().unwrap_or(0),
            max_y: ys.iter().copied().max().unwrap_or(0),
        })
    }

    /// Pixel bounding box, inclusive. Conservative: every pixel whose
    /// center is covered lies inside it.
    pub fn pixel_bounds(&self) -> (i64, i64, i64, i64) {
        (
            self.min_x >> SUBPIXEL_BITS,
            self.min_y >> SUBPIXEL_BITS,
            self.max_x >> SUBPIXEL_BITS,
            self.max_y >> SUBPIXEL_BITS,
        )
    }

    /// Call `f(x, y, weights)` for every pixel inside `rect`
    /// (x0, y0, x1, y1 with exclusive max) whose center the triangle
    /// covers. `weights[i]` belongs to the caller's vertex i and the three
    /// sum to one.
    pub fn for_each_covered<F>(&self, rect: (usize, usize, usize, usize), mut f: F)
    where
        F: FnMut(usize, usize, [f32; 3]),
    {
        let (bx0, by0, bx1, by1) = self.pixel_bounds();
        let x_start = bx0.max(rect.0 as i64);
        let y_start = by0.max(rect.1 as i64);
        let x_end = bx1.min(rect.2 as i64 - 1);
        let y_end = by1.min(rect.3 as i64 - 1);
        if x_start > x_end || y_start > y_end {
            return;
        }

        let px = x_start * SUBPIXEL_ONE + HALF_PIXEL;
        let py = y_start * SUBPIXEL_ONE + HALF_PIXEL;
        let mut row = self.edges.map(|e| e.eval(px, py));

        for y in y_start..=y_end {
            let mut e = row;
            for x in x_start..=x_end {
                if (e[0] | e[1] | e[2]) >= 0 {
                    let mut weights = [0.0f32; 3];
                    for (k, &value) in e.iter().enumerate() {
                        weights[self.order[k]] = (value as f64 * self.inv_area) as f32;
                    }
                    f(x as usize, y as usize, weights);
                }
                for k in 0..3 {
                    e[k] += self.edges[k].step_x;
                }
            }
            for k in 0..3 {
                row[k] += self.edges[k].step_y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(tri: &EdgeTriangle, rect: (usize, usize, usize, usize)) -> Vec<(usize, usize)> {
        let mut pixels = Vec::new();
        tri.for_each_covered(rect, |x, y, _| pixels.push((x, y)));
        pixels
    }

    #[test]
    fn winding_does_not_change_coverage() {
        let a = Vec2::new(1.2, 0.7);
        let b = Vec2::new(12.9, 3.3);
        let c = Vec2::new(4.4, 14.1);
        let ccw = EdgeTriangle::new([a, b, c]).unwrap();
        let cw = EdgeTriangle::new([a, c, b]).unwrap();
        let rect = (0, 0, 16, 16);
        assert_eq!(covered(&ccw, rect), covered(&cw, rect));
        assert!(!covered(&ccw, rect).is_empty());
    }

    #[test]
    fn weights_sum_to_one_and_match_vertex_order() {
        let tri = EdgeTriangle::new([
            Vec2::new(0.5, 0.5),
            Vec2::new(8.5, 0.5),
            Vec2::new(0.5, 8.5),
        ])
        .unwrap();
        let mut seen_corner = false;
        tri.for_each_covered((0, 0, 16, 16), |x, y, w| {
            assert!((w[0] + w[1] + w[2] - 1.0).abs() < 1e-5);
            if (x, y) == (0, 0) {
                // Pixel center sits exactly on vertex 0
                assert!((w[0] - 1.0).abs() < 1e-6);
                seen_corner = true;
            }
        });
        assert!(seen_corner);
    }

    #[test]
    fn degenerate_triangle_is_rejected() {
        let line = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0), Vec2::new(8.0, 8.0)];
        assert!(EdgeTriangle::new(line).is_none());
    }

    #[test]
    fn rect_limits_coverage() {
        let tri = EdgeTriangle::new([
            Vec2::new(0.0, 0.0),
            Vec2::new(32.0, 0.0),
            Vec2::new(0.0, 32.0),
        ])
        .unwrap();
        for (x, y) in covered(&tri, (16, 0, 32, 16)) {
            assert!((16..32).contains(&x));
            assert!(y < 16);
        }
    }

    #[test]
    fn huge_triangle_edge_values_stay_in_range() {
        // Clamped to the coordinate limit on every side
        let big = 1.0e9;
        let tri = EdgeTriangle::new([
            Vec2::new(-big, -big),
            Vec2::new(big, -big),
            Vec2::new(big, big),
        ])
        .unwrap();
        let limit = MAX_COORDINATE as usize;

        // Below the diagonal x == y everything is covered
        let mut count = 0;
        tri.for_each_covered((limit - 16, 0, limit, 16), |_, _, w| {
            assert!(w.iter().all(|v| v.is_finite() && *v >= 0.0));
            assert!((w[0] + w[1] + w[2] - 1.0).abs() < 1e-4);
            count += 1;
        });
        assert_eq!(count, 256);
        assert!(covered(&tri, (0, limit - 16, 16, limit)).is_empty());
    }
}
