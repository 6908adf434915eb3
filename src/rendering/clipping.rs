/// Homogeneous clip-space culling and clipping
///
/// Triangles are classified with 6-bit out-codes first; only those that
/// neither trivially reject nor trivially accept go through
/// Sutherland-Hodgman against near, far, left, right, bottom, top.
use glam::{Vec2, Vec3, Vec4};

// One vertex per plane at most: 3 + 6.
pub const MAX_CLIP_VERTICES: usize = 9;

/// Below this, a clip w is too close to zero to divide by when
/// weighting attributes.
const MIN_INTERPOLATION_W: f32 = 1.0e-6;

pub const OUT_LEFT: u8 = 1 << 0;
pub const OUT_RIGHT: u8 = 1 << 1;
pub const OUT_BOTTOM: u8 = 1 << 2;
pub const OUT_TOP: u8 = 1 << 3;
pub const OUT_NEAR: u8 = 1 << 4;
pub const OUT_FAR: u8 = 1 << 5;

/// Output of the vertex stage.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ShadedVertex {
    pub world_pos: Vec3,
    pub clip_pos: Vec4,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl ShadedVertex {
    /// Point between `a` (t = 0) and `b` (t = 1) on a clip-space edge.
    ///
    /// Clip position is linear in t. The other attributes are blended by
    /// interpolating attr/w and 1/w and dividing, which reduces to a
    /// re-weighted t. The endpoints come back bit-exact.
    pub fn lerp(a: &ShadedVertex, b: &ShadedVertex, t: f32) -> ShadedVertex {
        if t <= 0.0 {
            return *a;
        }
        if t >= 1.0 {
            return *b;
        }

        let s = if a.clip_pos.w > MIN_INTERPOLATION_W && b.clip_pos.w > MIN_INTERPOLATION_W {
            let ra = 1.0 / a.clip_pos.w;
            let rb = 1.0 / b.clip_pos.w;
            let rt = rb * t;
            rt / (ra * (1.0 - t) + rt)
        } else {
            t
        };

        ShadedVertex {
            world_pos: a.world_pos.lerp(b.world_pos, s),
            clip_pos: a.clip_pos.lerp(b.clip_pos, t),
            normal: a.normal.lerp(b.normal, s),
            uv: a.uv.lerp(b.uv, s),
        }
    }
}

/// One bit per violated plane; plane set matches an OpenGL-style
/// projection where visible z lies in [-w, w].
#[inline]
pub fn out_code(p: Vec4) -> u8 {
    let mut code = 0;
    if p.x < -p.w {
        code |= OUT_LEFT;
    }
    if p.x > p.w {
        code |= OUT_RIGHT;
    }
    if p.y < -p.w {
        code |= OUT_BOTTOM;
    }
    if p.y > p.w {
        code |= OUT_TOP;
    }
    if p.z < -p.w {
        code |= OUT_NEAR;
    }
    if p.z > p.w {
        code |= OUT_FAR;
    }
    code
}

/// Twice the signed area of a triangle in NDC XY. Front faces (counter
/// clockwise in world space, seen from the front) come out negative.
#[inline]
pub fn ndc_signed_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Fixed-capacity convex polygon.
#[derive(Clone, Debug)]
pub struct ClipPolygon {
    vertices: [ShadedVertex; MAX_CLIP_VERTICES],
    len: usize,
}

impl Default for ClipPolygon {
    fn default() -> Self {
        Self {
            vertices: [ShadedVertex::default(); MAX_CLIP_VERTICES],
            len: 0,
        }
    }
}

impl ClipPolygon {
    fn set_triangle(&mut self, tri: &[ShadedVertex; 3]) {
        self.vertices[..3].copy_from_slice(tri);
        self.len = 3;
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Vertices past capacity are ignored; a convex triangle clipped by six
    /// planes never needs more.
    #[inline]
    pub fn push(&mut self, v: ShadedVertex) {
        if self.len < MAX_CLIP_VERTICES {
            self.vertices[self.len] = v;
            self.len += 1;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn vertices(&self) -> &[ShadedVertex] {
        &self.vertices[..self.len]
    }

    /// Fan triangulation around vertex 0. Yields nothing below 3 vertices.
    pub fn fan_triangles(&self) -> impl Iterator<Item = [ShadedVertex; 3]> + '_ {
        let v = self.vertices();
        (1..v.len().saturating_sub(1)).map(move |i| [v[0], v[i], v[i + 1]])
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClipOutcome {
    /// All vertices outside one plane; nothing to draw.
    Rejected,
    /// All vertices inside; polygon is the input triangle.
    Inside,
    /// Polygon was cut; it may still have ended up empty.
    Clipped,
}

type PlaneDistance = fn(Vec4) -> f32;

fn near(p: Vec4) -> f32 {
    p.w + p.z
}
fn far(p: Vec4) -> f32 {
    p.w - p.z
}
fn left(p: Vec4) -> f32 {
    p.w + p.x
}
fn right(p: Vec4) -> f32 {
    p.w - p.x
}
fn bottom(p: Vec4) -> f32 {
    p.w + p.y
}
fn top(p: Vec4) -> f32 {
    p.w - p.y
}

const CLIP_PLANES: [PlaneDistance; 6] = [near, far, left, right, bottom, top];

/// Ping-pong polygon buffers reused across triangles.
#[derive(Clone, Debug, Default)]
pub struct ClipBuffers {
    front: ClipPolygon,
    back: ClipPolygon,
}

impl ClipBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clip one triangle and return the outcome with the resulting polygon.
    pub fn clip_triangle(&mut self, tri: &[ShadedVertex; 3]) -> (ClipOutcome, &ClipPolygon) {
        let codes = tri.map(|v| out_code(v.clip_pos));
        if codes[0] & codes[1] & codes[2] != 0 {
            self.front.clear();
            return (ClipOutcome::Rejected, &self.front);
        }

        self.front.set_triangle(tri);
        if codes[0] | codes[1] | codes[2] == 0 {
            return (ClipOutcome::Inside, &self.front);
        }

        for distance in CLIP_PLANES {
            clip_against_plane(&self.front, &mut self.back, distance);
            std::mem::swap(&mut self.front, &mut self.back);
            if self.front.len() < 3 {
                self.front.clear();
                break;
            }
        }
        (ClipOutcome::Clipped, &self.front)
    }
}

/// One Sutherland-Hodgman pass. Inside means distance >= 0.
fn clip_against_plane(input: &ClipPolygon, output: &mut ClipPolygon, distance: PlaneDistance) {
    output.clear();
    let vertices = input.vertices();
    let Some(&last) = vertices.last() else {
        return;
    };

    let mut prev = last;
    let mut prev_d = distance(prev.clip_pos);
    for &curr in vertices {
        let curr_d = distance(curr.clip_pos);
        let prev_inside = prev_d >= 0.0;
        let curr_inside = curr_d >= 0.0;

        if prev_inside != curr_inside {
            let t = prev_d / (prev_d - curr_d);
            output.push(ShadedVertex::lerp(&prev, &curr, t));
        }
        if curr_inside {
            output.push(curr);
        }

        prev = curr;
        prev_d = curr_d;
    }
}
