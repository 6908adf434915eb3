/// Axis-aligned bounding box.
///
/// `Aabb::EMPTY` is the "never encapsulated" sentinel (min = +inf, max = -inf)
/// and must not be queried; it exists as a fold seed. `Aabb::ZERO` is what
/// bound computations hand back for empty input.
use glam::{Mat4, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub const ZERO: Aabb = Aabb {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Fold a set of points into a box. No points yields `Aabb::ZERO`.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.encapsulate_point(p);
        }
        if aabb.is_valid() {
            aabb
        } else {
            Self::ZERO
        }
    }

    /// True once at least one point has been encapsulated.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    #[inline]
    pub fn encapsulate_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn encapsulate(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    #[inline]
    pub fn union(mut self, other: &Aabb) -> Aabb {
        self.encapsulate(other);
        self
    }

    /// Closed-interval overlap on all three axes.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// True if `other` lies entirely inside `self` (touching faces count).
    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Map all 8 corners through `m` and re-encapsulate.
    /// Transforming only min/max would be wrong under rotation.
    pub fn transform(&self, m: &Mat4) -> Aabb {
        let mut out = Aabb::EMPTY;
        for corner in self.corners() {
            out.encapsulate_point(m.transform_point3(corner));
        }
        out
    }

    /// The 12 edges as index pairs into `corners()`.
    pub const EDGES: [(usize, usize); 12] = [
        (0, 1),
        (2, 3),
        (4, 5),
        (6, 7),
        (0, 2),
        (1, 3),
        (4, 6),
        (5, 7),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn boxes() -> [Aabb; 3] {
        [
            Aabb::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 1.0, 3.0)),
            Aabb::new(Vec3::new(0.5, -4.0, 0.0), Vec3::new(0.75, 2.0, 0.5)),
            Aabb::new(Vec3::new(-3.0, 1.0, 1.0), Vec3::new(-2.0, 5.0, 8.0)),
        ]
    }

    #[test]
    fn encapsulation_order_does_not_matter() {
        let [a, b, c] = boxes();
        let abc = Aabb::EMPTY.union(&a).union(&b).union(&c);
        let cab = Aabb::EMPTY.union(&c).union(&a).union(&b);
        let bca = Aabb::EMPTY.union(&b).union(&c).union(&a);
        assert_eq!(abc, cab);
        assert_eq!(abc, bca);
        assert_eq!(abc.min, Vec3::new(-3.0, -4.0, 0.0));
        assert_eq!(abc.max, Vec3::new(1.0, 5.0, 8.0));
    }

    #[test]
    fn box_contains_and_intersects_itself() {
        for b in boxes() {
            assert!(b.contains(&b));
            assert!(b.intersects(&b));
        }
    }

    #[test]
    fn touching_faces_intersect() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(!a.contains(&b));
    }

    #[test]
    fn identity_transform_is_noop() {
        for b in boxes() {
            assert_eq!(b.transform(&Mat4::IDENTITY), b);
        }
    }

    #[test]
    fn translation_shifts_bounds_exactly() {
        let t = Vec3::new(1.5, -2.25, 4.0);
        let m = Mat4::from_translation(t);
        for b in boxes() {
            let moved = b.transform(&m);
            assert_eq!(moved.min, b.min + t);
            assert_eq!(moved.max, b.max + t);
        }
    }

    #[test]
    fn rotation_still_encloses_all_corners() {
        let b = Aabb::new(Vec3::new(-1.0, -2.0, -0.5), Vec3::new(3.0, 1.0, 0.5));
        let m = Mat4::from_quat(Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.3));
        let rotated = b.transform(&m);
        for corner in b.corners() {
            let p = m.transform_point3(corner);
            assert!(rotated.min.cmple(p + Vec3::splat(1e-5)).all());
            assert!(p.cmple(rotated.max + Vec3::splat(1e-5)).all());
        }
        assert!(rotated.is_valid());
    }

    #[test]
    fn no_points_yields_zero_box() {
        assert_eq!(Aabb::from_points(std::iter::empty()), Aabb::ZERO);
        assert!(!Aabb::EMPTY.is_valid());
    }
}
