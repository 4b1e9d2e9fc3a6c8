use serde::{Deserialize, Serialize};

use super::{clamp, BoundingBox, Ray, Vec4};
use crate::tracer::TestCounter;

/// Determinants within this distance to zero are treated as rays parallel to the triangle.
const EPS: f64 = 1e-5;

/// The relation of a triangle towards an axis aligned plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// All corners are strictly below the plane.
    Below,
    /// All corners are on or above the plane.
    Above,
    /// The plane divides the triangle.
    Straddling,
}

/// Barycentric coordinates of a position on a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarycentricCoordinates {
    /// The position on the triangle.
    pub position: Vec4,
    /// The weight of the first corner.
    pub u: f64,
    /// The weight of the second corner.
    pub v: f64,
    /// The weight of the third corner.
    pub w: f64,
}

/// A triangle with three corners in counter-clockwise order and a normal per corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    corners: [Vec4; 3],
    normals: [Vec4; 3],

    /// The normalized face normal, zero for degenerate triangles.
    face_normal: Vec4,
}

impl Triangle {
    /// Creates a triangle whose corner normals are the face normal.
    ///
    /// # Arguments
    /// * `a` - The first corner.
    /// * `b` - The second corner.
    /// * `c` - The third corner.
    pub fn new(a: Vec4, b: Vec4, c: Vec4) -> Self {
        let face_normal = Self::compute_face_normal(&a, &b, &c);

        Self {
            corners: [a, b, c],
            normals: [face_normal; 3],
            face_normal,
        }
    }

    /// Creates a triangle with explicit corner normals. The normals get normalized.
    pub fn with_normals(a: Vec4, b: Vec4, c: Vec4, na: Vec4, nb: Vec4, nc: Vec4) -> Self {
        let face_normal = Self::compute_face_normal(&a, &b, &c);

        Self {
            corners: [a, b, c],
            normals: [
                na.expect_direction().normalized(),
                nb.expect_direction().normalized(),
                nc.expect_direction().normalized(),
            ],
            face_normal,
        }
    }

    fn compute_face_normal(a: &Vec4, b: &Vec4, c: &Vec4) -> Vec4 {
        let a = a.expect_point();
        let b = b.expect_point();
        let c = c.expect_point();

        b.sub(&a).cross(&c.sub(&a)).normalized()
    }

    #[inline]
    pub fn a(&self) -> &Vec4 {
        &self.corners[0]
    }

    #[inline]
    pub fn b(&self) -> &Vec4 {
        &self.corners[1]
    }

    #[inline]
    pub fn c(&self) -> &Vec4 {
        &self.corners[2]
    }

    #[inline]
    pub fn corners(&self) -> [&Vec4; 3] {
        [&self.corners[0], &self.corners[1], &self.corners[2]]
    }

    #[inline]
    pub fn normals(&self) -> [&Vec4; 3] {
        [&self.normals[0], &self.normals[1], &self.normals[2]]
    }

    /// Returns the normalized face normal following the counter-clockwise winding.
    #[inline]
    pub fn face_normal(&self) -> &Vec4 {
        &self.face_normal
    }

    /// Computes the distance the ray travels until it hits the triangle.
    /// Every call is counted as one triangle test.
    ///
    /// Returns `None` if the ray is parallel to the triangle, the hit lies behind the origin
    /// or outside of the triangle. The near and far distances of the ray are not checked.
    ///
    /// # Arguments
    /// * `ray` - The ray to test the intersection with.
    /// * `counter` - The counter for the triangle test.
    pub fn intersect(&self, ray: &Ray, counter: &mut TestCounter) -> Option<f64> {
        counter.add_check();

        let [a, b, c] = &self.corners;
        let n = &self.face_normal;

        let det = ray.direction().dot(n);
        if det > -EPS && det < EPS {
            return None;
        }

        let pos = a.sub(ray.origin()).dot(n) / det;
        if pos <= 0.0 {
            return None;
        }

        // the hit point has to be on the inner side of all three edges
        let p = ray.position(pos);
        if n.dot(&c.sub(b).cross(&p.sub(b))) < 0.0 {
            return None;
        }
        if n.dot(&a.sub(c).cross(&p.sub(c))) < 0.0 {
            return None;
        }
        if n.dot(&b.sub(a).cross(&p.sub(a))) < 0.0 {
            return None;
        }

        Some(pos)
    }

    /// Computes the barycentric coordinates of a position on the triangle.
    ///
    /// `u` and `v` are derived from the sub-triangle areas and clamped to `[0, 1]`, `w` is
    /// `1 - u - v` clamped to `[0, 1]`. Hence, the sum is exactly one unless clamping kicked
    /// in for a position slightly outside the triangle.
    pub fn get_at(&self, p: &Vec4) -> BarycentricCoordinates {
        let [a, b, c] = &self.corners;
        let total = b.sub(a).cross(&c.sub(a)).length_sq();
        if total == 0.0 {
            let third = 1.0 / 3.0;
            return BarycentricCoordinates {
                position: *p,
                u: third,
                v: third,
                w: third,
            };
        }

        let da = (b.sub(p).cross(&c.sub(p)).length_sq() / total).sqrt();
        let db = (a.sub(p).cross(&c.sub(p)).length_sq() / total).sqrt();

        let u = clamp(da, 0.0, 1.0);
        let v = clamp(db, 0.0, 1.0);
        let w = clamp(1.0 - u - v, 0.0, 1.0);

        BarycentricCoordinates {
            position: *p,
            u,
            v,
            w,
        }
    }

    /// Interpolates the corner normals with the given barycentric weights.
    pub fn normal_at(&self, bary: &BarycentricCoordinates) -> Vec4 {
        let [na, nb, nc] = &self.normals;

        na.mul(bary.u)
            .add_mul(nb, bary.v)
            .add_mul(nc, bary.w)
            .normalized()
    }

    /// Returns the relation of the triangle towards the plane `coordinate[axis] == value`.
    /// Corners on the plane count as above.
    pub fn rel_to_plane(&self, value: f64, axis: usize) -> PlaneSide {
        let lower_a = self.corners[0][axis] < value;
        let lower_b = self.corners[1][axis] < value;
        let lower_c = self.corners[2][axis] < value;

        if lower_a != lower_b || lower_a != lower_c {
            PlaneSide::Straddling
        } else if lower_a {
            PlaneSide::Below
        } else {
            PlaneSide::Above
        }
    }

    /// Returns the minimal coordinate of all corners on the axis.
    #[inline]
    pub fn min_coord(&self, axis: usize) -> f64 {
        self.corners[0][axis]
            .min(self.corners[1][axis])
            .min(self.corners[2][axis])
    }

    /// Returns the maximal coordinate of all corners on the axis.
    #[inline]
    pub fn max_coord(&self, axis: usize) -> f64 {
        self.corners[0][axis]
            .max(self.corners[1][axis])
            .max(self.corners[2][axis])
    }

    /// Returns the longest edge of the triangle's bounding box.
    pub fn extent(&self) -> f64 {
        (0..3)
            .map(|axis| self.max_coord(axis) - self.min_coord(axis))
            .fold(0.0, f64::max)
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_triangle(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::point(1.0, 0.0, 0.0),
            Vec4::point(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_face_normal() {
        assert_eq!(unit_triangle().face_normal(), &Vec4::Z_AXIS);
        assert_eq!(unit_triangle().normals()[2], &Vec4::Z_AXIS);
    }

    #[test]
    fn test_hit_through_centroid() {
        let t = unit_triangle();
        let mut counter = TestCounter::default();

        let centroid = Vec4::point(1.0 / 3.0, 1.0 / 3.0, 0.0);
        let ray = Ray::new(
            centroid.add(&Vec4::direction(0.0, 0.0, 2.5)),
            Vec4::Z_AXIS.negate(),
            0.0,
            f64::INFINITY,
        );

        let d = t.intersect(&ray, &mut counter).unwrap();
        assert!((d - 2.5).abs() < 1e-12);

        // hit from behind works as well
        let ray = Ray::new(
            centroid.add(&Vec4::direction(0.0, 0.0, -1.5)),
            Vec4::Z_AXIS,
            0.0,
            f64::INFINITY,
        );
        let d = t.intersect(&ray, &mut counter).unwrap();
        assert!((d - 1.5).abs() < 1e-12);

        assert_eq!(counter.checks(), 2);
    }

    #[test]
    fn test_misses_are_counted() {
        let t = unit_triangle();
        let mut counter = TestCounter::default();

        // parallel to the triangle plane and offset
        let ray = Ray::new(Vec4::point(0.2, 0.2, 1.0), Vec4::X_AXIS, 0.0, f64::INFINITY);
        assert_eq!(t.intersect(&ray, &mut counter), None);

        // parallel within the plane
        let ray = Ray::new(Vec4::point(-1.0, 0.2, 0.0), Vec4::X_AXIS, 0.0, f64::INFINITY);
        assert_eq!(t.intersect(&ray, &mut counter), None);

        // outside of the triangle
        let ray = Ray::new(Vec4::point(0.8, 0.8, 1.0), Vec4::Z_AXIS.negate(), 0.0, f64::INFINITY);
        assert_eq!(t.intersect(&ray, &mut counter), None);

        // behind the origin
        let ray = Ray::new(Vec4::point(0.2, 0.2, 1.0), Vec4::Z_AXIS, 0.0, f64::INFINITY);
        assert_eq!(t.intersect(&ray, &mut counter), None);

        assert_eq!(counter.checks(), 4);
    }

    #[test]
    fn test_degenerate_triangle_misses() {
        let t = Triangle::new(
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::point(1.0, 1.0, 1.0),
            Vec4::point(2.0, 2.0, 2.0),
        );
        let mut counter = TestCounter::default();
        let ray = Ray::new(Vec4::point(1.0, 1.0, -1.0), Vec4::Z_AXIS, 0.0, f64::INFINITY);

        assert_eq!(t.intersect(&ray, &mut counter), None);
        let bary = t.get_at(&Vec4::point(1.0, 1.0, 1.0));
        assert!(bary.u.is_finite() && bary.v.is_finite() && bary.w.is_finite());
    }

    #[test]
    fn test_barycentric() {
        let t = unit_triangle();

        let bary = t.get_at(t.a());
        assert!((bary.u - 1.0).abs() < 1e-12);
        assert!(bary.v.abs() < 1e-12 && bary.w.abs() < 1e-12);

        let bary = t.get_at(&Vec4::point(1.0 / 3.0, 1.0 / 3.0, 0.0));
        for x in [bary.u, bary.v, bary.w] {
            assert!((x - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normal_interpolation() {
        let t = Triangle::with_normals(
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::point(1.0, 0.0, 0.0),
            Vec4::point(0.0, 1.0, 0.0),
            Vec4::X_AXIS,
            Vec4::direction(0.0, 2.0, 0.0),
            Vec4::Z_AXIS,
        );

        let n = t.normal_at(&t.get_at(t.b()));
        assert!((n.y() - 1.0).abs() < 1e-12);

        let n = t.normal_at(&t.get_at(&Vec4::point(1.0 / 3.0, 1.0 / 3.0, 0.0)));
        assert!((n.length_sq() - 1.0).abs() < 1e-12);
        assert!((n.x() - n.y()).abs() < 1e-9 && (n.y() - n.z()).abs() < 1e-9);
    }

    #[test]
    fn test_rel_to_plane() {
        let t = unit_triangle();

        assert_eq!(t.rel_to_plane(0.5, 0), PlaneSide::Straddling);
        assert_eq!(t.rel_to_plane(-0.5, 0), PlaneSide::Above);
        assert_eq!(t.rel_to_plane(0.0, 0), PlaneSide::Above);
        assert_eq!(t.rel_to_plane(1.5, 1), PlaneSide::Below);
        assert_eq!(t.rel_to_plane(0.0, 2), PlaneSide::Above);
        assert_eq!(t.extent(), 1.0);
    }
}
