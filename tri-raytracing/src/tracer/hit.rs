use crate::math::{BarycentricCoordinates, Ray, Triangle, Vec4};

use super::TestCounter;

/// The triangle a ray hit.
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit<'a> {
    /// The index of the triangle within its storage.
    pub index: usize,

    /// The triangle that got hit.
    pub triangle: &'a Triangle,

    /// The travel distance of the ray until the hit.
    pub distance: f64,
}

/// The result of intersecting a single ray with a triangle storage.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    ray: Ray,
    triangle: Option<TriangleHit<'a>>,

    /// The raw test counts of the traversal.
    tests: TestCounter,

    /// The triangle tests relative to the number of triangles in the storage.
    relative_checks: f64,

    /// The bounding box tests relative to the number of boxes in the storage.
    relative_bbox_checks: f64,
}

impl<'a> Hit<'a> {
    /// Creates a new hit and snapshots the counter.
    ///
    /// # Arguments
    /// * `ray` - The ray.
    /// * `triangle` - The triangle that got hit, if any.
    /// * `tests` - The tests performed for the ray.
    /// * `triangle_count` - The number of triangles in the storage.
    /// * `bbox_count` - The number of bounding boxes in the storage.
    pub fn new(
        ray: Ray,
        triangle: Option<TriangleHit<'a>>,
        tests: TestCounter,
        triangle_count: usize,
        bbox_count: usize,
    ) -> Self {
        Self {
            ray,
            triangle,
            tests,
            relative_checks: relative(tests.checks(), triangle_count),
            relative_bbox_checks: relative(tests.bbox_checks(), bbox_count),
        }
    }

    /// Creates a hit without triangle and without tests.
    pub fn miss(ray: Ray) -> Self {
        Self::new(ray, None, TestCounter::default(), 0, 0)
    }

    #[inline]
    pub fn ray(&self) -> &Ray {
        &self.ray
    }

    #[inline]
    pub fn has_hit(&self) -> bool {
        self.triangle.is_some()
    }

    #[inline]
    pub fn triangle(&self) -> Option<&TriangleHit<'a>> {
        self.triangle.as_ref()
    }

    /// Returns the travel distance of the ray if a triangle was hit.
    #[inline]
    pub fn distance(&self) -> Option<f64> {
        self.triangle.map(|t| t.distance)
    }

    /// Returns the hit position.
    pub fn position(&self) -> Option<Vec4> {
        self.distance().map(|d| self.ray.position(d))
    }

    /// Computes the barycentric coordinates of the hit position.
    pub fn barycentric(&self) -> Option<BarycentricCoordinates> {
        let t = self.triangle?;
        Some(t.triangle.get_at(&self.ray.position(t.distance)))
    }

    /// Computes the interpolated normal at the hit position.
    pub fn normal(&self) -> Option<Vec4> {
        let t = self.triangle?;
        let bary = t.triangle.get_at(&self.ray.position(t.distance));

        Some(t.triangle.normal_at(&bary))
    }

    #[inline]
    pub fn tests(&self) -> &TestCounter {
        &self.tests
    }

    /// Returns the triangle tests relative to the number of triangles in the storage.
    #[inline]
    pub fn relative_checks(&self) -> f64 {
        self.relative_checks
    }

    /// Returns the box tests relative to the number of boxes in the storage.
    #[inline]
    pub fn relative_bbox_checks(&self) -> f64 {
        self.relative_bbox_checks
    }
}

#[inline]
fn relative(count: u64, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hit_accessors() {
        let t = Triangle::new(
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::point(1.0, 0.0, 0.0),
            Vec4::point(0.0, 1.0, 0.0),
        );
        let ray = Ray::new(Vec4::point(0.25, 0.25, 1.0), Vec4::Z_AXIS.negate(), 0.0, 10.0);

        let hit = Hit::new(
            ray,
            Some(TriangleHit {
                index: 0,
                triangle: &t,
                distance: 1.0,
            }),
            TestCounter::new(2, 1),
            4,
            0,
        );

        assert!(hit.has_hit());
        assert_eq!(hit.distance(), Some(1.0));
        assert_eq!(hit.position(), Some(Vec4::point(0.25, 0.25, 0.0)));
        assert_eq!(hit.normal(), Some(Vec4::Z_AXIS));
        assert_eq!(hit.relative_checks(), 0.5);
        assert_eq!(hit.relative_bbox_checks(), 0.0);

        let bary = hit.barycentric().unwrap();
        assert!((bary.u + bary.v + bary.w - 1.0).abs() < 1e-12);

        let miss = Hit::miss(ray);
        assert!(!miss.has_hit());
        assert_eq!(miss.distance(), None);
        assert!(miss.barycentric().is_none());
    }
}
