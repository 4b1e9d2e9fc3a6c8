use std::fmt;

use super::{Ray, Triangle, Vec4};
use crate::tracer::TestCounter;

/// An axis aligned bounding box. The empty box has no corners and is the identity of
/// [`BoundingBox::add`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    /// The corner with the lower and the corner with the upper coordinates.
    corners: Option<[Vec4; 2]>,
}

impl BoundingBox {
    /// Creates a new empty bounding box.
    #[inline]
    pub fn empty() -> Self {
        Self { corners: None }
    }

    /// Creates the bounding box spanned by the two points.
    pub fn from_corners(from: &Vec4, to: &Vec4) -> Self {
        Self {
            corners: Some([Vec4::min(from, to), Vec4::max(from, to)]),
        }
    }

    /// Computes the bounding box of the triangle.
    pub fn from_triangle(t: &Triangle) -> Self {
        let [a, b, c] = t.corners();

        Self {
            corners: Some([
                Vec4::min(&Vec4::min(a, b), c),
                Vec4::max(&Vec4::max(a, b), c),
            ]),
        }
    }

    /// Creates the bounding box of all given triangles.
    pub fn from_triangles<'a, I>(triangles: I) -> Self
    where
        I: IntoIterator<Item = &'a Triangle>,
    {
        triangles
            .into_iter()
            .fold(Self::empty(), |b, t| b.add(&Self::from_triangle(t)))
    }

    /// Returns true if the box is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corners.is_none()
    }

    /// Returns the union of both boxes.
    pub fn add(&self, o: &Self) -> Self {
        match (&self.corners, &o.corners) {
            (None, _) => *o,
            (_, None) => *self,
            (Some([min0, max0]), Some([min1, max1])) => Self {
                corners: Some([Vec4::min(min0, min1), Vec4::max(max0, max1)]),
            },
        }
    }

    #[inline]
    pub fn min(&self) -> Option<&Vec4> {
        self.corners.as_ref().map(|c| &c[0])
    }

    #[inline]
    pub fn max(&self) -> Option<&Vec4> {
        self.corners.as_ref().map(|c| &c[1])
    }

    /// Returns the corner selected per axis, i.e., `true` picks the lower coordinate.
    pub fn get(&self, min_x: bool, min_y: bool, min_z: bool) -> Option<Vec4> {
        let [min, max] = self.corners.as_ref()?;
        let pick = |lower: bool, axis: usize| if lower { min[axis] } else { max[axis] };

        Some(Vec4::point(pick(min_x, 0), pick(min_y, 1), pick(min_z, 2)))
    }

    /// Computes and returns the bounding box center
    pub fn center(&self) -> Option<Vec4> {
        let [min, max] = self.corners.as_ref()?;
        Some(min.add_mul(&max.sub(min), 0.5))
    }

    /// Computes and returns the edge lengths of the box, zero for the empty box.
    pub fn size(&self) -> Vec4 {
        match &self.corners {
            Some([min, max]) => max.sub(min),
            None => Vec4::ZERO,
        }
    }

    /// Splits the box at the given value along the axis into a lower and an upper box.
    pub fn split(&self, axis: usize, value: f64) -> (Self, Self) {
        match &self.corners {
            Some([min, max]) => (
                Self {
                    corners: Some([*min, max.with(axis, value)]),
                },
                Self {
                    corners: Some([min.with(axis, value), *max]),
                },
            ),
            None => (Self::empty(), Self::empty()),
        }
    }

    /// Checks whether the point is contained in the box. Edges are included.
    pub fn contains(&self, p: &Vec4) -> bool {
        let p = p.expect_point();
        match &self.corners {
            Some([min, max]) => (0..3).all(|i| min[i] <= p[i] && p[i] <= max[i]),
            None => false,
        }
    }

    /// Slab test of the ray against the box, following "An Efficient and Robust Ray-Box
    /// Intersection Algorithm" by Williams et al.
    /// Returns the distance at which the valid part of the ray enters the box.
    ///
    /// Every test on a non-empty box is counted, regardless of its outcome.
    ///
    /// # Arguments
    /// * `ray` - The ray to test the intersection with.
    /// * `counter` - The counter for the box test.
    pub fn intersects(&self, ray: &Ray, counter: &mut TestCounter) -> Option<f64> {
        let [min, max] = self.corners.as_ref()?;
        counter.add_bbox_check();

        let o = ray.origin();
        let d = ray.direction();

        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            if d[axis] == 0.0 {
                // an axis parallel ray spans the whole slab if it starts inside of it
                if o[axis] < min[axis] || o[axis] > max[axis] {
                    return None;
                }

                continue;
            }

            let (lo, hi) = if d[axis] > 0.0 {
                (min[axis], max[axis])
            } else {
                (max[axis], min[axis])
            };

            let t0 = ray.hit_coord(lo, axis);
            let t1 = ray.hit_coord(hi, axis);
            if t_min > t1 || t0 > t_max {
                return None;
            }

            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
        }

        if t_min < ray.far() && t_max > ray.near() {
            Some(t_min.max(ray.near()))
        } else {
            None
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.corners {
            Some([min, max]) => write!(f, "{}-{}", min, max),
            None => write!(f, "empty"),
        }
    }
}
