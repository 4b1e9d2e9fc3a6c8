use std::fmt;
use std::ops::Index;

use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// The x axis index.
pub const X: usize = 0;
/// The y axis index.
pub const Y: usize = 1;
/// The z axis index.
pub const Z: usize = 2;

/// A three dimensional vector in homogeneous coordinates.
///
/// The w component tags the value: `w == 0` is a direction and `w == 1` is a point.
/// Operations that only make sense for one of both kinds assert the tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec4(glm::DVec4);

impl Vec4 {
    /// The origin point.
    pub const ORIGIN: Self = Self::raw(0.0, 0.0, 0.0, 1.0);
    /// The zero direction.
    pub const ZERO: Self = Self::raw(0.0, 0.0, 0.0, 0.0);
    /// The x axis direction.
    pub const X_AXIS: Self = Self::raw(1.0, 0.0, 0.0, 0.0);
    /// The y axis direction.
    pub const Y_AXIS: Self = Self::raw(0.0, 1.0, 0.0, 0.0);
    /// The z axis direction.
    pub const Z_AXIS: Self = Self::raw(0.0, 0.0, 1.0, 0.0);

    const fn raw(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self(glm::DVec4::new(x, y, z, w))
    }

    /// Creates a new point.
    #[inline]
    pub fn point(x: f64, y: f64, z: f64) -> Self {
        Self::raw(x, y, z, 1.0)
    }

    /// Creates a new direction.
    #[inline]
    pub fn direction(x: f64, y: f64, z: f64) -> Self {
        Self::raw(x, y, z, 0.0)
    }

    /// Creates a point or direction from the given array.
    ///
    /// # Arguments
    /// * `v` - The three coordinates.
    /// * `point` - Whether the result is a point or a direction.
    #[inline]
    pub fn from_array(v: [f64; 3], point: bool) -> Self {
        Self::raw(v[0], v[1], v[2], if point { 1.0 } else { 0.0 })
    }

    /// Wraps a raw homogeneous vector. A non-zero w is divided out, i.e., the result is a point.
    pub(crate) fn from_homogeneous(v: glm::DVec4) -> Self {
        if v.w == 0.0 {
            Self::raw(v.x, v.y, v.z, 0.0)
        } else {
            Self::raw(v.x / v.w, v.y / v.w, v.z / v.w, 1.0)
        }
    }

    /// Wraps the result of an arithmetic operation, which must still be a point or a direction.
    #[inline]
    fn tagged(v: glm::DVec4) -> Self {
        debug_assert!(
            v.w == 0.0 || v.w == 1.0,
            "w must be 0 or 1, but is {}",
            v.w
        );
        Self(v)
    }

    #[inline]
    pub(crate) fn as_homogeneous(&self) -> &glm::DVec4 {
        &self.0
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.0.z
    }

    #[inline]
    pub fn w(&self) -> f64 {
        self.0.w
    }

    /// Returns whether the vector is a point.
    #[inline]
    pub fn is_point(&self) -> bool {
        self.0.w != 0.0
    }

    /// Asserts that the vector is a point and returns it.
    #[inline]
    pub fn expect_point(self) -> Self {
        assert!(self.is_point(), "expected point: {}", self);
        self
    }

    /// Asserts that the vector is a direction and returns it.
    #[inline]
    pub fn expect_direction(self) -> Self {
        assert!(!self.is_point(), "expected direction: {}", self);
        self
    }

    /// Returns the squared length of the vector, including the w component.
    #[inline]
    pub fn length_sq(&self) -> f64 {
        self.0.norm_squared()
    }

    #[inline]
    pub fn negate(&self) -> Self {
        Self::tagged(-self.0)
    }

    #[inline]
    pub fn mul(&self, s: f64) -> Self {
        Self::tagged(self.0 * s)
    }

    #[inline]
    pub fn add(&self, o: &Self) -> Self {
        Self::tagged(self.0 + o.0)
    }

    #[inline]
    pub fn sub(&self, o: &Self) -> Self {
        Self::tagged(self.0 - o.0)
    }

    /// Computes `self + o * s`.
    #[inline]
    pub fn add_mul(&self, o: &Self, s: f64) -> Self {
        Self::tagged(self.0 + o.0 * s)
    }

    /// Returns the vector scaled to unit length. A unit vector is returned as it is.
    pub fn normalized(&self) -> Self {
        let sq = self.length_sq();
        if sq == 1.0 || sq == 0.0 {
            *self
        } else {
            self.mul(1.0 / sq.sqrt())
        }
    }

    /// Computes the cross product. Both vectors must be directions.
    pub fn cross(&self, o: &Self) -> Self {
        let a = glm::vec4_to_vec3(&self.expect_direction().0);
        let b = glm::vec4_to_vec3(&o.expect_direction().0);
        let c = a.cross(&b);

        Self::direction(c.x, c.y, c.z)
    }

    /// Computes the dot product. Both vectors must be directions.
    #[inline]
    pub fn dot(&self, o: &Self) -> f64 {
        let a = self.expect_direction();
        let b = o.expect_direction();

        a.0.x * b.0.x + a.0.y * b.0.y + a.0.z * b.0.z
    }

    /// Rotates the direction around the x axis.
    ///
    /// # Arguments
    /// * `alpha` - The angle in radians.
    pub fn rotate_x(&self, alpha: f64) -> Self {
        let v = self.expect_direction();
        let (sin, cos) = alpha.sin_cos();
        Self::direction(v.x(), cos * v.y() - sin * v.z(), sin * v.y() + cos * v.z())
    }

    /// Rotates the direction around the y axis.
    ///
    /// # Arguments
    /// * `alpha` - The angle in radians.
    pub fn rotate_y(&self, alpha: f64) -> Self {
        let v = self.expect_direction();
        let (sin, cos) = alpha.sin_cos();
        Self::direction(cos * v.x() + sin * v.z(), v.y(), -sin * v.x() + cos * v.z())
    }

    /// Rotates the direction around the z axis.
    ///
    /// # Arguments
    /// * `alpha` - The angle in radians.
    pub fn rotate_z(&self, alpha: f64) -> Self {
        let v = self.expect_direction();
        let (sin, cos) = alpha.sin_cos();
        Self::direction(cos * v.x() - sin * v.y(), sin * v.x() + cos * v.y(), v.z())
    }

    /// Computes the angle in radians enclosed by both directions.
    pub fn angle(&self, o: &Self) -> f64 {
        let a = self.normalized();
        let b = o.normalized();
        let s = a.cross(&b).length_sq().sqrt().min(1.0);

        // asin only covers [0, pi/2], the sign of the dot product tells the rest
        if a.dot(&b) < 0.0 {
            std::f64::consts::PI - s.asin()
        } else {
            s.asin()
        }
    }

    /// Component-wise minimum of two points.
    pub fn min(a: &Self, b: &Self) -> Self {
        let a = a.expect_point();
        let b = b.expect_point();
        Self::point(a.x().min(b.x()), a.y().min(b.y()), a.z().min(b.z()))
    }

    /// Component-wise maximum of two points.
    pub fn max(a: &Self, b: &Self) -> Self {
        let a = a.expect_point();
        let b = b.expect_point();
        Self::point(a.x().max(b.x()), a.y().max(b.y()), a.z().max(b.z()))
    }

    /// Returns a copy with the given axis replaced by the value.
    pub fn with(&self, axis: usize, value: f64) -> Self {
        assert!(axis < 3);
        let mut v = self.0;
        v[axis] = value;

        Self(v)
    }
}

impl Index<usize> for Vec4 {
    type Output = f64;

    #[inline]
    fn index(&self, axis: usize) -> &f64 {
        &self.0[axis]
    }
}

impl fmt::Display for Vec4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_point() { "point" } else { "dir" };
        write!(f, "{}({}, {}, {})", kind, self.x(), self.y(), self.z())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cross_and_dot() {
        let c = Vec4::X_AXIS.cross(&Vec4::Y_AXIS);
        assert_eq!(c, Vec4::Z_AXIS);
        assert_eq!(Vec4::X_AXIS.dot(&Vec4::Y_AXIS), 0.0);
        assert_eq!(Vec4::direction(1.0, 2.0, 3.0).dot(&Vec4::direction(4.0, 5.0, 6.0)), 32.0);
    }

    #[test]
    #[should_panic(expected = "expected direction")]
    fn test_cross_rejects_points() {
        Vec4::point(1.0, 0.0, 0.0).cross(&Vec4::Y_AXIS);
    }

    #[test]
    #[should_panic(expected = "expected direction")]
    fn test_dot_rejects_points() {
        Vec4::Y_AXIS.dot(&Vec4::ORIGIN);
    }

    #[test]
    #[should_panic(expected = "expected point")]
    fn test_min_rejects_directions() {
        Vec4::min(&Vec4::ORIGIN, &Vec4::X_AXIS);
    }

    #[test]
    fn test_point_arithmetic_keeps_tags() {
        let a = Vec4::point(1.0, 2.0, 3.0);
        let b = Vec4::point(4.0, 6.0, 8.0);

        let d = b.sub(&a);
        assert!(!d.is_point());
        assert!(a.add(&d).is_point());
        assert!(a.add_mul(&d, 0.5).is_point());
        assert_eq!(a.add(&d), b);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "w must be 0 or 1")]
    fn test_adding_points_is_rejected() {
        Vec4::point(1.0, 2.0, 3.0).add(&Vec4::point(1.0, 0.0, 0.0));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "w must be 0 or 1")]
    fn test_scaling_points_is_rejected() {
        Vec4::point(1.0, 2.0, 3.0).mul(2.0);
    }

    #[test]
    fn test_normalized() {
        let v = Vec4::direction(3.0, 0.0, 4.0).normalized();
        assert!((v.length_sq() - 1.0).abs() < 1e-12);
        assert!((v.x() - 0.6).abs() < 1e-12);
        assert_eq!(Vec4::ZERO.normalized(), Vec4::ZERO);
    }

    #[test]
    fn test_angle() {
        let half_pi = std::f64::consts::FRAC_PI_2;
        assert!((Vec4::X_AXIS.angle(&Vec4::Y_AXIS) - half_pi).abs() < 1e-12);
        assert!(Vec4::X_AXIS.angle(&Vec4::X_AXIS).abs() < 1e-12);
        assert!((Vec4::X_AXIS.angle(&Vec4::X_AXIS.negate()) - std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_rotations() {
        let half_pi = std::f64::consts::FRAC_PI_2;
        let v = Vec4::X_AXIS.rotate_z(half_pi);
        assert!((v.y() - 1.0).abs() < 1e-12 && v.x().abs() < 1e-12);

        let v = Vec4::Y_AXIS.rotate_x(half_pi);
        assert!((v.z() - 1.0).abs() < 1e-12);

        let v = Vec4::Z_AXIS.rotate_y(half_pi);
        assert!((v.x() - 1.0).abs() < 1e-12);
    }
}
