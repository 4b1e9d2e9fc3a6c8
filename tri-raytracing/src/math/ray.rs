use super::Vec4;

/// A single ray starting at the origin that is only valid between its near and far distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The start position of the ray.
    origin: Vec4,

    /// The normalized direction of the ray.
    dir: Vec4,

    /// The distance the ray needs to travel at least.
    near: f64,

    /// The distance the ray can travel at most.
    far: f64,
}

impl Ray {
    /// Creates a new ray.
    ///
    /// # Arguments
    /// * `origin` - The start point of the ray.
    /// * `dir` - The direction of the ray. It gets normalized.
    /// * `near` - The minimal distance the ray needs to travel.
    /// * `far` - The maximal distance the ray can travel.
    pub fn new(origin: Vec4, dir: Vec4, near: f64, far: f64) -> Self {
        Self {
            origin: origin.expect_point(),
            dir: dir.expect_direction().normalized(),
            near,
            far,
        }
    }

    /// Creates a new unbounded ray spanned by the two positions x0 and x1.
    ///
    /// # Arguments
    /// * `x0` - The start position of the ray
    /// * `x1` - The next position along the line of the ray.
    pub fn from_pos(x0: &Vec4, x1: &Vec4) -> Self {
        Self::new(*x0, x1.sub(x0), 0.0, f64::INFINITY)
    }

    #[inline]
    pub fn origin(&self) -> &Vec4 {
        &self.origin
    }

    #[inline]
    pub fn direction(&self) -> &Vec4 {
        &self.dir
    }

    #[inline]
    pub fn near(&self) -> f64 {
        self.near
    }

    #[inline]
    pub fn far(&self) -> f64 {
        self.far
    }

    /// Returns the position after travelling the given distance.
    #[inline]
    pub fn position(&self, at: f64) -> Vec4 {
        self.origin.add_mul(&self.dir, at)
    }

    /// Returns the distance at which the ray takes the given value on the axis.
    /// For an axis parallel ray the result is a signed infinity or NaN.
    #[inline]
    pub fn hit_coord(&self, value: f64, axis: usize) -> f64 {
        (value - self.origin[axis]) / self.dir[axis]
    }

    /// Returns whether the distance lies strictly between near and far.
    #[inline]
    pub fn is_valid_distance(&self, d: f64) -> bool {
        d > self.near && d < self.far
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_valid_distance() {
        let ray = Ray::new(Vec4::ORIGIN, Vec4::direction(0.0, 0.0, 2.0), 1.0, 10.0);

        assert_eq!(ray.direction(), &Vec4::Z_AXIS);
        assert!(!ray.is_valid_distance(1.0));
        assert!(ray.is_valid_distance(1.5));
        assert!(!ray.is_valid_distance(10.0));
        assert_eq!(ray.position(3.0), Vec4::point(0.0, 0.0, 3.0));
    }

    #[test]
    #[should_panic(expected = "expected point")]
    fn test_origin_must_be_point() {
        Ray::new(Vec4::X_AXIS, Vec4::Y_AXIS, 0.0, 1.0);
    }
}
