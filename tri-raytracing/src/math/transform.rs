use nalgebra_glm as glm;

use super::{Triangle, Vec4};

/// An affine transformation in homogeneous coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform4 {
    mat: glm::DMat4,
}

impl AffineTransform4 {
    /// Creates the transformation from the given 4x4 matrix.
    ///
    /// # Arguments
    /// * `mat` - The matrix, applied to column vectors.
    pub fn from_matrix(mat: glm::DMat4) -> Self {
        Self { mat }
    }

    /// Creates the transformation from 16 values in column-major order.
    pub fn from_column_slice(values: &[f64]) -> Self {
        Self {
            mat: glm::DMat4::from_column_slice(values),
        }
    }

    pub fn identity() -> Self {
        Self {
            mat: glm::DMat4::identity(),
        }
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            mat: glm::translation(&glm::DVec3::new(dx, dy, dz)),
        }
    }

    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            mat: glm::scaling(&glm::DVec3::new(sx, sy, sz)),
        }
    }

    /// Rotation about the x axis.
    ///
    /// # Arguments
    /// * `alpha` - The angle in radians.
    pub fn rotate_x(alpha: f64) -> Self {
        Self {
            mat: glm::rotation(alpha, &glm::DVec3::new(1.0, 0.0, 0.0)),
        }
    }

    /// Rotation about the y axis.
    ///
    /// # Arguments
    /// * `alpha` - The angle in radians.
    pub fn rotate_y(alpha: f64) -> Self {
        Self {
            mat: glm::rotation(alpha, &glm::DVec3::new(0.0, 1.0, 0.0)),
        }
    }

    /// Rotation about the z axis.
    ///
    /// # Arguments
    /// * `alpha` - The angle in radians.
    pub fn rotate_z(alpha: f64) -> Self {
        Self {
            mat: glm::rotation(alpha, &glm::DVec3::new(0.0, 0.0, 1.0)),
        }
    }

    /// Returns the transformation that first applies `o` and then `self`.
    pub fn concatenate(&self, o: &Self) -> Self {
        Self {
            mat: self.mat * o.mat,
        }
    }

    /// Transforms the vector. Points are divided by the resulting w, directions are not
    /// translated.
    pub fn transform(&self, v: &Vec4) -> Vec4 {
        Vec4::from_homogeneous(self.mat * v.as_homogeneous())
    }

    /// Transforms the corners and normals of the triangle.
    pub fn transform_triangle(&self, t: &Triangle) -> Triangle {
        let [a, b, c] = t.corners();
        let [na, nb, nc] = t.normals();

        Triangle::with_normals(
            self.transform(a),
            self.transform(b),
            self.transform(c),
            self.transform(na),
            self.transform(nb),
            self.transform(nc),
        )
    }
}

impl Default for AffineTransform4 {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_translation_skips_directions() {
        let t = AffineTransform4::translation(1.0, 2.0, 3.0);

        assert_eq!(t.transform(&Vec4::ORIGIN), Vec4::point(1.0, 2.0, 3.0));
        assert_eq!(t.transform(&Vec4::X_AXIS), Vec4::X_AXIS);
    }

    #[test]
    fn test_perspective_divide() {
        let mut mat = glm::DMat4::identity();
        mat[(3, 3)] = 2.0;
        let t = AffineTransform4::from_matrix(mat);

        assert_eq!(t.transform(&Vec4::point(2.0, 4.0, 6.0)), Vec4::point(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_concatenate() {
        let t = AffineTransform4::translation(1.0, 0.0, 0.0)
            .concatenate(&AffineTransform4::scale(2.0, 2.0, 2.0));

        // scale first, then translate
        assert_eq!(t.transform(&Vec4::point(1.0, 1.0, 1.0)), Vec4::point(3.0, 2.0, 2.0));
    }

    #[test]
    fn test_rotate_z() {
        let t = AffineTransform4::rotate_z(std::f64::consts::FRAC_PI_2);
        let v = t.transform(&Vec4::X_AXIS);

        assert!(v.x().abs() < 1e-12);
        assert!((v.y() - 1.0).abs() < 1e-12);
        assert!(!v.is_point());
    }

    #[test]
    fn test_transform_triangle() {
        let t = Triangle::new(
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::point(1.0, 0.0, 0.0),
            Vec4::point(0.0, 1.0, 0.0),
        );
        let moved = AffineTransform4::translation(0.0, 0.0, 5.0).transform_triangle(&t);

        assert_eq!(moved.a(), &Vec4::point(0.0, 0.0, 5.0));
        assert_eq!(moved.normals()[0], &Vec4::Z_AXIS);
    }
}
