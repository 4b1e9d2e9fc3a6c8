use rand::Rng;

use crate::math::{Triangle, Vec4};

use super::TriangleSoup;

impl TriangleSoup {
    /// Creates the unit cube between the origin and `(1, 1, 1)` out of 12 counter-clockwise
    /// triangles with outwards pointing normals.
    pub fn cube() -> Self {
        let ltf = Vec4::point(0.0, 1.0, 0.0);
        let rtf = Vec4::point(1.0, 1.0, 0.0);
        let lbf = Vec4::point(0.0, 0.0, 0.0);
        let rbf = Vec4::point(1.0, 0.0, 0.0);
        let ltb = Vec4::point(0.0, 1.0, 1.0);
        let rtb = Vec4::point(1.0, 1.0, 1.0);
        let lbb = Vec4::point(0.0, 0.0, 1.0);
        let rbb = Vec4::point(1.0, 0.0, 1.0);

        let quad = |a: Vec4, b: Vec4, c: Vec4, d: Vec4, n: Vec4| {
            [
                Triangle::with_normals(a, b, c, n, n, n),
                Triangle::with_normals(c, d, a, n, n, n),
            ]
        };

        let faces = [
            quad(ltf, ltb, rtb, rtf, Vec4::Y_AXIS),
            quad(lbf, rbf, rbb, lbb, Vec4::Y_AXIS.negate()),
            quad(rbf, rtf, rtb, rbb, Vec4::X_AXIS),
            quad(lbf, lbb, ltb, ltf, Vec4::X_AXIS.negate()),
            quad(ltb, lbb, rbb, rtb, Vec4::Z_AXIS),
            quad(lbf, ltf, rtf, rbf, Vec4::Z_AXIS.negate()),
        ];

        Self::from_triangles(faces.into_iter().flatten().collect())
    }

    /// Creates a small test mesh of four crossing triangles within the box between the origin
    /// and `(5, 5, 5)`.
    pub fn example_mesh() -> Self {
        let lbb = Vec4::point(0.0, 0.0, 0.0);
        let lbf = Vec4::point(0.0, 0.0, 5.0);
        let ltb = Vec4::point(0.0, 5.0, 0.0);
        let ltf = Vec4::point(0.0, 5.0, 5.0);
        let rbb = Vec4::point(5.0, 0.0, 0.0);
        let rbf = Vec4::point(5.0, 0.0, 5.0);
        let rtb = Vec4::point(5.0, 5.0, 0.0);
        let rtf = Vec4::point(5.0, 5.0, 5.0);

        Self::from_triangles(vec![
            Triangle::new(lbf, rbb, ltb),
            Triangle::new(lbb, rbb, rtf),
            Triangle::new(ltf, rbb, rtb),
            Triangle::new(rtb, rbf, ltb),
        ])
    }

    /// Creates randomly placed and oriented triangles.
    ///
    /// # Arguments
    /// * `rng` - The random number generator.
    /// * `count` - The number of triangles.
    /// * `scene_size` - The triangle centers are placed within `[0, scene_size)` on each axis.
    /// * `triangle_size` - The corners deviate at most half of this from the center on each axis.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        count: usize,
        scene_size: f64,
        triangle_size: f64,
    ) -> Self {
        let half = triangle_size * 0.5;

        let triangles = (0..count)
            .map(|_| {
                let center = Vec4::point(
                    rng.random_range(0.0..scene_size),
                    rng.random_range(0.0..scene_size),
                    rng.random_range(0.0..scene_size),
                );

                let mut corner = || {
                    center.add(&Vec4::direction(
                        rng.random_range(-half..=half),
                        rng.random_range(-half..=half),
                        rng.random_range(-half..=half),
                    ))
                };

                let (a, b, c) = (corner(), corner(), corner());
                Triangle::new(a, b, c)
            })
            .collect();

        Self::from_triangles(triangles)
    }
}
