use crate::{
    math::{Ray, Triangle},
    tracer::{Hit, TestCounter},
};

use super::{closest_hit, to_hit, TriangleStorage};

/// The baseline storage, testing every triangle for every ray.
#[derive(Default)]
pub struct LinearStorage {
    triangles: Vec<Triangle>,
    built: bool,
}

impl LinearStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriangleStorage for LinearStorage {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn add_triangle(&mut self, triangle: Triangle) {
        assert!(!self.built, "cannot add triangles to a built storage");
        self.triangles.push(triangle);
    }

    fn build(&mut self) {
        self.built = true;
    }

    #[inline]
    fn is_built(&self) -> bool {
        self.built
    }

    fn hit(&self, ray: &Ray, counter: &mut TestCounter) -> Hit<'_> {
        assert!(self.built, "linear storage queried before build()");

        let best = closest_hit(
            &self.triangles,
            0..self.triangles.len(),
            ray,
            counter,
            ray.far(),
        );

        to_hit(self, ray, best, counter)
    }

    #[inline]
    fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    fn bbox_count(&self) -> usize {
        0
    }
}
