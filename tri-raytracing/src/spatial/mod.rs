//! Triangle storages for fast raycasting.
//!
//! All storages share the same lifecycle: triangles are added, the storage gets built exactly
//! once and is afterwards only read. Reading is safe from many threads at the same time.

mod kd_tree;
mod linear;
mod octree;
mod triangle_set;

pub use kd_tree::*;
pub use linear::*;
pub use octree::*;
pub use triangle_set::*;

use std::fmt;

use crate::{
    math::{Ray, Triangle},
    tracer::{Hit, TestCounter, TriangleHit},
    Error, Result,
};

/// A storage of triangles that answers closest hit queries for rays.
pub trait TriangleStorage: Send + Sync {
    /// Returns the name of the storage strategy.
    fn name(&self) -> &'static str;

    /// Adds a triangle. Must not be called after [`TriangleStorage::build`].
    fn add_triangle(&mut self, triangle: Triangle);

    /// Adds all given triangles.
    fn add_triangles(&mut self, triangles: &[Triangle]) {
        for t in triangles {
            self.add_triangle(*t);
        }
    }

    /// Builds the index over the added triangles. Calling it again has no effect.
    fn build(&mut self);

    /// Returns whether the storage was built.
    fn is_built(&self) -> bool;

    /// Determines the closest valid hit of the ray. Must not be called before
    /// [`TriangleStorage::build`].
    ///
    /// # Arguments
    /// * `ray` - The ray to intersect.
    /// * `counter` - The counter for the performed tests.
    fn hit(&self, ray: &Ray, counter: &mut TestCounter) -> Hit<'_>;

    /// Returns all stored triangles.
    fn triangles(&self) -> &[Triangle];

    /// Returns the number of stored triangles.
    fn triangle_count(&self) -> usize {
        self.triangles().len()
    }

    /// Returns the number of bounding boxes a query may test.
    fn bbox_count(&self) -> usize;

    /// Returns statistics about the built spatial index, if the storage has one.
    fn statistics(&self) -> Option<TreeStatistics> {
        None
    }
}

/// Statistics about a built spatial tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStatistics {
    /// The number of nodes, including the leaves.
    pub num_nodes: usize,

    /// The number of leaves.
    pub num_leaves: usize,

    /// The deepest level of a leaf, the root is at level 0.
    pub max_depth: usize,

    /// The summed number of triangle references over all leaves. Triangles stored in multiple
    /// leaves are counted multiple times.
    pub leaf_references: usize,
}

impl TreeStatistics {
    /// Registers a leaf at the given depth holding the given number of triangles.
    pub(crate) fn add_leaf(&mut self, depth: usize, num_triangles: usize) {
        self.num_nodes += 1;
        self.num_leaves += 1;
        self.max_depth = self.max_depth.max(depth);
        self.leaf_references += num_triangles;
    }

    /// Registers an inner node.
    pub(crate) fn add_inner(&mut self) {
        self.num_nodes += 1;
    }
}

impl fmt::Display for TreeStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodes={}, leaves={}, max depth={}, leaf references={}",
            self.num_nodes, self.num_leaves, self.max_depth, self.leaf_references
        )
    }
}

/// Checks that a build threshold is at least one.
pub(crate) fn check_threshold(name: &'static str, value: usize) -> Result<()> {
    if value < 1 {
        Err(Error::InvalidThreshold { name, value })
    } else {
        Ok(())
    }
}

/// Tests the ray against the given triangles and returns the index and distance of the closest
/// valid hit that is closer than `limit`.
///
/// # Arguments
/// * `triangles` - All triangles of the storage.
/// * `indices` - The indices of the triangles to test.
/// * `ray` - The ray to intersect.
/// * `counter` - The counter for the performed tests.
/// * `limit` - Only hits strictly closer than this distance are reported.
pub(crate) fn closest_hit<I>(
    triangles: &[Triangle],
    indices: I,
    ray: &Ray,
    counter: &mut TestCounter,
    limit: f64,
) -> Option<(usize, f64)>
where
    I: Iterator<Item = usize>,
{
    let mut best: Option<(usize, f64)> = None;
    let mut min_dist = limit;

    for index in indices {
        if let Some(dist) = triangles[index].intersect(ray, counter) {
            if ray.is_valid_distance(dist) && dist < min_dist {
                min_dist = dist;
                best = Some((index, dist));
            }
        }
    }

    best
}

/// Wraps the result of a query into a hit.
pub(crate) fn to_hit<'a, S>(
    storage: &'a S,
    ray: &Ray,
    best: Option<(usize, f64)>,
    counter: &TestCounter,
) -> Hit<'a>
where
    S: TriangleStorage + ?Sized,
{
    let triangles = storage.triangles();
    let triangle = best.map(|(index, distance)| TriangleHit {
        index,
        triangle: &triangles[index],
        distance,
    });

    Hit::new(
        *ray,
        triangle,
        *counter,
        storage.triangle_count(),
        storage.bbox_count(),
    )
}
