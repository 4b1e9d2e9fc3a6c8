use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    math::{BoundingBox, PlaneSide, Ray, Triangle, Vec4},
    tracer::{Hit, TestCounter},
    Result,
};

use super::{check_threshold, closest_hit, to_hit, TreeStatistics, TriangleSet, TriangleStorage};

/// The build parameters of the octree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctreeOptions {
    /// Nodes at this depth are not split any further.
    pub depth_threshold: usize,

    /// Nodes with at most this many triangles are not split any further.
    pub triangle_threshold: usize,
}

impl Default for OctreeOptions {
    fn default() -> Self {
        Self {
            depth_threshold: 12,
            triangle_threshold: 8,
        }
    }
}

impl OctreeOptions {
    pub fn validate(&self) -> Result<()> {
        check_threshold("depth threshold", self.depth_threshold)?;
        check_threshold("triangle threshold", self.triangle_threshold)
    }
}

enum OctNodeKind {
    Leaf(TriangleSet),

    /// The children indexed by octant, where bit `i` of the octant selects the upper half
    /// along axis `i`.
    Inner(Box<[OctNode; 8]>),
}

struct OctNode {
    bbox: BoundingBox,
    kind: OctNodeKind,
}

/// An octree splitting its boxes at their centers into eight children.
///
/// Triangles overlapping several octants are stored in all of them.
pub struct Octree {
    options: OctreeOptions,
    triangles: Vec<Triangle>,
    root: Option<OctNode>,

    /// Boxes with a non-zero side shorter than this are not split. It is the smallest extent of
    /// all triangles with a non-zero extent.
    min_cell_size: f64,
    stats: TreeStatistics,
}

impl Octree {
    /// Creates a new empty octree.
    ///
    /// # Arguments
    /// * `options` - The build parameters, both thresholds must be at least 1.
    pub fn new(options: OctreeOptions) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            options,
            triangles: Vec::new(),
            root: None,
            min_cell_size: 0.0,
            stats: TreeStatistics::default(),
        })
    }

    #[inline]
    pub fn options(&self) -> &OctreeOptions {
        &self.options
    }

    /// Returns the size below which cells are not split any further.
    #[inline]
    pub fn min_cell_size(&self) -> f64 {
        self.min_cell_size
    }

    /// Checks whether all sides of the box are large enough to be split.
    /// Flat sides are ignored, they never get smaller. A box without any extent, e.g., around
    /// triangles collapsed to a single point, is never split.
    fn is_splittable(&self, bbox: &BoundingBox) -> bool {
        let size = bbox.size();
        (0..3).any(|axis| size[axis] > 0.0)
            && (0..3).all(|axis| size[axis] == 0.0 || size[axis] >= self.min_cell_size)
    }

    /// Returns the box of the given octant of the box.
    fn octant_box(bbox: &BoundingBox, center: &Vec4, octant: usize) -> BoundingBox {
        let far_corner = bbox.get(octant & 1 == 0, octant & 2 == 0, octant & 4 == 0);

        match far_corner {
            Some(corner) => BoundingBox::from_corners(center, &corner),
            None => BoundingBox::empty(),
        }
    }

    /// Checks whether the triangle reaches into the octant of the center.
    fn reaches_octant(t: &Triangle, center: &Vec4, octant: usize) -> bool {
        (0..3).all(|axis| {
            let upper = octant & (1 << axis) != 0;
            match t.rel_to_plane(center[axis], axis) {
                PlaneSide::Straddling => true,
                PlaneSide::Below => !upper,
                PlaneSide::Above => upper,
            }
        })
    }

    /// Recursively creates the node for the given triangles.
    ///
    /// # Arguments
    /// * `bbox` - The box of the node.
    /// * `set` - The triangles overlapping the node.
    /// * `depth` - The depth of the node.
    fn build_node(&mut self, bbox: BoundingBox, set: TriangleSet, depth: usize) -> OctNode {
        let center = match bbox.center() {
            Some(center)
                if set.len() > self.options.triangle_threshold
                    && depth < self.options.depth_threshold
                    && self.is_splittable(&bbox) =>
            {
                center
            }
            _ => return self.make_leaf(bbox, set, depth),
        };

        let sets: Vec<TriangleSet> = (0..8)
            .map(|octant| {
                TriangleSet::from_indices(set.iter().filter(|i| {
                    Self::reaches_octant(&self.triangles[*i as usize], &center, octant)
                }))
            })
            .collect();

        // every triangle covers every octant, splitting would only duplicate them
        if sets.iter().all(|s| s.len() == set.len()) {
            return self.make_leaf(bbox, set, depth);
        }

        let children: Vec<OctNode> = sets
            .into_iter()
            .enumerate()
            .map(|(octant, s)| {
                let child_box = Self::octant_box(&bbox, &center, octant);
                self.build_node(child_box, s, depth + 1)
            })
            .collect();
        self.stats.add_inner();

        let children: Box<[OctNode; 8]> = match children.into_boxed_slice().try_into() {
            Ok(children) => children,
            Err(_) => unreachable!("an octree node has exactly 8 children"),
        };

        OctNode {
            bbox,
            kind: OctNodeKind::Inner(children),
        }
    }

    fn make_leaf(&mut self, bbox: BoundingBox, set: TriangleSet, depth: usize) -> OctNode {
        self.stats.add_leaf(depth, set.len());

        OctNode {
            bbox,
            kind: OctNodeKind::Leaf(set),
        }
    }

    /// Returns the closest hit within the node that is closer than `limit`.
    fn traverse(
        &self,
        node: &OctNode,
        ray: &Ray,
        counter: &mut TestCounter,
        limit: f64,
    ) -> Option<(usize, f64)> {
        let entry = node.bbox.intersects(ray, counter)?;
        if entry > limit {
            return None;
        }

        match &node.kind {
            OctNodeKind::Leaf(set) => closest_hit(
                &self.triangles,
                set.iter().map(|i| i as usize),
                ray,
                counter,
                limit,
            ),
            OctNodeKind::Inner(children) => {
                // flipping the bits of the negative directions visits the octants front to back
                let d = ray.direction();
                let mask = (0..3)
                    .filter(|axis| d[*axis] < 0.0)
                    .fold(0, |m, axis| m | (1 << axis));

                let mut best: Option<(usize, f64)> = None;
                let mut limit = limit;
                for k in 0..8 {
                    if let Some(h) = self.traverse(&children[k ^ mask], ray, counter, limit) {
                        limit = h.1;
                        best = Some(h);
                    }
                }

                best
            }
        }
    }
}

impl TriangleStorage for Octree {
    fn name(&self) -> &'static str {
        "octree"
    }

    fn add_triangle(&mut self, triangle: Triangle) {
        assert!(self.root.is_none(), "cannot add triangles to a built storage");
        self.triangles.push(triangle);
    }

    fn build(&mut self) {
        if self.root.is_some() {
            return;
        }

        self.min_cell_size = self
            .triangles
            .iter()
            .map(Triangle::extent)
            .filter(|e| *e > 0.0)
            .fold(f64::INFINITY, f64::min);

        let bbox = BoundingBox::from_triangles(&self.triangles);
        let set = TriangleSet::from_indices(0..self.triangles.len() as u32);

        self.stats = TreeStatistics::default();
        let root = self.build_node(bbox, set, 0);
        self.root = Some(root);

        debug!(
            "Built octree over {} triangles with min cell size {}: {}",
            self.triangles.len(),
            self.min_cell_size,
            self.stats
        );
    }

    #[inline]
    fn is_built(&self) -> bool {
        self.root.is_some()
    }

    fn hit(&self, ray: &Ray, counter: &mut TestCounter) -> Hit<'_> {
        let Some(root) = self.root.as_ref() else {
            panic!("octree queried before build()");
        };

        let best = self.traverse(root, ray, counter, ray.far());

        to_hit(self, ray, best, counter)
    }

    #[inline]
    fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    fn bbox_count(&self) -> usize {
        self.stats.num_nodes
    }

    fn statistics(&self) -> Option<TreeStatistics> {
        self.root.as_ref().map(|_| self.stats)
    }
}
