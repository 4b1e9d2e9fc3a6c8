use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    math::{BoundingBox, Ray, Triangle},
    tracer::{Hit, TestCounter},
    Result,
};

use super::{check_threshold, closest_hit, to_hit, TreeStatistics, TriangleStorage};

/// The build parameters of the kd-tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdTreeOptions {
    /// Nodes at this depth become leaves.
    pub depth_threshold: usize,

    /// Nodes with at most this many triangles become leaves.
    pub triangle_threshold: usize,
}

impl Default for KdTreeOptions {
    fn default() -> Self {
        Self {
            depth_threshold: 24,
            triangle_threshold: 8,
        }
    }
}

impl KdTreeOptions {
    pub fn validate(&self) -> Result<()> {
        check_threshold("depth threshold", self.depth_threshold)?;
        check_threshold("triangle threshold", self.triangle_threshold)
    }
}

enum KdNodeKind {
    Leaf(Vec<u32>),
    Inner {
        axis: usize,
        split: f64,

        /// The lower and the upper child.
        children: Box<[KdNode; 2]>,
    },
}

struct KdNode {
    bbox: BoundingBox,
    kind: KdNodeKind,
}

/// A kd-tree splitting at the median triangle while cycling through the axes.
///
/// Triangles crossing a split plane are stored on both sides.
pub struct KdTree {
    options: KdTreeOptions,
    triangles: Vec<Triangle>,
    root: Option<KdNode>,
    stats: TreeStatistics,
}

impl KdTree {
    /// Creates a new empty kd-tree.
    ///
    /// # Arguments
    /// * `options` - The build parameters, both thresholds must be at least 1.
    pub fn new(options: KdTreeOptions) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            options,
            triangles: Vec::new(),
            root: None,
            stats: TreeStatistics::default(),
        })
    }

    #[inline]
    pub fn options(&self) -> &KdTreeOptions {
        &self.options
    }

    /// Returns the split axis and split value of the root, if the root is an inner node.
    pub fn root_split(&self) -> Option<(usize, f64)> {
        match self.root.as_ref().map(|n| &n.kind) {
            Some(KdNodeKind::Inner { axis, split, .. }) => Some((*axis, *split)),
            _ => None,
        }
    }

    /// Recursively creates the node for the given triangles.
    ///
    /// # Arguments
    /// * `bbox` - The box of the node.
    /// * `indices` - The triangles overlapping the node.
    /// * `axis` - The axis to split along.
    /// * `depth` - The depth of the node.
    fn build_node(
        &mut self,
        bbox: BoundingBox,
        mut indices: Vec<u32>,
        axis: usize,
        depth: usize,
    ) -> KdNode {
        let n = indices.len();
        if depth >= self.options.depth_threshold
            || n <= self.options.triangle_threshold
            || n <= 1
        {
            return self.make_leaf(bbox, indices, depth);
        }

        let triangles = &self.triangles;
        indices.sort_by(|a, b| {
            triangles[*a as usize]
                .min_coord(axis)
                .total_cmp(&triangles[*b as usize].min_coord(axis))
        });

        let split = triangles[indices[(n - 1) / 2] as usize].min_coord(axis);

        let near: Vec<u32> = indices
            .iter()
            .copied()
            .filter(|i| triangles[*i as usize].min_coord(axis) < split)
            .collect();

        let far: Vec<u32> = indices
            .iter()
            .copied()
            .filter(|i| {
                let t = &triangles[*i as usize];
                t.max_coord(axis) > split || t.min_coord(axis) >= split
            })
            .collect();

        // splitting would not separate anything
        if near.len() == n || far.len() == n {
            return self.make_leaf(bbox, indices, depth);
        }

        let (near_box, far_box) = bbox.split(axis, split);
        let next_axis = (axis + 1) % 3;

        let near = self.build_node(near_box, near, next_axis, depth + 1);
        let far = self.build_node(far_box, far, next_axis, depth + 1);
        self.stats.add_inner();

        KdNode {
            bbox,
            kind: KdNodeKind::Inner {
                axis,
                split,
                children: Box::new([near, far]),
            },
        }
    }

    fn make_leaf(&mut self, bbox: BoundingBox, indices: Vec<u32>, depth: usize) -> KdNode {
        self.stats.add_leaf(depth, indices.len());

        KdNode {
            bbox,
            kind: KdNodeKind::Leaf(indices),
        }
    }

    /// Returns the closest hit within the node that is closer than `limit`.
    fn traverse(
        &self,
        node: &KdNode,
        ray: &Ray,
        counter: &mut TestCounter,
        limit: f64,
    ) -> Option<(usize, f64)> {
        let entry = node.bbox.intersects(ray, counter)?;
        if entry > limit {
            return None;
        }

        match &node.kind {
            KdNodeKind::Leaf(indices) => closest_hit(
                &self.triangles,
                indices.iter().map(|i| *i as usize),
                ray,
                counter,
                limit,
            ),
            KdNodeKind::Inner { axis, children, .. } => {
                let [lower, upper] = children.as_ref();
                let (first, second) = if ray.direction()[*axis] >= 0.0 {
                    (lower, upper)
                } else {
                    (upper, lower)
                };

                let first_hit = self.traverse(first, ray, counter, limit);
                let limit = first_hit.map_or(limit, |(_, d)| d);

                self.traverse(second, ray, counter, limit).or(first_hit)
            }
        }
    }
}

impl TriangleStorage for KdTree {
    fn name(&self) -> &'static str {
        "kd-tree"
    }

    fn add_triangle(&mut self, triangle: Triangle) {
        assert!(self.root.is_none(), "cannot add triangles to a built storage");
        self.triangles.push(triangle);
    }

    fn build(&mut self) {
        if self.root.is_some() {
            return;
        }

        let bbox = BoundingBox::from_triangles(&self.triangles);
        let indices = (0..self.triangles.len() as u32).collect();

        self.stats = TreeStatistics::default();
        let root = self.build_node(bbox, indices, 0, 0);
        self.root = Some(root);

        debug!(
            "Built kd-tree over {} triangles: {}",
            self.triangles.len(),
            self.stats
        );
    }

    #[inline]
    fn is_built(&self) -> bool {
        self.root.is_some()
    }

    fn hit(&self, ray: &Ray, counter: &mut TestCounter) -> Hit<'_> {
        let Some(root) = self.root.as_ref() else {
            panic!("kd-tree queried before build()");
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

#[cfg(test)]
mod test {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    use crate::{
        math::Vec4,
        scene::TriangleSoup,
        spatial::LinearStorage,
        Error,
    };

    use super::*;

    fn kd_tree(depth_threshold: usize, triangle_threshold: usize) -> KdTree {
        KdTree::new(KdTreeOptions {
            depth_threshold,
            triangle_threshold,
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_thresholds() {
        let r = KdTree::new(KdTreeOptions {
            depth_threshold: 0,
            triangle_threshold: 4,
        });
        assert!(matches!(r, Err(Error::InvalidThreshold { value: 0, .. })));

        let r = KdTree::new(KdTreeOptions {
            depth_threshold: 4,
            triangle_threshold: 0,
        });
        assert!(r.is_err());
    }

    #[test]
    fn test_median_split() {
        let mut tree = kd_tree(10, 1);
        for x in [0.0, 1.0, 2.0, 3.0, 4.0] {
            tree.add_triangle(Triangle::new(
                Vec4::point(x, 0.0, 0.0),
                Vec4::point(x + 0.5, 0.0, 0.0),
                Vec4::point(x, 1.0, 0.0),
            ));
        }
        tree.build();

        // (5 - 1) / 2 = 2, the min x of the third triangle
        assert_eq!(tree.root_split(), Some((0, 2.0)));
    }

    #[test]
    fn test_random_soup_statistics() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let soup = TriangleSoup::random(&mut rng, 1000, 100.0, 5.0);

        let mut tree = kd_tree(10, 10);
        tree.add_triangles(soup.triangles());
        tree.build();

        let stats = tree.statistics().unwrap();
        assert!(stats.leaf_references >= 1000);
        assert!(stats.max_depth <= 10);
        assert!(stats.num_leaves > 1);
        assert_eq!(tree.bbox_count(), stats.num_nodes);
    }

    #[test]
    fn test_straddling_triangles_are_kept() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut tree = kd_tree(6, 1);

        // long triangles crossing many split planes
        for _ in 0..50 {
            let y = rng.random_range(0.0..10.0);
            let z = rng.random_range(0.0..10.0);
            let x = rng.random_range(0.0..1.0);
            tree.add_triangle(Triangle::new(
                Vec4::point(x, y, z),
                Vec4::point(x + 8.0, y, z),
                Vec4::point(x, y + 0.5, z + 0.5),
            ));
        }
        tree.build();

        let mut reference = LinearStorage::new();
        reference.add_triangles(tree.triangles());
        reference.build();

        for _ in 0..200 {
            let ray = Ray::new(
                Vec4::point(
                    rng.random_range(0.0..9.0),
                    rng.random_range(0.0..10.0),
                    -5.0,
                ),
                Vec4::direction(
                    rng.random_range(-0.1..0.1),
                    rng.random_range(-0.1..0.1),
                    1.0,
                ),
                0.0,
                f64::INFINITY,
            );

            let mut c0 = TestCounter::default();
            let mut c1 = TestCounter::default();
            let expected = reference.hit(&ray, &mut c0).distance();
            let actual = tree.hit(&ray, &mut c1).distance();

            assert_eq!(expected.is_some(), actual.is_some());
            if let (Some(e), Some(a)) = (expected, actual) {
                assert!((e - a).abs() <= 1e-9 * e.max(1.0));
            }
        }
    }

    #[test]
    fn test_straddling_triangle_hit_from_both_sides() {
        let mut tree = kd_tree(10, 1);
        for x in [0.0, 1.0, 2.0, 3.0, 4.0] {
            tree.add_triangle(Triangle::new(
                Vec4::point(x, 0.0, 0.0),
                Vec4::point(x + 0.5, 0.0, 0.0),
                Vec4::point(x, 1.0, 0.0),
            ));
        }
        tree.add_triangle(Triangle::new(
            Vec4::point(0.5, 2.0, 5.0),
            Vec4::point(3.5, 2.0, 5.0),
            Vec4::point(0.5, 3.5, 5.0),
        ));
        tree.build();

        // sorted min x: 0, 0.5, 1, 2, 3, 4, hence the root splits at x = 1
        assert_eq!(tree.root_split(), Some((0, 1.0)));

        let near = Vec4::point(0.75, 2.2, 5.0);
        let far = Vec4::point(2.0, 2.2, 5.0);
        let rays = [
            (Vec4::point(0.75, 2.2, 0.0), near),
            (Vec4::point(2.0, 2.2, 8.0), far),
            // crossing the split plane before the hit
            (Vec4::point(-1.0, 2.2, 3.0), far),
            (Vec4::point(4.0, 2.2, 3.0), near),
        ];

        for (origin, target) in rays {
            let ray = Ray::from_pos(&origin, &target);
            let hit = tree.hit(&ray, &mut TestCounter::default());

            let expected = target.sub(&origin).length_sq().sqrt();
            assert_eq!(hit.triangle().map(|t| t.index), Some(5), "{}", origin);
            assert!((hit.distance().unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_default_options() {
        let tree = KdTree::new(KdTreeOptions::default()).unwrap();
        assert_eq!(tree.options(), &KdTreeOptions::default());
        assert_eq!(tree.options().depth_threshold, 24);
        assert_eq!(tree.options().triangle_threshold, 8);
    }

    #[test]
    fn test_identical_triangles_form_a_leaf() {
        let mut tree = kd_tree(20, 1);
        let t = Triangle::new(
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::point(1.0, 0.0, 0.0),
            Vec4::point(0.0, 1.0, 0.0),
        );
        for _ in 0..10 {
            tree.add_triangle(t);
        }
        tree.build();

        let stats = tree.statistics().unwrap();
        assert_eq!(stats.num_nodes, 1);
        assert_eq!(stats.leaf_references, 10);
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let soup = TriangleSoup::random(&mut rng, 100, 10.0, 1.0);

        let mut tree = kd_tree(8, 4);
        assert!(!tree.is_built());
        tree.add_triangles(soup.triangles());
        tree.build();
        let stats = tree.statistics();
        tree.build();

        assert!(tree.is_built());
        assert_eq!(tree.statistics(), stats);
    }

    #[test]
    fn test_empty_tree() {
        let mut tree = kd_tree(8, 4);
        tree.build();

        let mut counter = TestCounter::default();
        let ray = Ray::new(Vec4::ORIGIN, Vec4::Z_AXIS, 0.0, 1.0);

        assert!(!tree.hit(&ray, &mut counter).has_hit());
        assert_eq!(counter, TestCounter::default());
    }

    #[test]
    #[should_panic(expected = "before build")]
    fn test_hit_before_build_panics() {
        let tree = kd_tree(8, 4);
        let ray = Ray::new(Vec4::ORIGIN, Vec4::Z_AXIS, 0.0, 1.0);
        tree.hit(&ray, &mut TestCounter::default());
    }

    #[test]
    #[should_panic(expected = "built storage")]
    fn test_add_after_build_panics() {
        let mut tree = kd_tree(8, 4);
        tree.build();
        tree.add_triangle(Triangle::new(
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::point(1.0, 0.0, 0.0),
            Vec4::point(0.0, 1.0, 0.0),
        ));
    }
}
