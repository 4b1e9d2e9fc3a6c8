use log::{debug, info};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{
    math::{Ray, Vec4},
    spatial::TriangleStorage,
    Result,
};

use super::{Hit, HitConsumer, RayProducer, TestCounter};

/// Tiles with at most this many pixels are computed sequentially by a single task.
pub const TILE_THRESHOLD: usize = 4000;

/// A callback that observes every pixel while the grid gets populated. It is called
/// concurrently and in no particular order.
pub type PixelObserver<'o> = dyn Fn(usize, usize, &Hit) + Sync + 'o;

/// A dense grid of hits stored row by row.
pub struct HitGrid<'a> {
    width: usize,
    height: usize,
    hits: Vec<Hit<'a>>,
}

impl<'a> HitGrid<'a> {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the hit of the given pixel.
    ///
    /// # Arguments
    /// * `x` - The column of the pixel.
    /// * `y` - The row of the pixel.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &Hit<'a> {
        assert!(x < self.width && y < self.height);
        &self.hits[y * self.width + x]
    }

    /// Returns all hits row by row.
    #[inline]
    pub fn hits(&self) -> &[Hit<'a>] {
        &self.hits
    }

    /// Sums up the tests of all hits.
    pub fn total_tests(&self) -> TestCounter {
        self.hits
            .iter()
            .fold(TestCounter::default(), |acc, h| acc + *h.tests())
    }

    /// Notifies the consumer about every pixel, column by column, and finishes it.
    pub fn notify<C: HitConsumer + ?Sized>(&self, consumer: &mut C) {
        consumer.set_size(self.width, self.height);
        for x in 0..self.width {
            for y in 0..self.height {
                consumer.hit_at(self.get(x, y), x, y);
            }
        }

        consumer.finished();
    }
}

/// The result of shooting all rays of a producer.
pub struct Shot<'a> {
    /// The hit per pixel.
    pub grid: HitGrid<'a>,

    /// The tests of all rays.
    pub total: TestCounter,
}

/// A rectangular part of the grid, given by the mutable row slices it covers.
struct Tile<'g, 'a> {
    x_from: usize,
    y_from: usize,
    width: usize,
    rows: Vec<&'g mut [Hit<'a>]>,
}

impl<'g, 'a> Tile<'g, 'a> {
    #[inline]
    fn num_pixels(&self) -> usize {
        self.width * self.rows.len()
    }

    /// Splits the longer side of the tile into two halves.
    fn split(self) -> (Self, Self) {
        let height = self.rows.len();

        if self.width >= height {
            let mid = self.width / 2;
            let (lower, upper): (Vec<_>, Vec<_>) =
                self.rows.into_iter().map(|row| row.split_at_mut(mid)).unzip();

            (
                Self {
                    x_from: self.x_from,
                    y_from: self.y_from,
                    width: mid,
                    rows: lower,
                },
                Self {
                    x_from: self.x_from + mid,
                    y_from: self.y_from,
                    width: self.width - mid,
                    rows: upper,
                },
            )
        } else {
            let mid = height / 2;
            let mut lower = self.rows;
            let upper = lower.split_off(mid);

            (
                Self {
                    x_from: self.x_from,
                    y_from: self.y_from,
                    width: self.width,
                    rows: lower,
                },
                Self {
                    x_from: self.x_from,
                    y_from: self.y_from + mid,
                    width: self.width,
                    rows: upper,
                },
            )
        }
    }
}

/// The shared, read-only state of a single shot.
struct ShotContext<'c, 'a, P: ?Sized, S: ?Sized> {
    producer: &'c P,
    storage: &'a S,
    observer: &'c PixelObserver<'c>,
}

/// Shoots the rays of a producer against a triangle storage on a fork-join worker pool.
pub struct RayShooter {
    pool: ThreadPool,
}

impl RayShooter {
    /// Creates a new ray shooter.
    ///
    /// # Arguments
    /// * `num_threads` - The number of worker threads, 0 selects the available parallelism.
    pub fn new(num_threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("ray-shooter-{}", i))
            .build()?;

        info!("Using {} worker threads", pool.current_num_threads());

        Ok(Self { pool })
    }

    /// Returns the number of worker threads.
    #[inline]
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Shoots all rays of the producer.
    ///
    /// # Arguments
    /// * `producer` - The producer of the rays.
    /// * `storage` - The built storage to intersect the rays with.
    pub fn shoot<'a, P, S>(&self, producer: &P, storage: &'a S) -> Shot<'a>
    where
        P: RayProducer + ?Sized,
        S: TriangleStorage + ?Sized,
    {
        self.shoot_observed(producer, storage, &|_, _, _| {})
    }

    /// Shoots all rays of the producer and reports every pixel to the observer as soon as it is
    /// computed.
    ///
    /// # Arguments
    /// * `producer` - The producer of the rays.
    /// * `storage` - The built storage to intersect the rays with.
    /// * `observer` - Called concurrently for every computed pixel.
    pub fn shoot_observed<'a, P, S>(
        &self,
        producer: &P,
        storage: &'a S,
        observer: &PixelObserver<'_>,
    ) -> Shot<'a>
    where
        P: RayProducer + ?Sized,
        S: TriangleStorage + ?Sized,
    {
        assert!(storage.is_built(), "the storage must be built before shooting");

        let width = producer.width();
        let height = producer.height();

        // every cell gets overwritten exactly once by the tile containing it
        let unset = Hit::miss(Ray::new(Vec4::ORIGIN, Vec4::Z_AXIS, 0.0, 0.0));
        let mut hits = vec![unset; width * height];

        let total = if width > 0 {
            let tile = Tile {
                x_from: 0,
                y_from: 0,
                width,
                rows: hits.chunks_mut(width).collect(),
            };

            let ctx = ShotContext {
                producer,
                storage,
                observer,
            };

            self.pool.install(|| Self::shoot_tile(&ctx, tile))
        } else {
            TestCounter::default()
        };

        debug!(
            "Shot {}x{} rays: {} triangle tests, {} box tests",
            width,
            height,
            total.checks(),
            total.bbox_checks()
        );

        Shot {
            grid: HitGrid {
                width,
                height,
                hits,
            },
            total,
        }
    }

    /// Computes the tile, splitting it into two concurrently computed halves while it is large.
    fn shoot_tile<'a, P, S>(ctx: &ShotContext<'_, 'a, P, S>, tile: Tile<'_, 'a>) -> TestCounter
    where
        P: RayProducer + ?Sized,
        S: TriangleStorage + ?Sized,
    {
        if tile.num_pixels() <= TILE_THRESHOLD {
            return Self::shoot_sequential(ctx, tile);
        }

        let (a, b) = tile.split();
        let (ca, cb) = rayon::join(|| Self::shoot_tile(ctx, a), || Self::shoot_tile(ctx, b));

        ca + cb
    }

    fn shoot_sequential<'a, P, S>(
        ctx: &ShotContext<'_, 'a, P, S>,
        tile: Tile<'_, 'a>,
    ) -> TestCounter
    where
        P: RayProducer + ?Sized,
        S: TriangleStorage + ?Sized,
    {
        let mut all = TestCounter::default();

        for (dy, row) in tile.rows.into_iter().enumerate() {
            let y = tile.y_from + dy;
            for (dx, cell) in row.iter_mut().enumerate() {
                let x = tile.x_from + dx;

                let ray = ctx.producer.ray_for(x, y);
                let mut counter = TestCounter::default();
                let hit = ctx.storage.hit(&ray, &mut counter);
                all += counter;

                (ctx.observer)(x, y, &hit);
                *cell = hit;
            }
        }

        all
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::{
        scene::TriangleSoup,
        spatial::{KdTree, KdTreeOptions, LinearStorage},
        tracer::PinholeCamera,
    };

    use super::*;

    fn built_cube() -> LinearStorage {
        let mut storage = LinearStorage::new();
        TriangleSoup::cube().load_into(&mut storage);
        storage.build();

        storage
    }

    fn cube_camera(width: usize, height: usize) -> PinholeCamera {
        let mut camera = PinholeCamera::new(width, height, 20.0, 0.1, 100.0).unwrap();
        camera
            .set_view(Vec4::point(0.5, 0.5, -2.0), Vec4::Z_AXIS, Vec4::Y_AXIS)
            .unwrap();

        camera
    }

    /// Records the order in which the pixels are delivered.
    #[derive(Default)]
    struct Recorder {
        size: Option<(usize, usize)>,
        pixels: Vec<(usize, usize)>,
        finished: bool,
    }

    impl HitConsumer for Recorder {
        fn set_size(&mut self, width: usize, height: usize) {
            self.size = Some((width, height));
        }

        fn hit_at(&mut self, _hit: &Hit, x: usize, y: usize) {
            assert!(!self.finished);
            self.pixels.push((x, y));
        }

        fn finished(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_empty_scene() {
        let mut storage = LinearStorage::new();
        storage.build();

        let camera = PinholeCamera::new(800, 600, 60.0, 0.0, 1000.0).unwrap();
        let shooter = RayShooter::new(4).unwrap();
        let shot = shooter.shoot(&camera, &storage);

        assert_eq!(shot.grid.hits().len(), 800 * 600);
        assert!(shot.grid.hits().iter().all(|h| !h.has_hit()));
        assert_eq!(shot.total, TestCounter::default());
    }

    #[test]
    fn test_cube_distances() {
        let storage = built_cube();
        let camera = cube_camera(64, 48);
        let shooter = RayShooter::new(2).unwrap();
        let shot = shooter.shoot(&camera, &storage);

        for y in 0..48 {
            for x in 0..64 {
                let hit = shot.grid.get(x, y);
                let ray = camera.ray_for(x, y);

                // every ray enters the front face at z = 0
                let expected = 2.0 / ray.direction().z();
                let d = hit.distance().unwrap();
                assert!((d - expected).abs() < 1e-9, "{} vs {}", d, expected);
                assert!(hit.position().unwrap().z().abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_totals_are_sums_of_pixels() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let soup = TriangleSoup::random(&mut rng, 500, 1.0, 0.1);

        let mut tree = KdTree::new(KdTreeOptions::default()).unwrap();
        soup.load_into(&mut tree);
        tree.build();

        let mut camera = PinholeCamera::new(120, 90, 50.0, 0.0, 100.0).unwrap();
        camera
            .set_view(Vec4::point(0.5, 0.5, -1.5), Vec4::Z_AXIS, Vec4::Y_AXIS)
            .unwrap();

        // the grid is larger than a tile, hence the work gets split
        assert!(120 * 90 > TILE_THRESHOLD);
        let shot = RayShooter::new(3).unwrap().shoot(&camera, &tree);

        let (left, right): (Vec<_>, Vec<_>) = (0..120)
            .flat_map(|x| (0..90).map(move |y| (x, y)))
            .partition(|(x, y)| (x + y) % 3 == 0);
        let sum = |pixels: &[(usize, usize)]| {
            pixels
                .iter()
                .fold(TestCounter::default(), |acc, (x, y)| {
                    acc + *shot.grid.get(*x, *y).tests()
                })
        };

        assert_eq!(sum(&left) + sum(&right), shot.total);
        assert_eq!(shot.grid.total_tests(), shot.total);
        assert!(shot.total.bbox_checks() > 0);
    }

    #[test]
    fn test_results_do_not_depend_on_threads() {
        let storage = built_cube();
        let camera = cube_camera(90, 70);

        let a = RayShooter::new(1).unwrap().shoot(&camera, &storage);
        let b = RayShooter::new(4).unwrap().shoot(&camera, &storage);

        assert_eq!(a.total, b.total);
        for (ha, hb) in a.grid.hits().iter().zip(b.grid.hits()) {
            assert_eq!(ha.distance(), hb.distance());
            assert_eq!(ha.tests(), hb.tests());
        }
    }

    #[test]
    fn test_observer_sees_every_pixel() {
        let storage = built_cube();
        let camera = cube_camera(100, 60);
        let seen = Mutex::new(vec![0u32; 100 * 60]);

        let shooter = RayShooter::new(2).unwrap();
        shooter.shoot_observed(&camera, &storage, &|x, y, hit| {
            assert!(hit.has_hit());
            seen.lock().unwrap()[y * 100 + x] += 1;
        });

        assert!(seen.into_inner().unwrap().iter().all(|n| *n == 1));
    }

    #[test]
    fn test_notify_column_by_column() {
        let storage = built_cube();
        let shot = RayShooter::new(1)
            .unwrap()
            .shoot(&cube_camera(3, 2), &storage);

        let mut recorder = Recorder::default();
        shot.grid.notify(&mut recorder);

        assert_eq!(recorder.size, Some((3, 2)));
        assert_eq!(
            recorder.pixels,
            vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]
        );
        assert!(recorder.finished);
    }

    #[test]
    #[should_panic(expected = "must be built")]
    fn test_unbuilt_storage_panics() {
        let storage = LinearStorage::new();
        let camera = cube_camera(4, 4);
        RayShooter::new(1).unwrap().shoot(&camera, &storage);
    }
}
