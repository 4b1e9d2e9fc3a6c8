use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use log::{debug, error, info, warn};

use crate::{
    consume::ImageChannel,
    scene::TriangleSoup,
    spatial::TriangleStorage,
    tracer::{HitGrid, PixelObserver, RayShooter, TestCounter},
    Error, RenderConfig, Result, StatsNode, StatsNodeTrait, StorageSetup,
};

/// The outcome of rendering a single view with a single storage.
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// The name of the storage setup.
    pub setup: String,

    /// The index of the view.
    pub view_index: usize,

    /// The tests of all rays.
    pub total: TestCounter,

    /// The number of pixels whose ray hit a triangle.
    pub num_hits: usize,

    /// The number of pixels disagreeing with the linear storage, if cross checking is enabled.
    pub mismatches: Option<usize>,
}

/// Counts the pixels of the two grids that disagree on hit or miss or on the hit distance.
///
/// # Arguments
/// * `a` - The first grid.
/// * `b` - The second grid, must have the same size as the first.
pub fn count_mismatches(a: &HitGrid, b: &HitGrid) -> usize {
    assert_eq!(a.width(), b.width());
    assert_eq!(a.height(), b.height());

    a.hits()
        .iter()
        .zip(b.hits().iter())
        .filter(|(ha, hb)| match (ha.distance(), hb.distance()) {
            (Some(da), Some(db)) => (da - db).abs() > 1e-9 * da.abs().max(1.0),
            (None, None) => false,
            _ => true,
        })
        .count()
}

/// An executor rendering all views of a configuration with all storage setups.
pub struct RenderExecutor {
    config: RenderConfig,
    out_dir: PathBuf,
    soup: TriangleSoup,
}

impl RenderExecutor {
    /// Creates a new render executor.
    ///
    /// # Arguments
    /// * `config` - The render configuration.
    /// * `soup` - The triangles to render.
    /// * `out_dir` - The output directory for the images.
    pub fn new(config: RenderConfig, soup: TriangleSoup, out_dir: PathBuf) -> Self {
        Self {
            config,
            out_dir,
            soup,
        }
    }

    /// Runs the executor and returns a report per rendered view and setup.
    ///
    /// # Arguments
    /// * `s` - The stats node to write the timings and counters to.
    pub fn run(&self, s: StatsNode) -> Result<Vec<RenderReport>> {
        info!("Num Setups: {}", self.config.setups.len());
        info!("Num Views: {}", self.config.views.len());
        info!("Num Triangles: {}", self.soup.len());

        info!("Initialize the render executor...");
        self.initialize().map_err(|err| {
            error!("Failed to initialize the render executor: {:?}", err);
            err
        })?;

        let shooter = RayShooter::new(self.config.num_threads)?;

        let reference = if self.config.cross_check {
            Some(self.build_storage(&s, StorageSetup::Linear)?)
        } else {
            None
        };

        let mut storages = Vec::with_capacity(self.config.setups.len());
        for setup in self.config.setups.iter() {
            match self.build_storage(&s, *setup) {
                Ok(storage) => storages.push((setup.name(), storage)),
                Err(err) => error!("Failed to create the setup {}: {}", setup.name(), err),
            }
        }

        let mut reports = Vec::new();

        for (view_index, view) in self.config.views.iter().enumerate() {
            info!(
                "Render view {}/{}...",
                view_index + 1,
                self.config.views.len()
            );

            let camera = match view.camera(self.config.width, self.config.height) {
                Ok(camera) => camera,
                Err(err) => {
                    error!("Skipping view {}: {}", view_index, err);
                    continue;
                }
            };

            // the channels live across setups, such that diff channels compare consecutive setups
            let mut channels: Vec<Box<dyn ImageChannel>> = self
                .config
                .channels
                .iter()
                .map(|c| c.create(view.near, view.far))
                .collect();

            let reference_shot = reference.as_ref().map(|r| {
                let _t = s.get_child("reference").register_timing();
                shooter.shoot(&camera, r.as_ref())
            });

            for (name, storage) in storages.iter() {
                let node = s.get_child(name);
                let num_hits = AtomicUsize::new(0);

                let shot = {
                    let _t = node.get_child("render").register_timing();
                    let count_hits: &PixelObserver = &|_, _, hit| {
                        if hit.has_hit() {
                            num_hits.fetch_add(1, Ordering::Relaxed);
                        }
                    };

                    shooter.shoot_observed(&camera, storage.as_ref(), count_hits)
                };

                node.add_to_counter("triangle tests", shot.total.checks());
                node.add_to_counter("box tests", shot.total.bbox_checks());

                let mismatches = reference_shot
                    .as_ref()
                    .map(|r| count_mismatches(&r.grid, &shot.grid));

                let report = RenderReport {
                    setup: name.clone(),
                    view_index,
                    total: shot.total,
                    num_hits: num_hits.into_inner(),
                    mismatches,
                };

                info!(
                    "{}: {} hits, {} triangle tests, {} box tests",
                    name,
                    report.num_hits,
                    report.total.checks(),
                    report.total.bbox_checks()
                );

                match mismatches {
                    Some(0) => debug!("{}: agrees with the linear storage", name),
                    Some(n) => warn!("{}: {} pixels disagree with the linear storage", name, n),
                    None => {}
                }

                for channel in channels.iter_mut() {
                    shot.grid.notify(channel.as_mut());
                }

                if self.config.write_images {
                    let dir = self.out_dir.join(name);
                    for channel in channels.iter() {
                        self.write_channel(&dir, view_index, channel.as_ref());
                    }
                }

                reports.push(report);
            }
        }

        Ok(reports)
    }

    /// Creates the storage for the setup, adds all triangles and builds it.
    ///
    /// # Arguments
    /// * `s` - The stats node to write the build timings to.
    /// * `setup` - The setup to build.
    fn build_storage(
        &self,
        s: &StatsNode,
        setup: StorageSetup,
    ) -> Result<Box<dyn TriangleStorage>> {
        let mut storage = setup.create()?;
        self.soup.load_into(storage.as_mut());

        info!("Building {}...", setup.name());
        {
            let _t = s.get_child(&setup.name()).get_child("build").register_timing();
            storage.build();
        }

        if let Some(stats) = storage.statistics() {
            info!("{}: {}", setup.name(), stats);
        }

        Ok(storage)
    }

    /// Writes the image of the channel, errors are only logged.
    fn write_channel(&self, dir: &Path, view_index: usize, channel: &dyn ImageChannel) {
        let Some(image) = channel.image() else {
            return;
        };

        if let Err(err) = std::fs::create_dir_all(dir) {
            error!("Failed to create the setup directory: {:?}", err);
            return;
        }

        let path = dir.join(format!("view_{}_{}.ppm", view_index, channel.name()));
        let writer = match File::create(&path) {
            Ok(writer) => writer,
            Err(err) => {
                error!("Failed to create the image file: {:?}", err);
                return;
            }
        };

        if let Err(err) = image.write_ppm(writer) {
            error!("Failed to save the image {:?}: {:?}", path, err);
        }
    }

    /// Initializes the render executor.
    fn initialize(&self) -> Result<()> {
        // make sure the specified output directory exists and is a directory
        std::fs::create_dir_all(&self.out_dir).map_err(|err| {
            error!("Failed to create the output directory: {:?}", err);

            Error::Io(err)
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{consume::Channel, Stats, View};

    use super::*;

    fn config(write_images: bool) -> RenderConfig {
        RenderConfig {
            setups: vec![
                StorageSetup::Linear,
                StorageSetup::KdTree {
                    depth_threshold: 8,
                    triangle_threshold: 2,
                },
                StorageSetup::Octree {
                    depth_threshold: 6,
                    triangle_threshold: 2,
                },
            ],
            input: Vec::new(),
            views: vec![View {
                eye: [0.5, 0.5, -2.0],
                view: [0.0, 0.0, 1.0],
                up: [0.0, 1.0, 0.0],
                fov: 20.0,
                near: 0.1,
                far: 100.0,
            }],
            width: 40,
            height: 30,
            num_threads: 2,
            write_images,
            channels: vec![Channel::Depth, Channel::TriangleTestsDiff],
            cross_check: true,
        }
    }

    #[test]
    fn test_cube_renders_agree() {
        let out_dir = std::env::temp_dir().join("tri_raytracing_executor_agree");
        let executor = RenderExecutor::new(config(false), TriangleSoup::cube(), out_dir);

        let reports = executor.run(Stats::new_root()).unwrap();
        assert_eq!(reports.len(), 3);

        for r in reports.iter() {
            assert_eq!(r.mismatches, Some(0), "{}", r.setup);
            assert_eq!(r.num_hits, 40 * 30);
        }
        assert_eq!(reports[0].total.checks(), 12 * 40 * 30);
    }

    #[test]
    fn test_images_are_written() {
        let out_dir = std::env::temp_dir().join("tri_raytracing_executor_images");
        let executor = RenderExecutor::new(config(true), TriangleSoup::cube(), out_dir.clone());
        executor.run(Stats::new_root()).unwrap();

        let path = out_dir.join("linear").join("view_0_depth.ppm");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("P3\n40 30\n255\n"));
        assert!(out_dir
            .join("octree_d6_t2")
            .join("view_0_triangles_diff.ppm")
            .exists());
    }
}
