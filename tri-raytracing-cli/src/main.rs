use std::{fs::File, sync::PoisonError, time::Instant};

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use options::{BuiltinScene, Options};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tri_raytracing::{
    scene::{load_into_soup, TriangleSoup},
    RenderConfig, RenderExecutor, Stats, StatsNodeTrait,
};

mod options;

/// Initializes the program logging
///
/// # Arguments
/// * `filter` - The log level filter, i.e., the minimum log level to be logged.
fn initialize_logging(filter: LevelFilter) {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    builder.filter_level(filter).init();
}

/// Loads the CAD files matching the provided glob patterns.
///
/// # Arguments
/// * `patterns` - The glob patterns for the CAD files.
fn load_cad_files(patterns: &[String]) -> Result<(TriangleSoup, usize)> {
    let mut soup = TriangleSoup::new();
    let mut num_read_files = 0;

    for pattern in patterns {
        let paths = glob::glob(pattern).map_err(|err| {
            error!("Invalid input pattern '{}': {:?}", pattern, err);
            err
        })?;

        for entry in paths {
            match entry {
                Ok(path) => {
                    info!("Loading CAD data '{}'...", path.display());

                    if let Err(err) = load_into_soup(&mut soup, &path) {
                        error!("Failed to load CAD data: {:?}", err);
                        info!("Skipping CAD data...");
                    } else {
                        num_read_files += 1;
                    }
                }
                Err(err) => {
                    error!("Failed to read entry: {:?}", err);
                    info!("Skipping entry...");
                }
            }
        }
    }

    Ok((soup, num_read_files))
}

/// Creates the built-in scene.
fn builtin_scene(options: &Options) -> TriangleSoup {
    match options.builtin {
        BuiltinScene::Cube => TriangleSoup::cube(),
        BuiltinScene::Example => TriangleSoup::example_mesh(),
        BuiltinScene::Random => {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            TriangleSoup::random(&mut rng, options.num_random, 1.0, 0.05)
        }
    }
}

/// Loads the scene from the cache, the configured input files or the built-in scenes.
///
/// # Arguments
/// * `options` - The program options.
/// * `config` - The render configuration.
fn load_scene(options: &Options, config: &RenderConfig) -> Result<TriangleSoup> {
    if let Some(cache) = options.scene_cache.as_ref().filter(|c| c.exists()) {
        info!("Reading cached scene {:?}...", cache);
        return Ok(TriangleSoup::read_from(File::open(cache)?)?);
    }

    let t = Instant::now();
    let (soup, num_read) = load_cad_files(&config.input)?;
    info!(
        "Loaded {} CAD files in {} ms",
        num_read,
        t.elapsed().as_secs_f64() * 1e3f64
    );

    let soup = if soup.is_empty() {
        warn!("No triangles loaded, using the built-in {:?} scene", options.builtin);
        builtin_scene(options)
    } else {
        soup
    };

    if let Some(cache) = options.scene_cache.as_ref() {
        info!("Writing scene cache {:?}...", cache);
        soup.write(File::create(cache)?)?;
    }

    Ok(soup)
}

/// Runs the program.
///
/// # Arguments
/// * `options` - The program options.
fn run_program(options: Options) -> anyhow::Result<()> {
    let s = Stats::root();

    let config = RenderConfig::read(File::open(&options.config)?).map_err(|err| {
        error!("Failed to read the configuration: {:?}", err);
        err
    })?;

    let soup = {
        let _t = s.get_child("loading").register_timing();
        load_scene(&options, &config)?
    };

    info!("Scene information:");
    info!("  - Number of triangles: {}", soup.len());
    info!("  - Bounding box: {}", soup.bounding_box());

    let executor = RenderExecutor::new(config, soup, options.out_dir.clone());
    let reports = executor.run(s.get_child("rendering"))?;

    let num_mismatching = reports
        .iter()
        .filter(|r| r.mismatches.is_some_and(|n| n > 0))
        .count();
    if num_mismatching > 0 {
        warn!("{} renders disagree with the linear storage", num_mismatching);
    }

    Ok(())
}

fn main() {
    let options = Options::parse();
    initialize_logging(options.log_level.into());
    options.dump_to_log();

    match run_program(options) {
        Ok(_) => {
            info!("Stat:");
            let root = Stats::root();
            let stats = root.lock().unwrap_or_else(PoisonError::into_inner);
            info!("{}", *stats);
            info!("Program completed successfully");
        }
        Err(err) => {
            error!("Program failed: {:?}", err);
            std::process::exit(1);
        }
    }
}
