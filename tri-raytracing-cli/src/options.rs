use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};

/// Workaround for parsing the different log level
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// The scene rendered when the configuration names no input files.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BuiltinScene {
    /// The unit cube
    Cube,
    /// Four crossing triangles
    Example,
    /// Seeded random triangles
    Random,
}

/// CLI for rendering triangle meshes with different spatial indices and comparing their costs.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// The log level
    #[arg(short, value_enum, long, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// The render configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// The directory for the rendered images
    #[arg(short, long, default_value = "out")]
    pub out_dir: PathBuf,

    /// Binary file caching the loaded triangles. It is read if it exists and written otherwise.
    #[arg(long)]
    pub scene_cache: Option<PathBuf>,

    /// The scene used if no input files are configured
    #[arg(long, value_enum, default_value_t = BuiltinScene::Cube)]
    pub builtin: BuiltinScene,

    /// The number of triangles of the random built-in scene
    #[arg(long, default_value_t = 10000)]
    pub num_random: usize,
}

impl Options {
    /// Dumps the options to the log.
    pub fn dump_to_log(&self) {
        info!("Log Level: {:?}", self.log_level);
        info!("Config file: {:?}", self.config);
        info!("Output directory: {:?}", self.out_dir);
        info!("Scene cache: {:?}", self.scene_cache);
        info!("Built-in scene: {:?}", self.builtin);
    }
}
