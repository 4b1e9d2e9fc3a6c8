use log::error;
use serde::{Deserialize, Serialize};

use crate::{
    consume::Channel,
    math::Vec4,
    spatial::{KdTree, KdTreeOptions, LinearStorage, Octree, OctreeOptions, TriangleStorage},
    tracer::PinholeCamera,
    Error, Result,
};

/// The configuration of a render run.
#[derive(Debug, Deserialize, Serialize)]
pub struct RenderConfig {
    /// The storage setups, i.e., the different storages to render the views with.
    pub setups: Vec<StorageSetup>,

    /// The input files for the rendering.
    /// Can be expressions like `*.glb`
    #[serde(default)]
    pub input: Vec<String>,

    /// The views to render
    pub views: Vec<View>,

    /// The width of the images in pixels
    pub width: usize,

    /// The height of the images in pixels
    pub height: usize,

    /// The number of threads to use, 0 selects the available parallelism
    #[serde(default)]
    pub num_threads: usize,

    /// Should the channels be written as images
    #[serde(default)]
    pub write_images: bool,

    /// The channels to render per view
    #[serde(default = "default_channels")]
    pub channels: Vec<Channel>,

    /// Should every setup be compared against the linear storage
    #[serde(default)]
    pub cross_check: bool,
}

fn default_channels() -> Vec<Channel> {
    vec![Channel::Shading]
}

impl RenderConfig {
    /// Reads the configuration from the provided reader.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the configuration from.
    pub fn read<R: std::io::Read>(reader: R) -> Result<Self> {
        let config: RenderConfig = serde_yaml::from_reader(reader).map_err(|e| {
            error!("Failed to parse the configuration: {:?}", e);

            Error::DeserializationError(Box::new(e))
        })?;

        Ok(config)
    }

    /// Writes the configuration to the provided writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the configuration to.
    pub fn write<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let yaml = serde_yaml::to_string(&self).map_err(|e| {
            error!("Failed to serialize the configuration: {:?}", e);

            Error::SerializationError(Box::new(e))
        })?;

        writer.write_all(yaml.as_bytes())?;

        Ok(())
    }
}

/// A camera view.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct View {
    /// The position of the camera
    pub eye: [f64; 3],

    /// The viewing direction
    pub view: [f64; 3],

    /// The up direction
    pub up: [f64; 3],

    /// The field of view in degrees
    pub fov: f64,

    /// The nearest valid hit distance
    pub near: f64,

    /// The farthest valid hit distance
    pub far: f64,
}

impl View {
    /// Creates the camera for the view.
    ///
    /// # Arguments
    /// * `width` - The width of the image in pixels.
    /// * `height` - The height of the image in pixels.
    pub fn camera(&self, width: usize, height: usize) -> Result<PinholeCamera> {
        let mut camera = PinholeCamera::new(width, height, self.fov, self.near, self.far)?;
        camera.set_view(
            Vec4::from_array(self.eye, true),
            Vec4::from_array(self.view, false),
            Vec4::from_array(self.up, false),
        )?;

        Ok(camera)
    }
}

/// The triangle storage to render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum StorageSetup {
    Linear,
    KdTree {
        depth_threshold: usize,
        triangle_threshold: usize,
    },
    Octree {
        depth_threshold: usize,
        triangle_threshold: usize,
    },
}

impl StorageSetup {
    /// Creates an empty storage for the setup.
    pub fn create(&self) -> Result<Box<dyn TriangleStorage>> {
        Ok(match *self {
            StorageSetup::Linear => Box::new(LinearStorage::new()),
            StorageSetup::KdTree {
                depth_threshold,
                triangle_threshold,
            } => Box::new(KdTree::new(KdTreeOptions {
                depth_threshold,
                triangle_threshold,
            })?),
            StorageSetup::Octree {
                depth_threshold,
                triangle_threshold,
            } => Box::new(Octree::new(OctreeOptions {
                depth_threshold,
                triangle_threshold,
            })?),
        })
    }

    /// Returns a name of the setup, usable as directory name.
    pub fn name(&self) -> String {
        match self {
            StorageSetup::Linear => "linear".to_owned(),
            StorageSetup::KdTree {
                depth_threshold,
                triangle_threshold,
            } => format!("kd_tree_d{}_t{}", depth_threshold, triangle_threshold),
            StorageSetup::Octree {
                depth_threshold,
                triangle_threshold,
            } => format!("octree_d{}_t{}", depth_threshold, triangle_threshold),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_loading_config() {
        let simple_config_data = include_bytes!("../../configs/simple.yaml");
        let config = RenderConfig::read(&simple_config_data[..]).unwrap();

        assert_eq!(config.input, vec!["test_data/*.glb".to_string()]);
        assert_eq!(config.views.len(), 2);
        assert_eq!(config.setups.len(), 3);
        assert_eq!(
            config.setups[1],
            StorageSetup::KdTree {
                depth_threshold: 20,
                triangle_threshold: 8
            }
        );
        assert!(config.write_images);
        assert!(config.cross_check);
        assert_eq!(config.num_threads, 0);
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 240);
        assert_eq!(config.channels, vec![Channel::Shading, Channel::TriangleTests]);
    }

    #[test]
    fn test_defaults_and_round_trip() {
        let yaml = "
setups: [Linear]
views: []
width: 8
height: 4
";
        let config = RenderConfig::read(yaml.as_bytes()).unwrap();
        assert!(config.input.is_empty());
        assert!(!config.write_images);
        assert!(!config.cross_check);
        assert_eq!(config.channels, vec![Channel::Shading]);

        let mut buffer = Vec::new();
        config.write(&mut buffer).unwrap();
        let config2 = RenderConfig::read(&buffer[..]).unwrap();
        assert_eq!(config2.setups, config.setups);
        assert_eq!(config2.width, 8);
    }

    #[test]
    fn test_invalid_config() {
        assert!(RenderConfig::read("setups: 5".as_bytes()).is_err());
    }

    #[test]
    fn test_create_storages() {
        let s = StorageSetup::Octree {
            depth_threshold: 4,
            triangle_threshold: 2,
        };
        assert_eq!(s.create().unwrap().name(), "octree");
        assert_eq!(s.name(), "octree_d4_t2");

        let s = StorageSetup::KdTree {
            depth_threshold: 0,
            triangle_threshold: 2,
        };
        assert!(s.create().is_err());
    }

    #[test]
    fn test_view_camera() {
        let view = View {
            eye: [0.5, 0.5, -2.0],
            view: [0.0, 0.0, 1.0],
            up: [0.0, 1.0, 0.0],
            fov: 45.0,
            near: 0.1,
            far: 100.0,
        };

        let camera = view.camera(80, 60).unwrap();
        assert_eq!(camera.eye(), &Vec4::point(0.5, 0.5, -2.0));
        assert!(view.camera(0, 60).is_err());
    }
}
