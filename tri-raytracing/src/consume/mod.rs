//! Consumers turning rendered hit grids into images.

mod image;
mod shaders;
mod test_count;

pub use image::{Image, Rgb};
pub use shaders::*;
pub use test_count::*;

use serde::{Deserialize, Serialize};

use crate::tracer::HitConsumer;

/// A hit consumer producing an image.
pub trait ImageChannel: HitConsumer {
    /// Returns the name of the channel, usable as file name.
    fn name(&self) -> String;

    /// Returns the image of the last consumed render, if any.
    fn image(&self) -> Option<&Image>;
}

/// The image channels that can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Channel {
    Shading,
    Normal,
    Depth,
    Barycentric,
    TriangleTests,
    BoxTests,
    TriangleTestsDiff,
    BoxTestsDiff,
}

impl Channel {
    /// Creates the consumer for the channel.
    ///
    /// # Arguments
    /// * `near` - The nearest distance mapped by the depth channel.
    /// * `far` - The farthest distance mapped by the depth channel.
    pub fn create(&self, near: f64, far: f64) -> Box<dyn ImageChannel> {
        match self {
            Channel::Shading => Box::new(ShaderConsumer::new(ViewShader)),
            Channel::Normal => Box::new(ShaderConsumer::new(NormalShader)),
            Channel::Depth => Box::new(ShaderConsumer::new(DepthShader::new(near, far))),
            Channel::Barycentric => Box::new(ShaderConsumer::new(BarycentricShader)),
            Channel::TriangleTests => Box::new(TestCountConsumer::new(TestKind::Triangles)),
            Channel::BoxTests => Box::new(TestCountConsumer::new(TestKind::Boxes)),
            Channel::TriangleTestsDiff => {
                Box::new(CompareTestCountConsumer::new(TestKind::Triangles))
            }
            Channel::BoxTestsDiff => Box::new(CompareTestCountConsumer::new(TestKind::Boxes)),
        }
    }
}
