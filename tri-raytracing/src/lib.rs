//! An offline raytracing core for triangle soups.
//!
//! Triangles are collected in a [`spatial::TriangleStorage`], either tested one by one or indexed
//! by a kd-tree or an octree. The [`tracer::RayShooter`] shoots a grid of rays against a built
//! storage on a fork-join worker pool and reports the closest hit and the number of performed
//! intersection tests per pixel.

mod config;
pub mod consume;
mod error;
mod executor;
pub mod math;
pub mod scene;
pub mod spatial;
mod stats;
pub mod tracer;

pub use config::*;
pub use error::*;
pub use executor::*;
pub use stats::*;
