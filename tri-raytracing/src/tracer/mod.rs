//! The parallel ray dispatch engine.
//!
//! A [`RayProducer`] supplies one ray per pixel, the [`RayShooter`] intersects all of them with
//! a built triangle storage and collects the per-pixel [`Hit`] results into a [`HitGrid`].

mod counter;
mod hit;
mod producer;
mod shooter;

pub use counter::*;
pub use hit::*;
pub use producer::*;
pub use shooter::*;

/// Consumes the hits of a completed render.
pub trait HitConsumer {
    /// Called once before any hit with the size of the grid.
    fn set_size(&mut self, width: usize, height: usize);

    /// Called once for every pixel.
    ///
    /// # Arguments
    /// * `hit` - The hit of the pixel.
    /// * `x` - The column of the pixel.
    /// * `y` - The row of the pixel.
    fn hit_at(&mut self, hit: &Hit, x: usize, y: usize);

    /// Called after all pixels were delivered.
    fn finished(&mut self);
}
