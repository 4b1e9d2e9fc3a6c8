use crate::{
    math::{Ray, Vec4},
    Error, Result,
};

/// Produces a grid of rays.
///
/// The producer is a pure function of the pixel coordinates and gets called concurrently from
/// multiple worker threads.
pub trait RayProducer: Sync {
    /// Returns the ray for the given pixel.
    ///
    /// # Arguments
    /// * `x` - The column of the pixel.
    /// * `y` - The row of the pixel.
    fn ray_for(&self, x: usize, y: usize) -> Ray;

    /// Returns the width of the grid.
    fn width(&self) -> usize;

    /// Returns the height of the grid.
    fn height(&self) -> usize;
}

/// A pinhole camera shooting one ray per pixel through an angular grid.
#[derive(Debug, Clone)]
pub struct PinholeCamera {
    width: usize,
    height: usize,

    /// The vertical field of view in degrees.
    fov: f64,
    near: f64,
    far: f64,

    eye: Vec4,
    view: Vec4,
    up: Vec4,

    /// The normalized direction to the left, derived from up and view.
    left: Vec4,
}

impl PinholeCamera {
    /// Creates a new camera at the origin looking along the negative z axis.
    ///
    /// # Arguments
    /// * `width` - The width of the grid in pixels.
    /// * `height` - The height of the grid in pixels.
    /// * `fov` - The field of view in degrees.
    /// * `near` - The nearest valid distance.
    /// * `far` - The farthest valid distance.
    pub fn new(width: usize, height: usize, fov: f64, near: f64, far: f64) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidCamera(format!(
                "grid size {}x{} is empty",
                width, height
            )));
        }

        if !(fov > 0.0 && fov < 180.0) {
            return Err(Error::InvalidCamera(format!(
                "field of view {} is not within (0, 180)",
                fov
            )));
        }

        // the outermost columns are half the horizontal field of view off the view direction
        let horizontal_fov = fov * width as f64 / height as f64;
        if horizontal_fov >= 180.0 {
            return Err(Error::InvalidCamera(format!(
                "horizontal field of view {} of a {}x{} grid is not below 180",
                horizontal_fov, width, height
            )));
        }

        if !(near < far) {
            return Err(Error::InvalidCamera(format!(
                "near {} must be smaller than far {}",
                near, far
            )));
        }

        let mut camera = Self {
            width,
            height,
            fov,
            near,
            far,
            eye: Vec4::ORIGIN,
            view: Vec4::Z_AXIS.negate(),
            up: Vec4::Y_AXIS,
            left: Vec4::X_AXIS.negate(),
        };
        camera.set_view(Vec4::ORIGIN, Vec4::Z_AXIS.negate(), Vec4::Y_AXIS)?;

        Ok(camera)
    }

    /// Sets the camera position and orientation.
    ///
    /// # Arguments
    /// * `eye` - The camera origin.
    /// * `view` - The viewing direction.
    /// * `up` - The direction which is up for the camera.
    pub fn set_view(&mut self, eye: Vec4, view: Vec4, up: Vec4) -> Result<()> {
        let view = view.expect_direction().normalized();
        let up = up.expect_direction().normalized();
        let left = up.cross(&view);

        if left.length_sq() == 0.0 {
            return Err(Error::InvalidCamera(format!(
                "view {} and up {} are parallel",
                view, up
            )));
        }

        self.eye = eye.expect_point();
        self.view = view;
        self.up = up;
        self.left = left.normalized();

        Ok(())
    }

    /// Moves the camera along the view direction or, if `ortho` is set, to the left.
    pub fn move_by(&mut self, forward: bool, ortho: bool, amount: f64) {
        let dir = if ortho { self.left } else { self.view };
        self.eye = self
            .eye
            .add_mul(&dir, if forward { amount } else { -amount });
    }

    #[inline]
    pub fn fov(&self) -> f64 {
        self.fov
    }

    #[inline]
    pub fn near(&self) -> f64 {
        self.near
    }

    #[inline]
    pub fn far(&self) -> f64 {
        self.far
    }

    #[inline]
    pub fn eye(&self) -> &Vec4 {
        &self.eye
    }

    #[inline]
    pub fn view(&self) -> &Vec4 {
        &self.view
    }

    #[inline]
    pub fn up(&self) -> &Vec4 {
        &self.up
    }
}

impl RayProducer for PinholeCamera {
    fn ray_for(&self, x: usize, y: usize) -> Ray {
        let w = self.width as f64;
        let h = self.height as f64;

        let angle_x = -self.fov * w / h * (x as f64 / w - 0.5);
        let angle_y = -self.fov * (y as f64 / h - 0.5);
        let len_left = angle_x.to_radians().tan();
        let len_up = angle_y.to_radians().tan();

        let dir = self
            .view
            .add_mul(&self.left, len_left)
            .add_mul(&self.up, len_up);

        Ray::new(self.eye, dir, self.near, self.far)
    }

    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }
}
