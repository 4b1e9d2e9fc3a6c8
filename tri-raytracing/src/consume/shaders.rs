use std::f64::consts::FRAC_PI_2;

use crate::tracer::{Hit, HitConsumer};

use super::{image::to_channel, Image, ImageChannel, Rgb};

/// Computes the color of a single pixel from its hit alone.
pub trait Shader {
    /// Returns the name of the shader.
    fn name(&self) -> &'static str;

    /// Returns the color for the hit. Misses are drawn black by the consumer.
    fn shade(&self, hit: &Hit) -> Rgb;
}

/// Shades the surface by the angle between the interpolated normal and the inverted ray.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewShader;

impl Shader for ViewShader {
    fn name(&self) -> &'static str {
        "shading"
    }

    fn shade(&self, hit: &Hit) -> Rgb {
        match hit.normal() {
            Some(normal) => {
                let angle = hit.ray().direction().negate().angle(&normal);
                Image::grey(255 - to_channel(angle / FRAC_PI_2))
            }
            None => Image::grey(0),
        }
    }
}

/// Maps the interpolated normal to RGB.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalShader;

impl Shader for NormalShader {
    fn name(&self) -> &'static str {
        "normal"
    }

    fn shade(&self, hit: &Hit) -> Rgb {
        match hit.normal() {
            Some(n) => [
                to_channel(n.x() * 0.5 + 0.5),
                to_channel(n.y() * 0.5 + 0.5),
                to_channel(n.z() * 0.5 + 0.5),
            ],
            None => Image::grey(0),
        }
    }
}

/// Draws close hits bright and far hits dark.
#[derive(Clone, Copy, Debug)]
pub struct DepthShader {
    near: f64,
    far: f64,
}

impl DepthShader {
    /// Creates a new depth shader mapping the range between `near` and `far` onto the grey values.
    pub fn new(near: f64, far: f64) -> Self {
        Self { near, far }
    }
}

impl Shader for DepthShader {
    fn name(&self) -> &'static str {
        "depth"
    }

    fn shade(&self, hit: &Hit) -> Rgb {
        match hit.distance() {
            Some(d) => {
                let d = (d - self.near) / (self.far - self.near);
                Image::grey(255 - to_channel(d))
            }
            None => Image::grey(0),
        }
    }
}

/// Maps the barycentric coordinates of the hit to RGB.
#[derive(Clone, Copy, Debug, Default)]
pub struct BarycentricShader;

impl Shader for BarycentricShader {
    fn name(&self) -> &'static str {
        "barycentric"
    }

    fn shade(&self, hit: &Hit) -> Rgb {
        match hit.barycentric() {
            Some(b) => [to_channel(b.u), to_channel(b.v), to_channel(b.w)],
            None => Image::grey(0),
        }
    }
}

/// Renders every hit with the shader into an image.
pub struct ShaderConsumer<S: Shader> {
    shader: S,
    image: Option<Image>,
}

impl<S: Shader> ShaderConsumer<S> {
    pub fn new(shader: S) -> Self {
        Self {
            shader,
            image: None,
        }
    }
}

impl<S: Shader> HitConsumer for ShaderConsumer<S> {
    fn set_size(&mut self, width: usize, height: usize) {
        self.image = Some(Image::new(width, height));
    }

    fn hit_at(&mut self, hit: &Hit, x: usize, y: usize) {
        if let Some(image) = self.image.as_mut() {
            image.set(x, y, self.shader.shade(hit));
        }
    }

    fn finished(&mut self) {}
}

impl<S: Shader> ImageChannel for ShaderConsumer<S> {
    fn name(&self) -> String {
        self.shader.name().to_owned()
    }

    fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        math::{Ray, Triangle, Vec4},
        tracer::{TestCounter, TriangleHit},
    };

    use super::*;

    fn with_hit<F: FnOnce(&Hit)>(dir: Vec4, f: F) {
        let t = Triangle::new(
            Vec4::point(-1.0, -1.0, 0.0),
            Vec4::point(1.0, -1.0, 0.0),
            Vec4::point(0.0, 1.0, 0.0),
        );
        let ray = Ray::new(Vec4::point(0.0, 0.0, 2.0), dir, 1.0, 5.0);
        let distance = 2.0 / ray.direction().z().abs();

        let hit = Hit::new(
            ray,
            Some(TriangleHit {
                index: 0,
                triangle: &t,
                distance,
            }),
            TestCounter::new(1, 0),
            1,
            0,
        );

        f(&hit);
    }

    #[test]
    fn test_frontal_view_is_white() {
        with_hit(Vec4::Z_AXIS.negate(), |hit| {
            assert_eq!(ViewShader.shade(hit), [255, 255, 255]);
            assert_eq!(NormalShader.shade(hit), [127, 127, 255]);
            assert_eq!(DepthShader::new(1.0, 5.0).shade(hit), Image::grey(192));
        });
    }

    #[test]
    fn test_grazing_view_is_dark() {
        with_hit(Vec4::direction(1.0, 0.0, -0.01), |hit| {
            assert!(ViewShader.shade(hit)[0] < 5);
        });
    }

    #[test]
    fn test_misses_are_black() {
        let ray = Ray::new(Vec4::ORIGIN, Vec4::Z_AXIS, 0.0, 1.0);
        let miss = Hit::miss(ray);

        assert_eq!(ViewShader.shade(&miss), [0, 0, 0]);
        assert_eq!(NormalShader.shade(&miss), [0, 0, 0]);
        assert_eq!(DepthShader::new(0.0, 1.0).shade(&miss), [0, 0, 0]);
        assert_eq!(BarycentricShader.shade(&miss), [0, 0, 0]);
    }

    #[test]
    fn test_consumer_fills_image() {
        with_hit(Vec4::Z_AXIS.negate(), |hit| {
            let mut c = ShaderConsumer::new(BarycentricShader);
            c.set_size(2, 1);
            c.hit_at(hit, 1, 0);
            c.finished();

            let img = c.image().unwrap();
            assert_eq!(img.get(0, 0), [0, 0, 0]);
            let [r, g, b] = img.get(1, 0);
            assert!(r > 0 && g > 0 && b > 0);
            assert_eq!(c.name(), "barycentric");
        });
    }
}
