use log::info;
use serde::{Deserialize, Serialize};

use crate::tracer::{Hit, HitConsumer};

use super::{image::to_channel, Image, ImageChannel};

/// The kind of tests visualized by a test count consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    Triangles,
    Boxes,
}

impl TestKind {
    #[inline]
    fn count(&self, hit: &Hit) -> u64 {
        match self {
            TestKind::Triangles => hit.tests().checks(),
            TestKind::Boxes => hit.tests().bbox_checks(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TestKind::Triangles => "triangles",
            TestKind::Boxes => "boxes",
        }
    }
}

/// Draws a heat map of the number of tests per pixel, normalized by the minimum and maximum of
/// the image.
pub struct TestCountConsumer {
    kind: TestKind,
    width: usize,
    values: Vec<u64>,
    min: u64,
    max: u64,
    image: Option<Image>,
}

impl TestCountConsumer {
    pub fn new(kind: TestKind) -> Self {
        Self {
            kind,
            width: 0,
            values: Vec::new(),
            min: u64::MAX,
            max: 0,
            image: None,
        }
    }

    /// Returns the smallest and the largest count of the last image.
    pub fn range(&self) -> (u64, u64) {
        (self.min, self.max)
    }
}

impl HitConsumer for TestCountConsumer {
    fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.values = vec![0; width * height];
        self.min = u64::MAX;
        self.max = 0;
        self.image = Some(Image::new(width, height));
    }

    fn hit_at(&mut self, hit: &Hit, x: usize, y: usize) {
        let v = self.kind.count(hit);
        self.values[y * self.width + x] = v;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn finished(&mut self) {
        info!(
            "{} checks [min: {} max: {}]",
            self.kind.label(),
            self.min,
            self.max
        );

        let Some(image) = self.image.as_mut() else {
            return;
        };

        let range = self.max.saturating_sub(self.min);
        for (index, v) in self.values.iter().enumerate() {
            let sub = if range > 0 {
                to_channel((v - self.min) as f64 / range as f64)
            } else {
                0
            };

            let color = match self.kind {
                TestKind::Triangles => [255, 255 - sub, 255 - sub],
                TestKind::Boxes => [0, sub, 0],
            };

            image.set(index % self.width, index / self.width, color);
        }
    }
}

impl ImageChannel for TestCountConsumer {
    fn name(&self) -> String {
        format!("{}_checks", self.kind.label())
    }

    fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }
}

/// Draws the difference of the number of tests per pixel towards the previously consumed render
/// of the same size. More tests are drawn red, fewer tests blue.
pub struct CompareTestCountConsumer {
    kind: TestKind,
    width: usize,
    height: usize,
    values: Vec<u64>,
    prev: Option<Vec<u64>>,
    max: u64,
    image: Option<Image>,
}

impl CompareTestCountConsumer {
    pub fn new(kind: TestKind) -> Self {
        Self {
            kind,
            width: 0,
            height: 0,
            values: Vec::new(),
            prev: None,
            max: 0,
            image: None,
        }
    }
}

impl HitConsumer for CompareTestCountConsumer {
    fn set_size(&mut self, width: usize, height: usize) {
        let values = std::mem::take(&mut self.values);

        // only a render of the same size can be compared
        self.prev = if self.image.is_some() && self.width == width && self.height == height {
            Some(values)
        } else {
            None
        };

        self.max = self
            .prev
            .as_ref()
            .and_then(|p| p.iter().max().copied())
            .unwrap_or(0);

        self.width = width;
        self.height = height;
        self.values = vec![0; width * height];
        self.image = Some(Image::new(width, height));
    }

    fn hit_at(&mut self, hit: &Hit, x: usize, y: usize) {
        let v = self.kind.count(hit);
        self.values[y * self.width + x] = v;
        self.max = self.max.max(v);
    }

    fn finished(&mut self) {
        info!("{} diff [max: {}]", self.kind.label(), self.max);

        let Some(image) = self.image.as_mut() else {
            return;
        };

        for (index, v) in self.values.iter().enumerate() {
            let old = self.prev.as_ref().map_or(0, |p| p[index]);
            let d = if self.max > 0 {
                (*v as f64 - old as f64) / self.max as f64
            } else {
                0.0
            };

            let color = [to_channel(d), 0, to_channel(-d)];
            image.set(index % self.width, index / self.width, color);
        }
    }
}

impl ImageChannel for CompareTestCountConsumer {
    fn name(&self) -> String {
        format!("{}_diff", self.kind.label())
    }

    fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        math::{Ray, Vec4},
        tracer::TestCounter,
    };

    use super::*;

    fn hit_with_tests(checks: u64, bbox_checks: u64) -> Hit<'static> {
        let ray = Ray::new(Vec4::ORIGIN, Vec4::Z_AXIS, 0.0, 1.0);
        Hit::new(ray, None, TestCounter::new(checks, bbox_checks), 10, 10)
    }

    fn render<C: HitConsumer>(c: &mut C, counts: &[u64]) {
        c.set_size(counts.len(), 1);
        for (x, n) in counts.iter().enumerate() {
            c.hit_at(&hit_with_tests(*n, *n), x, 0);
        }
        c.finished();
    }

    #[test]
    fn test_heat_map() {
        let mut c = TestCountConsumer::new(TestKind::Triangles);
        render(&mut c, &[2, 4, 6]);

        assert_eq!(c.range(), (2, 6));
        let img = c.image().unwrap();
        assert_eq!(img.get(0, 0), [255, 255, 255]);
        assert_eq!(img.get(1, 0), [255, 128, 128]);
        assert_eq!(img.get(2, 0), [255, 0, 0]);

        let mut c = TestCountConsumer::new(TestKind::Boxes);
        render(&mut c, &[3, 3]);
        assert_eq!(c.image().unwrap().get(1, 0), [0, 0, 0]);
        assert_eq!(c.name(), "boxes_checks");
    }

    #[test]
    fn test_diff_against_previous_render() {
        let mut c = CompareTestCountConsumer::new(TestKind::Triangles);

        // the first render is compared against zero
        render(&mut c, &[0, 10]);
        assert_eq!(c.image().unwrap().get(1, 0), [255, 0, 0]);

        render(&mut c, &[10, 5]);
        let img = c.image().unwrap();
        assert_eq!(img.get(0, 0), [255, 0, 0]);
        assert_eq!(img.get(1, 0), [0, 0, 127]);

        // a different size starts over
        render(&mut c, &[4]);
        assert_eq!(c.image().unwrap().get(0, 0), [255, 0, 0]);
    }
}
