use std::io::{BufWriter, Write};

use crate::Result;

/// An RGB color with 8 bits per channel.
pub type Rgb = [u8; 3];

/// A simple RGB image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,

    /// The pixels row by row.
    pixels: Vec<Rgb>,
}

impl Image {
    /// Creates a new black image.
    ///
    /// # Arguments
    /// * `width` - The width of the image.
    /// * `height` - The height of the image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0]; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: Rgb) {
        self.pixels[y * self.width + x] = color;
    }

    /// Returns a grey color.
    #[inline]
    pub fn grey(value: u8) -> Rgb {
        [value, value, value]
    }

    /// Writes the image as ASCII PPM file.
    ///
    /// # Arguments
    /// * `writer` - The writer to which the image will be serialized.
    pub fn write_ppm<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = BufWriter::new(writer);

        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?;

        for row in self.pixels.chunks(self.width.max(1)) {
            for (index, [r, g, b]) in row.iter().enumerate() {
                if index > 0 {
                    write!(out, " ")?;
                }

                write!(out, "{} {} {}", r, g, b)?;
            }

            writeln!(out)?;
        }

        out.flush()?;

        Ok(())
    }
}

/// Converts a value in `[0, 1]` into a color channel, truncating like an integer cast.
#[inline]
pub(crate) fn to_channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_ppm() {
        let mut img = Image::new(2, 2);
        img.set(1, 0, [255, 0, 0]);
        img.set(0, 1, Image::grey(7));

        let mut buffer = Vec::new();
        img.write_ppm(&mut buffer).unwrap();

        let s = String::from_utf8(buffer).unwrap();
        assert_eq!(s, "P3\n2 2\n255\n0 0 0 255 0 0\n7 7 7 0 0 0\n");
    }

    #[test]
    fn test_to_channel() {
        assert_eq!(to_channel(0.0), 0);
        assert_eq!(to_channel(1.0), 255);
        assert_eq!(to_channel(0.5), 127);
        assert_eq!(to_channel(-3.0), 0);
        assert_eq!(to_channel(4.0), 255);
    }
}
