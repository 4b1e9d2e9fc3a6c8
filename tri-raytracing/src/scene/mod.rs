mod io;
mod io_utils;
mod meshes;

pub use io::*;

use serde::{Deserialize, Serialize};

use crate::{
    math::{AffineTransform4, BoundingBox, Triangle},
    spatial::TriangleStorage,
    Error, Result,
};

/// A flat list of world-space triangles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleSoup {
    triangles: Vec<Triangle>,
}

impl TriangleSoup {
    /// Creates a new empty soup.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    #[inline]
    pub fn push(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Appends all triangles of the other soup.
    pub fn append(&mut self, other: &TriangleSoup) {
        self.triangles.extend_from_slice(&other.triangles);
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Computes the bounding box of all triangles.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_triangles(&self.triangles)
    }

    /// Returns a copy of the soup with every triangle transformed.
    pub fn transformed(&self, transform: &AffineTransform4) -> Self {
        Self {
            triangles: self
                .triangles
                .iter()
                .map(|t| transform.transform_triangle(t))
                .collect(),
        }
    }

    /// Adds all triangles to the given storage.
    ///
    /// # Arguments
    /// * `storage` - The storage to add the triangles to. Must not be built yet.
    pub fn load_into<S: TriangleStorage + ?Sized>(&self, storage: &mut S) {
        storage.add_triangles(&self.triangles);
    }

    /// Writes the soup to the given writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the soup to.
    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()> {
        bincode::serialize_into(writer, self).map_err(|e| Error::SerializationError(Box::new(e)))
    }

    /// Reads the soup from the given reader.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the soup from.
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Self> {
        bincode::deserialize_from(reader).map_err(|e| Error::DeserializationError(Box::new(e)))
    }
}

impl From<Vec<Triangle>> for TriangleSoup {
    fn from(triangles: Vec<Triangle>) -> Self {
        Self::from_triangles(triangles)
    }
}
