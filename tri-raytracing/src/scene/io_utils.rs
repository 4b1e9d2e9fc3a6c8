use cad_import::structure::PrimitiveType;

/// How consecutive vertex indices form triangles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Assembly {
    /// Every three indices form a separate triangle.
    List,
    /// Every index forms a triangle with the first and the previous index.
    Fan,
    /// Every index forms a triangle with the two previous indices, alternating the winding.
    Strip { odd: bool },
}

/// Assembles the vertex indices of triangle primitives into index triples.
pub struct TriangleIterator<I: Iterator<Item = u32>> {
    assembly: Assembly,
    indices: I,

    /// The two indices kept from previous triangles for fans and strips.
    kept: [u32; 2],
}

impl<I: Iterator<Item = u32>> TriangleIterator<I> {
    /// Creates the iterator, or returns `None` for primitives other than triangle lists, fans
    /// and strips.
    ///
    /// # Arguments
    /// * `primitive` - The primitive type of the indices.
    /// * `indices` - The raw vertex indices.
    pub fn new(primitive: PrimitiveType, mut indices: I) -> Option<Self> {
        let assembly = match primitive {
            PrimitiveType::Triangles => Assembly::List,
            PrimitiveType::TriangleFan => Assembly::Fan,
            PrimitiveType::TriangleStrip => Assembly::Strip { odd: false },
            _ => return None,
        };

        let kept = match assembly {
            Assembly::List => [0, 0],
            _ => [
                indices.next().unwrap_or_default(),
                indices.next().unwrap_or_default(),
            ],
        };

        Some(Self {
            assembly,
            indices,
            kept,
        })
    }
}

impl<I: Iterator<Item = u32>> Iterator for TriangleIterator<I> {
    type Item = [u32; 3];

    fn next(&mut self) -> Option<Self::Item> {
        let [k0, k1] = self.kept;

        match self.assembly {
            Assembly::List => Some([
                self.indices.next()?,
                self.indices.next()?,
                self.indices.next()?,
            ]),
            Assembly::Fan => {
                let v = self.indices.next()?;
                self.kept[1] = v;

                Some([k0, k1, v])
            }
            Assembly::Strip { odd } => {
                let v = self.indices.next()?;
                self.kept = [k1, v];
                self.assembly = Assembly::Strip { odd: !odd };

                Some(if odd { [k1, k0, v] } else { [k0, k1, v] })
            }
        }
    }
}
