use std::{collections::HashMap, path::Path};

use cad_import::{
    loader::Manager,
    structure::{CADData, IndexData, Node, Point3D, Shape},
    ID,
};
use log::{debug, error};

use crate::{
    math::{AffineTransform4, Triangle, Vec4},
    Error, Result,
};

use super::{io_utils::TriangleIterator, TriangleSoup};

/// Tries to load the CAD file from the given path and appends its triangles in world space.
///
/// # Arguments
/// * `soup` - The soup to load the triangles into.
/// * `path` - The path to load the CAD file from.
pub fn load_into_soup<P: AsRef<Path>>(soup: &mut TriangleSoup, path: P) -> Result<()> {
    let cad_data = load_cad_data(path.as_ref())?;
    add_cad_data_to_soup(soup, &cad_data);

    Ok(())
}

/// Tries to load the cad data from the given path
///
/// # Arguments
/// * `file_path` - The path to load the CAD data from.
fn load_cad_data(file_path: &Path) -> Result<CADData> {
    let manager = Manager::new();

    let mime_types = determine_mime_types(&manager, file_path)?;

    for mime_type in mime_types.iter() {
        if let Some(loader) = manager.get_loader_by_mime_type(mime_type.as_str()) {
            let cad_data = loader
                .read_file(file_path, mime_type)
                .map_err(Error::CadImport)?;

            return Ok(cad_data);
        }
    }

    error!("Cannot find loader for the input file {:?}", file_path);
    Err(Error::NoLoaderFound)
}

/// Tries to find the mime types for the given file based on the file extension.
///
/// # Arguments
/// * `input_file` - The input file whose extension will be used
pub fn determine_mime_types(manager: &Manager, input_file: &Path) -> Result<Vec<String>> {
    match input_file.extension() {
        Some(ext) => match ext.to_str() {
            Some(ext) => Ok(manager.get_mime_types_for_extension(ext)),
            None => Err(Error::InvalidFileExtension),
        },
        None => Err(Error::InvalidFileExtension),
    }
}

/// Adds the triangles of the CAD data to the soup by traversing over the node structure.
///
/// # Arguments
/// * `soup` - The soup to which the triangles will be added.
/// * `cad_data` - The CAD data to convert.
pub fn add_cad_data_to_soup(soup: &mut TriangleSoup, cad_data: &CADData) {
    let root_node = cad_data.get_root_node();
    let traversal_context = TraversalContext::new(root_node);
    let mut traversal_data = TraversalData::new();

    traverse(soup, root_node, traversal_context, &mut traversal_data);

    debug!(
        "Converted {} distinct shapes, soup has {} triangles",
        traversal_data.shape_map.len(),
        soup.len()
    );
}

/// Internal function for traversing over the node structure and transforming all shapes into
/// world space.
///
/// # Arguments
/// * `soup` - The soup to which the triangles will be added.
/// * `node` - The currently visited node.
/// * `traversal_context` - Additional information used during traversal.
/// * `traversal_data` - Additional data used during traversal.
fn traverse(
    soup: &mut TriangleSoup,
    node: &Node,
    traversal_context: TraversalContext,
    traversal_data: &mut TraversalData,
) {
    let transform = &traversal_context.transform;

    // instantiate the shapes referenced by the current node
    let shapes: &[std::rc::Rc<Shape>] = node.get_shapes();
    for shape in shapes {
        let local = get_or_create_triangles(shape, traversal_data);

        for t in local.iter() {
            soup.push(transform.transform_triangle(t));
        }
    }

    for child in node.get_children().iter() {
        let child_traversal_context = traversal_context.derive(child);

        traverse(soup, child, child_traversal_context, traversal_data);
    }
}

/// Returns the local triangles of the given shape, which are converted only once per shape.
///
/// # Arguments
/// * `shape` - The shape for which to get the triangles.
/// * `traversal_data` - Additional data used during traversal.
fn get_or_create_triangles<'d>(
    shape: &Shape,
    traversal_data: &'d mut TraversalData,
) -> &'d [Triangle] {
    traversal_data
        .shape_map
        .entry(shape.get_id())
        .or_insert_with(|| create_triangles_from_shape(shape))
}

/// Creates the triangles of the given shape in its local coordinate system.
///
/// # Arguments
/// * `shape` - The shape to create the triangles from.
fn create_triangles_from_shape(shape: &Shape) -> Vec<Triangle> {
    let mut triangles = Vec::new();

    for part in shape.get_parts() {
        let in_mesh = part.get_mesh();
        let positions = in_mesh.get_vertices().get_positions().as_slice();
        let in_primitive_data = in_mesh.get_primitives();
        let primitive_type = in_primitive_data.get_primitive_type();

        match in_primitive_data.get_raw_index_data() {
            IndexData::Indices(indices) => {
                match TriangleIterator::new(primitive_type, indices.iter().copied()) {
                    Some(it) => append_triangles(&mut triangles, positions, it),
                    None => debug!("Primitive type {:?} is not triangle", primitive_type),
                }
            }
            IndexData::NonIndexed(n) => {
                match TriangleIterator::new(primitive_type, 0..(*n as u32)) {
                    Some(it) => append_triangles(&mut triangles, positions, it),
                    None => debug!("Primitive type {:?} is not triangle", primitive_type),
                }
            }
        }
    }

    triangles
}

/// Appends the triangles given by vertex indices. Triangles referencing missing vertices are
/// skipped.
///
/// # Arguments
/// * `triangles` - The triangles to append to.
/// * `pos` - The positions of the vertices.
/// * `indices` - The vertex indices of the triangles.
fn append_triangles<I>(
    triangles: &mut Vec<Triangle>,
    pos: &[Point3D],
    indices: TriangleIterator<I>,
) where
    I: Iterator<Item = u32>,
{
    let to_point = |i: u32| {
        pos.get(i as usize).map(|p| {
            let s = p.0.as_slice();
            Vec4::point(s[0] as f64, s[1] as f64, s[2] as f64)
        })
    };

    let mut num_skipped = 0;
    for [i0, i1, i2] in indices {
        match (to_point(i0), to_point(i1), to_point(i2)) {
            (Some(a), Some(b), Some(c)) => triangles.push(Triangle::new(a, b, c)),
            _ => num_skipped += 1,
        }
    }

    if num_skipped > 0 {
        error!("Skipped {} triangles with invalid vertex indices", num_skipped);
    }
}

/// Contextual data used during traversing the node data.
#[derive(Clone)]
struct TraversalContext {
    /// The current transformation into world space
    transform: AffineTransform4,
}

impl TraversalContext {
    /// Returns a new traversal context for the root node.
    pub fn new(root_node: &Node) -> Self {
        let transform = match root_node.get_transform() {
            Some(t) => to_affine_transform(t.as_slice()),
            None => AffineTransform4::identity(),
        };

        Self { transform }
    }

    /// Returns a new traversal context by visiting the given node.
    ///
    /// # Arguments
    /// * `node` - The node to visit based on the current traversal context
    pub fn derive(&self, node: &Node) -> Self {
        let mut result = self.clone();

        if let Some(t) = node.get_transform() {
            result.transform = result
                .transform
                .concatenate(&to_affine_transform(t.as_slice()));
        }

        result
    }
}

/// Converts a column-major single precision matrix.
fn to_affine_transform(values: &[f32]) -> AffineTransform4 {
    let values: Vec<f64> = values.iter().map(|v| *v as f64).collect();
    AffineTransform4::from_column_slice(&values)
}

struct TraversalData {
    /// The local triangles per shape
    pub shape_map: HashMap<ID, Vec<Triangle>>,
}

impl TraversalData {
    pub fn new() -> Self {
        Self {
            shape_map: HashMap::new(),
        }
    }
}
