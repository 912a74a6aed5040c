//! STL (stereolithography) format support.
//!
//! Both binary and ASCII files are read. STL carries no connectivity, so
//! corners are welded on exact position; `stl_io` does this while indexing.

use std::fs::File;
use std::path::Path;

use nalgebra::Point3;

use super::load_error;
use crate::error::Result;
use crate::mesh::{build_from_triangles, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an STL file.
///
/// Triangles that collapse to an edge or a point after welding are dropped.
///
/// # Example
///
/// ```no_run
/// use unfold::io::stl;
/// use unfold::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| load_error(path, e.to_string()))?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices)
        .filter(|&[a, b, c]| a != b && b != c && a != c)
        .collect();

    let dropped = stl.faces.len() - faces.len();
    if dropped > 0 {
        log::warn!("{}: dropped {} degenerate triangles", path.display(), dropped);
    }

    if faces.is_empty() {
        return Err(load_error(path, "STL file contains no valid triangles"));
    }

    build_from_triangles(&vertices, &faces)
}
