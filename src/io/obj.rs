//! Wavefront OBJ format support.
//!
//! Only geometry is read: `v` positions and `f` faces. Texture and normal
//! references in face tokens (`v/vt/vn`) are accepted and ignored, as are all
//! other statements. Polygon faces are kept as polygons.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use super::load_error;
use crate::algo::parameterize::UVMap;
use crate::error::{Result, UnfoldError};
use crate::mesh::{build_from_polygons, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use unfold::io::obj;
/// use unfold::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let coords: Vec<f64> = tokens
                    .take(3)
                    .map(|t| t.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| load_error(path, format!("line {}: {}", line_no + 1, e)))?;
                if coords.len() != 3 {
                    return Err(load_error(
                        path,
                        format!("line {}: vertex needs 3 coordinates", line_no + 1),
                    ));
                }
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let face = tokens
                    .map(|t| parse_face_index(t, vertices.len()))
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| {
                        load_error(path, format!("line {}: bad face index", line_no + 1))
                    })?;
                faces.push(face);
            }
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err(load_error(path, "OBJ file contains no faces"));
    }

    build_from_polygons(&vertices, &faces)
}

/// Resolve one face token to a 0-based vertex index.
///
/// OBJ indices are 1-based; negative values count back from the last vertex
/// read so far.
fn parse_face_index(token: &str, num_vertices: usize) -> Option<usize> {
    let index: i64 = token.split('/').next()?.parse().ok()?;
    match index {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => num_vertices.checked_sub(i.unsigned_abs() as usize),
    }
}

/// Save a mesh with one texture coordinate per vertex.
///
/// Writes `v` and `vt` lines in vertex order and faces as `f v/vt ...`, so
/// every vertex uses the texture coordinate of the same index.
///
/// # Example
///
/// ```no_run
/// use unfold::algo::parameterize::{lscm, LscmOptions};
/// use unfold::io::obj;
/// use unfold::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("patch.obj").unwrap();
/// let uv = lscm(&mesh, &LscmOptions::default()).unwrap();
/// obj::save_with_uvs(&mesh, &uv, "patch_uv.obj").unwrap();
/// ```
pub fn save_with_uvs<P: AsRef<Path>, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    uv: &UVMap<I>,
    path: P,
) -> Result<()> {
    if uv.len() != mesh.num_vertices() {
        return Err(UnfoldError::invalid_param(
            "uv",
            uv.len(),
            "UV map size must match the vertex count",
        ));
    }

    let mut writer = BufWriter::new(File::create(path.as_ref())?);

    writeln!(writer, "# unfold")?;
    for v in mesh.vertex_ids() {
        let p = mesh.position(v);
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for v in mesh.vertex_ids() {
        let t = uv.get(v);
        writeln!(writer, "vt {} {}", t.x, t.y)?;
    }
    for f in mesh.face_ids() {
        write!(writer, "f")?;
        for v in mesh.face_vertices(f) {
            let i = v.index() + 1;
            write!(writer, " {}/{}", i, i)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}
