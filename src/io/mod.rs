//! Reading meshes and writing parameterized results.
//!
//! Inputs come in as OBJ, STL or PLY and are picked by file extension in
//! [`load`]. The only output is an OBJ carrying one texture coordinate per
//! vertex, see [`obj::save_with_uvs`].
//!
//! | Extension | Read | Write | Faces |
//! |-----------|------|-------|-------|
//! | `.obj` | ✓ | with UVs | polygons kept |
//! | `.stl` | ✓ | | triangles, welded on position |
//! | `.ply` | ✓ | | polygons kept |
//!
//! ```no_run
//! use unfold::algo::parameterize::{lscm, LscmOptions};
//! use unfold::io::{load, obj};
//! use unfold::mesh::HalfEdgeMesh;
//!
//! let scan: HalfEdgeMesh = load("scan.stl").unwrap();
//! let uv = lscm(&scan, &LscmOptions::default()).unwrap();
//! obj::save_with_uvs(&scan, &uv, "scan_uv.obj").unwrap();
//! ```

pub mod obj;
pub mod ply;
pub mod stl;

use std::path::Path;

use crate::error::{Result, UnfoldError};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Mesh file formats understood by [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront `.obj`.
    Obj,
    /// Stereolithography `.stl`, ASCII or binary.
    Stl,
    /// Stanford `.ply`, ASCII or binary.
    Ply,
}

impl Format {
    /// Map a file extension (case-insensitive, without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "stl" => Some(Format::Stl),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Format of `path`, judged by its extension alone.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        let ext = path.as_ref().extension()?.to_str()?;
        Format::from_extension(ext)
    }
}

/// Read a mesh, dispatching on the file extension.
///
/// # Errors
///
/// [`UnfoldError::UnsupportedFormat`] for an unknown or missing extension,
/// otherwise whatever the format reader reports.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let Some(format) = Format::from_path(path) else {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("(none)");
        return Err(UnfoldError::UnsupportedFormat {
            extension: extension.to_string(),
        });
    };

    log::debug!("reading {} as {:?}", path.display(), format);
    match format {
        Format::Obj => obj::load(path),
        Format::Stl => stl::load(path),
        Format::Ply => ply::load(path),
    }
}

pub(crate) fn load_error<S: Into<String>>(path: &Path, message: S) -> UnfoldError {
    UnfoldError::LoadError {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/model.OBJ"), Some(Format::Obj));
        assert_eq!(Format::from_path("scan.stl"), Some(Format::Stl));
        assert_eq!(Format::from_path("bunny.ply"), Some(Format::Ply));
        assert_eq!(Format::from_path("scene.gltf"), None);
        assert_eq!(Format::from_path("noext"), None);
    }

    #[test]
    fn test_unsupported_format() {
        let result: Result<HalfEdgeMesh> = load("scene.fbx");
        match result {
            Err(UnfoldError::UnsupportedFormat { extension }) => assert_eq!(extension, "fbx"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }
}
