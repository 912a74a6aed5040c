//! # Unfold
//!
//! Least Squares Conformal Maps for triangle meshes.
//!
//! Unfold flattens a 3D surface with boundary into the plane, computing one
//! (u, v) coordinate per vertex that locally preserves angles. It is built on
//! a half-edge mesh, a small sparse least-squares solver, and pluggable
//! boundary pinning strategies.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **LSCM**: one component from a border half-edge, or a whole mesh as an atlas
//! - **Runtime solver choice**: Jacobi-preconditioned CG or dense SVD
//! - **File formats**: OBJ (load, save with UVs), STL and PLY (load)
//!
//! ## Quick Start
//!
//! ```no_run
//! use unfold::prelude::*;
//!
//! let mesh: HalfEdgeMesh = unfold::io::load("patch.obj").unwrap();
//! let uv = lscm(&mesh, &LscmOptions::default()).unwrap();
//!
//! println!("UV area: {}", uv.total_area(&mesh));
//! unfold::io::obj::save_with_uvs(&mesh, &uv, "patch_uv.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use unfold::prelude::*;
//! use nalgebra::Point3;
//!
//! // A square made of two triangles
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! let uv = lscm(&mesh, &LscmOptions::default()).unwrap();
//!
//! // A flat square maps onto itself up to a similarity
//! let (min, max) = uv.bounding_box().unwrap();
//! assert!((max.x - min.x - 1.0).abs() < 1e-6);
//! assert!((max.y - min.y - 1.0).abs() < 1e-6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod linalg;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use unfold::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::parameterize::{
        lscm, lscm_atlas, parameterize, AtlasOptions, BorderStrategy, LscmOptions, UVMap,
    };
    pub use crate::error::{Result, UnfoldError};
    pub use crate::linalg::{ConjugateGradientSolver, DenseSvdSolver, LinearSolver};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex,
        SurfaceMesh, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
