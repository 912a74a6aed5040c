//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation used by the
//! parameterization algorithms.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which represents a polygon mesh using
//! a half-edge (doubly-connected edge list) data structure. Algorithms access it
//! through the [`SurfaceMesh`] trait, which exposes just the connectivity
//! queries they need.
//!
//! # Index Types
//!
//! Mesh elements are identified by typed handles:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! These handles are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use unfold::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.boundary_halfedges().count(), 3);
//! ```

mod builder;
mod halfedge;
mod index;
mod traits;

pub use builder::{
    build_from_polygons, build_from_triangles, to_face_vertex, to_polygons, triangulate,
};
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, LoopIter, Vertex};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use traits::SurfaceMesh;
