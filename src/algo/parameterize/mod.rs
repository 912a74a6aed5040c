//! UV parameterization algorithms.
//!
//! This module computes UV coordinates (a 2D parameterization) for triangle
//! meshes with boundary using Least Squares Conformal Maps.
//!
//! # Pieces
//!
//! - [`lscm`] / [`parameterize`]: one component, from a border half-edge
//! - [`lscm_atlas`]: every component, packed into one UV map
//! - [`BorderStrategy`]: how the (at least two) pinned vertices are chosen
//! - [`LscmParameterizer`]: the pipeline with caller-owned [`UVMap`],
//!   [`PinnedMap`] and [`VertexIndexMap`]
//! - [`conformal_energy`], [`angle_distortion`], [`flipped_faces`]: quality
//!
//! # Requirements
//!
//! Only components with a boundary (disk-like topology) can be flattened.
//! Closed meshes must first be cut to create a boundary.
//!
//! # Example
//!
//! ```no_run
//! use unfold::prelude::*;
//! use unfold::algo::parameterize::{lscm, LscmOptions};
//!
//! let mesh: HalfEdgeMesh = unfold::io::load("input.obj").unwrap();
//!
//! let uv_map = lscm(&mesh, &LscmOptions::default()).unwrap();
//!
//! for vid in mesh.vertex_ids() {
//!     let uv = uv_map.get(vid);
//!     println!("Vertex {:?}: u={:.3}, v={:.3}", vid, uv.x, uv.y);
//! }
//! ```
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

mod atlas;
mod basis;
mod border;
mod component;
mod lscm;
mod maps;
mod metrics;

pub use atlas::{lscm_atlas, Atlas, AtlasOptions, Chart, ChartStatus};
pub use basis::{project_triangle, LocalTriangle};
pub use border::{
    BorderParameterizer, BorderStrategy, CircularBorder, FarthestPairBorder, PinnedVertex,
    PinnedVerticesBorder, TwoVerticesBorder,
};
pub use component::{border_halfedge, component_vertices, connected_component, connected_components};
pub use lscm::{
    initialize_system_from_mesh_border, lscm, parameterize, setup_triangle_relations, LscmOptions,
    LscmParameterizer,
};
pub use maps::{PinnedMap, UVMap, VertexIndexMap};
pub use metrics::{angle_distortion, conformal_energy, flipped_faces};
