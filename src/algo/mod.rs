//! Mesh processing algorithms.
//!
//! - **Parameterization**: LSCM for single components and multi-chart atlases
//!
//! Algorithms are written against [`SurfaceMesh`](crate::mesh::SurfaceMesh),
//! so any mesh type implementing it can be used.

pub mod parameterize;
