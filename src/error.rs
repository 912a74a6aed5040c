//! Error types for unfold.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`UnfoldError`].
pub type Result<T> = std::result::Result<T, UnfoldError>;

/// Errors that can occur while building meshes or computing parameterizations.
#[derive(Error, Debug)]
pub enum UnfoldError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// The mesh (or the requested component) has no boundary.
    #[error("mesh has no boundary; cut it into a disk before parameterizing")]
    NoBoundary,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has repeated vertex indices or fewer than three corners.
    #[error("face {face} is degenerate (has duplicate or too few vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A directed edge is used by more than one face.
    #[error("edge ({v0}, {v1}) has more than two incident faces or inconsistent orientation")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// A vertex joins two separate border fans (a "bowtie"), so the holes
    /// around it cannot be told apart.
    #[error("vertex {vertex} is non-manifold: it lies on more than one border fan")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// An operation that needs triangles met a larger face.
    #[error("face {face} has {corners} corners, expected a triangle")]
    NotATriangle {
        /// The face index.
        face: usize,
        /// Number of corners of the face.
        corners: usize,
    },

    /// The boundary pinning strategy could not fix enough vertices.
    #[error("border parameterization failed: {reason}")]
    BorderParameterization {
        /// Why the strategy gave up.
        reason: String,
    },

    /// The sparse least squares system could not be solved.
    #[error("cannot solve linear system: {reason}")]
    CannotSolveLinearSystem {
        /// Backend-specific failure description.
        reason: String,
    },

    /// A face could not be turned into LSCM equations.
    #[error("cannot set up relations for face {face}: {reason}")]
    TriangleSetup {
        /// The face index.
        face: usize,
        /// Why the face was rejected.
        reason: String,
    },

    /// A vertex that takes part in the system has no entry in the index map.
    #[error("vertex {vertex} has no index in the vertex index map")]
    MissingVertexIndex {
        /// The vertex index.
        vertex: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// An iterative solver ran out of iterations.
    #[error("solver failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl UnfoldError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        UnfoldError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a border parameterization error.
    pub fn border<S: Into<String>>(reason: S) -> Self {
        UnfoldError::BorderParameterization {
            reason: reason.into(),
        }
    }

    /// Returns true for the failures the LSCM pipeline itself reports
    /// (border pinning, solving, per-triangle setup).
    pub fn is_parameterization_failure(&self) -> bool {
        matches!(
            self,
            UnfoldError::BorderParameterization { .. }
                | UnfoldError::CannotSolveLinearSystem { .. }
                | UnfoldError::TriangleSetup { .. }
        )
    }
}
