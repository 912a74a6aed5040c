//! Pluggable solver backends.
//!
//! [`LeastSquaresSystem::solve`](super::LeastSquaresSystem::solve) hands the
//! assembled matrix to a [`LinearSolver`] chosen at runtime, so callers can
//! trade an iterative sparse solve for a dense decomposition that detects rank
//! deficiency.

use std::fmt::Debug;

use nalgebra::DVector;

use super::sparse::{conjugate_gradient, CsrMatrix};
use crate::error::{Result, UnfoldError};

/// Result of a backend solve.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Values of the free unknowns.
    pub x: DVector<f64>,
    /// Iterations used (zero for direct methods).
    pub iterations: usize,
    /// Relative residual of the solved system.
    pub relative_residual: f64,
}

/// A strategy for solving `A x = b`.
pub trait LinearSolver: Debug + Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Solve `a * x = b`, starting from `x0` if the method is iterative.
    fn solve(&self, a: &CsrMatrix, b: &DVector<f64>, x0: &DVector<f64>) -> Result<Solution>;
}

/// Sparse conjugate gradient on the normal equations.
///
/// Needs a symmetric positive definite matrix, which is what a least squares
/// system with enough locked unknowns produces.
#[derive(Debug, Clone)]
pub struct ConjugateGradientSolver {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Relative residual at which to stop.
    pub tolerance: f64,
    /// Use a Jacobi (diagonal) preconditioner.
    pub preconditioned: bool,
}

impl Default for ConjugateGradientSolver {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-10,
            preconditioned: true,
        }
    }
}

impl ConjugateGradientSolver {
    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable or disable the Jacobi preconditioner.
    pub fn with_preconditioner(mut self, preconditioned: bool) -> Self {
        self.preconditioned = preconditioned;
        self
    }
}

impl LinearSolver for ConjugateGradientSolver {
    fn name(&self) -> &'static str {
        if self.preconditioned {
            "jacobi-cg"
        } else {
            "cg"
        }
    }

    fn solve(&self, a: &CsrMatrix, b: &DVector<f64>, x0: &DVector<f64>) -> Result<Solution> {
        if !(self.tolerance > 0.0) {
            return Err(UnfoldError::invalid_param(
                "tolerance",
                self.tolerance,
                "must be positive",
            ));
        }
        let out = conjugate_gradient(
            a,
            b,
            Some(x0),
            self.max_iterations,
            self.tolerance,
            self.preconditioned,
        )?;
        Ok(Solution {
            x: out.x,
            iterations: out.iterations,
            relative_residual: out.relative_residual,
        })
    }
}

/// Dense SVD solve.
///
/// Expands the matrix and decomposes it, so it only suits small systems, but
/// it reports rank deficiency instead of returning one arbitrary member of a
/// family of solutions.
#[derive(Debug, Clone)]
pub struct DenseSvdSolver {
    /// Singular values below `rank_tolerance * σ_max` count as zero.
    pub rank_tolerance: f64,
}

impl Default for DenseSvdSolver {
    fn default() -> Self {
        Self {
            rank_tolerance: 1e-10,
        }
    }
}

impl DenseSvdSolver {
    /// Set the relative threshold for zero singular values.
    pub fn with_rank_tolerance(mut self, rank_tolerance: f64) -> Self {
        self.rank_tolerance = rank_tolerance;
        self
    }
}

impl LinearSolver for DenseSvdSolver {
    fn name(&self) -> &'static str {
        "dense-svd"
    }

    fn solve(&self, a: &CsrMatrix, b: &DVector<f64>, _x0: &DVector<f64>) -> Result<Solution> {
        let dense = a.to_dense();
        let svd = dense.clone().svd(true, true);

        let sigma_max = svd.singular_values.max();
        let threshold = self.rank_tolerance * sigma_max;
        let rank = svd.singular_values.iter().filter(|&&s| s > threshold).count();
        if sigma_max <= 0.0 || rank < a.ncols() {
            return Err(UnfoldError::CannotSolveLinearSystem {
                reason: format!("matrix is rank deficient (rank {} of {})", rank, a.ncols()),
            });
        }

        let x = svd
            .solve(b, threshold)
            .map_err(|e| UnfoldError::CannotSolveLinearSystem {
                reason: e.to_string(),
            })?;

        let b_norm = b.norm();
        let relative_residual = if b_norm > 0.0 {
            (&dense * &x - b).norm() / b_norm
        } else {
            0.0
        };

        Ok(Solution {
            x,
            iterations: 0,
            relative_residual,
        })
    }
}
