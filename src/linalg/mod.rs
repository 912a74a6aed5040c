//! Sparse linear algebra for the parameterization solvers.
//!
//! - [`CsrMatrix`] and [`conjugate_gradient`] for sparse SPD systems
//! - [`LeastSquaresSystem`] for building systems row by row with locked unknowns
//! - [`LinearSolver`] backends chosen at runtime

mod backend;
mod sparse;
mod system;

pub use backend::{ConjugateGradientSolver, DenseSvdSolver, LinearSolver, Solution};
pub use sparse::{conjugate_gradient, CgOutcome, CsrMatrix};
pub use system::{LeastSquaresSystem, Row, SolveReport, Variable};
