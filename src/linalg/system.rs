//! Sparse linear (least squares) system with lockable unknowns.
//!
//! The system is filled row by row. Each unknown is either free or locked to
//! a fixed value; locked unknowns are moved to the right-hand side when their
//! row is committed, so the matrix handed to the backend only spans the free
//! unknowns. In least squares mode the normal equations `AᵀA x = Aᵀb` are
//! accumulated instead of the rows themselves.
//!
//! The construction protocol is:
//!
//! ```text
//! new(n) -> set values / lock -> begin_system
//!     (begin_row -> add_coefficient* -> set_right_hand_side? -> end_row)*
//! end_system -> solve -> read values
//! ```
//!
//! Calling the methods out of order is a programming error and panics.
//!
//! # Example
//!
//! ```
//! use unfold::linalg::{ConjugateGradientSolver, LeastSquaresSystem};
//!
//! // x0 is fixed at 1, ask for x1 = x0 and x1 = 3 in the least squares sense
//! let mut system = LeastSquaresSystem::new(2);
//! system.set_least_squares(true);
//! system.variable_mut(0).set_value(1.0);
//! system.variable_mut(0).lock();
//!
//! system.begin_system();
//! system.begin_row();
//! system.add_coefficient(1, 1.0);
//! system.add_coefficient(0, -1.0);
//! system.end_row();
//! system.begin_row();
//! system.add_coefficient(1, 1.0);
//! system.set_right_hand_side(3.0);
//! system.end_row();
//! system.end_system();
//!
//! system.solve(&ConjugateGradientSolver::default()).unwrap();
//! assert!((system.variable(1).value() - 2.0).abs() < 1e-8);
//! ```

use nalgebra::DVector;

use super::backend::LinearSolver;
use super::sparse::CsrMatrix;
use crate::error::{Result, UnfoldError};

/// One scalar unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct Variable {
    value: f64,
    locked: bool,
    /// Position among the free unknowns, assigned by `begin_system`.
    free_index: Option<usize>,
}

impl Variable {
    /// Current value (initial guess, fixed value, or solution).
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value.
    #[inline]
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Hold the variable at its current value.
    #[inline]
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Check if the variable is locked.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// A committed equation row, kept as given (locked unknowns included).
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// `(unknown, coefficient)` pairs in insertion order.
    pub coefficients: Vec<(usize, f64)>,
    /// Right-hand side before locked unknowns were moved over.
    pub rhs: f64,
}

/// Statistics of a successful solve.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Backend name.
    pub solver: &'static str,
    /// Number of free unknowns solved for.
    pub num_free: usize,
    /// Number of rows in the system.
    pub num_rows: usize,
    /// Backend iterations (zero for direct methods).
    pub iterations: usize,
    /// Relative residual reported by the backend.
    pub relative_residual: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    InSystem,
    InRow,
    Constructed,
    Solved,
}

/// Sparse linear system over `n` scalar unknowns.
#[derive(Debug, Clone)]
pub struct LeastSquaresSystem {
    variables: Vec<Variable>,
    least_squares: bool,
    state: State,
    num_free: usize,
    rows: Vec<Row>,
    current: Vec<(usize, f64)>,
    current_rhs: f64,
    /// Triplets over free unknowns: the rows themselves, or `AᵀA` in least squares mode.
    triplets: Vec<(usize, usize, f64)>,
    rhs: Vec<f64>,
    matrix: Option<CsrMatrix>,
}

impl LeastSquaresSystem {
    /// Create a system with `n` free unknowns, all valued zero.
    pub fn new(n: usize) -> Self {
        Self {
            variables: vec![Variable::default(); n],
            least_squares: false,
            state: State::Initial,
            num_free: 0,
            rows: Vec::new(),
            current: Vec::new(),
            current_rhs: 0.0,
            triplets: Vec::new(),
            rhs: Vec::new(),
            matrix: None,
        }
    }

    /// Number of unknowns.
    #[inline]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of free unknowns (valid after `begin_system`).
    #[inline]
    pub fn num_free(&self) -> usize {
        self.num_free
    }

    /// Number of committed rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Committed rows in order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Solve in the least squares sense instead of row-for-row.
    pub fn set_least_squares(&mut self, least_squares: bool) {
        assert_eq!(self.state, State::Initial, "set_least_squares after begin_system");
        self.least_squares = least_squares;
    }

    /// Access an unknown.
    #[inline]
    pub fn variable(&self, i: usize) -> &Variable {
        &self.variables[i]
    }

    /// Access an unknown mutably.
    ///
    /// Locking is only meaningful before `begin_system`.
    #[inline]
    pub fn variable_mut(&mut self, i: usize) -> &mut Variable {
        &mut self.variables[i]
    }

    /// Freeze the set of locked unknowns and start accepting rows.
    pub fn begin_system(&mut self) {
        assert_eq!(self.state, State::Initial, "begin_system called twice");

        let mut next = 0;
        for var in &mut self.variables {
            var.free_index = if var.locked {
                None
            } else {
                next += 1;
                Some(next - 1)
            };
        }
        self.num_free = next;
        self.rhs = vec![0.0; next];
        self.state = State::InSystem;
    }

    /// Start a new row.
    pub fn begin_row(&mut self) {
        assert_eq!(self.state, State::InSystem, "begin_row outside of system");
        self.current.clear();
        self.current_rhs = 0.0;
        self.state = State::InRow;
    }

    /// Add `coefficient * x[unknown]` to the current row.
    pub fn add_coefficient(&mut self, unknown: usize, coefficient: f64) {
        assert_eq!(self.state, State::InRow, "add_coefficient outside of row");
        assert!(
            unknown < self.variables.len(),
            "unknown {} out of range ({} unknowns)",
            unknown,
            self.variables.len()
        );
        self.current.push((unknown, coefficient));
    }

    /// Set the right-hand side of the current row (zero by default).
    pub fn set_right_hand_side(&mut self, rhs: f64) {
        assert_eq!(self.state, State::InRow, "set_right_hand_side outside of row");
        self.current_rhs = rhs;
    }

    /// Commit the current row.
    pub fn end_row(&mut self) {
        assert_eq!(self.state, State::InRow, "end_row without begin_row");

        // Locked unknowns become constants on the right
        let mut rhs = self.current_rhs;
        let mut free: Vec<(usize, f64)> = Vec::with_capacity(self.current.len());
        for &(unknown, a) in &self.current {
            let var = &self.variables[unknown];
            match var.free_index {
                Some(j) => free.push((j, a)),
                None => rhs -= a * var.value,
            }
        }

        if self.least_squares {
            for &(i, ai) in &free {
                for &(j, aj) in &free {
                    self.triplets.push((i, j, ai * aj));
                }
                self.rhs[i] += ai * rhs;
            }
        } else {
            let row = self.rows.len();
            for &(j, a) in &free {
                self.triplets.push((row, j, a));
            }
            if row < self.rhs.len() {
                self.rhs[row] = rhs;
            } else {
                self.rhs.push(rhs);
            }
        }

        self.rows.push(Row {
            coefficients: std::mem::take(&mut self.current),
            rhs: self.current_rhs,
        });
        self.state = State::InSystem;
    }

    /// Stop accepting rows and assemble the sparse matrix.
    pub fn end_system(&mut self) {
        assert_eq!(self.state, State::InSystem, "end_system inside a row or twice");

        let nrows = if self.least_squares {
            self.num_free
        } else {
            self.rows.len()
        };
        self.rhs.resize(nrows, 0.0);
        let triplets = std::mem::take(&mut self.triplets);
        self.matrix = Some(CsrMatrix::from_triplets(nrows, self.num_free, triplets));
        self.state = State::Constructed;
    }

    /// The assembled matrix over free unknowns (after `end_system`).
    pub fn matrix(&self) -> Option<&CsrMatrix> {
        self.matrix.as_ref()
    }

    /// Solve for the free unknowns and store the result in them.
    ///
    /// Free unknowns seed the backend with their current values. Any backend
    /// failure is reported as [`UnfoldError::CannotSolveLinearSystem`].
    pub fn solve(&mut self, solver: &dyn LinearSolver) -> Result<SolveReport> {
        assert!(
            matches!(self.state, State::Constructed | State::Solved),
            "solve before end_system"
        );
        let matrix = match &self.matrix {
            Some(m) => m,
            None => unreachable!("matrix is built by end_system"),
        };

        let num_rows = self.rows.len();
        if self.num_free == 0 {
            self.state = State::Solved;
            return Ok(SolveReport {
                solver: solver.name(),
                num_free: 0,
                num_rows,
                iterations: 0,
                relative_residual: 0.0,
            });
        }

        let b = DVector::from_column_slice(&self.rhs);
        let x0 = DVector::from_iterator(
            self.num_free,
            self.variables
                .iter()
                .filter(|v| v.free_index.is_some())
                .map(|v| v.value),
        );

        let solution = solver.solve(matrix, &b, &x0).map_err(|e| match e {
            UnfoldError::CannotSolveLinearSystem { .. } => e,
            other => UnfoldError::CannotSolveLinearSystem {
                reason: other.to_string(),
            },
        })?;

        if solution.x.iter().any(|x| !x.is_finite()) {
            return Err(UnfoldError::CannotSolveLinearSystem {
                reason: format!("{} produced non-finite values", solver.name()),
            });
        }

        for var in &mut self.variables {
            if let Some(j) = var.free_index {
                var.value = solution.x[j];
            }
        }
        self.state = State::Solved;

        Ok(SolveReport {
            solver: solver.name(),
            num_free: self.num_free,
            num_rows,
            iterations: solution.iterations,
            relative_residual: solution.relative_residual,
        })
    }

    /// Root-mean-square residual of the committed rows at the current values.
    pub fn residual(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .rows
            .iter()
            .map(|row| {
                let lhs: f64 = row
                    .coefficients
                    .iter()
                    .map(|&(i, a)| a * self.variables[i].value)
                    .sum();
                (lhs - row.rhs).powi(2)
            })
            .sum();
        (sum / self.rows.len() as f64).sqrt()
    }
}
