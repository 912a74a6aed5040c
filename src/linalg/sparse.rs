//! Compressed sparse row matrices and a (preconditioned) conjugate gradient solver.

use nalgebra::{DMatrix, DVector};

use crate::error::{Result, UnfoldError};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` is the slice of row `i` in `col_idx`/`values`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed. The sort is stable,
    /// so duplicates are accumulated in insertion order and the result is
    /// bit-for-bit reproducible.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            debug_assert!(row < rows && col < cols, "triplet ({}, {}) out of bounds", row, col);
            if last == Some((row, col)) {
                if let Some(acc) = values.last_mut() {
                    *acc += val;
                }
            } else {
                col_idx.push(col);
                values.push(val);
                row_ptr[row + 1] += 1;
                last = Some((row, col));
            }
        }

        // Per-row counts -> offsets
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Check if the matrix is square.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Iterate over the stored `(col, value)` pairs of a row.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Get the entry at (row, col), zero if not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.row(row)
            .find(|&(c, _)| c == col)
            .map_or(0.0, |(_, v)| v)
    }

    /// Main diagonal (zeros where nothing is stored).
    pub fn diagonal(&self) -> DVector<f64> {
        let n = self.rows.min(self.cols);
        DVector::from_iterator(n, (0..n).map(|i| self.get(i, i)))
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        DVector::from_iterator(
            self.rows,
            (0..self.rows).map(|i| self.row(i).map(|(c, v)| v * x[c]).sum::<f64>()),
        )
    }

    /// Expand into a dense matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for (c, v) in self.row(i) {
                m[(i, c)] += v;
            }
        }
        m
    }
}

/// Outcome of an iterative solve.
#[derive(Debug, Clone)]
pub struct CgOutcome {
    /// The solution vector.
    pub x: DVector<f64>,
    /// Iterations performed.
    pub iterations: usize,
    /// Final relative residual ‖b − Ax‖ / ‖b‖.
    pub relative_residual: f64,
}

/// Solve A*x = b using the (Jacobi-preconditioned) Conjugate Gradient method.
///
/// Requires A to be symmetric positive definite.
///
/// # Arguments
///
/// * `a` - The system matrix (must be symmetric positive definite)
/// * `b` - The right-hand side vector
/// * `x0` - Optional initial guess (zeros if None)
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance (relative residual norm)
/// * `jacobi` - Scale the residual by the inverse diagonal of A
///
/// # Errors
///
/// [`UnfoldError::ConvergenceFailed`] if the tolerance is not reached, or if
/// a search direction with zero curvature shows the matrix is singular.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: Option<&DVector<f64>>,
    max_iter: usize,
    tolerance: f64,
    jacobi: bool,
) -> Result<CgOutcome> {
    let n = b.len();
    if !a.is_square() || a.nrows() != n {
        return Err(UnfoldError::invalid_param(
            "matrix",
            format!("{}x{} with rhs of length {}", a.nrows(), a.ncols(), n),
            "conjugate gradient needs a square system",
        ));
    }

    // A x = 0 with A SPD has only the trivial solution
    let b_norm = b.norm();
    if b_norm < 1e-15 {
        return Ok(CgOutcome {
            x: DVector::zeros(n),
            iterations: 0,
            relative_residual: 0.0,
        });
    }

    let inv_diag = jacobi.then(|| {
        a.diagonal()
            .map(|d| if d > 0.0 { 1.0 / d } else { 1.0 })
    });
    let precondition = |r: &DVector<f64>| match &inv_diag {
        Some(m) => r.component_mul(m),
        None => r.clone(),
    };

    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => DVector::zeros(n),
    };

    let mut r = b - a.mul_vec(&x);
    let mut rel = r.norm() / b_norm;
    if rel < tolerance {
        return Ok(CgOutcome {
            x,
            iterations: 0,
            relative_residual: rel,
        });
    }

    let mut z = precondition(&r);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iter in 0..max_iter {
        let ap = a.mul_vec(&p);

        let p_ap = p.dot(&ap);
        if p_ap.abs() < 1e-300 {
            // Zero curvature: singular along p
            log::trace!("cg: zero curvature at iteration {}", iter);
            break;
        }
        let alpha = rz / p_ap;

        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        rel = r.norm() / b_norm;
        if rel < tolerance {
            log::trace!("cg: converged in {} iterations (residual {:.3e})", iter + 1, rel);
            return Ok(CgOutcome {
                x,
                iterations: iter + 1,
                relative_residual: rel,
            });
        }

        z = precondition(&r);
        let rz_new = r.dot(&z);
        let beta = rz_new / rz;
        p = &z + beta * &p;
        rz = rz_new;
    }

    log::trace!("cg: stopped with residual {:.3e}", rel);
    Err(UnfoldError::ConvergenceFailed {
        iterations: max_iter,
    })
}
