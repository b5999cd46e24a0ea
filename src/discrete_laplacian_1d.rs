use crate::discrete_laplacian::{accumulate, extent};
use crate::{Boundary, StrError};
use russell_lab::{Matrix, Vector};
use russell_sparse::CooMatrix;

/// Implements the Finite Difference (FDM) Laplacian operator in 1D
///
/// ```text
///           ∂²u
///    L{u} = ———
///           ∂x²
/// ```
///
/// The operator is built with a three-point stencil on `n` points with spacing `dx = (xmax - xmin) / n`.
pub struct DiscreteLaplacian1d {
    xmin: f64,
    n: usize,
    dx: f64,
    boundary: Boundary,
}

impl DiscreteLaplacian1d {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `xmin`, `xmax` -- range along x
    /// * `n` -- number of points (≥ 1)
    /// * `boundary` -- periodic or free edges
    pub fn new(xmin: f64, xmax: f64, n: usize, boundary: Boundary) -> Result<Self, StrError> {
        if n < 1 {
            return Err("n must be ≥ 1");
        }
        let l = extent(xmin, xmax)?;
        Ok(DiscreteLaplacian1d {
            xmin,
            n,
            dx: l / (n as f64),
            boundary,
        })
    }

    /// Returns the dimension of the linear system
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Returns the grid spacing
    pub fn spacing(&self) -> f64 {
        self.dx
    }

    /// Executes a function over all grid points
    ///
    /// The callback function is `f(node, x)`
    pub fn loop_over_grid_points<F>(&self, mut callback: F)
    where
        F: FnMut(usize, f64),
    {
        for i in 0..self.n {
            callback(i, self.xmin + (i as f64) * self.dx);
        }
    }

    /// Returns the non-repeated entries (column, value) of row `i`; the diagonal comes first
    pub fn stencil(&self, i: usize) -> Vec<(usize, f64)> {
        let n = self.n;
        let c = 1.0 / (self.dx * self.dx);
        let periodic = self.boundary == Boundary::Periodic;
        let left = if i > 0 {
            Some(i - 1)
        } else if periodic {
            Some(n - 1)
        } else {
            None
        };
        let right = if i + 1 < n {
            Some(i + 1)
        } else if periodic {
            Some(0)
        } else {
            None
        };
        let mut entries = vec![(i, 0.0)];
        for j in [left, right].iter().flatten() {
            accumulate(&mut entries, *j, c);
            accumulate(&mut entries, i, -c);
        }
        entries
    }

    /// Computes the dense matrix of the operator
    pub fn as_dense(&self) -> Matrix {
        let mut aa = Matrix::new(self.n, self.n);
        for i in 0..self.n {
            for (j, value) in self.stencil(i) {
                aa.set(i, j, value);
            }
        }
        aa
    }

    /// Computes the sparse (COO) matrix of the operator
    pub fn coefficient_matrix(&self, one_based: bool) -> Result<CooMatrix, StrError> {
        let max_bandwidth = 3;
        let mut aa = CooMatrix::new(self.n, self.n, self.n * max_bandwidth, None, one_based)?;
        for i in 0..self.n {
            for (j, value) in self.stencil(i) {
                aa.put(i, j, value)?;
            }
        }
        Ok(aa)
    }

    /// Applies the operator to a field without assembling the matrix: v := L u
    pub fn apply(&self, u: &Vector) -> Result<Vector, StrError> {
        if u.dim() != self.n {
            return Err("vector u must have dim = n");
        }
        let mut v = Vector::new(self.n);
        for i in 0..self.n {
            v[i] = self.stencil(i).iter().map(|(j, value)| value * u[*j]).sum();
        }
        Ok(v)
    }
}

/// Creates the dense 1D discrete Laplacian on a segment of length l
///
/// Returns the `n × n` matrix; `pbc` selects periodic (true) or free (false) ends.
pub fn create_laplacian_1d(n: usize, l: f64, pbc: bool) -> Result<Matrix, StrError> {
    let fdm = DiscreteLaplacian1d::new(0.0, l, n, Boundary::from_pbc(pbc))?;
    Ok(fdm.as_dense())
}

/// Same as [create_laplacian_1d]
pub fn build_laplacian_1d(n: usize, l: f64, periodic: bool) -> Result<Matrix, StrError> {
    create_laplacian_1d(n, l, periodic)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
