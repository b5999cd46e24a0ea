use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_sparse::CooMatrix;

/// Specifies how the stencil is closed at the edges of the grid
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Boundary {
    /// The grid wraps around: the neighbour of the last point is the first point
    Periodic,

    /// Missing neighbours are dropped together with their diagonal share (no-flux edge)
    Free,
}

impl Boundary {
    /// Returns `Periodic` if `pbc` is true and `Free` otherwise
    pub fn from_pbc(pbc: bool) -> Self {
        if pbc {
            Boundary::Periodic
        } else {
            Boundary::Free
        }
    }
}

/// Implements the Finite Difference (FDM) Laplacian operator in 2D
///
/// ```text
///           ∂²u   ∂²u
///    L{u} = ——— + ———
///           ∂x²   ∂y²
/// ```
///
/// **Notes:**
///
/// * The operator is built with a five-point stencil.
/// * The grid has `nx` points along x with spacing `dx = (xmax - xmin) / nx`
///   (and similarly along y), thus the point `xmax` itself is not on the grid.
/// * The node of point `(i, j)` is `i * ny + j`, i.e., row-major over an `(nx, ny)` array.
/// * Every row sums to zero; hence, constant fields span the null space.
pub struct DiscreteLaplacian2d {
    xmin: f64,          // min x coordinate
    ymin: f64,          // min y coordinate
    nx: usize,          // number of points along x (≥ 1)
    ny: usize,          // number of points along y (≥ 1)
    dx: f64,            // grid spacing along x
    dy: f64,            // grid spacing along y
    boundary: Boundary, // closing of the stencil at the edges
}

impl DiscreteLaplacian2d {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `xmin`, `xmax` -- range along x
    /// * `ymin`, `ymax` -- range along y
    /// * `nx` -- number of points along x (≥ 1)
    /// * `ny` -- number of points along y (≥ 1)
    /// * `boundary` -- periodic or free edges
    pub fn new(
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        nx: usize,
        ny: usize,
        boundary: Boundary,
    ) -> Result<Self, StrError> {
        if nx < 1 {
            return Err("nx must be ≥ 1");
        }
        if ny < 1 {
            return Err("ny must be ≥ 1");
        }
        let lx = extent(xmin, xmax)?;
        let ly = extent(ymin, ymax)?;
        Ok(DiscreteLaplacian2d {
            xmin,
            ymin,
            nx,
            ny,
            dx: lx / (nx as f64),
            dy: ly / (ny as f64),
            boundary,
        })
    }

    /// Returns the dimension of the linear system (nx * ny)
    pub fn dim(&self) -> usize {
        self.nx * self.ny
    }

    /// Returns the number of points along x
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Returns the number of points along y
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Returns the grid spacings (dx, dy)
    pub fn spacing(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    /// Returns the boundary treatment
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Returns the node (equation) number of grid point (i, j)
    pub fn node(&self, i: usize, j: usize) -> usize {
        i * self.ny + j
    }

    /// Returns the grid indices (i, j) of a node
    pub fn grid_indices(&self, node: usize) -> (usize, usize) {
        (node / self.ny, node % self.ny)
    }

    /// Executes a function over all grid points
    ///
    /// The callback function is `f(node, x, y)`
    pub fn loop_over_grid_points<F>(&self, mut callback: F)
    where
        F: FnMut(usize, f64, f64),
    {
        for i in 0..self.nx {
            let x = self.xmin + (i as f64) * self.dx;
            for j in 0..self.ny {
                let y = self.ymin + (j as f64) * self.dy;
                callback(self.node(i, j), x, y);
            }
        }
    }

    /// Returns the neighbours of a node (west, east, south, north) and their coefficients
    ///
    /// Missing neighbours (free edges) are `None`. With periodic edges and a single
    /// point along some direction, the neighbour along that direction is the node itself.
    fn neighbours(&self, node: usize) -> [Option<(usize, f64)>; 4] {
        let (i, j) = self.grid_indices(node);
        let (nx, ny) = (self.nx, self.ny);
        let cx = 1.0 / (self.dx * self.dx);
        let cy = 1.0 / (self.dy * self.dy);
        let periodic = self.boundary == Boundary::Periodic;
        let west = if i > 0 {
            Some(node - ny)
        } else if periodic {
            Some(node + (nx - 1) * ny)
        } else {
            None
        };
        let east = if i + 1 < nx {
            Some(node + ny)
        } else if periodic {
            Some(node - (nx - 1) * ny)
        } else {
            None
        };
        let south = if j > 0 {
            Some(node - 1)
        } else if periodic {
            Some(node + ny - 1)
        } else {
            None
        };
        let north = if j + 1 < ny {
            Some(node + 1)
        } else if periodic {
            Some(node + 1 - ny)
        } else {
            None
        };
        [
            west.map(|n| (n, cx)),
            east.map(|n| (n, cx)),
            south.map(|n| (n, cy)),
            north.map(|n| (n, cy)),
        ]
    }

    /// Returns the non-repeated entries (column, value) of the row corresponding to `node`
    ///
    /// The first entry is always the diagonal. Coinciding neighbours are summed and a
    /// neighbour equal to the node itself cancels its own diagonal share.
    pub fn stencil(&self, node: usize) -> Vec<(usize, f64)> {
        let mut entries = vec![(node, 0.0)];
        for (col, coefficient) in self.neighbours(node).iter().flatten() {
            accumulate(&mut entries, *col, *coefficient);
            accumulate(&mut entries, node, -coefficient);
        }
        entries
    }

    /// Computes the dense matrix of the operator
    pub fn as_dense(&self) -> Matrix {
        let dim = self.dim();
        let mut aa = Matrix::new(dim, dim);
        for i in 0..dim {
            for (j, value) in self.stencil(i) {
                aa.set(i, j, value);
            }
        }
        aa
    }

    /// Computes the sparse (COO) matrix of the operator
    pub fn coefficient_matrix(&self, one_based: bool) -> Result<CooMatrix, StrError> {
        let dim = self.dim();
        let max_bandwidth = 5;
        let mut aa = CooMatrix::new(dim, dim, dim * max_bandwidth, None, one_based)?;
        for i in 0..dim {
            for (j, value) in self.stencil(i) {
                aa.put(i, j, value)?;
            }
        }
        Ok(aa)
    }

    /// Computes the sparse (COO) matrix with the potential at `reference` pinned to zero
    ///
    /// The row and column of `reference` are removed and a one is put on the diagonal.
    /// Since constant fields span the null space, the resulting matrix is non-singular.
    pub fn grounded_coefficient_matrix(&self, reference: usize, one_based: bool) -> Result<CooMatrix, StrError> {
        let dim = self.dim();
        if reference >= dim {
            return Err("reference node must be smaller than dim");
        }
        let max_bandwidth = 5;
        let max_nnz = dim * max_bandwidth + 1; // the last +1 corresponds to the 1 put on the diagonal
        let mut aa = CooMatrix::new(dim, dim, max_nnz, None, one_based)?;
        for i in 0..dim {
            if i == reference {
                continue;
            }
            for (j, value) in self.stencil(i) {
                if j != reference {
                    aa.put(i, j, value)?;
                }
            }
        }
        aa.put(reference, reference, 1.0)?;
        Ok(aa)
    }

    /// Applies the operator to a field without assembling the matrix: v := L u
    pub fn apply(&self, u: &Vector) -> Result<Vector, StrError> {
        let dim = self.dim();
        if u.dim() != dim {
            return Err("vector u must have dim = nx * ny");
        }
        let mut v = Vector::new(dim);
        for i in 0..dim {
            v[i] = self.stencil(i).iter().map(|(j, value)| value * u[*j]).sum();
        }
        Ok(v)
    }
}

/// Creates the dense 2D discrete Laplacian on a grid with extents lx × ly
///
/// # Input
///
/// * `nx`, `ny` -- number of points along x and y (≥ 1)
/// * `lx`, `ly` -- extents of the domain (> 0)
/// * `pbc` -- periodic boundary conditions if true; free (no-flux) edges otherwise
///
/// # Output
///
/// Returns the `(nx * ny) × (nx * ny)` matrix with node `i * ny + j` for point (i, j).
pub fn create_laplacian_2d(nx: usize, ny: usize, lx: f64, ly: f64, pbc: bool) -> Result<Matrix, StrError> {
    let fdm = DiscreteLaplacian2d::new(0.0, lx, 0.0, ly, nx, ny, Boundary::from_pbc(pbc))?;
    Ok(fdm.as_dense())
}

/// Same as [create_laplacian_2d]
pub fn build_laplacian_2d(nx: usize, ny: usize, lx: f64, ly: f64, periodic: bool) -> Result<Matrix, StrError> {
    create_laplacian_2d(nx, ny, lx, ly, periodic)
}

/// Returns the length of the range [min, max), which must be finite and positive
pub(crate) fn extent(min: f64, max: f64) -> Result<f64, StrError> {
    if !min.is_finite() || !max.is_finite() {
        return Err("the range of coordinates must be finite");
    }
    let length = max - min;
    if length <= 0.0 {
        return Err("the length of the domain must be positive");
    }
    Ok(length)
}

/// Adds a value to the entry with column `col`, pushing a new entry if needed
pub(crate) fn accumulate(entries: &mut Vec<(usize, f64)>, col: usize, value: f64) {
    match entries.iter_mut().find(|(j, _)| *j == col) {
        Some(entry) => entry.1 += value,
        None => entries.push((col, value)),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
