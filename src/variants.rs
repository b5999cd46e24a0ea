use crate::discrete_laplacian::extent;
use crate::{create_laplacian_2d, Boundary, DiscreteLaplacian1d, DiscreteLaplacian2d, StrError};
use russell_lab::Matrix;

/// Defines the signature of a 2D Laplacian builder: `(nx, ny, lx, ly, pbc) -> L`
pub type LaplacianBuilder = fn(usize, usize, f64, f64, bool) -> Result<Matrix, StrError>;

/// Holds an independently implemented realization of the 2D Laplacian builder
pub struct LaplacianVariant {
    /// Name used when reporting results
    pub name: &'static str,

    /// The builder function
    pub build: LaplacianBuilder,
}

/// Lists all builders that must agree with each other
pub static VARIANTS: [LaplacianVariant; 4] = [
    LaplacianVariant {
        name: "reference",
        build: create_laplacian_2d,
    },
    LaplacianVariant {
        name: "stencil",
        build: laplacian_2d_stencil,
    },
    LaplacianVariant {
        name: "kronecker",
        build: laplacian_2d_kronecker,
    },
    LaplacianVariant {
        name: "sparse",
        build: laplacian_2d_sparse,
    },
];

/// Finds a variant in [VARIANTS] by name
pub fn find_variant(name: &str) -> Option<&'static LaplacianVariant> {
    VARIANTS.iter().find(|v| v.name == name)
}

/// Assembles the dense matrix point-by-point with modular index arithmetic
///
/// Every row starts with the textbook diagonal `-2/dx² - 2/dy²`; with free edges,
/// a missing neighbour gives its coefficient back to the diagonal.
pub fn laplacian_2d_stencil(nx: usize, ny: usize, lx: f64, ly: f64, pbc: bool) -> Result<Matrix, StrError> {
    check_counts(nx, ny)?;
    let cx = f64::powi(nx as f64 / extent(0.0, lx)?, 2);
    let cy = f64::powi(ny as f64 / extent(0.0, ly)?, 2);
    let dim = nx * ny;
    let mut aa = Matrix::new(dim, dim);
    for i in 0..nx {
        for j in 0..ny {
            let p = i * ny + j;
            add_to(&mut aa, p, p, -2.0 * cx - 2.0 * cy);
            let couplings = [
                ((i + nx - 1) % nx, j, i > 0, cx),
                ((i + 1) % nx, j, i + 1 < nx, cx),
                (i, (j + ny - 1) % ny, j > 0, cy),
                (i, (j + 1) % ny, j + 1 < ny, cy),
            ];
            for (k, l, interior, c) in couplings {
                if interior || pbc {
                    add_to(&mut aa, p, k * ny + l, c);
                } else {
                    add_to(&mut aa, p, p, c);
                }
            }
        }
    }
    Ok(aa)
}

/// Assembles the dense matrix as `Lx ⊗ Iy + Ix ⊗ Ly` from the 1D operators
pub fn laplacian_2d_kronecker(nx: usize, ny: usize, lx: f64, ly: f64, pbc: bool) -> Result<Matrix, StrError> {
    check_counts(nx, ny)?;
    let boundary = Boundary::from_pbc(pbc);
    let lap_x = DiscreteLaplacian1d::new(0.0, lx, nx, boundary)?.as_dense();
    let lap_y = DiscreteLaplacian1d::new(0.0, ly, ny, boundary)?.as_dense();
    let dim = nx * ny;
    let mut aa = Matrix::new(dim, dim);
    for i in 0..nx {
        for k in 0..nx {
            let value = lap_x.get(i, k);
            if value != 0.0 {
                for j in 0..ny {
                    add_to(&mut aa, i * ny + j, k * ny + j, value);
                }
            }
        }
    }
    for i in 0..nx {
        for j in 0..ny {
            for l in 0..ny {
                let value = lap_y.get(j, l);
                if value != 0.0 {
                    add_to(&mut aa, i * ny + j, i * ny + l, value);
                }
            }
        }
    }
    Ok(aa)
}

/// Assembles the sparse (COO) matrix and converts it to dense
pub fn laplacian_2d_sparse(nx: usize, ny: usize, lx: f64, ly: f64, pbc: bool) -> Result<Matrix, StrError> {
    let fdm = DiscreteLaplacian2d::new(0.0, lx, 0.0, ly, nx, ny, Boundary::from_pbc(pbc))?;
    let aa = fdm.coefficient_matrix(false)?;
    Ok(aa.as_dense())
}

fn check_counts(nx: usize, ny: usize) -> Result<(), StrError> {
    if nx < 1 {
        return Err("nx must be ≥ 1");
    }
    if ny < 1 {
        return Err("ny must be ≥ 1");
    }
    Ok(())
}

fn add_to(aa: &mut Matrix, i: usize, j: usize, value: f64) {
    aa.set(i, j, aa.get(i, j) + value);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{find_variant, VARIANTS};
    use crate::create_laplacian_2d;
    use russell_lab::mat_approx_eq;

    #[test]
    fn find_variant_works() {
        assert_eq!(find_variant("kronecker").map(|v| v.name), Some("kronecker"));
        assert!(find_variant("poisson_4").is_none());
        let names: Vec<_> = VARIANTS.iter().map(|v| v.name).collect();
        assert_eq!(names, &["reference", "stencil", "kronecker", "sparse"]);
    }

    #[test]
    fn variants_capture_errors() {
        for variant in &VARIANTS {
            assert_eq!((variant.build)(0, 3, 1.0, 1.0, true).err(), Some("nx must be ≥ 1"));
            assert_eq!((variant.build)(3, 0, 1.0, 1.0, true).err(), Some("ny must be ≥ 1"));
            assert_eq!(
                (variant.build)(3, 3, -1.0, 1.0, true).err(),
                Some("the length of the domain must be positive")
            );
        }
    }

    #[test]
    fn variants_agree_with_reference() {
        for pbc in [true, false] {
            for (nx, ny) in [(1, 1), (1, 4), (2, 3), (4, 1), (5, 4)] {
                let reference = create_laplacian_2d(nx, ny, 1.5, 3.0, pbc).unwrap();
                for variant in &VARIANTS {
                    let aa = (variant.build)(nx, ny, 1.5, 3.0, pbc).unwrap();
                    assert_eq!(aa.dims(), (nx * ny, nx * ny));
                    mat_approx_eq(&aa, &reference, 1e-12);
                }
            }
        }
    }
}
