use crate::{DiscreteLaplacian2d, StrError};
use russell_lab::{mat_vec_mul, solve_lin_sys, Matrix, Vector};
use russell_sparse::{Genie, LinSolver, SparseMatrix};

/// Node whose potential is pinned to zero when solving the singular system
pub const REFERENCE_NODE: usize = 0;

/// Relative tolerance on the total charge (compared with the sum of absolute values)
pub const NEUTRALITY_TOLERANCE: f64 = 1e-10;

/// Computes the charge density ρ = -L φ
pub fn charge_density(laplacian: &Matrix, phi: &Vector) -> Result<Vector, StrError> {
    let (m, n) = laplacian.dims();
    if phi.dim() != n {
        return Err("vector phi is incompatible with the laplacian");
    }
    let mut rho = Vector::new(m);
    mat_vec_mul(&mut rho, -1.0, laplacian, phi)?;
    Ok(rho)
}

/// Shifts the values such that their mean becomes zero
pub fn remove_mean(v: &mut Vector) {
    let n = v.dim();
    if n == 0 {
        return;
    }
    let mean = v.as_data().iter().sum::<f64>() / (n as f64);
    for i in 0..n {
        v[i] -= mean;
    }
}

/// Checks that a charge density sums to zero (solvability of the periodic problem)
fn check_neutrality(rho: &Vector) -> Result<(), StrError> {
    let total: f64 = rho.as_data().iter().sum();
    let scale: f64 = rho.as_data().iter().map(|r| f64::abs(*r)).sum();
    if f64::abs(total) > NEUTRALITY_TOLERANCE * f64::max(1.0, scale) {
        return Err("charge density must be neutral (zero mean)");
    }
    Ok(())
}

/// Solves the Poisson equation L φ = -ρ with a dense LU factorization
///
/// The Laplacian must have constant fields as its (only) null space, thus the
/// potential at [REFERENCE_NODE] is pinned to zero and the solution is then
/// shifted to zero mean.
///
/// # Input
///
/// * `laplacian` -- the (nx * ny) square matrix
/// * `rho` -- the neutral charge density
pub fn solve_poisson(laplacian: &Matrix, rho: &Vector) -> Result<Vector, StrError> {
    let (m, n) = laplacian.dims();
    if m != n {
        return Err("laplacian must be square");
    }
    if rho.dim() != n {
        return Err("vector rho is incompatible with the laplacian");
    }
    if n == 0 {
        return Ok(Vector::new(0));
    }
    check_neutrality(rho)?;

    // grounded copy of the matrix
    let mut aa = Matrix::new(n, n);
    for i in 0..n {
        if i == REFERENCE_NODE {
            continue;
        }
        for j in 0..n {
            if j != REFERENCE_NODE {
                aa.set(i, j, laplacian.get(i, j));
            }
        }
    }
    aa.set(REFERENCE_NODE, REFERENCE_NODE, 1.0);

    // right-hand side (overwritten with the solution)
    let mut phi = Vector::new(n);
    for i in 0..n {
        phi[i] = -rho[i];
    }
    phi[REFERENCE_NODE] = 0.0;

    solve_lin_sys(&mut phi, &mut aa)?;
    remove_mean(&mut phi);
    Ok(phi)
}

/// Solves many Poisson problems on the same grid with a single sparse factorization
pub struct PoissonSolver {
    fdm: DiscreteLaplacian2d,
    genie: Genie,
}

impl PoissonSolver {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `fdm` -- the discrete Laplacian
    /// * `genie` -- the sparse solver (e.g., Umfpack)
    pub fn new(fdm: DiscreteLaplacian2d, genie: Genie) -> Self {
        PoissonSolver { fdm, genie }
    }

    /// Returns the discrete Laplacian
    pub fn laplacian(&self) -> &DiscreteLaplacian2d {
        &self.fdm
    }

    /// Solves L φ = -ρ for each charge density; returns the zero-mean potentials
    pub fn solve_many(&self, densities: &[Vector]) -> Result<Vec<Vector>, StrError> {
        let dim = self.fdm.dim();
        for rho in densities {
            if rho.dim() != dim {
                return Err("vector rho must have dim = nx * ny");
            }
            check_neutrality(rho)?;
        }

        // factorize the grounded coefficient matrix
        let one_based = self.genie == Genie::Mumps;
        let aa = self.fdm.grounded_coefficient_matrix(REFERENCE_NODE, one_based)?;
        let mut mat = SparseMatrix::from_coo(aa);
        let mut solver = LinSolver::new(self.genie)?;
        solver.actual.factorize(&mut mat, None)?;

        // solve with each right-hand side
        let mut potentials = Vec::with_capacity(densities.len());
        let mut rhs = Vector::new(dim);
        for rho in densities {
            for i in 0..dim {
                rhs[i] = -rho[i];
            }
            rhs[REFERENCE_NODE] = 0.0;
            let mut phi = Vector::new(dim);
            solver.actual.solve(&mut phi, &mat, &rhs, false)?;
            remove_mean(&mut phi);
            potentials.push(phi);
        }
        Ok(potentials)
    }

    /// Solves L φ = -ρ for a single charge density
    pub fn solve(&self, rho: &Vector) -> Result<Vector, StrError> {
        let mut potentials = self.solve_many(std::slice::from_ref(rho))?;
        potentials.pop().ok_or("solver returned no potential")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{charge_density, remove_mean, solve_poisson, PoissonSolver};
    use crate::{create_laplacian_1d, create_laplacian_2d, Boundary, DiscreteLaplacian2d};
    use russell_lab::{vec_approx_eq, Matrix, Vector};
    use russell_sparse::Genie;

    #[test]
    fn remove_mean_works() {
        let mut v = Vector::from(&[1.0, 2.0, 3.0, 6.0]);
        remove_mean(&mut v);
        vec_approx_eq(v.as_data(), &[-2.0, -1.0, 0.0, 3.0], 1e-15);
        let mut empty = Vector::new(0);
        remove_mean(&mut empty);
        assert_eq!(empty.dim(), 0);
    }

    #[test]
    fn charge_density_works() {
        let aa = create_laplacian_1d(4, 4.0, true).unwrap();
        let phi = Vector::from(&[0.0, 1.0, 0.0, -1.0]);
        let rho = charge_density(&aa, &phi).unwrap();
        vec_approx_eq(rho.as_data(), &[0.0, 2.0, 0.0, -2.0], 1e-15);
        assert_eq!(
            charge_density(&aa, &Vector::new(3)).err(),
            Some("vector phi is incompatible with the laplacian")
        );
    }

    #[test]
    fn solve_poisson_captures_errors() {
        let aa = create_laplacian_1d(4, 4.0, true).unwrap();
        assert_eq!(
            solve_poisson(&Matrix::new(2, 3), &Vector::new(3)).err(),
            Some("laplacian must be square")
        );
        assert_eq!(
            solve_poisson(&aa, &Vector::new(3)).err(),
            Some("vector rho is incompatible with the laplacian")
        );
        assert_eq!(
            solve_poisson(&aa, &Vector::from(&[1.0, 0.0, 0.0, 0.0])).err(),
            Some("charge density must be neutral (zero mean)")
        );
    }

    #[test]
    fn solve_poisson_works_1d() {
        let aa = create_laplacian_1d(4, 4.0, true).unwrap();
        let rho = Vector::from(&[0.0, 2.0, 0.0, -2.0]);
        let phi = solve_poisson(&aa, &rho).unwrap();
        vec_approx_eq(phi.as_data(), &[0.0, 1.0, 0.0, -1.0], 1e-14);
    }

    #[test]
    fn solve_poisson_works_2d() {
        for pbc in [true, false] {
            let aa = create_laplacian_2d(4, 3, 2.0, 1.5, pbc).unwrap();
            let mut rho = Vector::new(12);
            for i in 0..12 {
                rho[i] = f64::sin(i as f64);
            }
            remove_mean(&mut rho);
            let phi = solve_poisson(&aa, &rho).unwrap();
            let mean = phi.as_data().iter().sum::<f64>() / 12.0;
            assert!(f64::abs(mean) < 1e-14);
            let rho_again = charge_density(&aa, &phi).unwrap();
            vec_approx_eq(rho_again.as_data(), rho.as_data(), 1e-12);
        }
    }

    #[test]
    fn solve_poisson_handles_single_point() {
        let aa = create_laplacian_2d(1, 1, 1.0, 1.0, true).unwrap();
        let phi = solve_poisson(&aa, &Vector::new(1)).unwrap();
        vec_approx_eq(phi.as_data(), &[0.0], 1e-15);
    }

    #[test]
    fn poisson_solver_captures_errors() {
        let fdm = DiscreteLaplacian2d::new(0.0, 1.0, 0.0, 1.0, 3, 3, Boundary::Periodic).unwrap();
        let solver = PoissonSolver::new(fdm, Genie::Umfpack);
        assert_eq!(solver.laplacian().dim(), 9);
        assert_eq!(
            solver.solve(&Vector::new(4)).err(),
            Some("vector rho must have dim = nx * ny")
        );
        assert_eq!(
            solver.solve(&Vector::filled(9, 1.0)).err(),
            Some("charge density must be neutral (zero mean)")
        );
    }

    #[test]
    fn poisson_solver_matches_dense_solution() {
        let fdm = DiscreteLaplacian2d::new(0.0, 2.0, 0.0, 3.0, 5, 4, Boundary::Periodic).unwrap();
        let aa = fdm.as_dense();
        let mut densities = Vec::new();
        for k in 1..4 {
            let mut rho = Vector::new(fdm.dim());
            fdm.loop_over_grid_points(|n, x, y| rho[n] = (k as f64) * f64::cos(x * y) + x - y);
            remove_mean(&mut rho);
            densities.push(rho);
        }
        let solver = PoissonSolver::new(fdm, Genie::Umfpack);
        let potentials = solver.solve_many(&densities).unwrap();
        assert_eq!(potentials.len(), 3);
        for (rho, phi) in densities.iter().zip(potentials.iter()) {
            let phi_dense = solve_poisson(&aa, rho).unwrap();
            vec_approx_eq(phi.as_data(), phi_dense.as_data(), 1e-12);
        }
    }
}
