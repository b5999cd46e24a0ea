//! Checks the properties that every 2D Laplacian builder must satisfy
//!
//! 1. the matrix is square with dimension nx * ny
//! 2. the matrix is symmetric
//! 3. constant fields are in the null space
//! 4. solving L φ = -ρ and recomputing -L φ reproduces ρ
//! 5. -L (cos x + sin y) ≈ cos x + sin y on [-π, π)²

use crate::{charge_density, solve_poisson, Boundary, DiscreteLaplacian2d, LaplacianVariant, StrError};
use rand::Rng;
use rand_distr::StandardNormal;
use russell_lab::{Matrix, Vector};
use std::f64::consts::PI;

/// Holds the relative and absolute tolerances used by [allclose]
#[derive(Clone, Copy, Debug)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

/// Tolerance for the solve-then-apply round trip
pub const ROUND_TRIP_TOLERANCE: Tolerance = Tolerance { rtol: 1e-5, atol: 1e-5 };

/// Tolerance for the comparison against the analytic Laplacian of cos(x) + sin(y)
pub const ANALYTIC_TOLERANCE: Tolerance = Tolerance { rtol: 1e-2, atol: 5e-2 };

/// Tolerance for the symmetry check (relative to the largest entry)
pub const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Tolerance for the null space check (relative to the largest entry)
pub const NULL_SPACE_TOLERANCE: f64 = 1e-10;

/// Returns true if `|actual - desired| ≤ atol + rtol * |desired|` for all components
///
/// Returns false if the slices have different lengths.
pub fn allclose(actual: &[f64], desired: &[f64], tolerance: Tolerance) -> bool {
    if actual.len() != desired.len() {
        return false;
    }
    actual
        .iter()
        .zip(desired)
        .all(|(a, d)| f64::abs(a - d) <= tolerance.atol + tolerance.rtol * f64::abs(*d))
}

/// Holds the parameters of one consistency check
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConformanceCase {
    pub nx: usize,
    pub ny: usize,
    pub lx: f64,
    pub ly: f64,
}

/// Returns all combinations of nx, ny ∈ {5, 10, 20} and lx, ly ∈ {1, 3}
pub fn consistency_cases() -> Vec<ConformanceCase> {
    let mut cases = Vec::new();
    for nx in [5, 10, 20] {
        for ny in [5, 10, 20] {
            for lx in [1.0, 3.0] {
                for ly in [1.0, 3.0] {
                    cases.push(ConformanceCase { nx, ny, lx, ly });
                }
            }
        }
    }
    cases
}

fn max_abs_entry(laplacian: &Matrix) -> f64 {
    laplacian.as_data().iter().fold(0.0, |acc, a| f64::max(acc, f64::abs(*a)))
}

/// Checks that the matrix is (nx * ny) × (nx * ny)
pub fn check_shape(laplacian: &Matrix, nx: usize, ny: usize) -> Result<(), StrError> {
    let (m, n) = laplacian.dims();
    if m != nx * ny {
        return Err("laplacian has wrong first shape");
    }
    if n != nx * ny {
        return Err("laplacian has wrong second shape");
    }
    Ok(())
}

/// Checks that the matrix equals its transpose
pub fn check_symmetry(laplacian: &Matrix) -> Result<(), StrError> {
    let (m, n) = laplacian.dims();
    if m != n {
        return Err("laplacian must be square");
    }
    let tol = SYMMETRY_TOLERANCE * f64::max(1.0, max_abs_entry(laplacian));
    for i in 0..m {
        for j in (i + 1)..n {
            if f64::abs(laplacian.get(i, j) - laplacian.get(j, i)) > tol {
                return Err("laplacian is not symmetric");
            }
        }
    }
    Ok(())
}

/// Checks that applying the matrix to a constant field yields zero
pub fn check_null_space(laplacian: &Matrix) -> Result<(), StrError> {
    let (_, n) = laplacian.dims();
    let ones = Vector::filled(n, 1.0);
    let minus_lap_ones = charge_density(laplacian, &ones)?;
    let tolerance = Tolerance {
        rtol: 0.0,
        atol: NULL_SPACE_TOLERANCE * f64::max(1.0, max_abs_entry(laplacian)),
    };
    if !allclose(minus_lap_ones.as_data(), &vec![0.0; n], tolerance) {
        return Err("constant fields are not in the null space");
    }
    Ok(())
}

/// Generates a normally distributed charge density with zero mean (flattened (nx, ny) array)
pub fn random_neutral_density<R: Rng>(nx: usize, ny: usize, rng: &mut R) -> Vector {
    let dim = nx * ny;
    let mut rho = Vector::new(dim);
    for i in 0..dim {
        rho[i] = rng.sample(StandardNormal);
    }
    crate::remove_mean(&mut rho);
    rho
}

/// Checks that solving L φ = -ρ and recomputing -L φ reproduces ρ
pub fn check_round_trip(laplacian: &Matrix, rho: &Vector) -> Result<(), StrError> {
    let phi = solve_poisson(laplacian, rho)?;
    let rho_again = charge_density(laplacian, &phi)?;
    if !allclose(rho_again.as_data(), rho.as_data(), ROUND_TRIP_TOLERANCE) {
        return Err("round trip does not reproduce the charge density");
    }
    Ok(())
}

/// Samples φ(x, y) = cos(x) + sin(y) on the periodic grid spanning [-π, π)²
pub fn cossin_field(nx: usize, ny: usize) -> Vector {
    let (dx, dy) = (2.0 * PI / (nx as f64), 2.0 * PI / (ny as f64));
    let mut phi = Vector::new(nx * ny);
    for i in 0..nx {
        let x = -PI + (i as f64) * dx;
        for j in 0..ny {
            let y = -PI + (j as f64) * dy;
            phi[i * ny + j] = f64::cos(x) + f64::sin(y);
        }
    }
    phi
}

/// Returns the max difference between -L φ and φ = cos(x) + sin(y)
///
/// The laplacian must be built with nx × ny points and extents 2π × 2π.
pub fn cossin_max_error(laplacian: &Matrix, nx: usize, ny: usize) -> Result<f64, StrError> {
    check_shape(laplacian, nx, ny)?;
    let phi = cossin_field(nx, ny);
    let minus_lap_phi = charge_density(laplacian, &phi)?;
    Ok(minus_lap_phi
        .as_data()
        .iter()
        .zip(phi.as_data())
        .fold(0.0, |acc, (a, b)| f64::max(acc, f64::abs(a - b))))
}

/// Checks that -L φ approximates the analytic -∇²φ = φ for φ = cos(x) + sin(y)
///
/// The laplacian must be built with nx × ny points and extents 2π × 2π.
pub fn check_cossin(laplacian: &Matrix, nx: usize, ny: usize) -> Result<(), StrError> {
    check_shape(laplacian, nx, ny)?;
    let phi = cossin_field(nx, ny);
    let minus_lap_phi = charge_density(laplacian, &phi)?;
    compare_cossin(&minus_lap_phi, &phi)
}

/// Same as [check_cossin] but applies the periodic operator without assembling the matrix
pub fn check_cossin_matrix_free(nx: usize, ny: usize) -> Result<(), StrError> {
    let fdm = DiscreteLaplacian2d::new(-PI, PI, -PI, PI, nx, ny, Boundary::Periodic)?;
    let phi = cossin_field(nx, ny);
    let mut minus_lap_phi = fdm.apply(&phi)?;
    for i in 0..minus_lap_phi.dim() {
        minus_lap_phi[i] = -minus_lap_phi[i];
    }
    compare_cossin(&minus_lap_phi, &phi)
}

fn compare_cossin(minus_lap_phi: &Vector, phi: &Vector) -> Result<(), StrError> {
    if !allclose(minus_lap_phi.as_data(), phi.as_data(), ANALYTIC_TOLERANCE) {
        return Err("discrete laplacian of cos(x) + sin(y) does not match the analytic one");
    }
    Ok(())
}

/// Runs the shape, symmetry, null space, and round trip checks of a variant for one case
pub fn check_variant<R: Rng>(
    variant: &LaplacianVariant,
    case: &ConformanceCase,
    rng: &mut R,
) -> Result<(), StrError> {
    let laplacian = (variant.build)(case.nx, case.ny, case.lx, case.ly, true)?;
    check_shape(&laplacian, case.nx, case.ny)?;
    check_symmetry(&laplacian)?;
    check_null_space(&laplacian)?;
    let rho = random_neutral_density(case.nx, case.ny, rng);
    check_round_trip(&laplacian, &rho)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_laplacian_2d;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn allclose_works() {
        let tol = Tolerance { rtol: 0.1, atol: 0.01 };
        assert!(allclose(&[1.0, 10.0], &[1.1, 10.0], tol));
        assert!(allclose(&[0.0], &[0.01], tol));
        assert!(!allclose(&[0.0], &[0.02], tol));
        assert!(!allclose(&[1.0], &[1.0, 2.0], tol));
        assert!(allclose(&[], &[], tol));
    }

    #[test]
    fn consistency_cases_works() {
        let cases = consistency_cases();
        assert_eq!(cases.len(), 36);
        assert_eq!(cases[0], ConformanceCase { nx: 5, ny: 5, lx: 1.0, ly: 1.0 });
        assert_eq!(cases[35], ConformanceCase { nx: 20, ny: 20, lx: 3.0, ly: 3.0 });
    }

    #[test]
    fn checks_capture_errors() {
        let aa = create_laplacian_2d(3, 2, 1.0, 1.0, true).unwrap();
        assert_eq!(check_shape(&aa, 2, 2).err(), Some("laplacian has wrong first shape"));
        assert_eq!(
            check_shape(&Matrix::new(6, 5), 3, 2).err(),
            Some("laplacian has wrong second shape")
        );

        let mut bb = aa.clone();
        bb.set(0, 1, 7.0);
        assert_eq!(check_symmetry(&bb).err(), Some("laplacian is not symmetric"));
        assert_eq!(check_null_space(&bb).err(), Some("constant fields are not in the null space"));
        assert_eq!(
            check_cossin(&aa, 3, 2).err(),
            Some("discrete laplacian of cos(x) + sin(y) does not match the analytic one")
        );
    }

    #[test]
    fn checks_work() {
        let mut rng = StdRng::seed_from_u64(1234);
        let aa = create_laplacian_2d(5, 5, 1.0, 1.0, true).unwrap();
        check_shape(&aa, 5, 5).unwrap();
        check_symmetry(&aa).unwrap();
        check_null_space(&aa).unwrap();
        let rho = random_neutral_density(5, 5, &mut rng);
        assert_eq!(rho.dim(), 25);
        assert!(f64::abs(rho.as_data().iter().sum::<f64>()) < 1e-12);
        check_round_trip(&aa, &rho).unwrap();
    }

    #[test]
    fn cossin_field_works() {
        let phi = cossin_field(2, 4);
        // x ∈ {-π, 0}, y ∈ {-π, -π/2, 0, π/2}
        let correct = &[-1.0, -2.0, -1.0, 0.0, 1.0, 0.0, 1.0, 2.0];
        assert!(allclose(phi.as_data(), correct, Tolerance { rtol: 0.0, atol: 1e-15 }));
    }

    #[test]
    fn cossin_error_shrinks_with_resolution() {
        let (nx, ny) = (16, 16);
        let coarse = create_laplacian_2d(nx, ny, 2.0 * PI, 2.0 * PI, true).unwrap();
        let (nx2, ny2) = (32, 32);
        let fine = create_laplacian_2d(nx2, ny2, 2.0 * PI, 2.0 * PI, true).unwrap();
        let err_coarse = cossin_max_error(&coarse, nx, ny).unwrap();
        let err_fine = cossin_max_error(&fine, nx2, ny2).unwrap();
        assert!(err_fine < err_coarse);
        // second order: halving the spacing divides the error by about four
        assert!(err_fine < 0.3 * err_coarse);
        check_cossin(&fine, nx2, ny2).unwrap();
        check_cossin_matrix_free(nx2, ny2).unwrap();
    }
}
