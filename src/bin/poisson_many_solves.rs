use periodic_poisson::{Boundary, DiscreteLaplacian2d, PoissonSolver};
use russell_lab::{Stopwatch, StrError, Vector};
use russell_sparse::Genie;
use std::f64::consts::PI;
use std::fmt;
use structopt::StructOpt;

// Approximate (with the Finite Differences Method, FDM) the solution of
//
//    ∂²ϕ   ∂²ϕ
//  - ——— - ——— = multiplier * (cos(x) + sin(y))
//    ∂x²   ∂y²
//
// on the periodic [-π, π) × [-π, π) square.
//
// The analytical (zero-mean) solution is:
//
// ϕ(x, y) = multiplier * (cos(x) + sin(y))

fn populate_density(fdm: &DiscreteLaplacian2d, multiplier: f64) -> Vector {
    let mut rho = Vector::new(fdm.dim());
    fdm.loop_over_grid_points(|i, x, y| {
        rho[i] = multiplier * (f64::cos(x) + f64::sin(y));
    });
    rho
}

fn compare_analytical_solution(fdm: &DiscreteLaplacian2d, num: &Vector, multiplier: f64) -> f64 {
    let mut err_max = 0.0;
    fdm.loop_over_grid_points(|i, x, y| {
        let ana = multiplier * (f64::cos(x) + f64::sin(y));
        let err = f64::abs(num[i] - ana);
        if err > err_max {
            err_max = err
        }
    });
    err_max
}

#[derive(StructOpt)]
struct Options {
    #[structopt(default_value = "50")]
    nx: usize,

    #[structopt(default_value = "Umfpack")]
    genie: String,
}

fn main() -> Result<(), StrError> {
    // parse command line arguments
    let opt = Options::from_args();
    let genie = Genie::from(&opt.genie);

    // start stopwatch
    let mut stopwatch = Stopwatch::new("");

    // allocate the discrete Laplacian
    let fdm = DiscreteLaplacian2d::new(-PI, PI, -PI, PI, opt.nx, opt.nx, Boundary::Periodic)?;

    // message
    println!("nx = {}, dim = {}, genie = {:?}", opt.nx, fdm.dim(), genie);

    // populate the charge densities with increasing multipliers
    const MULTIPLIERS: &[f64] = &[1.0, 2.0, 5.0, 10.0, 100.0];
    let densities: Vec<_> = MULTIPLIERS.iter().map(|m| populate_density(&fdm, *m)).collect();

    // factorize once and solve many times
    let solver = PoissonSolver::new(fdm, genie);
    let potentials = solver.solve_many(&densities)?;

    // compare the results
    let errors: Vec<_> = MULTIPLIERS
        .iter()
        .zip(potentials.iter())
        .map(|(m, phi)| compare_analytical_solution(solver.laplacian(), phi, *m))
        .collect();
    println!("multipliers ={}", P(MULTIPLIERS.to_vec()));
    println!("errors      ={}", P(errors));

    // message
    stopwatch.stop();
    println!("elapsed time = {}", stopwatch);
    Ok(())
}

struct P(Vec<f64>);

impl fmt::Display for P {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for v in &self.0 {
            write!(f, "{:8.1e}", v)?;
        }
        Ok(())
    }
}
