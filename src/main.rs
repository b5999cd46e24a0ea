use periodic_poisson::{
    check_cossin, check_variant, consistency_cases, cossin_max_error, find_variant, LaplacianVariant, StrError,
    VARIANTS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use russell_lab::Stopwatch;
use std::f64::consts::PI;
use structopt::StructOpt;

/// Checks that the Laplacian builders agree with each other
#[derive(StructOpt)]
struct Options {
    /// Name of the builder to check (all builders if omitted)
    #[structopt(long)]
    variant: Option<String>,

    /// Seed of the random charge densities
    #[structopt(long, default_value = "42")]
    seed: u64,

    /// Number of points along x and y for the cos(x) + sin(y) check
    #[structopt(long, default_value = "50")]
    analytic_n: usize,
}

fn main() -> Result<(), StrError> {
    // parse command line arguments
    let opt = Options::from_args();
    let variants: Vec<&LaplacianVariant> = match &opt.variant {
        Some(name) => vec![find_variant(name).ok_or("cannot find the requested variant")?],
        None => VARIANTS.iter().collect(),
    };

    // start stopwatch
    let mut stopwatch = Stopwatch::new("");

    let cases = consistency_cases();
    let mut n_failed = 0;
    for variant in &variants {
        // run the consistency cases in parallel; each case has its own generator
        let failures: Vec<_> = cases
            .par_iter()
            .enumerate()
            .filter_map(|(k, case)| {
                let mut rng = StdRng::seed_from_u64(opt.seed + k as u64);
                check_variant(variant, case, &mut rng).err().map(|e| (*case, e))
            })
            .collect();
        for (case, error) in &failures {
            println!(
                "{:>10}: nx = {:>2}, ny = {:>2}, lx = {}, ly = {} (failed: {})",
                variant.name, case.nx, case.ny, case.lx, case.ly, error
            );
        }

        // check the analytic solution
        let n = opt.analytic_n;
        let laplacian = (variant.build)(n, n, 2.0 * PI, 2.0 * PI, true)?;
        let err_max = cossin_max_error(&laplacian, n, n)?;
        let analytic = match check_cossin(&laplacian, n, n) {
            Ok(()) => "success",
            Err(_) => "failed",
        };

        println!(
            "{:>10}: {}/{} consistency cases passed, cos+sin with n = {}: err_max = {:.2e} ({})",
            variant.name,
            cases.len() - failures.len(),
            cases.len(),
            n,
            err_max,
            analytic
        );
        n_failed += failures.len();
        if analytic == "failed" {
            n_failed += 1;
        }
    }

    // message
    stopwatch.stop();
    println!("elapsed time = {}", stopwatch);
    if n_failed > 0 {
        return Err("some checks failed");
    }
    Ok(())
}
