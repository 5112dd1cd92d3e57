//! Random-walk Metropolis for the rate of a Poisson sample under a Gamma prior, restricted
//! to a bounded interval. The conjugate posterior mean is printed for comparison.

use mini_mc::core::{progress_bar, run_chain_with_progress};
use mini_mc::densities::{log_dgamma, log_dpois};
use mini_mc::distributions::{IsotropicGaussian, Posterior};
use mini_mc::metropolis::{Bounds, MetropolisSampler};
use mini_mc::stats::{histogram, summarize};
use mini_mc::variates::VariateSource;

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const N_OBS: usize = 100;
    const TRUE_RATE: f64 = 4.0;
    const N_STEPS: usize = 50_000;
    const BURNIN: usize = 5_000;
    const SEED: u64 = 42;
    let (a, b) = (2.0, 0.5);

    let mut source = VariateSource::new().set_seed(SEED);
    let data: Vec<f64> = source
        .poisson(N_OBS, TRUE_RATE)?
        .into_iter()
        .map(|k| k as f64)
        .collect();
    let exact_mean = (a + data.iter().sum::<f64>()) / (b + data.len() as f64);

    let posterior = Posterior::from_log(
        move |theta: &[f64]| log_dgamma(theta[0], a, b),
        |x: f64, theta: &[f64]| log_dpois(x as u64, theta[0]),
        data,
    );
    let mut sampler = MetropolisSampler::new(posterior, IsotropicGaussian::new(0.3)?, &[1.0])?
        .with_bounds(Bounds::interval(0.0, 20.0)?)?
        .set_seed(SEED);

    let pb = progress_bar(N_STEPS, "Metropolis");
    let samples = run_chain_with_progress(&mut sampler, N_STEPS, &pb)?;

    let summary = summarize(&samples, BURNIN)?;
    println!(
        "Posterior mean of the rate: {:.4} (conjugate {:.4}), sd {:.4}",
        summary.mean[0],
        exact_mean,
        summary.variance[0].sqrt()
    );
    println!(
        "Acceptance rate {:.3}, out-of-bounds proposals {}",
        sampler.acceptance_rate(),
        sampler.out_of_bounds_count()
    );

    let draws: Vec<f64> = samples.column(0).iter().skip(BURNIN).copied().collect();
    let hist = histogram(&draws, 20)?;
    let peak = hist.counts.iter().copied().max().unwrap_or(1).max(1);
    for (center, count) in hist.centers().iter().zip(&hist.counts) {
        println!("{center:>7.3} | {}", "#".repeat(50 * count / peak));
    }

    #[cfg(feature = "csv")]
    mini_mc::io::csv::save_csv(&samples, &["rate"], "/tmp/poisson_metropolis.csv")?;

    Ok(())
}
