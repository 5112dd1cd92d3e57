//! Gibbs sampling for a zero-inflated Poisson model on synthetic data.

use mini_mc::core::discard_burn_in;
use mini_mc::distributions::{ZeroInflatedPoisson, ZIP_LAMBDA, ZIP_P};
use mini_mc::gibbs::zip_sampler;
use mini_mc::stats::summarize;
use mini_mc::variates::VariateSource;

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const N_OBS: usize = 10_000;
    const N_SWEEPS: usize = 5_000;
    const BURNIN: usize = 500;
    const SEED: u64 = 7;
    let (true_lambda, true_p) = (2.0, 0.3);

    let mut source = VariateSource::new().set_seed(SEED);
    let data = ZeroInflatedPoisson::simulate(&mut source, N_OBS, true_lambda, true_p)?;
    let zeros = data.iter().filter(|&&x| x == 0).count();
    println!("Simulated {N_OBS} counts, {zeros} of them zero");

    let mut sampler = zip_sampler(data, 1.0, 1.0, (1.0, 0.5))?.set_seed(SEED);
    sampler.run(N_SWEEPS)?;

    let samples = sampler.history_array();
    let summary = summarize(&samples, BURNIN)?;
    println!(
        "lambda: {:.4} ± {:.4} (true {true_lambda})",
        summary.mean[ZIP_LAMBDA],
        summary.variance[ZIP_LAMBDA].sqrt()
    );
    println!(
        "p:      {:.4} ± {:.4} (true {true_p})",
        summary.mean[ZIP_P],
        summary.variance[ZIP_P].sqrt()
    );
    println!("Kept {} sweeps", discard_burn_in(&samples, BURNIN).nrows());

    #[cfg(feature = "csv")]
    mini_mc::io::csv::save_csv(&samples, &["lambda", "p"], "/tmp/zip_gibbs.csv")?;

    Ok(())
}
