//! Uniform and importance-sampled Monte Carlo integrals, with a convergence study and a
//! coverage check of the reported confidence intervals.

use mini_mc::densities::{dcauchy, dnorm};
use mini_mc::integrate::{coverage, MonteCarloIntegrator};

use rand::{thread_rng, Rng};
use rand_distr::Normal;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let seed: u64 = thread_rng().gen();
    let mut integrator = MonteCarloIntegrator::new().set_seed(seed);
    println!("Seed: {seed}");

    // ∫_0^1 x^2 dx = 1/3
    let square = integrator.estimate_integral(|x| x * x, 0.0, 1.0, 100_000)?;
    println!(
        "∫ x^2 on [0, 1]: {:.5} ± {:.5}  (95% CI [{:.5}, {:.5}], exact {:.5})",
        square.estimate,
        square.standard_error,
        square.ci_lower,
        square.ci_upper,
        1.0 / 3.0
    );

    // The standard error falls like 1/sqrt(n).
    println!("\n{:>8}  {:>10}  {:>10}  {:>10}", "n", "estimate", "se", "se*sqrt(n)");
    let sizes = [10, 100, 1_000, 10_000, 100_000];
    for e in integrator.convergence_study(|x| x * x, 0.0, 1.0, &sizes)? {
        println!(
            "{:>8}  {:>10.5}  {:>10.5}  {:>10.5}",
            e.n,
            e.estimate,
            e.standard_error,
            e.standard_error * (e.n as f64).sqrt()
        );
    }

    let replicates = integrator.replicate(|x| x * x, 0.0, 1.0, 10_000, 500)?;
    println!(
        "\nCoverage of 500 nominal 95% intervals: {:.3}",
        coverage(&replicates, 1.0 / 3.0)
    );

    // ∫ x^2 φ(x) dx = 1, sampled from a wider normal.
    let proposal = Normal::new(0.0, 2.0)?;
    let second_moment = integrator.estimate_integral_importance(
        |x| x * x * dnorm(x, 0.0, 1.0),
        |x| dnorm(x, 0.0, 2.0),
        &proposal,
        50_000,
    )?;
    println!(
        "\n∫ x^2 φ(x) dx by importance sampling: {:.5} ± {:.5} (exact 1), max weight share {:.2e}",
        second_moment.estimate.estimate,
        second_moment.estimate.standard_error,
        second_moment.max_weight_share
    );

    // A normal proposal for a Cauchy integrand has tails that are too light.
    let light_tails = integrator.estimate_integral_importance(
        |x| dcauchy(x, 0.0, 1.0),
        |x| dnorm(x, 0.0, 1.0),
        &Normal::new(0.0, 1.0)?,
        50_000,
    )?;
    println!(
        "∫ Cauchy density with a N(0, 1) proposal: {:.5} (exact 1), max weight share {:.2e}",
        light_tails.estimate.estimate, light_tails.max_weight_share
    );

    Ok(())
}
