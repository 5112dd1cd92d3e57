/*!
# Monte Carlo Integrator

Plain and importance-sampled Monte Carlo estimates of definite integrals, each reported as
an [`Estimate`] with standard error and confidence interval.

For uniform sampling on `[a, b]` every draw contributes `f(x) / (1 / (b - a))`, so the
running mean converges almost surely to `∫ f` and its standard error shrinks as
`O(1/√n)`.

## Importance sampling and support

[`MonteCarloIntegrator::estimate_integral_importance`] reweights draws from a proposal `g`
by `f / g`. The proposal's support **must cover every point where `f` is non-zero**.
If it does not, the estimate is silently biased: no draw ever lands where `g` is zero, so
nothing can be detected at runtime. The only signal offered is
[`ImportanceEstimate::max_weight_share`], which flags the related problem of a proposal
whose tails are too light.

## Example

```rust
use mini_mc::integrate::MonteCarloIntegrator;

let mut integrator = MonteCarloIntegrator::new().set_seed(42);
let result = integrator.estimate_integral(|x| x * x, 0.0, 1.0, 10_000).unwrap();
assert!((result.estimate - 1.0 / 3.0).abs() < 0.02);
assert!(result.ci_lower < result.estimate && result.estimate < result.ci_upper);
```
*/

use std::convert::Infallible;
use std::fmt::Display;

use log::{debug, warn};
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::estimator::{Estimate, RunningEstimator, DEFAULT_Z};
use crate::variates::VariateSource;

/// Share of the total absolute weight above which a single importance weight is reported.
pub const WEIGHT_SHARE_WARNING: f64 = 0.1;

/// An importance-sampling estimate together with a weight-concentration diagnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportanceEstimate {
    pub estimate: Estimate,
    /// `max |w_i| / Σ |w_i|`; close to 1 when one draw dominates the estimate.
    pub max_weight_share: f64,
}

/// Monte Carlo integration driven by a seeded [`VariateSource`].
#[derive(Debug, Clone)]
pub struct MonteCarloIntegrator {
    source: VariateSource,
    z: f64,
}

impl Default for MonteCarloIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

fn require_samples(n: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::Domain(
            "an estimate needs at least one sample".to_string(),
        ));
    }
    Ok(())
}

fn interval_width(a: f64, b: f64) -> Result<f64> {
    if !(a.is_finite() && b.is_finite() && a < b) {
        return Err(Error::Configuration(format!(
            "integration bounds must be finite with a < b, got [{a}, {b}]"
        )));
    }
    let width = b - a;
    if !width.is_finite() {
        return Err(Error::Configuration(format!(
            "integration interval [{a}, {b}] is wider than an f64 can represent"
        )));
    }
    Ok(width)
}

fn finite_value(x: &[f64], y: f64, what: &str) -> Result<f64> {
    if y.is_finite() {
        Ok(y)
    } else {
        Err(Error::computation(x, format!("{what} returned {y}")))
    }
}

impl MonteCarloIntegrator {
    pub fn new() -> Self {
        Self {
            source: VariateSource::new(),
            z: DEFAULT_Z,
        }
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.source = self.source.set_seed(seed);
        self
    }

    pub fn seed(&self) -> u64 {
        self.source.seed()
    }

    /// Normal quantile used for the reported confidence interval (default 1.96).
    pub fn set_confidence_z(mut self, z: f64) -> Result<Self> {
        if !(z.is_finite() && z > 0.0) {
            return Err(Error::invalid("z", z, "must be finite and positive"));
        }
        self.z = z;
        Ok(self)
    }

    /// Estimates `∫_a^b f(x) dx` from `n` uniform draws.
    pub fn estimate_integral<F>(&mut self, f: F, a: f64, b: f64, n: usize) -> Result<Estimate>
    where
        F: Fn(f64) -> f64,
    {
        self.try_estimate_integral(|x| Ok::<f64, Infallible>(f(x)), a, b, n)
    }

    /// Like [`Self::estimate_integral`] for integrands that can fail. The first failure
    /// aborts the run with a computation error carrying the offending `x`.
    pub fn try_estimate_integral<F, E>(
        &mut self,
        f: F,
        a: f64,
        b: f64,
        n: usize,
    ) -> Result<Estimate>
    where
        F: Fn(f64) -> std::result::Result<f64, E>,
        E: Display,
    {
        let width = interval_width(a, b)?;
        require_samples(n)?;

        let uniform = Uniform::new(a, b);
        let mut est = RunningEstimator::new();
        for _ in 0..n {
            let x = self.source.sample(&uniform);
            let y = f(x).map_err(|e| Error::computation(&[x], e.to_string()))?;
            let y = finite_value(&[x], y, "integrand")?;
            est.observe(y * width);
        }

        let summary = est.summary(self.z)?;
        debug!(
            "uniform estimate over [{a}, {b}] with n = {n}: {:.6} ± {:.6}",
            summary.estimate, summary.standard_error
        );
        Ok(summary)
    }

    /// Estimates `∫ f` over the box `bounds` (one `(lo, hi)` pair per coordinate).
    pub fn estimate_integral_box<F>(
        &mut self,
        f: F,
        bounds: &[(f64, f64)],
        n: usize,
    ) -> Result<Estimate>
    where
        F: Fn(&[f64]) -> f64,
    {
        if bounds.is_empty() {
            return Err(Error::Configuration(
                "box integration needs at least one dimension".to_string(),
            ));
        }
        let uniforms = bounds
            .iter()
            .map(|&(lo, hi)| interval_width(lo, hi).map(|_| Uniform::new(lo, hi)))
            .collect::<Result<Vec<_>>>()?;
        let volume: f64 = bounds.iter().map(|(lo, hi)| hi - lo).product();
        if !volume.is_finite() {
            return Err(Error::Configuration(format!(
                "box volume overflows an f64 for bounds {bounds:?}"
            )));
        }
        require_samples(n)?;

        let mut est = RunningEstimator::new();
        let mut x = vec![0.0; bounds.len()];
        for _ in 0..n {
            for (xi, u) in x.iter_mut().zip(&uniforms) {
                *xi = self.source.sample(u);
            }
            let y = finite_value(&x, f(&x), "integrand")?;
            est.observe(y * volume);
        }
        est.summary(self.z)
    }

    /// Importance-sampling estimate of `∫ f` using draws from `g_sampler`, whose density
    /// is `g_density`. Each draw contributes the weight `f(X) / g(X)`.
    ///
    /// The caller must ensure `g` is positive wherever `f` is non-zero; see the module
    /// documentation.
    pub fn estimate_integral_importance<F, G, S>(
        &mut self,
        f: F,
        g_density: G,
        g_sampler: &S,
        n: usize,
    ) -> Result<ImportanceEstimate>
    where
        F: Fn(f64) -> f64,
        G: Fn(f64) -> f64,
        S: Distribution<f64>,
    {
        require_samples(n)?;

        let mut est = RunningEstimator::new();
        let mut max_abs = 0.0_f64;
        let mut sum_abs = 0.0;
        for _ in 0..n {
            let x = self.source.sample(g_sampler);
            let fx = finite_value(&[x], f(x), "integrand")?;
            let gx = g_density(x);
            if !(gx.is_finite() && gx > 0.0) {
                return Err(Error::computation(
                    &[x],
                    format!("proposal density is {gx} at a point drawn from the proposal"),
                ));
            }
            let w = finite_value(&[x], fx / gx, "importance weight")?;
            max_abs = max_abs.max(w.abs());
            sum_abs += w.abs();
            est.observe(w);
        }

        let max_weight_share = if sum_abs > 0.0 { max_abs / sum_abs } else { 0.0 };
        if n >= 100 && max_weight_share > WEIGHT_SHARE_WARNING {
            warn!(
                "importance sampling: one weight carries {:.1}% of the total; \
                 the proposal tails may be too light and the standard error unreliable",
                100.0 * max_weight_share
            );
        }

        Ok(ImportanceEstimate {
            estimate: est.summary(self.z)?,
            max_weight_share,
        })
    }

    /// One uniform estimate per sample size, drawn one after another from this
    /// integrator's stream. Used to check the `1/√n` error decay.
    pub fn convergence_study<F>(
        &mut self,
        f: F,
        a: f64,
        b: f64,
        sample_sizes: &[usize],
    ) -> Result<Vec<Estimate>>
    where
        F: Fn(f64) -> f64,
    {
        sample_sizes
            .iter()
            .map(|&n| self.estimate_integral(&f, a, b, n))
            .collect()
    }

    /// Runs `replications` independent uniform estimates in parallel. Replicate `i` uses
    /// its own integrator seeded with `seed + i`, so the result does not depend on thread
    /// scheduling.
    pub fn replicate<F>(
        &self,
        f: F,
        a: f64,
        b: f64,
        n: usize,
        replications: usize,
    ) -> Result<Vec<Estimate>>
    where
        F: Fn(f64) -> f64 + Sync,
    {
        let base = self.seed();
        let z = self.z;
        (0..replications)
            .into_par_iter()
            .map(|i| {
                let mut integrator = MonteCarloIntegrator {
                    source: VariateSource::new().set_seed(base.wrapping_add(i as u64)),
                    z,
                };
                integrator.estimate_integral(&f, a, b, n)
            })
            .collect()
    }
}

/// Fraction of `estimates` whose confidence interval contains `truth`.
pub fn coverage(estimates: &[Estimate], truth: f64) -> f64 {
    if estimates.is_empty() {
        return 0.0;
    }
    estimates.iter().filter(|e| e.covers(truth)).count() as f64 / estimates.len() as f64
}
