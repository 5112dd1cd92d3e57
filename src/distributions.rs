/*!
Capability traits for the samplers and the concrete models shipped with the crate.

- [`Target`]: an unnormalized log-density, the only thing the Metropolis sampler needs.
- [`Proposal`]: a *symmetric* random-walk proposal, so no Hastings correction is applied.
- [`Conditional`]: the full conditionals driving a Gibbs sweep, with an optional per-sweep
  latent block drawn before the coordinates.

# Examples

```rust
use mini_mc::distributions::{Posterior, Target};
use mini_mc::densities::{dgamma, dpois};

// Poisson likelihood with a Gamma(2, 1) prior on the rate.
let posterior = Posterior::new(
    |theta: &[f64]| dgamma(theta[0], 2.0, 1.0),
    |x: f64, theta: &[f64]| dpois(x as u64, theta[0]),
    vec![3.0, 1.0, 4.0],
);
assert!(posterior.unnorm_log_prob(&[2.0]).is_finite());
assert_eq!(posterior.unnorm_log_prob(&[-1.0]), f64::NEG_INFINITY);
```
*/

use rand_distr::Normal;

use crate::error::{Error, Result};
use crate::variates::VariateSource;

/// A target density known up to a multiplicative constant.
pub trait Target {
    /// Log of the unnormalized density at `theta`. `-inf` means zero density.
    fn unnorm_log_prob(&self, theta: &[f64]) -> f64;
}

impl<F> Target for F
where
    F: Fn(&[f64]) -> f64,
{
    fn unnorm_log_prob(&self, theta: &[f64]) -> f64 {
        self(theta)
    }
}

/// A symmetric proposal: q(x' | x) = q(x | x').
pub trait Proposal {
    /// Draws a candidate centred on `current`.
    fn sample(&self, current: &[f64], source: &mut VariateSource) -> Result<Vec<f64>>;
}

/// Full conditional distributions for a Gibbs sampler.
///
/// A sweep first calls [`Conditional::draw_latent`] once, then [`Conditional::sample`] for
/// every coordinate in index order, each time with the partially updated state.
pub trait Conditional {
    /// Per-sweep auxiliary variables. Use `()` when the model has none.
    type Latent;

    /// Number of coordinates in the chain state.
    fn dim(&self) -> usize;

    /// Checks that `state` is an admissible starting point.
    fn validate(&self, _state: &[f64]) -> Result<()> {
        Ok(())
    }

    fn draw_latent(&self, given: &[f64], source: &mut VariateSource) -> Result<Self::Latent>;

    /// Draws coordinate `i` given every other coordinate and the sweep's latent block.
    fn sample(
        &self,
        i: usize,
        given: &[f64],
        latent: &Self::Latent,
        source: &mut VariateSource,
    ) -> Result<f64>;
}

/**
An isotropic Gaussian random-walk proposal: independent `Normal(0, std)` noise on
every coordinate.

```rust
use mini_mc::distributions::{IsotropicGaussian, Proposal};
use mini_mc::variates::VariateSource;

let proposal = IsotropicGaussian::new(0.5).unwrap();
let mut source = VariateSource::new().set_seed(1);
let candidate = proposal.sample(&[0.0, 1.0], &mut source).unwrap();
assert_eq!(candidate.len(), 2);
```
*/
#[derive(Debug, Clone)]
pub struct IsotropicGaussian {
    std: f64,
    noise: Normal<f64>,
}

impl IsotropicGaussian {
    pub fn new(std: f64) -> Result<Self> {
        if !(std.is_finite() && std > 0.0) {
            return Err(Error::invalid("std", std, "proposal scale must be positive"));
        }
        let noise = Normal::new(0.0, std)
            .map_err(|e| Error::Configuration(format!("could not build proposal: {e}")))?;
        Ok(Self { std, noise })
    }

    pub fn std(&self) -> f64 {
        self.std
    }
}

impl Proposal for IsotropicGaussian {
    fn sample(&self, current: &[f64], source: &mut VariateSource) -> Result<Vec<f64>> {
        Ok(current
            .iter()
            .map(|&x| x + source.sample(&self.noise))
            .collect())
    }
}

/// Prior density times the joint likelihood of independent observations.
///
/// With [`Posterior::new`] both `prior` and `likelihood` return plain densities; with
/// [`Posterior::from_log`] they return log-densities, which keeps far-tail points finite
/// where a plain density would underflow to 0. Either way the product is accumulated as a
/// sum of logs so that many observations do not underflow.
#[derive(Debug, Clone)]
pub struct Posterior<P, L> {
    prior: P,
    likelihood: L,
    data: Vec<f64>,
    log_densities: bool,
}

impl<P, L> Posterior<P, L>
where
    P: Fn(&[f64]) -> f64,
    L: Fn(f64, &[f64]) -> f64,
{
    pub fn new(prior: P, likelihood: L, data: Vec<f64>) -> Self {
        Self {
            prior,
            likelihood,
            data,
            log_densities: false,
        }
    }

    /// Like [`Posterior::new`], but `prior` and `likelihood` return log-densities.
    pub fn from_log(log_prior: P, log_likelihood: L, data: Vec<f64>) -> Self {
        Self {
            prior: log_prior,
            likelihood: log_likelihood,
            data,
            log_densities: true,
        }
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The unnormalized posterior density itself (may underflow for large data sets).
    pub fn density(&self, theta: &[f64]) -> f64 {
        self.unnorm_log_prob(theta).exp()
    }
}

impl<P, L> Target for Posterior<P, L>
where
    P: Fn(&[f64]) -> f64,
    L: Fn(f64, &[f64]) -> f64,
{
    fn unnorm_log_prob(&self, theta: &[f64]) -> f64 {
        let to_log = |v: f64| if self.log_densities { v } else { v.ln() };
        let mut lp = to_log((self.prior)(theta));
        for &x in &self.data {
            if lp == f64::NEG_INFINITY {
                break;
            }
            lp += to_log((self.likelihood)(x, theta));
        }
        lp
    }
}

/// Index of the Poisson rate λ in the zero-inflated chain state.
pub const ZIP_LAMBDA: usize = 0;
/// Index of the inclusion probability p in the zero-inflated chain state.
pub const ZIP_P: usize = 1;

/// Latent inclusion indicators `r_i` for one sweep of the zero-inflated sampler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicators {
    pub r: Vec<bool>,
    /// Σ r_i
    pub sum: u64,
}

/**
Full conditionals of the zero-inflated Poisson model

```text
x_i = r_i * y_i,  y_i ~ Poisson(λ),  r_i ~ Bernoulli(p)
λ ~ Gamma(a, b),  p ~ Uniform(0, 1)
```

with chain state `[λ, p]`:

```text
r_i | λ, p, x  = 1                                   if x_i > 0
               ~ Bernoulli(p e^-λ / (p e^-λ + 1 - p))  if x_i = 0
λ | p, r, x    ~ Gamma(a + Σx_i, b + Σr_i)
p | λ, r, x    ~ Beta(1 + Σr_i, n - Σr_i + 1)
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroInflatedPoisson {
    data: Vec<u64>,
    a: f64,
    b: f64,
    sum_x: f64,
}

impl ZeroInflatedPoisson {
    /// `a` and `b` are the shape and rate of the Gamma prior on λ.
    pub fn new(data: Vec<u64>, a: f64, b: f64) -> Result<Self> {
        if !(a.is_finite() && a > 0.0) {
            return Err(Error::invalid("a", a, "gamma prior shape must be positive"));
        }
        if !(b.is_finite() && b > 0.0) {
            return Err(Error::invalid("b", b, "gamma prior rate must be positive"));
        }
        let sum_x = data.iter().map(|&x| x as f64).sum();
        Ok(Self { data, a, b, sum_x })
    }

    pub fn data(&self) -> &[u64] {
        &self.data
    }

    /// Probability that a zero observation came from the Poisson component,
    /// `p e^-λ / (p e^-λ + 1 - p)`. Exact at both ends of `p` for any λ.
    pub fn inclusion_probability(lambda: f64, p: f64) -> f64 {
        if p == 1.0 {
            return 1.0;
        }
        1.0 / (1.0 + (1.0 - p) / p * lambda.exp())
    }

    /// Draws `n` synthetic observations from the model with known `lambda` and `p`.
    pub fn simulate(
        source: &mut VariateSource,
        n: usize,
        lambda: f64,
        p: f64,
    ) -> Result<Vec<u64>> {
        let y = source.poisson(n, lambda)?;
        let r = source.bernoulli(n, p)?;
        Ok(y.into_iter()
            .zip(r)
            .map(|(y, r)| if r { y } else { 0 })
            .collect())
    }
}

impl Conditional for ZeroInflatedPoisson {
    type Latent = Indicators;

    fn dim(&self) -> usize {
        2
    }

    fn validate(&self, state: &[f64]) -> Result<()> {
        if state.len() != 2 {
            return Err(Error::Configuration(format!(
                "zero-inflated Poisson state is [lambda, p], got {} coordinates",
                state.len()
            )));
        }
        let (lambda, p) = (state[ZIP_LAMBDA], state[ZIP_P]);
        if !(lambda.is_finite() && lambda > 0.0) {
            return Err(Error::invalid("lambda", lambda, "must be positive"));
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::invalid("p", p, "must lie in [0, 1]"));
        }
        Ok(())
    }

    fn draw_latent(&self, given: &[f64], source: &mut VariateSource) -> Result<Indicators> {
        let q = Self::inclusion_probability(given[ZIP_LAMBDA], given[ZIP_P]);
        if !q.is_finite() {
            return Err(Error::computation(
                given,
                "inclusion probability is not finite",
            ));
        }
        let mut sum = 0;
        let r = self
            .data
            .iter()
            .map(|&x| -> Result<bool> {
                let r = x > 0 || source.bernoulli_one(q)?;
                sum += r as u64;
                Ok(r)
            })
            .collect::<Result<Vec<bool>>>()?;
        Ok(Indicators { r, sum })
    }

    fn sample(
        &self,
        i: usize,
        _given: &[f64],
        latent: &Indicators,
        source: &mut VariateSource,
    ) -> Result<f64> {
        let sum_r = latent.sum as f64;
        match i {
            ZIP_LAMBDA => source.gamma_one(self.a + self.sum_x, self.b + sum_r),
            ZIP_P => source.beta_one(1.0 + sum_r, self.data.len() as f64 - sum_r + 1.0),
            _ => Err(Error::Configuration(format!(
                "zero-inflated Poisson has 2 coordinates, asked for index {i}"
            ))),
        }
    }
}
