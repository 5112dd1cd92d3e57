/*!
# Metropolis Sampler

A single-chain random-walk Metropolis sampler for a target density known up to a
constant. The proposal is symmetric, so the acceptance probability is the plain ratio

```text
α = min(1, π(θ') / π(θ))
```

computed in log space from [`Target::unnorm_log_prob`].

## Bounded support

An optional [`Bounds`] box restricts the admissible states. A proposal that falls outside
the box is *abstained*: the chain stays where it is for that step and no acceptance test
is performed. Out-of-range proposals are never clamped to the boundary.

## Example

```rust
use mini_mc::distributions::IsotropicGaussian;
use mini_mc::metropolis::{Bounds, MetropolisSampler};

// Standard normal restricted to [-1, 1].
let target = |theta: &[f64]| -0.5 * theta[0] * theta[0];
let proposal = IsotropicGaussian::new(0.5).unwrap();

let mut sampler = MetropolisSampler::new(target, proposal, &[0.0])
    .unwrap()
    .with_bounds(Bounds::interval(-1.0, 1.0).unwrap())
    .unwrap()
    .set_seed(42);

sampler.run(1_000).unwrap();
assert_eq!(sampler.history().len(), 1_000);
assert!(sampler.history().iter().all(|s| (-1.0..=1.0).contains(&s[0])));
```
*/

use log::{debug, warn};
use ndarray::Array2;

use crate::core::{history_to_array, MarkovChain};
use crate::distributions::{Proposal, Target};
use crate::error::{Error, Result};
use crate::variates::VariateSource;

/// A closed box `[lo, hi]` of admissible states.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lo: Vec<f64>,
    hi: Vec<f64>,
}

impl Bounds {
    pub fn new(lo: Vec<f64>, hi: Vec<f64>) -> Result<Self> {
        if lo.is_empty() || lo.len() != hi.len() {
            return Err(Error::Configuration(format!(
                "bounds need matching non-empty lo/hi, got {} and {} coordinates",
                lo.len(),
                hi.len()
            )));
        }
        if let Some((l, h)) = lo.iter().zip(&hi).find(|(l, h)| !(l < h)) {
            return Err(Error::Configuration(format!(
                "bounds must satisfy lo < hi, got [{l}, {h}]"
            )));
        }
        Ok(Self { lo, hi })
    }

    /// One-dimensional bounds.
    pub fn interval(lo: f64, hi: f64) -> Result<Self> {
        Self::new(vec![lo], vec![hi])
    }

    pub fn dim(&self) -> usize {
        self.lo.len()
    }

    pub fn contains(&self, theta: &[f64]) -> bool {
        theta.len() == self.lo.len()
            && theta
                .iter()
                .zip(self.lo.iter().zip(&self.hi))
                .all(|(x, (lo, hi))| lo <= x && x <= hi)
    }
}

/// What happened during one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected,
    /// The proposal left the admissible box; the step was abstained.
    OutOfBounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub outcome: Outcome,
    /// Acceptance probability used for the decision (0 when out of bounds).
    pub alpha: f64,
}

/// `min(1, proposed / current)` for unnormalized posterior densities.
///
/// Returns exactly `1.0` whenever `proposed >= current`. A zero `current` makes the ratio
/// undefined and is a [`Error::Domain`].
pub fn acceptance_probability(proposed: f64, current: f64) -> Result<f64> {
    if !(proposed >= 0.0 && current >= 0.0) || proposed.is_infinite() || current.is_infinite() {
        return Err(Error::Domain(format!(
            "posterior densities must be finite and non-negative, got {proposed} / {current}"
        )));
    }
    if current == 0.0 {
        return Err(Error::Domain(
            "posterior density at the current state is zero".to_string(),
        ));
    }
    if proposed >= current {
        return Ok(1.0);
    }
    Ok(proposed / current)
}

/// The same acceptance probability from log densities: `exp(min(0, lp_prop - lp_curr))`.
pub fn log_acceptance_probability(lp_proposed: f64, lp_current: f64) -> Result<f64> {
    if lp_current == f64::NEG_INFINITY {
        return Err(Error::Domain(
            "posterior density at the current state is zero".to_string(),
        ));
    }
    let undefined = |lp: f64| lp.is_nan() || lp == f64::INFINITY;
    if undefined(lp_proposed) || undefined(lp_current) {
        return Err(Error::Domain(format!(
            "log posterior must be finite or -inf, got {lp_proposed} / {lp_current}"
        )));
    }
    if lp_proposed >= lp_current {
        return Ok(1.0);
    }
    Ok((lp_proposed - lp_current).exp())
}

/// Evaluates the target and rejects NaN / +inf as a computation error at `theta`.
fn checked_log_prob<D: Target>(target: &D, theta: &[f64]) -> Result<f64> {
    let lp = target.unnorm_log_prob(theta);
    if lp.is_nan() || lp == f64::INFINITY {
        return Err(Error::computation(
            theta,
            format!("target log density evaluated to {lp}"),
        ));
    }
    Ok(lp)
}

/**
A single Metropolis chain: target, symmetric proposal, optional bounds, its own
[`VariateSource`], and the append-only history of visited states.

Given the same seed and parameters, two samplers produce bit-identical histories.
*/
#[derive(Debug, Clone)]
pub struct MetropolisSampler<D, Q> {
    target: D,
    proposal: Q,
    bounds: Option<Bounds>,
    current_state: Vec<f64>,
    current_log_prob: f64,
    source: VariateSource,
    history: Vec<Vec<f64>>,
    n_accepted: u64,
    n_out_of_bounds: u64,
}

impl<D, Q> MetropolisSampler<D, Q>
where
    D: Target,
    Q: Proposal,
{
    /// Creates a chain at `initial_state`, which must have strictly positive posterior
    /// density.
    pub fn new(target: D, proposal: Q, initial_state: &[f64]) -> Result<Self> {
        if initial_state.is_empty() {
            return Err(Error::Configuration(
                "initial state must have at least one coordinate".to_string(),
            ));
        }
        let current_log_prob = checked_log_prob(&target, initial_state)?;
        if current_log_prob == f64::NEG_INFINITY {
            return Err(Error::Domain(format!(
                "initial state {initial_state:?} has zero posterior density"
            )));
        }
        Ok(Self {
            target,
            proposal,
            bounds: None,
            current_state: initial_state.to_vec(),
            current_log_prob,
            source: VariateSource::new(),
            history: Vec::new(),
            n_accepted: 0,
            n_out_of_bounds: 0,
        })
    }

    /// Restricts the chain to `bounds`. The current state must already lie inside.
    pub fn with_bounds(mut self, bounds: Bounds) -> Result<Self> {
        if bounds.dim() != self.current_state.len() {
            return Err(Error::Configuration(format!(
                "bounds have {} coordinates, state has {}",
                bounds.dim(),
                self.current_state.len()
            )));
        }
        if !bounds.contains(&self.current_state) {
            return Err(Error::Configuration(format!(
                "initial state {:?} lies outside the bounds",
                self.current_state
            )));
        }
        self.bounds = Some(bounds);
        Ok(self)
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.source = self.source.set_seed(seed);
        self
    }

    pub fn seed(&self) -> u64 {
        self.source.seed()
    }

    /// One Metropolis transition; the resulting state is appended to the history.
    pub fn transition(&mut self) -> Result<Transition> {
        let proposed = self.proposal.sample(&self.current_state, &mut self.source)?;
        if proposed.len() != self.current_state.len() {
            return Err(Error::Configuration(format!(
                "proposal returned {} coordinates, state has {}",
                proposed.len(),
                self.current_state.len()
            )));
        }

        let transition = match &self.bounds {
            Some(bounds) if !bounds.contains(&proposed) => {
                self.n_out_of_bounds += 1;
                Transition {
                    outcome: Outcome::OutOfBounds,
                    alpha: 0.0,
                }
            }
            _ => {
                let proposed_lp = checked_log_prob(&self.target, &proposed)?;
                let alpha = log_acceptance_probability(proposed_lp, self.current_log_prob)?;
                let u = self.source.uniform01();
                if u < alpha {
                    self.current_state = proposed;
                    self.current_log_prob = proposed_lp;
                    self.n_accepted += 1;
                    Transition {
                        outcome: Outcome::Accepted,
                        alpha,
                    }
                } else {
                    Transition {
                        outcome: Outcome::Rejected,
                        alpha,
                    }
                }
            }
        };

        self.history.push(self.current_state.clone());
        Ok(transition)
    }

    /// Runs `n_steps` transitions.
    pub fn run(&mut self, n_steps: usize) -> Result<()> {
        for _ in 0..n_steps {
            self.transition()?;
        }
        let rate = self.acceptance_rate();
        debug!(
            "metropolis: {} steps, acceptance rate {:.3}, {} out of bounds",
            self.history.len(),
            rate,
            self.n_out_of_bounds
        );
        if self.history.len() >= 100 && !(0.05..=0.95).contains(&rate) {
            warn!("metropolis: acceptance rate {rate:.3} suggests a poorly scaled proposal");
        }
        Ok(())
    }

    pub fn current_log_prob(&self) -> f64 {
        self.current_log_prob
    }

    /// Every state after each transition, oldest first.
    pub fn history(&self) -> &[Vec<f64>] {
        &self.history
    }

    pub fn history_array(&self) -> Array2<f64> {
        history_to_array(&self.history, self.current_state.len())
    }

    pub fn into_history(self) -> Vec<Vec<f64>> {
        self.history
    }

    /// Fraction of transitions that moved the chain. Zero before the first step.
    pub fn acceptance_rate(&self) -> f64 {
        if self.history.is_empty() {
            0.0
        } else {
            self.n_accepted as f64 / self.history.len() as f64
        }
    }

    pub fn out_of_bounds_count(&self) -> u64 {
        self.n_out_of_bounds
    }
}

impl<D, Q> MarkovChain<f64> for MetropolisSampler<D, Q>
where
    D: Target,
    Q: Proposal,
{
    fn step(&mut self) -> Result<&[f64]> {
        self.transition()?;
        Ok(&self.current_state)
    }

    fn current_state(&self) -> &[f64] {
        &self.current_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::run_chain;
    use crate::densities::{dgamma, dpois};
    use crate::distributions::{IsotropicGaussian, Posterior};

    /// Always proposes the same point.
    struct FixedProposal(Vec<f64>);

    impl Proposal for FixedProposal {
        fn sample(&self, _current: &[f64], _source: &mut VariateSource) -> Result<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    fn flat(_: &[f64]) -> f64 {
        0.0
    }

    #[test]
    fn alpha_is_a_probability() {
        let values = [0.0, 1e-300, 0.1, 0.5, 1.0, 2.0, 1e10];
        for &prop in &values {
            for &curr in values.iter().filter(|&&c| c > 0.0) {
                let alpha = acceptance_probability(prop, curr).unwrap();
                assert!((0.0..=1.0).contains(&alpha), "alpha {alpha} for {prop}/{curr}");
                if prop >= curr {
                    assert_eq!(alpha, 1.0);
                }

                let log_alpha = log_acceptance_probability(prop.ln(), curr.ln()).unwrap();
                assert!((0.0..=1.0).contains(&log_alpha));
                if prop >= curr {
                    assert_eq!(log_alpha, 1.0);
                }
            }
        }
    }

    #[test]
    fn zero_current_posterior_is_a_domain_error() {
        assert!(matches!(
            acceptance_probability(0.5, 0.0),
            Err(Error::Domain(_))
        ));
        assert!(matches!(
            log_acceptance_probability(-1.0, f64::NEG_INFINITY),
            Err(Error::Domain(_))
        ));
        assert!(acceptance_probability(-0.5, 1.0).is_err());
        assert!(acceptance_probability(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn out_of_bounds_proposal_keeps_current_state() {
        let mut sampler = MetropolisSampler::new(flat, FixedProposal(vec![2.3]), &[1.0])
            .unwrap()
            .with_bounds(Bounds::interval(0.0, 2.0).unwrap())
            .unwrap()
            .set_seed(3);

        let transition = sampler.transition().unwrap();
        assert_eq!(transition.outcome, Outcome::OutOfBounds);
        assert_eq!(transition.alpha, 0.0);
        assert_eq!(sampler.current_state(), &[1.0]);
        assert_eq!(sampler.history(), &[vec![1.0]]);
        assert_eq!(sampler.out_of_bounds_count(), 1);
    }

    #[test]
    fn bounds_are_closed() {
        let mut sampler = MetropolisSampler::new(flat, FixedProposal(vec![2.0]), &[1.0])
            .unwrap()
            .with_bounds(Bounds::interval(0.0, 2.0).unwrap())
            .unwrap();
        // Flat target: alpha = 1, so an in-bounds proposal is always accepted.
        let transition = sampler.transition().unwrap();
        assert_eq!(transition.outcome, Outcome::Accepted);
        assert_eq!(sampler.current_state(), &[2.0]);
    }

    #[test]
    fn malformed_configuration_is_rejected() {
        assert!(matches!(
            Bounds::interval(2.0, 2.0),
            Err(Error::Configuration(_))
        ));
        assert!(Bounds::new(vec![0.0, 0.0], vec![1.0]).is_err());

        let proposal = IsotropicGaussian::new(1.0).unwrap();
        let outside = MetropolisSampler::new(flat, proposal.clone(), &[3.0])
            .unwrap()
            .with_bounds(Bounds::interval(0.0, 2.0).unwrap());
        assert!(matches!(outside, Err(Error::Configuration(_))));

        let zero_start = MetropolisSampler::new(
            |_: &[f64]| f64::NEG_INFINITY,
            proposal.clone(),
            &[0.0],
        );
        assert!(matches!(zero_start, Err(Error::Domain(_))));

        let nan_start = MetropolisSampler::new(|_: &[f64]| f64::NAN, proposal, &[0.0]);
        assert!(matches!(nan_start, Err(Error::Computation { .. })));
    }

    #[test]
    fn nan_target_surfaces_with_offending_state() {
        let target = |theta: &[f64]| if theta[0] > 5.0 { f64::NAN } else { 0.0 };
        let mut sampler =
            MetropolisSampler::new(target, FixedProposal(vec![6.0]), &[0.0]).unwrap();
        match sampler.transition() {
            Err(Error::Computation { x, .. }) => assert_eq!(x, vec![6.0]),
            other => panic!("expected computation error, got {other:?}"),
        }
    }

    #[test]
    fn zero_density_proposals_are_rejected() {
        let target = |theta: &[f64]| {
            if theta[0] < 0.0 {
                f64::NEG_INFINITY
            } else {
                0.0
            }
        };
        let mut sampler =
            MetropolisSampler::new(target, FixedProposal(vec![-1.0]), &[0.5]).unwrap();
        let transition = sampler.transition().unwrap();
        assert_eq!(transition.outcome, Outcome::Rejected);
        assert_eq!(transition.alpha, 0.0);
        assert_eq!(sampler.current_state(), &[0.5]);
    }

    #[test]
    fn same_seed_same_chain() {
        let make = || {
            MetropolisSampler::new(
                |theta: &[f64]| -0.5 * (theta[0] * theta[0] + theta[1] * theta[1]),
                IsotropicGaussian::new(0.8).unwrap(),
                &[0.0, 0.0],
            )
            .unwrap()
            .set_seed(42)
        };
        let mut a = make();
        let mut b = make();
        a.run(500).unwrap();
        b.run(500).unwrap();
        assert_eq!(a.history(), b.history());
        assert_eq!(a.acceptance_rate(), b.acceptance_rate());

        let mut c = make().set_seed(43);
        c.run(500).unwrap();
        assert_ne!(a.history(), c.history());
    }

    #[test]
    fn markov_chain_rows_match_history() {
        let mut sampler = MetropolisSampler::new(
            |theta: &[f64]| -theta[0].abs(),
            IsotropicGaussian::new(1.0).unwrap(),
            &[0.0],
        )
        .unwrap()
        .set_seed(9);
        let rows = run_chain(&mut sampler, 50).unwrap();
        assert_eq!(rows, sampler.history_array());
    }

    #[test]
    fn poisson_rate_posterior_mean() {
        let mut source = VariateSource::new().set_seed(17);
        let data: Vec<f64> = source
            .poisson(50, 3.0)
            .unwrap()
            .into_iter()
            .map(|k| k as f64)
            .collect();
        let (a, b) = (2.0, 1.0);
        let exact_mean = (a + data.iter().sum::<f64>()) / (b + data.len() as f64);

        let posterior = Posterior::new(
            move |theta: &[f64]| dgamma(theta[0], a, b),
            |x: f64, theta: &[f64]| dpois(x as u64, theta[0]),
            data,
        );
        let mut sampler = MetropolisSampler::new(
            posterior,
            IsotropicGaussian::new(0.4).unwrap(),
            &[1.0],
        )
        .unwrap()
        .with_bounds(Bounds::interval(0.0, 10.0).unwrap())
        .unwrap()
        .set_seed(1234);

        sampler.run(20_000).unwrap();
        let kept = &sampler.history()[2_000..];
        let mean = kept.iter().map(|s| s[0]).sum::<f64>() / kept.len() as f64;
        assert!(
            (mean - exact_mean).abs() < 0.05,
            "chain mean {mean}, conjugate mean {exact_mean}"
        );
        let rate = sampler.acceptance_rate();
        assert!(rate > 0.2 && rate < 0.9, "acceptance rate {rate}");
    }
}
