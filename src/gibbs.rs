/*!
# Gibbs Sampler

Cycles through the full conditional distributions of a [`Conditional`] model in a fixed
order. One sweep is

1. draw the model's latent block (e.g. the zero-inflation indicators) from the current
   state,
2. draw coordinate `0`, then `1`, ... each from its full conditional given the latent
   block and the *most recently updated* values of the other coordinates.

The latent block lives only for the duration of the sweep; the history records the
parameter vector after each sweep.

## Example

```rust
use mini_mc::distributions::{ZeroInflatedPoisson, ZIP_LAMBDA};
use mini_mc::gibbs::zip_sampler;
use mini_mc::variates::VariateSource;

let mut source = VariateSource::new().set_seed(7);
let data = ZeroInflatedPoisson::simulate(&mut source, 2_000, 2.0, 0.3).unwrap();

let mut sampler = zip_sampler(data, 1.0, 1.0, (0.5, 0.5)).unwrap().set_seed(7);
sampler.run(200).unwrap();
assert_eq!(sampler.history().len(), 200);
assert!(sampler.history().iter().all(|s| s[ZIP_LAMBDA] > 0.0));
```
*/

use log::debug;
use ndarray::Array2;

use crate::core::{history_to_array, MarkovChain};
use crate::distributions::{Conditional, ZeroInflatedPoisson};
use crate::error::{Error, Result};
use crate::variates::VariateSource;

/// A single Gibbs chain over the coordinates of `D`.
#[derive(Debug, Clone)]
pub struct GibbsSampler<D> {
    /// The model that provides conditional samples.
    target: D,

    /// Current state of the Markov chain.
    current_state: Vec<f64>,

    /// Variate source for this chain.
    source: VariateSource,

    /// State after every completed sweep, oldest first.
    history: Vec<Vec<f64>>,
}

impl<D: Conditional> GibbsSampler<D> {
    /// Creates a chain with a given model and initial state.
    pub fn new(target: D, initial_state: &[f64]) -> Result<Self> {
        if initial_state.len() != target.dim() {
            return Err(Error::Configuration(format!(
                "model has {} coordinates, initial state has {}",
                target.dim(),
                initial_state.len()
            )));
        }
        target.validate(initial_state)?;
        Ok(Self {
            target,
            current_state: initial_state.to_vec(),
            source: VariateSource::new(),
            history: Vec::new(),
        })
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.source = self.source.set_seed(seed);
        self
    }

    pub fn seed(&self) -> u64 {
        self.source.seed()
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    /// Performs one full sweep in coordinate order and appends the result to the history.
    pub fn sweep(&mut self) -> Result<&[f64]> {
        let latent = self.target.draw_latent(&self.current_state, &mut self.source)?;
        for i in 0..self.current_state.len() {
            let value = self
                .target
                .sample(i, &self.current_state, &latent, &mut self.source)?;
            if !value.is_finite() {
                return Err(Error::computation(
                    &self.current_state,
                    format!("full conditional for coordinate {i} produced {value}"),
                ));
            }
            self.current_state[i] = value;
        }
        self.history.push(self.current_state.clone());
        Ok(&self.current_state)
    }

    /// Runs `n_sweeps` sweeps.
    pub fn run(&mut self, n_sweeps: usize) -> Result<()> {
        for _ in 0..n_sweeps {
            self.sweep()?;
        }
        debug!(
            "gibbs: {} sweeps, current state {:?}",
            self.history.len(),
            self.current_state
        );
        Ok(())
    }

    pub fn history(&self) -> &[Vec<f64>] {
        &self.history
    }

    pub fn history_array(&self) -> Array2<f64> {
        history_to_array(&self.history, self.current_state.len())
    }

    pub fn into_history(self) -> Vec<Vec<f64>> {
        self.history
    }
}

impl<D: Conditional> MarkovChain<f64> for GibbsSampler<D> {
    fn step(&mut self) -> Result<&[f64]> {
        self.sweep()
    }

    fn current_state(&self) -> &[f64] {
        &self.current_state
    }
}

/// Gibbs sampler for the zero-inflated Poisson model with a Gamma(`a`, `b`) prior on λ,
/// started at `(lambda0, p0)`.
pub fn zip_sampler(
    data: Vec<u64>,
    a: f64,
    b: f64,
    (lambda0, p0): (f64, f64),
) -> Result<GibbsSampler<ZeroInflatedPoisson>> {
    GibbsSampler::new(ZeroInflatedPoisson::new(data, a, b)?, &[lambda0, p0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{discard_burn_in, run_chain};
    use crate::distributions::{ZIP_LAMBDA, ZIP_P};

    /// A dummy conditional distribution that always returns the same constant value.
    #[derive(Clone)]
    struct ConstantConditional {
        c: f64,
        dim: usize,
    }

    impl Conditional for ConstantConditional {
        type Latent = ();

        fn dim(&self) -> usize {
            self.dim
        }

        fn draw_latent(&self, _given: &[f64], _source: &mut VariateSource) -> Result<()> {
            Ok(())
        }

        fn sample(
            &self,
            _i: usize,
            _given: &[f64],
            _latent: &(),
            _source: &mut VariateSource,
        ) -> Result<f64> {
            Ok(self.c)
        }
    }

    /// Records the order of updates: coordinate i becomes 1 + the value of coordinate i-1.
    struct Chained;

    impl Conditional for Chained {
        type Latent = f64;

        fn dim(&self) -> usize {
            3
        }

        fn draw_latent(&self, given: &[f64], _source: &mut VariateSource) -> Result<f64> {
            Ok(given[2])
        }

        fn sample(
            &self,
            i: usize,
            given: &[f64],
            latent: &f64,
            _source: &mut VariateSource,
        ) -> Result<f64> {
            Ok(if i == 0 { latent + 1.0 } else { given[i - 1] + 1.0 })
        }
    }

    #[test]
    fn test_gibbs_chain_step() {
        let conditional = ConstantConditional { c: 7.0, dim: 3 };
        let mut chain = GibbsSampler::new(conditional, &[0.0, 0.0, 0.0]).unwrap();

        chain.step().unwrap();
        for &x in chain.current_state().iter() {
            assert!((x - 7.0).abs() < f64::EPSILON, "Expected 7.0, got {}", x);
        }
    }

    #[test]
    fn sweep_uses_most_recent_values() {
        let mut chain = GibbsSampler::new(Chained, &[0.0, 0.0, 10.0]).unwrap();
        chain.sweep().unwrap();
        // Latent reads the old last coordinate, then each coordinate builds on the new one.
        assert_eq!(chain.current_state(), &[11.0, 12.0, 13.0]);
        chain.sweep().unwrap();
        assert_eq!(chain.current_state(), &[14.0, 15.0, 16.0]);
        assert_eq!(chain.history().len(), 2);
    }

    #[test]
    fn run_chain_rows_match_history() {
        let conditional = ConstantConditional { c: 42.0, dim: 2 };
        let mut sampler = GibbsSampler::new(conditional, &[0.0, 0.0]).unwrap();
        let samples = run_chain(&mut sampler, 10).unwrap();
        let kept = discard_burn_in(&samples, 5);
        assert_eq!(kept.shape(), &[5, 2]);
        assert_eq!(samples, sampler.history_array());
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let conditional = ConstantConditional { c: 1.0, dim: 2 };
        assert!(matches!(
            GibbsSampler::new(conditional, &[0.0]),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn zip_rejects_invalid_configuration() {
        assert!(matches!(
            zip_sampler(vec![0, 1], -1.0, 1.0, (0.5, 0.5)),
            Err(Error::InvalidParameter { name: "a", .. })
        ));
        assert!(matches!(
            zip_sampler(vec![0, 1], 1.0, 0.0, (0.5, 0.5)),
            Err(Error::InvalidParameter { name: "b", .. })
        ));
        assert!(zip_sampler(vec![0, 1], 1.0, 1.0, (0.0, 0.5)).is_err());
        assert!(zip_sampler(vec![0, 1], 1.0, 1.0, (0.5, -0.1)).is_err());
    }

    #[test]
    fn zip_without_observations_samples_the_prior() {
        let (a, b) = (4.0, 2.0);
        let mut sampler = zip_sampler(Vec::new(), a, b, (0.5, 0.5))
            .unwrap()
            .set_seed(99);
        sampler.run(20_000).unwrap();
        let n = sampler.history().len() as f64;
        let lambda_mean = sampler.history().iter().map(|s| s[ZIP_LAMBDA]).sum::<f64>() / n;
        let p_mean = sampler.history().iter().map(|s| s[ZIP_P]).sum::<f64>() / n;
        assert!((lambda_mean - a / b).abs() < 0.05, "lambda mean {lambda_mean}");
        assert!((p_mean - 0.5).abs() < 0.02, "p mean {p_mean}");
    }

    #[test]
    fn zip_same_seed_same_chain() {
        let data = vec![0, 0, 3, 1, 0, 2, 0, 5, 0, 0];
        let mut a = zip_sampler(data.clone(), 1.0, 1.0, (0.5, 0.5))
            .unwrap()
            .set_seed(2025);
        let mut b = zip_sampler(data, 1.0, 1.0, (0.5, 0.5))
            .unwrap()
            .set_seed(2025);
        a.run(300).unwrap();
        b.run(300).unwrap();
        assert_eq!(a.history(), b.history());
        assert_eq!(a.seed(), 2025);
    }
}
