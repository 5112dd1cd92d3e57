//! Chain-driving machinery shared by the Metropolis and Gibbs samplers.
//!
//! A chain exposes one explicit transition ([`MarkovChain::step`]); everything here is a
//! loop around it. Steps of a single chain are strictly sequential, so a host that wants
//! cancellation can simply stop calling `step` between iterations.

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{s, Array2, ArrayView1};
use num_traits::Zero;

use crate::error::Result;

pub trait MarkovChain<S> {
    /// Does one iteration of the chain, returning the new current state.
    fn step(&mut self) -> Result<&[S]>;

    /// Get the current state without stepping.
    fn current_state(&self) -> &[S];
}

/// Runs `n_steps` transitions and returns them as an `n_steps × dim` array.
pub fn run_chain<S, M>(chain: &mut M, n_steps: usize) -> Result<Array2<S>>
where
    M: MarkovChain<S>,
    S: Clone + Zero,
{
    let dim = chain.current_state().len();
    let mut out = Array2::<S>::zeros((n_steps, dim));

    for i in 0..n_steps {
        let state = chain.step()?;
        out.row_mut(i).assign(&ArrayView1::from(state));
    }

    Ok(out)
}

pub fn run_chain_with_progress<S, M>(
    chain: &mut M,
    n_steps: usize,
    pb: &ProgressBar,
) -> Result<Array2<S>>
where
    M: MarkovChain<S>,
    S: Clone + Zero,
{
    let dim = chain.current_state().len();
    let mut out = Array2::<S>::zeros((n_steps, dim));

    pb.set_length(n_steps as u64);

    for i in 0..n_steps {
        let state = chain.step()?;
        out.row_mut(i).assign(&ArrayView1::from(state));

        pb.inc(1);
    }

    pb.finish_with_message("Done!");
    Ok(out)
}

/// A progress bar in the crate's house style.
pub fn progress_bar(n_steps: usize, prefix: &str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    let pb = ProgressBar::new(n_steps as u64);
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb
}

/// Drops the first `discard` rows (burn-in). Discarding everything yields an empty array.
pub fn discard_burn_in<S: Clone>(samples: &Array2<S>, discard: usize) -> Array2<S> {
    let start = discard.min(samples.nrows());
    samples.slice(s![start.., ..]).to_owned()
}

/// Packs a history of equally-sized states into an `n × dim` array.
pub(crate) fn history_to_array(history: &[Vec<f64>], dim: usize) -> Array2<f64> {
    Array2::from_shape_fn((history.len(), dim), |(i, j)| history[i][j])
}
