//! Summaries of sampled chains for the reporting side: per-coordinate moments and
//! equal-width histograms.

use ndarray::prelude::*;

use crate::core::discard_burn_in;
use crate::error::{Error, Result};
use crate::estimator::RunningEstimator;

#[derive(Debug, Clone, PartialEq)]
pub struct ChainSummary {
    /// Rows kept after burn-in.
    pub n: usize,
    pub mean: Array1<f64>,     // n_params
    pub variance: Array1<f64>, // n_params, population variance
}

/// Per-coordinate mean and variance of `samples` (rows = iterations) after dropping the
/// first `discard` rows.
pub fn summarize(samples: &Array2<f64>, discard: usize) -> Result<ChainSummary> {
    let kept = discard_burn_in(samples, discard);
    if kept.nrows() == 0 {
        return Err(Error::Domain(format!(
            "no samples left to summarize ({} rows, {} discarded)",
            samples.nrows(),
            discard
        )));
    }

    let estimators: Vec<RunningEstimator> = kept
        .axis_iter(Axis(1))
        .map(|column| RunningEstimator::from_values(column.iter().copied()))
        .collect();
    let mean = estimators
        .iter()
        .map(RunningEstimator::estimate)
        .collect::<Result<Array1<f64>>>()?;
    let variance = estimators
        .iter()
        .map(RunningEstimator::variance)
        .collect::<Result<Array1<f64>>>()?;

    Ok(ChainSummary {
        n: kept.nrows(),
        mean,
        variance,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` increasing bin edges spanning `[min, max]`.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Bin midpoints, convenient for plotting.
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }
}

/// Counts `values` into `bins` equal-width bins over `[min, max]`. The last bin is closed
/// on the right so the maximum is counted.
pub fn histogram(values: &[f64], bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(Error::Configuration(
            "a histogram needs at least one bin".to_string(),
        ));
    }
    if values.is_empty() {
        return Err(Error::Domain("cannot bin an empty sample".to_string()));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(Error::Domain(format!("cannot bin non-finite value {bad}")));
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A constant sample still gets a bin of positive width.
    let (lo, hi) = if min < max { (min, max) } else { (min - 0.5, max + 0.5) };
    let width = (hi - lo) / bins as f64;
    if !width.is_finite() {
        return Err(Error::Domain(format!(
            "value range [{lo}, {hi}] is too wide to bin"
        )));
    }

    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(Histogram { edges, counts })
}
