//! Running point estimate, standard error and confidence interval for a stream of draws.
//!
//! The accumulator keeps `(n, mean, M2)` and updates them with Welford's recurrence.
//! This is the same information as the raw `(n, S, Q)` sums (`S = n * mean`,
//! `Q = M2 + n * mean^2`) without the cancellation that `Q/n - mean^2` suffers when the
//! mean is large compared to the spread.
//!
//! The standard error assumes the observed values are i.i.d. with a finite second moment.
//! Heavy-tailed inputs (e.g. importance weights from a proposal with lighter tails than
//! the target) still produce a number, but it is not a reliable error bar.

use crate::error::{Error, Result};

/// Normal quantile for a two-sided 95% interval.
pub const DEFAULT_Z: f64 = 1.96;

/// Incremental mean/variance accumulator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningEstimator {
    n: u64,
    mean: f64,
    m2: f64,
}

/// A finished estimate with its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub estimate: f64,
    pub standard_error: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub n: u64,
}

impl Estimate {
    /// Whether `value` lies inside the closed confidence interval.
    pub fn covers(&self, value: f64) -> bool {
        self.ci_lower <= value && value <= self.ci_upper
    }
}

impl RunningEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch construction from an iterator of values.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut est = Self::new();
        est.observe_all(values);
        est
    }

    /// Adds one value in O(1).
    pub fn observe(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn observe_all<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        values.into_iter().for_each(|x| self.observe(x));
    }

    /// Combines an independent accumulator into this one (Chan et al. pairwise update).
    pub fn merge(&mut self, other: &RunningEstimator) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = other.clone();
            return;
        }
        let n_a = self.n as f64;
        let n_b = other.n as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;
        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.n += other.n;
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    fn require_observations(&self, what: &str) -> Result<f64> {
        if self.n == 0 {
            Err(Error::Domain(format!("{what} is undefined with zero observations")))
        } else {
            Ok(self.n as f64)
        }
    }

    /// Running sum `S`.
    pub fn sum(&self) -> f64 {
        self.mean * self.n as f64
    }

    /// Running sum of squares `Q`.
    pub fn sum_of_squares(&self) -> f64 {
        self.m2 + self.mean * self.mean * self.n as f64
    }

    /// `S / n`.
    pub fn estimate(&self) -> Result<f64> {
        self.require_observations("estimate")?;
        Ok(self.mean)
    }

    /// Population second central moment `Q/n - (S/n)^2`, never negative.
    pub fn variance(&self) -> Result<f64> {
        let n = self.require_observations("variance")?;
        Ok((self.m2 / n).max(0.0))
    }

    /// `sqrt((Q/n - estimate^2) / n)`.
    pub fn standard_error(&self) -> Result<f64> {
        let n = self.require_observations("standard error")?;
        Ok((self.variance()? / n).sqrt())
    }

    /// `[estimate - z * se, estimate + z * se]`.
    pub fn confidence_interval(&self, z: f64) -> Result<(f64, f64)> {
        let est = self.estimate()?;
        let se = self.standard_error()?;
        Ok((est - z * se, est + z * se))
    }

    pub fn summary(&self, z: f64) -> Result<Estimate> {
        let (ci_lower, ci_upper) = self.confidence_interval(z)?;
        Ok(Estimate {
            estimate: self.estimate()?,
            standard_error: self.standard_error()?,
            ci_lower,
            ci_upper,
            n: self.n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn matches_closed_form_sums() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let est = RunningEstimator::from_values(xs);

        let n = xs.len() as f64;
        let s: f64 = xs.iter().sum();
        let q: f64 = xs.iter().map(|x| x * x).sum();

        assert_eq!(est.count(), 8);
        assert_abs_diff_eq!(est.sum(), s, epsilon = 1e-12);
        assert_abs_diff_eq!(est.sum_of_squares(), q, epsilon = 1e-9);
        assert_abs_diff_eq!(est.estimate().unwrap(), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(est.variance().unwrap(), 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            est.standard_error().unwrap(),
            ((q / n - (s / n).powi(2)) / n).sqrt(),
            epsilon = 1e-12
        );

        let (lo, hi) = est.confidence_interval(DEFAULT_Z).unwrap();
        assert_abs_diff_eq!(hi - lo, 2.0 * DEFAULT_Z * (0.5_f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn empty_estimator_is_a_domain_error() {
        let est = RunningEstimator::new();
        assert!(matches!(est.estimate(), Err(Error::Domain(_))));
        assert!(matches!(est.standard_error(), Err(Error::Domain(_))));
        assert!(matches!(
            est.confidence_interval(DEFAULT_Z),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn single_observation_is_computable() {
        let est = RunningEstimator::from_values([3.5]);
        let summary = est.summary(DEFAULT_Z).unwrap();
        assert_eq!(summary.estimate, 3.5);
        assert!(summary.standard_error.is_finite());
        assert!(summary.covers(3.5));
    }

    #[test]
    fn large_offset_keeps_variance_nonnegative() {
        let est = RunningEstimator::from_values((0..1000).map(|i| 1e9 + (i % 2) as f64));
        assert_abs_diff_eq!(est.variance().unwrap(), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn merge_equals_sequential() {
        let xs: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin()).collect();
        let all = RunningEstimator::from_values(xs.iter().copied());

        let mut left = RunningEstimator::from_values(xs[..20].iter().copied());
        let right = RunningEstimator::from_values(xs[20..].iter().copied());
        left.merge(&right);

        assert_eq!(left.count(), all.count());
        assert_abs_diff_eq!(left.estimate().unwrap(), all.estimate().unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(left.variance().unwrap(), all.variance().unwrap(), epsilon = 1e-12);

        let mut empty = RunningEstimator::new();
        empty.merge(&all);
        assert_eq!(empty, all);
    }
}
