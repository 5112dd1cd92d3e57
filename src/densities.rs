//! Closed-form density and mass functions used to build posteriors and importance weights.
//!
//! Evaluators are total: points outside the support give `0.0` (log `-inf`), and invalid
//! parameters give `NaN` so that a bad setup surfaces as a computation error downstream
//! rather than as a silently-zero weight.

use std::f64::consts::PI;

use statrs::function::beta::ln_beta;
use statrs::function::gamma::ln_gamma;

/// `a * ln(x)` with the convention `0 * ln(0) = 0`.
fn xlogy(a: f64, x: f64) -> f64 {
    if a == 0.0 {
        0.0
    } else {
        a * x.ln()
    }
}

pub fn log_dnorm(x: f64, mean: f64, sd: f64) -> f64 {
    if !(sd > 0.0) {
        return f64::NAN;
    }
    let z = (x - mean) / sd;
    -0.5 * z * z - sd.ln() - 0.5 * (2.0 * PI).ln()
}

/// Normal density.
pub fn dnorm(x: f64, mean: f64, sd: f64) -> f64 {
    log_dnorm(x, mean, sd).exp()
}

pub fn log_dcauchy(x: f64, location: f64, scale: f64) -> f64 {
    if !(scale > 0.0) {
        return f64::NAN;
    }
    let z = (x - location) / scale;
    -(PI * scale).ln() - z.mul_add(z, 1.0).ln()
}

/// Cauchy density.
pub fn dcauchy(x: f64, location: f64, scale: f64) -> f64 {
    log_dcauchy(x, location, scale).exp()
}

pub fn log_dpois(k: u64, lambda: f64) -> f64 {
    if lambda < 0.0 || lambda.is_nan() {
        return f64::NAN;
    }
    if lambda == 0.0 {
        return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
    }
    let kf = k as f64;
    kf * lambda.ln() - lambda - ln_gamma(kf + 1.0)
}

/// Poisson probability mass at `k`.
pub fn dpois(k: u64, lambda: f64) -> f64 {
    log_dpois(k, lambda).exp()
}

pub fn log_dbeta(x: f64, alpha: f64, beta: f64) -> f64 {
    if !(alpha > 0.0 && beta > 0.0) {
        return f64::NAN;
    }
    if !(0.0..=1.0).contains(&x) {
        return f64::NEG_INFINITY;
    }
    xlogy(alpha - 1.0, x) + xlogy(beta - 1.0, 1.0 - x) - ln_beta(alpha, beta)
}

/// Beta density on [0, 1].
pub fn dbeta(x: f64, alpha: f64, beta: f64) -> f64 {
    log_dbeta(x, alpha, beta).exp()
}

pub fn log_dgamma(x: f64, shape: f64, rate: f64) -> f64 {
    if !(shape > 0.0 && rate > 0.0) {
        return f64::NAN;
    }
    if x < 0.0 {
        return f64::NEG_INFINITY;
    }
    if x == 0.0 {
        return match shape {
            s if s < 1.0 => f64::INFINITY,
            s if s == 1.0 => rate.ln(),
            _ => f64::NEG_INFINITY,
        };
    }
    shape * rate.ln() + xlogy(shape - 1.0, x) - rate * x - ln_gamma(shape)
}

/// Gamma density with shape/rate parameterization.
pub fn dgamma(x: f64, shape: f64, rate: f64) -> f64 {
    log_dgamma(x, shape, rate).exp()
}
