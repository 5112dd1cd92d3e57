//! Error types shared by every sampler and integrator in the crate.

use thiserror::Error;

/// Failure of a single run or step.
///
/// None of these are retried internally: resampling past an undefined
/// mathematical state does not make it defined.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Structurally invalid setup, e.g. malformed bounds or mismatched dimensions.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A numeric hyperparameter outside its admissible range.
    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The operation is undefined for the current state.
    #[error("Domain error: {0}")]
    Domain(String),

    /// A caller-supplied function failed or produced a non-finite value at `x`.
    #[error("Computation error at x = {x:?}: {message}")]
    Computation { x: Vec<f64>, message: String },
}

impl Error {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Error::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    pub(crate) fn computation(x: &[f64], message: impl Into<String>) -> Self {
        Error::Computation {
            x: x.to_vec(),
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
