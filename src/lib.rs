//! Monte Carlo integration and Markov chain samplers.
//!
//! - [`integrate`]: uniform, box and importance-sampled integral estimates with standard
//!   errors and confidence intervals.
//! - [`metropolis`]: random-walk Metropolis over an unnormalized posterior, optionally
//!   restricted to a box.
//! - [`gibbs`]: fixed-order Gibbs sweeps, including the zero-inflated Poisson model.
//!
//! Every stochastic component draws from its own seeded [`variates::VariateSource`], so a
//! fixed seed reproduces a run exactly.

pub mod core;
pub mod densities;
pub mod distributions;
pub mod error;
pub mod estimator;
pub mod gibbs;
pub mod integrate;
pub mod io;
pub mod metropolis;
pub mod stats;
pub mod variates;

pub use error::{Error, Result};
