//! Export of sampled chains for external reporting tools.

#[cfg(feature = "csv")]
pub mod csv;
