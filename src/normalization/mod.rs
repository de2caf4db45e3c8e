//! Normalization of expression values for reporting

mod counts;
mod size_factors;

pub use counts::{average_cpm, cpm, library_sizes};
pub use size_factors::{estimate_size_factors, normalized_values, NormalizationMethod};
