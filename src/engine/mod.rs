//! Differential expression engine seam
//!
//! The statistical model (dispersion fit, Wald/LRT test, multiple-testing
//! correction) lives outside this crate. An engine receives the matrix and
//! the two-group assignment and returns one [`GeneStatResult`] per matrix
//! gene, with fold changes computed as group A relative to group B and
//! p-values already adjusted.

mod precomputed;

pub use precomputed::PrecomputedEngine;

use serde::{Deserialize, Serialize};

use crate::data::{ExpressionMatrix, GroupAssignment};
use crate::error::Result;

/// Per-gene statistics produced by an engine
///
/// `None` marks an undefined value (e.g. an all-zero gene has no p-value);
/// it is never coerced to zero downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneStatResult {
    pub gene_id: String,
    /// log2(A / B)
    pub log2_fold_change: Option<f64>,
    /// Test statistic
    pub stat: Option<f64>,
    pub raw_pvalue: Option<f64>,
    /// Multiple-testing adjusted p-value
    pub adjusted_pvalue: Option<f64>,
}

impl GeneStatResult {
    /// A result whose statistics are all undefined
    pub fn undefined(gene_id: &str) -> Self {
        Self {
            gene_id: gene_id.to_string(),
            log2_fold_change: None,
            stat: None,
            raw_pvalue: None,
            adjusted_pvalue: None,
        }
    }
}

/// A differential expression test treated as a black box
pub trait DeEngine {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Test every gene of `matrix`, returning results in matrix row order
    fn test(
        &self,
        matrix: &ExpressionMatrix,
        groups: &GroupAssignment,
    ) -> Result<Vec<GeneStatResult>>;
}

/// Warn about engine output that breaks the adjusted >= raw contract
///
/// Values are reported, never corrected.
pub(crate) fn check_adjustment(results: &[GeneStatResult]) {
    let violations = results
        .iter()
        .filter(|r| match (r.raw_pvalue, r.adjusted_pvalue) {
            (Some(raw), Some(adj)) => adj < raw,
            _ => false,
        })
        .count();
    if violations > 0 {
        log::warn!(
            "{} genes have an adjusted p-value below the raw p-value",
            violations
        );
    }
}
