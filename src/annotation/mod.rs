//! Gene annotation and the statistics/annotation left join

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::ExpressionMatrix;
use crate::engine::GeneStatResult;
use crate::error::{ReportError, Result};
use crate::normalization::{average_cpm, normalized_values, NormalizationMethod};

/// Static annotation for one gene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneAnnotation {
    pub display_name: Option<String>,
    pub biotype: Option<String>,
}

/// Read-only lookup from stable identifier to annotation
///
/// Loaded once per run and shared by reference between the joiner and the
/// rank exporter.
#[derive(Debug, Clone, Default)]
pub struct AnnotationTable {
    entries: HashMap<String, GeneAnnotation>,
}

impl AnnotationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, keeping the first one seen for a gene
    ///
    /// Returns false when `gene_id` was already present.
    pub fn insert(&mut self, gene_id: &str, annotation: GeneAnnotation) -> bool {
        if self.entries.contains_key(gene_id) {
            return false;
        }
        self.entries.insert(gene_id.to_string(), annotation);
        true
    }

    pub fn get(&self, gene_id: &str) -> Option<&GeneAnnotation> {
        self.entries.get(gene_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (matched, unmatched) counts of `gene_ids` against the table
    pub fn coverage<S: AsRef<str>>(&self, gene_ids: &[S]) -> (usize, usize) {
        let matched = gene_ids
            .iter()
            .filter(|id| self.entries.contains_key(AsRef::<str>::as_ref(*id)))
            .count();
        (matched, gene_ids.len() - matched)
    }
}

/// Per-gene statistics joined with annotation and abundance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedResult {
    pub gene_id: String,
    /// `None` when the gene has no annotation entry
    pub display_name: Option<String>,
    pub biotype: Option<String>,
    pub log2_fold_change: Option<f64>,
    pub stat: Option<f64>,
    pub raw_pvalue: Option<f64>,
    pub adjusted_pvalue: Option<f64>,
    /// Mean CPM across all samples
    pub average_abundance: f64,
    /// Normalized value per sample, in matrix column order
    pub normalized_values: Vec<f64>,
}

/// Left-join engine results with annotation and abundance metrics
///
/// Every statistics row is kept, in its original order. Abundance is the
/// mean over samples of library-size scaled values (CPM) computed from
/// `counts`, independently of any scaling the engine applied.
pub fn join_annotations(
    stats: &[GeneStatResult],
    annotation: &AnnotationTable,
    counts: &ExpressionMatrix,
    normalization: NormalizationMethod,
) -> Result<Vec<AnnotatedResult>> {
    let abundance = average_cpm(counts.values());
    let normalized = normalized_values(counts.values(), normalization)?;

    let joined: Result<Vec<AnnotatedResult>> = stats
        .par_iter()
        .map(|s| {
            let i = counts
                .gene_index(&s.gene_id)
                .ok_or_else(|| ReportError::InvalidInput {
                    reason: format!(
                        "Statistics reported for gene '{}' not in the matrix",
                        s.gene_id
                    ),
                })?;
            let ann = annotation.get(&s.gene_id).cloned().unwrap_or_default();
            Ok(AnnotatedResult {
                gene_id: s.gene_id.clone(),
                display_name: ann.display_name,
                biotype: ann.biotype,
                log2_fold_change: s.log2_fold_change,
                stat: s.stat,
                raw_pvalue: s.raw_pvalue,
                adjusted_pvalue: s.adjusted_pvalue,
                average_abundance: abundance[i],
                normalized_values: normalized.row(i).to_vec(),
            })
        })
        .collect();
    let joined = joined?;

    let ids: Vec<&str> = joined.iter().map(|r| r.gene_id.as_str()).collect();
    let (matched, unmatched) = annotation.coverage(&ids);
    log::info!(
        "Annotated {} of {} genes ({} without annotation kept with empty fields)",
        matched,
        joined.len(),
        unmatched
    );

    Ok(joined)
}
