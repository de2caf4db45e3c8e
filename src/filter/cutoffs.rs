//! Cutoff filtering of annotated results into report views
//!
//! Each view is taken from the full result set, never from another view,
//! and sorted by decreasing log2 fold change. Comparisons are strict:
//! `padj < padj_cutoff`, `|lfc| > log2_cutoff`, `avg_cpm > abundance_cutoff`.
//! A gene with an undefined adjusted p-value never passes a cutoff view.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotatedResult;
use crate::config::Thresholds;

/// The four report views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Significance,
    Magnitude,
    Abundance,
    All,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::Significance,
        ViewKind::Magnitude,
        ViewKind::Abundance,
        ViewKind::All,
    ];

    /// Filename suffix of the view's artifact
    pub fn suffix(&self) -> &'static str {
        match self {
            ViewKind::Significance => "padj_cutoff",
            ViewKind::Magnitude => "log2f_cutoff",
            ViewKind::Abundance => "cpm_cutoff",
            ViewKind::All => "allgenes",
        }
    }
}

/// A statistic that is present and a real number
pub(crate) fn defined(x: Option<f64>) -> Option<f64> {
    x.filter(|v| !v.is_nan())
}

/// Decreasing order; undefined values sort after every defined one
///
/// Numerically equal values (including -0.0 and 0.0) compare equal, so a
/// stable sort keeps them in input order.
pub(crate) fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (defined(a), defined(b)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by decreasing log2 fold change (ties keep input order)
fn sort_by_fold_change(rows: &mut [&AnnotatedResult]) {
    rows.sort_by(|a, b| descending(a.log2_fold_change, b.log2_fold_change));
}

/// Applies the three cutoffs of one run
#[derive(Debug, Clone, Copy)]
pub struct ResultFilter {
    thresholds: Thresholds,
}

impl ResultFilter {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    fn significant(&self, r: &AnnotatedResult) -> bool {
        defined(r.adjusted_pvalue).is_some_and(|p| p < self.thresholds.padj_cutoff)
    }

    fn large_change(&self, r: &AnnotatedResult) -> bool {
        defined(r.log2_fold_change).is_some_and(|lfc| lfc.abs() > self.thresholds.log2_cutoff)
    }

    fn abundant(&self, r: &AnnotatedResult) -> bool {
        r.average_abundance > self.thresholds.abundance_cutoff
    }

    fn select<'a, F>(&self, results: &'a [AnnotatedResult], keep: F) -> Vec<&'a AnnotatedResult>
    where
        F: Fn(&AnnotatedResult) -> bool,
    {
        let mut rows: Vec<&AnnotatedResult> = results.iter().filter(|r| keep(*r)).collect();
        sort_by_fold_change(&mut rows);
        rows
    }

    /// Build all four views from the full result set
    pub fn apply<'a>(&self, results: &'a [AnnotatedResult]) -> FilteredViews<'a> {
        let views = FilteredViews {
            by_significance: self.select(results, |r| self.significant(r)),
            by_magnitude: self.select(results, |r| self.significant(r) && self.large_change(r)),
            by_abundance: self.select(results, |r| self.significant(r) && self.abundant(r)),
            all_annotated: self.select(results, |_| true),
            thresholds: self.thresholds,
        };

        for entry in views.summary().entries {
            log::info!(
                "Genes passing {} cutoff {}: {}",
                entry.cutoff_name,
                entry.cutoff_value,
                entry.signif_genes
            );
        }
        views
    }
}

/// Ordered projections of the annotated results
#[derive(Debug, Clone)]
pub struct FilteredViews<'a> {
    pub by_significance: Vec<&'a AnnotatedResult>,
    pub by_magnitude: Vec<&'a AnnotatedResult>,
    pub by_abundance: Vec<&'a AnnotatedResult>,
    pub all_annotated: Vec<&'a AnnotatedResult>,
    thresholds: Thresholds,
}

impl<'a> FilteredViews<'a> {
    pub fn view(&self, kind: ViewKind) -> &[&'a AnnotatedResult] {
        match kind {
            ViewKind::Significance => &self.by_significance,
            ViewKind::Magnitude => &self.by_magnitude,
            ViewKind::Abundance => &self.by_abundance,
            ViewKind::All => &self.all_annotated,
        }
    }

    /// Per-cutoff match counts for these views
    pub fn summary(&self) -> FilterSummary {
        let t = &self.thresholds;
        let tested = self
            .all_annotated
            .iter()
            .filter(|r| defined(r.adjusted_pvalue).is_some())
            .count();
        FilterSummary {
            entries: vec![
                CutoffCount::new("padj", t.padj_cutoff, self.by_significance.len()),
                CutoffCount::new("log2fc", t.log2_cutoff, self.by_magnitude.len()),
                CutoffCount::new("avg_cpm", t.abundance_cutoff, self.by_abundance.len()),
            ],
            total_genes: self.all_annotated.len(),
            genes_tested: tested,
        }
    }
}

/// Match count of one named cutoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffCount {
    pub cutoff_name: String,
    pub cutoff_value: f64,
    pub signif_genes: usize,
}

impl CutoffCount {
    fn new(name: &str, value: f64, count: usize) -> Self {
        Self {
            cutoff_name: name.to_string(),
            cutoff_value: value,
            signif_genes: count,
        }
    }
}

/// Summary record of one filtering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub entries: Vec<CutoffCount>,
    pub total_genes: usize,
    /// Genes with a defined adjusted p-value
    pub genes_tested: usize,
}

impl FilterSummary {
    /// Count for a cutoff by name
    pub fn count(&self, cutoff_name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.cutoff_name == cutoff_name)
            .map(|e| e.signif_genes)
    }
}

impl fmt::Display for FilterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cutoff_name\tcutoff_value\tsignif_genes")?;
        for e in &self.entries {
            writeln!(f, "{}\t{}\t{}", e.cutoff_name, e.cutoff_value, e.signif_genes)?;
        }
        Ok(())
    }
}
