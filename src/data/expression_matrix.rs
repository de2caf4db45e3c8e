//! Dense gene x sample expression matrix

use std::collections::{HashMap, HashSet};

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{ReportError, Result};
use crate::normalization;

/// A dense expression matrix keyed by a stable gene identifier
/// Rows are genes (first-occurrence order), columns are samples
///
/// Immutable once built: every stage downstream shares the same column order.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    /// Expression values (genes x samples)
    values: Array2<f64>,
    /// Row keys
    gene_ids: Vec<String>,
    /// Display names carried alongside each row key
    gene_names: Vec<String>,
    /// Column identifiers
    sample_ids: Vec<String>,
    /// Row key to row index
    gene_lookup: HashMap<String, usize>,
}

impl ExpressionMatrix {
    /// Create a new matrix from dense values
    pub fn new(
        values: Array2<f64>,
        gene_ids: Vec<String>,
        gene_names: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (n_genes, n_samples) = values.dim();

        if gene_ids.len() != n_genes || gene_names.len() != n_genes {
            return Err(ReportError::DimensionMismatch {
                expected: format!("{} gene IDs and names", n_genes),
                got: format!("{} IDs, {} names", gene_ids.len(), gene_names.len()),
            });
        }

        if sample_ids.len() != n_samples {
            return Err(ReportError::DimensionMismatch {
                expected: format!("{} sample IDs", n_samples),
                got: format!("{} sample IDs", sample_ids.len()),
            });
        }

        if values.iter().any(|&x| x < 0.0 || !x.is_finite()) {
            return Err(ReportError::Schema {
                reason: "Expression values must be non-negative finite numbers".to_string(),
            });
        }

        let mut gene_lookup = HashMap::with_capacity(n_genes);
        for (i, id) in gene_ids.iter().enumerate() {
            if gene_lookup.insert(id.clone(), i).is_some() {
                return Err(ReportError::IdentifierAmbiguity {
                    key: id.clone(),
                    candidates: vec![id.clone()],
                });
            }
        }

        let mut seen = HashSet::new();
        if let Some(dup) = sample_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(ReportError::Schema {
                reason: format!("Duplicate sample column '{}'", dup),
            });
        }

        Ok(Self {
            values,
            gene_ids,
            gene_names,
            sample_ids,
            gene_lookup,
        })
    }

    /// Get the number of genes
    pub fn n_genes(&self) -> usize {
        self.values.nrows()
    }

    /// Get the number of samples
    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }

    /// Get the values as a view
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    pub fn gene_names(&self) -> &[String] {
        &self.gene_names
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get values for a specific gene
    pub fn gene_values(&self, gene_idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(gene_idx)
    }

    /// Get gene index by row key
    pub fn gene_index(&self, gene_id: &str) -> Option<usize> {
        self.gene_lookup.get(gene_id).copied()
    }

    /// Get sample index by ID
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|id| id == sample_id)
    }

    /// Sum of values per sample (library size)
    pub fn library_sizes(&self) -> Vec<f64> {
        normalization::library_sizes(self.values())
    }
}
