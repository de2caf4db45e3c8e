//! Reshape long-format records into a dense expression matrix
//!
//! Rows follow the first occurrence of each row key, columns the first
//! occurrence of each sample. The result is rectangular or construction
//! fails: a missing (gene, sample) cell or two conflicting values for the
//! same cell is a schema error.

use std::collections::HashMap;

use ndarray::Array2;

use super::records::{ExpressionRecord, RowKey};
use super::ExpressionMatrix;
use crate::error::{ReportError, Result};

/// Builder for [`ExpressionMatrix`] from long-format records
///
/// # Example
///
/// ```ignore
/// let matrix = MatrixBuilder::new()
///     .row_key(RowKey::GeneId)
///     .build(&records)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MatrixBuilder {
    row_key: RowKey,
}

/// Per-row bookkeeping while scanning records
struct RowSlot {
    key: String,
    display_name: String,
    /// Distinct identifiers seen on the other side of the key
    counterparts: Vec<String>,
}

impl MatrixBuilder {
    /// Create a new builder keyed by the stable gene identifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field used as the row key
    pub fn row_key(mut self, row_key: RowKey) -> Self {
        self.row_key = row_key;
        self
    }

    /// Build the matrix
    pub fn build(&self, records: &[ExpressionRecord]) -> Result<ExpressionMatrix> {
        if records.is_empty() {
            return Err(ReportError::EmptyData {
                reason: "No expression records to build a matrix from".to_string(),
            });
        }

        let mut rows: Vec<RowSlot> = Vec::new();
        let mut row_index: HashMap<String, usize> = HashMap::new();
        let mut sample_ids: Vec<String> = Vec::new();
        let mut sample_index: HashMap<String, usize> = HashMap::new();
        let mut cells: HashMap<(usize, usize), f64> = HashMap::with_capacity(records.len());
        let mut n_identical_duplicates = 0usize;

        for rec in records {
            if rec.value < 0.0 || !rec.value.is_finite() {
                return Err(ReportError::Schema {
                    reason: format!(
                        "Invalid value {} for gene '{}' in sample '{}'",
                        rec.value, rec.gene_id, rec.sample_id
                    ),
                });
            }

            let key = rec.key(self.row_key);
            let i = match row_index.get(key) {
                Some(&i) => i,
                None => {
                    rows.push(RowSlot {
                        key: key.to_string(),
                        display_name: rec.gene_name.clone(),
                        counterparts: Vec::new(),
                    });
                    row_index.insert(key.to_string(), rows.len() - 1);
                    rows.len() - 1
                }
            };

            let counterpart = rec.counterpart(self.row_key);
            let slot = &mut rows[i];
            if !slot.counterparts.iter().any(|c| c == counterpart) {
                slot.counterparts.push(counterpart.to_string());
                if slot.counterparts.len() > 1 {
                    return Err(ReportError::IdentifierAmbiguity {
                        key: slot.key.clone(),
                        candidates: slot.counterparts.clone(),
                    });
                }
            }

            let j = match sample_index.get(&rec.sample_id) {
                Some(&j) => j,
                None => {
                    sample_ids.push(rec.sample_id.clone());
                    sample_index.insert(rec.sample_id.clone(), sample_ids.len() - 1);
                    sample_ids.len() - 1
                }
            };

            match cells.get(&(i, j)) {
                Some(&existing) if existing == rec.value => {
                    n_identical_duplicates += 1;
                }
                Some(&existing) => {
                    return Err(ReportError::Schema {
                        reason: format!(
                            "Conflicting values for gene '{}' in sample '{}': {} and {}",
                            key, rec.sample_id, existing, rec.value
                        ),
                    });
                }
                None => {
                    cells.insert((i, j), rec.value);
                }
            }
        }

        if n_identical_duplicates > 0 {
            log::warn!(
                "{} duplicate (gene, sample) records with identical values were collapsed",
                n_identical_duplicates
            );
        }

        let n_genes = rows.len();
        let n_samples = sample_ids.len();
        let expected = n_genes * n_samples;
        if cells.len() != expected {
            let (gi, sj) = (0..n_genes)
                .flat_map(|i| (0..n_samples).map(move |j| (i, j)))
                .find(|cell| !cells.contains_key(cell))
                .unwrap_or((0, 0));
            return Err(ReportError::Schema {
                reason: format!(
                    "Matrix is not rectangular: {} of {} cells missing (first: gene '{}', sample '{}')",
                    expected - cells.len(),
                    expected,
                    rows[gi].key,
                    sample_ids[sj]
                ),
            });
        }

        let mut values = Array2::zeros((n_genes, n_samples));
        for ((i, j), v) in cells {
            values[[i, j]] = v;
        }

        let (gene_ids, gene_names): (Vec<String>, Vec<String>) = rows
            .into_iter()
            .map(|slot| (slot.key, slot.display_name))
            .unzip();

        log::debug!(
            "Built {} x {} matrix keyed by {}",
            n_genes,
            n_samples,
            self.row_key
        );

        ExpressionMatrix::new(values, gene_ids, gene_names, sample_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, name: &str, sample: &str, v: f64) -> ExpressionRecord {
        ExpressionRecord::new(id, name, sample, v)
    }

    #[test]
    fn test_build_rectangular() {
        let records = vec![
            rec("G2", "B", "s1", 1.0),
            rec("G1", "A", "s1", 2.0),
            rec("G2", "B", "s2", 3.0),
            rec("G1", "A", "s2", 4.0),
            rec("G1", "A", "s3", 5.0),
            rec("G2", "B", "s3", 6.0),
        ];
        let matrix = MatrixBuilder::new().build(&records).unwrap();

        assert_eq!(matrix.gene_ids(), &["G2".to_string(), "G1".to_string()]);
        assert_eq!(matrix.gene_names(), &["B".to_string(), "A".to_string()]);
        assert_eq!(
            matrix.sample_ids(),
            &["s1".to_string(), "s2".to_string(), "s3".to_string()]
        );
        assert_eq!(matrix.gene_values(1).to_vec(), vec![2.0, 4.0, 5.0]);
        for i in 0..matrix.n_genes() {
            assert_eq!(matrix.gene_values(i).len(), matrix.n_samples());
        }
    }

    #[test]
    fn test_missing_cell_is_schema_error() {
        let records = vec![
            rec("G1", "A", "s1", 1.0),
            rec("G1", "A", "s2", 1.0),
            rec("G2", "B", "s1", 1.0),
        ];
        let err = MatrixBuilder::new().build(&records).unwrap_err();
        match err {
            ReportError::Schema { reason } => {
                assert!(reason.contains("'G2'"));
                assert!(reason.contains("'s2'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_conflicting_duplicate_is_schema_error() {
        let records = vec![rec("G1", "A", "s1", 1.0), rec("G1", "A", "s1", 2.0)];
        assert!(matches!(
            MatrixBuilder::new().build(&records),
            Err(ReportError::Schema { .. })
        ));
    }

    #[test]
    fn test_identical_duplicate_is_collapsed() {
        let records = vec![rec("G1", "A", "s1", 1.0), rec("G1", "A", "s1", 1.0)];
        let matrix = MatrixBuilder::new().build(&records).unwrap();
        assert_eq!(matrix.n_genes(), 1);
        assert_eq!(matrix.n_samples(), 1);
    }

    #[test]
    fn test_colliding_display_name_is_ambiguous() {
        let records = vec![
            rec("ENSG1", "PINX1", "s1", 1.0),
            rec("ENSG2", "PINX1", "s1", 2.0),
        ];
        let by_id = MatrixBuilder::new().row_key(RowKey::GeneId).build(&records);
        assert!(by_id.is_ok());

        let by_name = MatrixBuilder::new().row_key(RowKey::GeneName).build(&records);
        match by_name {
            Err(ReportError::IdentifierAmbiguity { key, candidates }) => {
                assert_eq!(key, "PINX1");
                assert_eq!(candidates, vec!["ENSG1".to_string(), "ENSG2".to_string()]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_value_rejected() {
        let records = vec![rec("G1", "A", "s1", -1.0)];
        assert!(matches!(
            MatrixBuilder::new().build(&records),
            Err(ReportError::Schema { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            MatrixBuilder::new().build(&[]),
            Err(ReportError::EmptyData { .. })
        ));
    }
}
