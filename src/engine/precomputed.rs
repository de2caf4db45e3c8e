//! Engine backed by a statistics table from an external DE run

use std::collections::HashMap;
use std::path::Path;

use super::{check_adjustment, DeEngine, GeneStatResult};
use crate::data::{ExpressionMatrix, GroupAssignment};
use crate::error::{ReportError, Result};
use crate::io::read_stats_table;

/// Serves results computed elsewhere (e.g. a DESeq2 results table)
///
/// The table must already describe the group A vs group B contrast.
#[derive(Debug, Clone)]
pub struct PrecomputedEngine {
    by_gene: HashMap<String, GeneStatResult>,
}

impl PrecomputedEngine {
    /// Index results by gene; a gene listed twice is a schema error
    pub fn from_results(results: Vec<GeneStatResult>) -> Result<Self> {
        let mut by_gene = HashMap::with_capacity(results.len());
        for result in results {
            if by_gene.contains_key(&result.gene_id) {
                return Err(ReportError::Schema {
                    reason: format!("Gene '{}' listed twice in statistics table", result.gene_id),
                });
            }
            by_gene.insert(result.gene_id.clone(), result);
        }
        Ok(Self { by_gene })
    }

    /// Load a statistics table from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_results(read_stats_table(path)?)
    }

    pub fn n_genes(&self) -> usize {
        self.by_gene.len()
    }
}

impl DeEngine for PrecomputedEngine {
    fn name(&self) -> &str {
        "precomputed"
    }

    fn test(
        &self,
        matrix: &ExpressionMatrix,
        groups: &GroupAssignment,
    ) -> Result<Vec<GeneStatResult>> {
        if groups.sample_ids() != matrix.sample_ids() {
            return Err(ReportError::DimensionMismatch {
                expected: format!(
                    "group assignment over {} matrix columns",
                    matrix.n_samples()
                ),
                got: format!("{} assigned samples", groups.sample_ids().len()),
            });
        }

        let mut missing = 0usize;
        let results: Vec<GeneStatResult> = matrix
            .gene_ids()
            .iter()
            .map(|id| match self.by_gene.get(id) {
                Some(r) => r.clone(),
                None => {
                    missing += 1;
                    GeneStatResult::undefined(id)
                }
            })
            .collect();

        if missing > 0 {
            log::warn!(
                "{} matrix genes have no statistics; reporting them as undefined",
                missing
            );
        }

        let extra = self
            .by_gene
            .keys()
            .filter(|id| matrix.gene_index(id).is_none())
            .count();
        if extra > 0 {
            log::warn!(
                "{} genes in the statistics table are not in the matrix",
                extra
            );
        }

        check_adjustment(&results);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::assign_groups;
    use ndarray::{array, Array2};
    use std::collections::BTreeSet;

    fn stat(id: &str, lfc: f64, padj: f64) -> GeneStatResult {
        GeneStatResult {
            gene_id: id.to_string(),
            log2_fold_change: Some(lfc),
            stat: None,
            raw_pvalue: Some(padj / 2.0),
            adjusted_pvalue: Some(padj),
        }
    }

    #[test]
    fn test_aligns_to_matrix_order() {
        let matrix = ExpressionMatrix::new(
            array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
            vec!["G1".into(), "G2".into(), "G3".into()],
            vec!["A".into(), "B".into(), "C".into()],
            vec!["s1".into(), "s2".into()],
        )
        .unwrap();
        let group_a: BTreeSet<String> = ["s1".to_string()].into_iter().collect();
        let groups = assign_groups(matrix.sample_ids(), &group_a, "KO", "WT").unwrap();

        let engine = PrecomputedEngine::from_results(vec![
            stat("G3", 1.0, 0.01),
            stat("G1", -1.0, 0.2),
            stat("G9", 0.5, 0.5),
        ])
        .unwrap();

        let results = engine.test(&matrix, &groups).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.gene_id.as_str()).collect();
        assert_eq!(ids, vec!["G1", "G2", "G3"]);
        assert_eq!(results[1], GeneStatResult::undefined("G2"));
        assert_eq!(results[2].log2_fold_change, Some(1.0));
    }

    #[test]
    fn test_duplicate_gene_rejected() {
        let result =
            PrecomputedEngine::from_results(vec![stat("G1", 1.0, 0.1), stat("G1", 2.0, 0.1)]);
        assert!(matches!(result, Err(ReportError::Schema { .. })));
    }

    #[test]
    fn test_genome_scale_table() {
        let n_genes = 60_000;
        let ids: Vec<String> = (0..n_genes).map(|i| format!("ENSG{:011}", i)).collect();
        let matrix = ExpressionMatrix::new(
            Array2::from_elem((n_genes, 2), 1.0),
            ids.clone(),
            ids.clone(),
            vec!["s1".into(), "s2".into()],
        )
        .unwrap();
        let group_a: BTreeSet<String> = ["s1".to_string()].into_iter().collect();
        let groups = assign_groups(matrix.sample_ids(), &group_a, "KO", "WT").unwrap();

        // Every other matrix gene plus as many genes the matrix lacks
        let table: Vec<GeneStatResult> = ids
            .iter()
            .step_by(2)
            .map(|id| stat(id, 1.0, 0.1))
            .chain((0..n_genes / 2).map(|i| stat(&format!("EXTRA{}", i), 1.0, 0.1)))
            .collect();
        let engine = PrecomputedEngine::from_results(table).unwrap();

        let start = std::time::Instant::now();
        let results = engine.test(&matrix, &groups).unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(5));

        assert_eq!(results.len(), n_genes);
        assert_eq!(results[0].log2_fold_change, Some(1.0));
        assert_eq!(results[1], GeneStatResult::undefined(&ids[1]));
        assert_eq!(results[n_genes - 1].gene_id, ids[n_genes - 1]);
    }
}
