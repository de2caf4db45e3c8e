//! Ranked gene lists for gene-set enrichment tools

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotatedResult;
use crate::filter::{defined, descending};

/// One line of a rank file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    /// Upper-cased display name
    pub display_name: String,
    pub log2_fold_change: f64,
}

/// Build the rank list for one biotype
///
/// Rows of another biotype, without annotation, or with an undefined fold
/// change are dropped. Names are upper-cased so case-insensitive consumers
/// match consistently; a name occurring twice stays as two entries. Sorted by
/// decreasing fold change, ties in input order.
pub fn rank_entries(results: &[AnnotatedResult], biotype: &str) -> Vec<RankEntry> {
    let mut entries: Vec<RankEntry> = results
        .iter()
        .filter(|r| r.biotype.as_deref() == Some(biotype))
        .filter_map(|r| {
            let lfc = defined(r.log2_fold_change)?;
            let name = r.display_name.as_deref()?;
            Some(RankEntry {
                display_name: name.to_uppercase(),
                log2_fold_change: lfc,
            })
        })
        .collect();

    entries.sort_by(|a, b| descending(Some(a.log2_fold_change), Some(b.log2_fold_change)));

    let n_duplicated = {
        let mut names: Vec<&str> = entries.iter().map(|e| e.display_name.as_str()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        before - names.len()
    };
    if n_duplicated > 0 {
        log::warn!(
            "{} rank entries share an upper-cased name with another entry; kept as separate lines",
            n_duplicated
        );
    }

    log::debug!("{} {} genes in rank list", entries.len(), biotype);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        id: &str,
        name: Option<&str>,
        biotype: Option<&str>,
        lfc: Option<f64>,
    ) -> AnnotatedResult {
        AnnotatedResult {
            gene_id: id.to_string(),
            display_name: name.map(str::to_string),
            biotype: biotype.map(str::to_string),
            log2_fold_change: lfc,
            stat: None,
            raw_pvalue: None,
            adjusted_pvalue: None,
            average_abundance: 0.0,
            normalized_values: vec![],
        }
    }

    #[test]
    fn test_restricts_to_biotype_and_uppercases() {
        let results = vec![
            row("G1", Some("Actb"), Some("protein_coding"), Some(0.5)),
            row("G2", Some("Malat1"), Some("lncRNA"), Some(4.0)),
            row("G3", Some("Gapdh"), Some("protein_coding"), Some(2.5)),
            row("G4", Some("Tp53"), Some("protein_coding"), None),
            row("G5", None, None, Some(9.0)),
        ];
        let ranks = rank_entries(&results, "protein_coding");

        assert_eq!(
            ranks,
            vec![
                RankEntry {
                    display_name: "GAPDH".into(),
                    log2_fold_change: 2.5,
                },
                RankEntry {
                    display_name: "ACTB".into(),
                    log2_fold_change: 0.5,
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_names_are_kept() {
        let results = vec![
            row("ENSG1", Some("Pinx1"), Some("protein_coding"), Some(1.0)),
            row("ENSG2", Some("PINX1"), Some("protein_coding"), Some(-1.0)),
        ];
        let ranks = rank_entries(&results, "protein_coding");
        assert_eq!(ranks.len(), 2);
        assert!(ranks.iter().all(|r| r.display_name == "PINX1"));
    }

    #[test]
    fn test_signed_zero_is_a_tie() {
        let results = vec![
            row("G1", Some("neg"), Some("protein_coding"), Some(-0.0)),
            row("G2", Some("pos"), Some("protein_coding"), Some(0.0)),
        ];
        let names: Vec<String> = rank_entries(&results, "protein_coding")
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        assert_eq!(names, vec!["NEG", "POS"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let results = vec![
            row("G1", Some("b"), Some("protein_coding"), Some(1.0)),
            row("G2", Some("a"), Some("protein_coding"), Some(1.0)),
            row("G3", Some("c"), Some("protein_coding"), Some(-2.0)),
        ];
        let names: Vec<String> = rank_entries(&results, "protein_coding")
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }
}
