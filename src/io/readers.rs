//! Readers for the expression, annotation and statistics tables

use std::path::Path;

use super::tables::{column_index, open_table, optional_text, parse_optional_f64, require_column};
use crate::annotation::{AnnotationTable, GeneAnnotation};
use crate::data::ExpressionRecord;
use crate::engine::GeneStatResult;
use crate::error::{ReportError, Result};

const GENE_ID_COLUMNS: &[&str] = &["gene_id", "ensembl_gene_id", "id"];
const GENE_NAME_COLUMNS: &[&str] = &[
    "gene_name",
    "external_gene_name",
    "display_name",
    "symbol",
    "name",
];
const SAMPLE_COLUMNS: &[&str] = &["sample_id", "sample", "sample_name"];
const BIOTYPE_COLUMNS: &[&str] = &["biotype", "gene_biotype", "gene_type"];

/// Read a long-format expression table
///
/// Expected columns: a gene identifier, a gene name, a sample identifier and
/// the numeric `value_column`. Other columns are ignored.
pub fn read_expression_records<P: AsRef<Path>>(
    path: P,
    value_column: &str,
) -> Result<Vec<ExpressionRecord>> {
    let mut reader = open_table(path.as_ref())?;
    let headers = reader.headers()?.clone();

    let id_col = require_column(&headers, GENE_ID_COLUMNS, "Expression")?;
    let name_col = require_column(&headers, GENE_NAME_COLUMNS, "Expression")?;
    let sample_col = require_column(&headers, SAMPLE_COLUMNS, "Expression")?;
    let value_col = require_column(&headers, &[value_column], "Expression")?;

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or("");
        let value = field(value_col).parse::<f64>().map_err(|_| ReportError::Schema {
            reason: format!(
                "Line {}: '{}' value '{}' is not a number",
                line + 2,
                value_column,
                field(value_col)
            ),
        })?;

        records.push(ExpressionRecord {
            gene_id: field(id_col).to_string(),
            gene_name: field(name_col).to_string(),
            sample_id: field(sample_col).to_string(),
            value,
        });
    }

    if records.is_empty() {
        return Err(ReportError::EmptyData {
            reason: "No records found in expression table".to_string(),
        });
    }

    Ok(records)
}

/// Read the gene annotation table (identifier, display name, biotype)
///
/// Empty or `NA` fields become null annotation; a gene listed more than once
/// keeps its first entry.
pub fn read_annotation_table<P: AsRef<Path>>(path: P) -> Result<AnnotationTable> {
    let mut reader = open_table(path.as_ref())?;
    let headers = reader.headers()?.clone();

    let id_col = require_column(&headers, GENE_ID_COLUMNS, "Annotation")?;
    let name_col = require_column(&headers, GENE_NAME_COLUMNS, "Annotation")?;
    let biotype_col = require_column(&headers, BIOTYPE_COLUMNS, "Annotation")?;

    let mut table = AnnotationTable::new();
    let mut duplicates = 0usize;
    for row in reader.records() {
        let row = row?;
        let id = row.get(id_col).unwrap_or("");
        if id.is_empty() {
            continue;
        }
        let annotation = GeneAnnotation {
            display_name: optional_text(row.get(name_col).unwrap_or("")),
            biotype: optional_text(row.get(biotype_col).unwrap_or("")),
        };
        if !table.insert(id, annotation) {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        log::warn!(
            "{} repeated gene identifiers in annotation table; first entry kept",
            duplicates
        );
    }

    Ok(table)
}

/// Read a per-gene statistics table from an external DE run
///
/// Required columns: `gene_id`, `log2FoldChange`, `pvalue`, `padj`;
/// `stat` is optional. `NA`, `NaN` and empty fields are undefined.
pub fn read_stats_table<P: AsRef<Path>>(path: P) -> Result<Vec<GeneStatResult>> {
    let mut reader = open_table(path.as_ref())?;
    let headers = reader.headers()?.clone();

    let id_col = require_column(&headers, GENE_ID_COLUMNS, "Statistics")?;
    let lfc_col = require_column(
        &headers,
        &["log2FoldChange", "log2_fold_change", "lfc"],
        "Statistics",
    )?;
    let p_col = require_column(&headers, &["pvalue", "raw_pvalue", "p_value"], "Statistics")?;
    let padj_col = require_column(&headers, &["padj", "adjusted_pvalue", "fdr"], "Statistics")?;
    let stat_col = column_index(&headers, &["stat", "statistic"]);

    let mut results = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let number = |i: usize| -> Result<Option<f64>> {
            parse_optional_f64(row.get(i).unwrap_or("")).map_err(|reason| ReportError::Schema {
                reason: format!("Line {} of statistics table: {}", line + 2, reason),
            })
        };

        let result = GeneStatResult {
            gene_id: row.get(id_col).unwrap_or("").to_string(),
            log2_fold_change: number(lfc_col)?,
            stat: match stat_col {
                Some(i) => number(i)?,
                None => None,
            },
            raw_pvalue: number(p_col)?,
            adjusted_pvalue: number(padj_col)?,
        };

        for (label, p) in [("pvalue", result.raw_pvalue), ("padj", result.adjusted_pvalue)] {
            if let Some(p) = p {
                if !(0.0..=1.0).contains(&p) {
                    return Err(ReportError::Schema {
                        reason: format!(
                            "Line {}: {} {} for gene '{}' is outside [0, 1]",
                            line + 2,
                            label,
                            p,
                            result.gene_id
                        ),
                    });
                }
            }
        }
        results.push(result);
    }

    Ok(results)
}
