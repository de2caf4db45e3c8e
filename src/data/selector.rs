//! Gene lookup by index, display name, or stable identifier

use std::fmt;
use std::str::FromStr;

use super::ExpressionMatrix;
use crate::annotation::AnnotationTable;
use crate::error::{ReportError, Result};

/// How a caller refers to a single gene
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneSelector {
    /// Zero-based matrix row
    ByIndex(usize),
    /// Display name (annotation name, falling back to the expression table name)
    ByName(String),
    /// Stable identifier (the matrix row key)
    ById(String),
}

impl GeneSelector {
    /// Resolve to the matrix row key
    ///
    /// A display name shared by several genes is an [`ReportError::IdentifierAmbiguity`];
    /// anything that matches no row is an [`ReportError::InvalidParameter`].
    pub fn resolve(
        &self,
        matrix: &ExpressionMatrix,
        annotation: Option<&AnnotationTable>,
    ) -> Result<String> {
        match self {
            GeneSelector::ByIndex(idx) => matrix
                .gene_ids()
                .get(*idx)
                .cloned()
                .ok_or_else(|| ReportError::InvalidParameter {
                    reason: format!(
                        "Gene index {} out of range (matrix has {} genes)",
                        idx,
                        matrix.n_genes()
                    ),
                }),
            GeneSelector::ById(id) => matrix
                .gene_index(id)
                .map(|_| id.clone())
                .ok_or_else(|| ReportError::InvalidParameter {
                    reason: format!("Gene identifier '{}' not found", id),
                }),
            GeneSelector::ByName(name) => {
                let candidates: Vec<String> = matrix
                    .gene_ids()
                    .iter()
                    .zip(matrix.gene_names())
                    .filter(|(id, table_name)| {
                        let display = annotation
                            .and_then(|a| a.get(id))
                            .and_then(|a| a.display_name.as_deref())
                            .unwrap_or(table_name.as_str());
                        display.eq_ignore_ascii_case(name)
                    })
                    .map(|(id, _)| id.clone())
                    .collect();

                match candidates.len() {
                    0 => Err(ReportError::InvalidParameter {
                        reason: format!("Gene name '{}' not found", name),
                    }),
                    1 => Ok(candidates[0].clone()),
                    _ => Err(ReportError::IdentifierAmbiguity {
                        key: name.clone(),
                        candidates,
                    }),
                }
            }
        }
    }
}

impl FromStr for GeneSelector {
    type Err = ReportError;

    /// Parse `index:<n>`, `name:<display>` or `id:<accession>`
    fn from_str(s: &str) -> Result<Self> {
        let (kind, value) = s.split_once(':').ok_or_else(|| ReportError::InvalidParameter {
            reason: format!(
                "Invalid gene selector '{}'. Use index:<n>, name:<gene> or id:<accession>.",
                s
            ),
        })?;

        if value.is_empty() {
            return Err(ReportError::InvalidParameter {
                reason: format!("Empty value in gene selector '{}'", s),
            });
        }

        match kind {
            "index" => value
                .parse::<usize>()
                .map(GeneSelector::ByIndex)
                .map_err(|_| ReportError::InvalidParameter {
                    reason: format!("Gene index '{}' is not a non-negative integer", value),
                }),
            "name" => Ok(GeneSelector::ByName(value.to_string())),
            "id" => Ok(GeneSelector::ById(value.to_string())),
            other => Err(ReportError::InvalidParameter {
                reason: format!("Unknown gene selector kind '{}'", other),
            }),
        }
    }
}

impl fmt::Display for GeneSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneSelector::ByIndex(i) => write!(f, "index:{}", i),
            GeneSelector::ByName(n) => write!(f, "name:{}", n),
            GeneSelector::ById(id) => write!(f, "id:{}", id),
        }
    }
}
